//! PII scrubbing, intent classification, differential privacy, and the
//! pipeline that composes them into Secure Events (4.B, 4.C, 4.D, 4.E).

pub mod dpu;
pub mod intent;
pub mod pii;
pub mod pipeline;

pub use dpu::{anonymize_timestamp, perturb_vector, randomized_response, DpConfig};
pub use intent::{classify, vectorize};
pub use pii::{PiiKind, PiiMatch, Scrubber};
pub use pipeline::{hash_url, PrivacyPipeline, ScrubSummary};
