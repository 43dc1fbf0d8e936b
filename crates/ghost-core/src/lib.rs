//! Dependency-free deterministic math shared across the pipeline: element
//! fingerprinting (4.A) and the hashing/noise/session primitives that back
//! the Differential Privacy Unit (4.D).

pub mod fingerprinter;
pub mod hashing;
pub mod noise;
pub mod session;

pub use fingerprinter::{fingerprint_element, AncestorNode, ElementObservation};
pub use hashing::{element_signature, fnv1a32, fnv1a32_hex, simhash128_hex, structural_hash};
pub use noise::{
    floor_to_bucket_ms, randomized_response, sample_gaussian, sample_laplace, session_bucket_index,
};
pub use session::session_fingerprint;
