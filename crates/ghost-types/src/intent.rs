use serde::{Deserialize, Serialize};

/// The closed set of twelve intent labels (4.C, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentClass {
    DataEntry,
    Navigation,
    Communication,
    Research,
    Approval,
    FileOperation,
    Authentication,
    Configuration,
    DataExtraction,
    WorkflowTransition,
    ErrorHandling,
    Unknown,
}

impl IntentClass {
    /// All twelve labels, in the order listed in 4.C.
    pub const ALL: [IntentClass; 12] = [
        IntentClass::DataEntry,
        IntentClass::Navigation,
        IntentClass::Communication,
        IntentClass::Research,
        IntentClass::Approval,
        IntentClass::FileOperation,
        IntentClass::Authentication,
        IntentClass::Configuration,
        IntentClass::DataExtraction,
        IntentClass::WorkflowTransition,
        IntentClass::ErrorHandling,
        IntentClass::Unknown,
    ];

    /// Per-class LCG seed constant required for deterministic vector generation (GLOSSARY).
    pub fn seed(self) -> u32 {
        match self {
            IntentClass::DataEntry => 0x1a2b3c4d,
            IntentClass::Navigation => 0x2b3c4d5e,
            IntentClass::Communication => 0x3c4d5e6f,
            IntentClass::Research => 0x4d5e6f70,
            IntentClass::Approval => 0x5e6f7081,
            IntentClass::FileOperation => 0x6f708192,
            IntentClass::Authentication => 0x708192a3,
            IntentClass::Configuration => 0x8192a3b4,
            IntentClass::DataExtraction => 0x92a3b4c5,
            IntentClass::WorkflowTransition => 0xa3b4c5d6,
            IntentClass::ErrorHandling => 0xb4c5d6e7,
            IntentClass::Unknown => 0xc5d6e7f8,
        }
    }

    /// Stable short string used when rendering an intent sequence for clustering/LLM prompts.
    pub fn as_str(self) -> &'static str {
        match self {
            IntentClass::DataEntry => "data_entry",
            IntentClass::Navigation => "navigation",
            IntentClass::Communication => "communication",
            IntentClass::Research => "research",
            IntentClass::Approval => "approval",
            IntentClass::FileOperation => "file_operation",
            IntentClass::Authentication => "authentication",
            IntentClass::Configuration => "configuration",
            IntentClass::DataExtraction => "data_extraction",
            IntentClass::WorkflowTransition => "workflow_transition",
            IntentClass::ErrorHandling => "error_handling",
            IntentClass::Unknown => "unknown",
        }
    }
}
