use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use std::fmt;

/// The closed tool set an execution-plan `action` node may invoke (§3, 4.I).
/// Unrecognized tool names round-trip as `Other`, matching 4.I's "unknown tool"
/// handling rather than failing to deserialize a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    NavigateTo,
    ClickElement,
    InputText,
    ApiCall,
    ExtractData,
    HumanEscalation,
    Other(String),
}

impl Tool {
    pub fn as_str(&self) -> &str {
        match self {
            Tool::NavigateTo => "navigate_to",
            Tool::ClickElement => "click_element",
            Tool::InputText => "input_text",
            Tool::ApiCall => "api_call",
            Tool::ExtractData => "extract_data",
            Tool::HumanEscalation => "human_escalation",
            Tool::Other(s) => s,
        }
    }
}

impl From<&str> for Tool {
    fn from(s: &str) -> Self {
        match s {
            "navigate_to" => Tool::NavigateTo,
            "click_element" => Tool::ClickElement,
            "input_text" => Tool::InputText,
            "api_call" => Tool::ApiCall,
            "extract_data" => Tool::ExtractData,
            "human_escalation" => Tool::HumanEscalation,
            other => Tool::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Tool {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tool {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Tool::from(s.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub tool: Tool,
    pub params: Value,
}

/// DAG vertex type (§3 Execution Node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Action,
    Condition,
    Loop,
    Parallel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub action: Option<ActionSpec>,
    pub condition: Option<Value>,
    pub children: Option<Vec<String>>,
    pub fallback: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Strategy used to resolve an element-targeting node, or the fixed strategy
/// string for non-element tools (4.I). `SelfHealed` wraps whatever strategy the
/// repair substitute actually used, rendering as `self_healed:<inner>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Semantic,
    Structural,
    Visual,
    Coordinate,
    Api,
    Human,
    Direct,
    Unknown,
    SelfHealed(Box<Strategy>),
}

impl Strategy {
    pub fn as_string(&self) -> String {
        match self {
            Strategy::Semantic => "semantic".to_string(),
            Strategy::Structural => "structural".to_string(),
            Strategy::Visual => "visual".to_string(),
            Strategy::Coordinate => "coordinate".to_string(),
            Strategy::Api => "api".to_string(),
            Strategy::Human => "human".to_string(),
            Strategy::Direct => "direct".to_string(),
            Strategy::Unknown => "unknown".to_string(),
            Strategy::SelfHealed(inner) => format!("self_healed:{}", inner.as_string()),
        }
    }

    pub fn from_str(s: &str) -> Self {
        if let Some(rest) = s.strip_prefix("self_healed:") {
            return Strategy::SelfHealed(Box::new(Strategy::from_str(rest)));
        }
        match s {
            "semantic" => Strategy::Semantic,
            "structural" => Strategy::Structural,
            "visual" => Strategy::Visual,
            "coordinate" => Strategy::Coordinate,
            "api" => Strategy::Api,
            "human" => Strategy::Human,
            "direct" => Strategy::Direct,
            _ => Strategy::Unknown,
        }
    }

    pub fn is_self_healed(&self) -> bool {
        matches!(self, Strategy::SelfHealed(_))
    }
}

impl Serialize for Strategy {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Strategy::from_str(&s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub node_id: String,
    pub status: StepStatus,
    pub strategy: Strategy,
    pub duration_ms: u64,
    pub output: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub ghost_id: Uuid,
    pub status: ExecutionStatus,
    pub parameters: Value,
    pub trigger: String,
    pub step_count: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}
