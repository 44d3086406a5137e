use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub plan_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanStatus {
    Created,
    Other(String),
}

impl From<String> for PlanStatus {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("created") {
            Self::Created
        } else {
            Self::Other(s)
        }
    }
}

impl PlanStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Other(s) => s,
        }
    }
}

impl From<PlanStatus> for String {
    fn from(s: PlanStatus) -> Self {
        match s {
            PlanStatus::Created => "created".to_string(),
            PlanStatus::Other(s) => s,
        }
    }
}

/// A plan returned by `POST /plan`. Never mutated after it is received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanHandle {
    pub plan_id: i64,
    pub status: PlanStatus,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: u32,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "text_or_json",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub plan_id: i64,
    #[serde(default)]
    pub results: Vec<StepResult>,
}

/// Envelope of `POST /execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    pub result: ExecutionResult,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryContent {
    #[serde(default)]
    pub plan_id: Option<i64>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub step: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub content: MemoryContent,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MemoryResponse {
    #[serde(default)]
    pub memory: Vec<MemoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

/// Step results arrive as plain strings from the executor, but tools may hand
/// back structured JSON; keep the latter as compact JSON text.
pub(crate) fn text_or_json<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
