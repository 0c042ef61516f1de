//! Request and response bodies of the curriculum backend
//!
//! Most fields default when absent so that partial responses from older
//! backend versions still deserialize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Generic `{message, ...}` acknowledgement
///
/// Endpoint-specific extras (`week_path`, `spec_path`, `asset_paths`, ...)
/// are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Status message from the backend
    #[serde(default)]
    pub message: String,
    /// Remaining response fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backend-side status of a week in `GET /weeks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendWeekStatus {
    /// Nothing generated yet
    NotGenerated,
    /// Some content generated
    Partial,
    /// All content generated
    Complete,
    /// Content present but failing validation
    Invalid,
    /// Status this client does not know about
    #[serde(other)]
    Unknown,
}

/// One entry of `GET /weeks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekListEntry {
    /// Week number
    pub week_number: u32,
    /// Backend status
    pub status: BackendWeekStatus,
    /// Whether the week spec exists
    #[serde(default)]
    pub has_spec: bool,
    /// Number of days with content (0-4)
    #[serde(default)]
    pub has_days: u32,
    /// Last modification time as reported by the backend
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Body of `GET /weeks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekListResponse {
    /// Known weeks
    #[serde(default)]
    pub weeks: Vec<WeekListEntry>,
}

/// Body of `GET /weeks/{week}/spec/compiled`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledWeekSpec {
    /// Week number
    pub week: u32,
    /// Spec parts keyed by part file name
    #[serde(default)]
    pub spec: Value,
}

/// Body of `GET /weeks/{week}/spec/parts/{part}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecPart {
    /// Part file name
    pub part: String,
    /// Part content (JSON or text)
    #[serde(default)]
    pub content: Value,
}

/// Body of `GET /weeks/{week}/days/{day}/fields/{field}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldContent {
    /// Field key
    pub field: String,
    /// Field content (JSON or text)
    #[serde(default)]
    pub content: Value,
}

/// Body of `GET /weeks/{week}/days/{day}/flint-bundle`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlintBundle {
    /// Week number
    pub week: u32,
    /// Day number
    pub day: u32,
    /// Field key to content; missing fields are null
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// One finding of a validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Where the finding applies
    #[serde(default)]
    pub location: String,
    /// What is wrong
    pub message: String,
}

/// Body of `POST /weeks/{week}/validate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Week number
    pub week: u32,
    /// Whether the week passed
    pub is_valid: bool,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
    /// Blocking findings
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
    /// Informational findings
    #[serde(default)]
    pub info: Vec<ValidationIssue>,
}

/// Body of `POST /weeks/{week}/export`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    /// Status message
    #[serde(default)]
    pub message: String,
    /// Path of the archive on the backend host
    pub zip_path: String,
    /// Archive size in KiB
    #[serde(default)]
    pub size_kb: f64,
}

/// Per-day part of a hydrate result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayHydration {
    /// Week number
    #[serde(default)]
    pub week: u32,
    /// Day number
    #[serde(default)]
    pub day: u32,
    /// Paths of the generated field files
    #[serde(default)]
    pub field_paths: Vec<String>,
    /// Path of the generated document
    #[serde(default)]
    pub document_path: String,
    /// Day status
    #[serde(default)]
    pub status: String,
}

/// Generated components of a hydrate result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HydrationComponents {
    /// Path of the week spec
    #[serde(default)]
    pub spec: String,
    /// Path of the role context
    #[serde(default)]
    pub role_context: String,
    /// Paths of generated assets
    #[serde(default)]
    pub assets: Vec<String>,
    /// Per-day results
    #[serde(default)]
    pub days: Vec<DayHydration>,
}

/// Validation summary of a hydrate result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HydrationValidation {
    /// Whether the hydrated week validates
    #[serde(default)]
    pub is_valid: bool,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
    /// Number of errors
    #[serde(default)]
    pub error_count: u32,
    /// Number of warnings
    #[serde(default)]
    pub warning_count: u32,
}

/// Body of `POST /gen/weeks/{week}/hydrate`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekHydrationResult {
    /// Week number
    pub week: u32,
    /// Generated components
    #[serde(default)]
    pub components: HydrationComponents,
    /// Validation summary
    #[serde(default)]
    pub validation: HydrationValidation,
}

/// Body of `GET /usage`
///
/// Passed through for display; the client keeps no invariants on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// LLM requests made
    #[serde(default)]
    pub total_requests: u64,
    /// Tokens consumed
    #[serde(default)]
    pub total_tokens: u64,
    /// Cost in USD
    #[serde(default, alias = "total_cost_usd")]
    pub total_cost: f64,
    /// Per-category or per-provider counters
    #[serde(default, alias = "by_provider")]
    pub breakdown: BTreeMap<String, Value>,
}
