//! Curriculum domain types
//!
//! Week and day records are synthesized on the client from backend
//! responses and rebuilt on every load; nothing here is persisted.

use crate::config::BACKEND_MAX_WEEK;
use crate::error::{Result, TequilaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Lessons (days) in every week
pub const DAYS_PER_WEEK: u32 = 4;

/// Virtue themes, assigned to weeks cyclically
pub const VIRTUES: [&str; 7] = [
    "Courage",
    "Wisdom",
    "Justice",
    "Temperance",
    "Faith",
    "Hope",
    "Charity",
];

/// Definition of one named day field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayFieldDef {
    /// File name used by the backend
    pub key: &'static str,
    /// Human-readable label
    pub label: &'static str,
}

/// The seven fields that make up a day, in display order
pub const DAY_FIELDS: [DayFieldDef; 7] = [
    DayFieldDef {
        key: "01_class_name.txt",
        label: "Class Name",
    },
    DayFieldDef {
        key: "02_summary.md",
        label: "Summary",
    },
    DayFieldDef {
        key: "03_grade_level.txt",
        label: "Grade Level",
    },
    DayFieldDef {
        key: "04_role_context.json",
        label: "Role Context",
    },
    DayFieldDef {
        key: "05_guidelines_for_sparky.md",
        label: "Guidelines for Sparky",
    },
    DayFieldDef {
        key: "06_document_for_sparky.json",
        label: "Document for Sparky",
    },
    DayFieldDef {
        key: "07_sparkys_greeting.txt",
        label: "Sparky's Greeting",
    },
];

/// Fields generated for a whole week (7 fields x 4 days)
pub const WEEK_TOTAL_FIELDS: u32 = DAY_FIELDS.len() as u32 * DAYS_PER_WEEK;

/// Parts of a week spec, as stored by the backend
pub const WEEK_SPEC_PARTS: [&str; 12] = [
    "01_metadata.json",
    "02_objectives.json",
    "03_vocabulary.json",
    "04_grammar_focus.md",
    "05_chant.json",
    "06_sessions_week_view.json",
    "07_assessment.json",
    "08_assets_index.json",
    "09_spiral_links.json",
    "10_interleaving_plan.md",
    "11_misconception_watchlist.json",
    "12_preview_next_week.md",
];

/// Look up a field definition by key
pub fn day_field(key: &str) -> Option<&'static DayFieldDef> {
    DAY_FIELDS.iter().find(|f| f.key == key)
}

/// Whether a field key holds JSON rather than text
pub fn is_json_field(key: &str) -> bool {
    key.ends_with(".json")
}

/// Virtue for a 1-based week number
pub fn virtue_for_week(week: u32) -> &'static str {
    VIRTUES[(week.saturating_sub(1) % VIRTUES.len() as u32) as usize]
}

/// Reject week numbers the backend would refuse
pub fn validate_week_number(week: u32) -> Result<()> {
    if week == 0 || week > BACKEND_MAX_WEEK {
        return Err(TequilaError::InvalidWeek {
            week,
            max: BACKEND_MAX_WEEK,
        }
        .into());
    }
    Ok(())
}

/// Reject day numbers outside 1-4
pub fn validate_day_number(day: u32) -> Result<()> {
    if day == 0 || day > DAYS_PER_WEEK {
        return Err(TequilaError::InvalidDay(day).into());
    }
    Ok(())
}

/// Whether a field's content counts toward completion
///
/// Null and the empty string are missing; any other value, including an
/// empty JSON object, counts as generated.
pub fn is_filled(content: &Value) -> bool {
    match content {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Week status shown in the week list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStatus {
    /// All content is present
    Completed,
    /// A generation job is running for this week
    Generating,
    /// Not generated (or not known to be generated)
    Pending,
}

impl fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStatus::Completed => write!(f, "completed"),
            WeekStatus::Generating => write!(f, "generating"),
            WeekStatus::Pending => write!(f, "pending"),
        }
    }
}

/// One row of the week list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    /// Week number (1-based)
    pub number: u32,
    /// Virtue theme of the week
    pub virtue: String,
    /// Derived status
    pub status: WeekStatus,
    /// Lessons in the week
    pub lessons_count: u32,
    /// Whether the week passed validation
    pub validated: bool,
}

impl WeekSummary {
    /// A week with no known content
    pub fn pending(number: u32) -> Self {
        Self {
            number,
            virtue: virtue_for_week(number).to_string(),
            status: WeekStatus::Pending,
            lessons_count: DAYS_PER_WEEK,
            validated: false,
        }
    }

    /// A week whose content is complete
    pub fn completed(number: u32) -> Self {
        Self {
            status: WeekStatus::Completed,
            validated: true,
            ..Self::pending(number)
        }
    }
}

/// All fields of one day, merged into a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    /// Day number (1-4)
    pub day: u32,
    /// Field key to content; missing fields hold an empty string
    pub fields: BTreeMap<String, Value>,
    /// True when every field is filled
    pub validated: bool,
    /// Number of filled fields
    pub fields_complete: u32,
    /// Number of fields in a day
    pub total_fields: u32,
}

impl Day {
    /// Build a day from fetched field contents, counting completion
    pub fn from_fields(day: u32, fields: BTreeMap<String, Value>) -> Self {
        let fields_complete = DAY_FIELDS
            .iter()
            .filter(|def| fields.get(def.key).map(is_filled).unwrap_or(false))
            .count() as u32;
        let total_fields = DAY_FIELDS.len() as u32;

        Self {
            day,
            fields,
            validated: fields_complete == total_fields,
            fields_complete,
            total_fields,
        }
    }

    /// Content of a field, if present
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Phase of a generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    /// Content is being generated
    Generating,
    /// Generated content is being validated
    Validating,
    /// Generation finished
    Completed,
    /// Generation failed
    Error,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStatus::Generating => write!(f, "generating"),
            GenerationStatus::Validating => write!(f, "validating"),
            GenerationStatus::Completed => write!(f, "completed"),
            GenerationStatus::Error => write!(f, "error"),
        }
    }
}

/// Progress of the week generation in flight
///
/// Shared by the local tracker and the backend's `progress` events, which
/// use the same camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationProgress {
    /// Week being generated
    pub week: u32,
    /// Day currently being generated (0 once failed)
    #[serde(default)]
    pub day: u32,
    /// Fields generated so far
    #[serde(default)]
    pub field: u32,
    /// Fields to generate in total
    #[serde(default = "default_total_fields")]
    pub total_fields: u32,
    /// Current phase
    pub status: GenerationStatus,
    /// Human-readable status line
    #[serde(default)]
    pub message: String,
    /// Retry attempt reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Retry budget reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Completion percentage reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

fn default_total_fields() -> u32 {
    WEEK_TOTAL_FIELDS
}

impl GenerationProgress {
    /// Optimistic record set when a week generation starts
    pub fn starting(week: u32) -> Self {
        Self {
            week,
            day: 1,
            field: 0,
            total_fields: WEEK_TOTAL_FIELDS,
            status: GenerationStatus::Generating,
            message: format!("Starting generation for Week {}...", week),
            attempt: None,
            max_attempts: None,
            percentage: None,
        }
    }

    /// Final record after the hydrate call succeeded
    pub fn completed(week: u32) -> Self {
        Self {
            day: DAYS_PER_WEEK,
            field: WEEK_TOTAL_FIELDS,
            status: GenerationStatus::Completed,
            message: "Generation completed successfully!".to_string(),
            ..Self::starting(week)
        }
    }

    /// Final record after the hydrate call failed
    pub fn failed(week: u32, message: impl Into<String>) -> Self {
        Self {
            day: 0,
            field: 0,
            status: GenerationStatus::Error,
            message: message.into(),
            ..Self::starting(week)
        }
    }

    /// Percentage of fields done, preferring the backend's figure
    pub fn percent(&self) -> f64 {
        if let Some(p) = self.percentage {
            return p;
        }
        if self.total_fields == 0 {
            return 0.0;
        }
        (self.field as f64 / self.total_fields as f64 * 1000.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_virtue_cycles_every_seven_weeks() {
        assert_eq!(virtue_for_week(1), "Courage");
        assert_eq!(virtue_for_week(7), "Charity");
        assert_eq!(virtue_for_week(8), "Courage");
        assert_eq!(virtue_for_week(35), "Charity");
    }

    #[test]
    fn test_day_field_lookup() {
        assert_eq!(day_field("02_summary.md").unwrap().label, "Summary");
        assert!(day_field("02_summary.txt").is_none());
        assert!(is_json_field("04_role_context.json"));
        assert!(!is_json_field("07_sparkys_greeting.txt"));
    }

    #[test]
    fn test_week_and_day_bounds() {
        assert!(validate_week_number(0).is_err());
        assert!(validate_week_number(1).is_ok());
        assert!(validate_week_number(36).is_ok());
        assert!(validate_week_number(37).is_err());
        assert!(validate_day_number(0).is_err());
        assert!(validate_day_number(4).is_ok());
        assert!(validate_day_number(5).is_err());
    }

    #[test]
    fn test_is_filled() {
        assert!(!is_filled(&Value::Null));
        assert!(!is_filled(&json!("")));
        assert!(is_filled(&json!("Salve")));
        assert!(is_filled(&json!({})));
        assert!(is_filled(&json!({"identity": "Sparky"})));
    }

    #[test]
    fn test_day_counts_filled_fields() {
        let mut fields = BTreeMap::new();
        for def in DAY_FIELDS.iter() {
            fields.insert(def.key.to_string(), json!(""));
        }
        fields.insert("01_class_name.txt".to_string(), json!("Latin A"));
        fields.insert("04_role_context.json".to_string(), json!({"a": 1}));

        let day = Day::from_fields(2, fields);
        assert_eq!(day.fields_complete, 2);
        assert_eq!(day.total_fields, 7);
        assert!(!day.validated);
    }

    #[test]
    fn test_day_with_all_fields_is_validated() {
        let fields = DAY_FIELDS
            .iter()
            .map(|def| (def.key.to_string(), json!("content")))
            .collect();
        let day = Day::from_fields(1, fields);
        assert_eq!(day.fields_complete, day.total_fields);
        assert!(day.validated);
    }

    #[test]
    fn test_week_summary_constructors() {
        let pending = WeekSummary::pending(9);
        assert_eq!(pending.virtue, "Wisdom");
        assert_eq!(pending.status, WeekStatus::Pending);
        assert_eq!(pending.lessons_count, 4);
        assert!(!pending.validated);

        let done = WeekSummary::completed(9);
        assert_eq!(done.status, WeekStatus::Completed);
        assert!(done.validated);
    }

    #[test]
    fn test_progress_records() {
        let start = GenerationProgress::starting(5);
        assert_eq!((start.day, start.field, start.total_fields), (1, 0, 28));
        assert_eq!(start.message, "Starting generation for Week 5...");

        let done = GenerationProgress::completed(5);
        assert_eq!((done.day, done.field), (4, 28));
        assert_eq!(done.status, GenerationStatus::Completed);
        assert_eq!(done.percent(), 100.0);

        let failed = GenerationProgress::failed(5, "boom");
        assert_eq!((failed.day, failed.field), (0, 0));
        assert_eq!(failed.status, GenerationStatus::Error);
        assert_eq!(failed.message, "boom");
    }

    #[test]
    fn test_progress_parses_backend_field_names() {
        let raw = json!({
            "week": 3,
            "day": 2,
            "field": 10,
            "totalFields": 28,
            "status": "validating",
            "message": "Validating day 2",
            "attempt": 1,
            "maxAttempts": 10,
            "percentage": 35.7
        });
        let progress: GenerationProgress = serde_json::from_value(raw).unwrap();
        assert_eq!(progress.status, GenerationStatus::Validating);
        assert_eq!(progress.max_attempts, Some(10));
        assert_eq!(progress.percent(), 35.7);
    }
}
