//! Day field aggregation
//!
//! A day is assembled from seven independently stored fields. Fields are
//! fetched one after another; a field that fails to load (usually because
//! it has not been generated yet) is recorded as empty rather than failing
//! the whole day.

use crate::api::CurriculumApi;
use crate::cancel::{ensure_active, guarded};
use crate::error::{is_cancelled, Result, TequilaError};
use crate::models::{day_field, validate_day_number, validate_week_number, Day, DAY_FIELDS};

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fetch all fields of one day and merge them
///
/// Per-field failures become empty strings. Only cancellation aborts the
/// sweep.
pub async fn fetch_day(
    api: &dyn CurriculumApi,
    week: u32,
    day: u32,
    cancellation: &CancellationToken,
) -> Result<Day> {
    let mut fields = BTreeMap::new();

    for def in DAY_FIELDS.iter() {
        ensure_active(cancellation)?;
        match guarded(cancellation, api.get_day_field(week, day, def.key)).await {
            Ok(result) => {
                fields.insert(def.key.to_string(), result.content);
            }
            Err(e) if is_cancelled(&e) => return Err(e),
            Err(e) => {
                tracing::debug!("Week {} day {} field {} missing: {}", week, day, def.key, e);
                fields.insert(def.key.to_string(), Value::String(String::new()));
            }
        }
    }

    Ok(Day::from_fields(day, fields))
}

/// Field view of a single day
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tequila::api::ApiClient;
/// use tequila::config::ApiConfig;
/// use tequila::days::DayAggregator;
///
/// # async fn example() -> anyhow::Result<()> {
/// let api = Arc::new(ApiClient::new(&ApiConfig::default())?);
/// let mut view = DayAggregator::new(api, 3, 2)?;
/// let day = view.load().await?;
/// println!("{}/{} fields", day.fields_complete, day.total_fields);
/// # Ok(())
/// # }
/// ```
pub struct DayAggregator {
    api: Arc<dyn CurriculumApi>,
    week: u32,
    day: u32,
    cancellation: CancellationToken,
    current: Option<Day>,
    error: Option<String>,
}

impl DayAggregator {
    /// Create a view for `week`/`day`
    ///
    /// # Errors
    ///
    /// Returns error if the week or day number is out of range
    pub fn new(api: Arc<dyn CurriculumApi>, week: u32, day: u32) -> Result<Self> {
        validate_week_number(week)?;
        validate_day_number(day)?;
        Ok(Self {
            api,
            week,
            day,
            cancellation: CancellationToken::new(),
            current: None,
            error: None,
        })
    }

    /// Tie the view's lifetime to `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Last loaded day
    pub fn day(&self) -> Option<&Day> {
        self.current.as_ref()
    }

    /// Last recorded error message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Load every field of the day
    ///
    /// # Errors
    ///
    /// Returns [`TequilaError::Cancelled`] if the view was torn down
    pub async fn load(&mut self) -> Result<&Day> {
        self.error = None;

        let day = match fetch_day(self.api.as_ref(), self.week, self.day, &self.cancellation).await
        {
            Ok(day) => day,
            Err(e) => {
                if !is_cancelled(&e) {
                    self.error = Some(e.to_string());
                }
                return Err(e);
            }
        };
        ensure_active(&self.cancellation)?;

        tracing::debug!(
            "Loaded week {} day {}: {}/{} fields",
            self.week,
            self.day,
            day.fields_complete,
            day.total_fields
        );
        Ok(&*self.current.insert(day))
    }

    /// Write one field, then reload the whole day from the backend
    ///
    /// # Errors
    ///
    /// Returns error for unknown field keys or when the update fails
    pub async fn update_field(&mut self, key: &str, content: Value) -> Result<&Day> {
        if day_field(key).is_none() {
            let err = TequilaError::InvalidField(key.to_string());
            self.error = Some(err.to_string());
            return Err(err.into());
        }
        ensure_active(&self.cancellation)?;

        let update = guarded(
            &self.cancellation,
            self.api.update_day_field(self.week, self.day, key, content),
        )
        .await;
        if let Err(e) = update {
            if !is_cancelled(&e) {
                tracing::warn!("Failed to update {}: {}", key, e);
                self.error = Some(e.to_string());
            }
            return Err(e);
        }

        tracing::info!("Updated week {} day {} field {}", self.week, self.day, key);
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FieldContent, MessageResponse, MockCurriculumApi};
    use serde_json::json;

    fn field_ok(field: &str, content: Value) -> Result<FieldContent> {
        Ok(FieldContent {
            field: field.to_string(),
            content,
        })
    }

    #[test]
    fn test_new_rejects_bad_numbers() {
        let api: Arc<dyn CurriculumApi> = Arc::new(MockCurriculumApi::new());
        assert!(DayAggregator::new(api.clone(), 0, 1).is_err());
        assert!(DayAggregator::new(api.clone(), 3, 5).is_err());
        assert!(DayAggregator::new(api, 3, 4).is_ok());
    }

    #[tokio::test]
    async fn test_load_counts_three_of_seven() {
        let mut mock = MockCurriculumApi::new();
        mock.expect_get_day_field()
            .times(7)
            .returning(|_, _, field| match field {
                "01_class_name.txt" => field_ok(field, json!("Latin A")),
                "02_summary.md" => field_ok(field, json!("Week summary")),
                "05_guidelines_for_sparky.md" => field_ok(field, json!("Be kind")),
                "03_grade_level.txt" => field_ok(field, json!("")),
                _ => Err(TequilaError::Api {
                    status: 404,
                    message: format!("Field not found: {}", field),
                }
                .into()),
            });

        let mut view = DayAggregator::new(Arc::new(mock), 1, 1).unwrap();
        let day = view.load().await.unwrap();

        assert_eq!(day.fields_complete, 3);
        assert_eq!(day.total_fields, 7);
        assert!(!day.validated);
        assert_eq!(day.fields.len(), 7);
        assert_eq!(day.fields["07_sparkys_greeting.txt"], json!(""));
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_update_field_rejects_unknown_key() {
        let mock = MockCurriculumApi::new();
        let mut view = DayAggregator::new(Arc::new(mock), 2, 2).unwrap();

        let err = view.update_field("99_bogus.txt", json!("x")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TequilaError>(),
            Some(TequilaError::InvalidField(_))
        ));
        assert!(view.error().is_some());
    }

    #[tokio::test]
    async fn test_update_failure_is_recorded_and_returned() {
        let mut mock = MockCurriculumApi::new();
        mock.expect_update_day_field().times(1).returning(|_, _, _, _| {
            Err(TequilaError::Api {
                status: 500,
                message: "disk full".to_string(),
            }
            .into())
        });
        mock.expect_get_day_field().times(0);

        let mut view = DayAggregator::new(Arc::new(mock), 2, 2).unwrap();
        let err = view
            .update_field("01_class_name.txt", json!("X"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(view.error(), Some("disk full"));
    }

    #[tokio::test]
    async fn test_update_reloads_from_backend() {
        let mut mock = MockCurriculumApi::new();
        mock.expect_update_day_field()
            .times(1)
            .returning(|_, _, _, _| Ok(MessageResponse::default()));
        mock.expect_get_day_field()
            .times(7)
            .returning(|_, _, field| field_ok(field, json!("server copy")));

        let mut view = DayAggregator::new(Arc::new(mock), 3, 2).unwrap();
        let day = view
            .update_field("01_class_name.txt", json!("local copy"))
            .await
            .unwrap();
        assert_eq!(day.fields["01_class_name.txt"], json!("server copy"));
        assert!(day.validated);
    }

    #[tokio::test]
    async fn test_cancelled_load_leaves_state_untouched() {
        let mock = MockCurriculumApi::new();
        let token = CancellationToken::new();
        token.cancel();

        let mut view = DayAggregator::new(Arc::new(mock), 1, 1)
            .unwrap()
            .with_cancellation(token);
        let err = view.load().await.unwrap_err();
        assert!(is_cancelled(&err));
        assert!(view.day().is_none());
        assert!(view.error().is_none());
    }
}
