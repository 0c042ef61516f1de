//! Week list aggregation
//!
//! The week list is rebuilt from scratch on every load. Which weeks exist
//! is learned either by probing compiled specs or from the backend's list
//! endpoint; whether a discovered week counts as completed depends on the
//! configured [`WeekCompleteness`].

use crate::api::types::BackendWeekStatus;
use crate::api::{CurriculumApi, ExportResponse, ValidationResult};
use crate::cancel::{ensure_active, guarded};
use crate::config::{WeekCompleteness, WeekDiscovery, WeeksConfig};
use crate::days::fetch_day;
use crate::error::{is_cancelled, Result};
use crate::models::{
    validate_week_number, GenerationProgress, GenerationStatus, WeekStatus, WeekSummary,
    DAYS_PER_WEEK,
};

use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Week list state
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tequila::api::ApiClient;
/// use tequila::config::{ApiConfig, WeeksConfig};
/// use tequila::weeks::WeekAggregator;
///
/// # async fn example() -> anyhow::Result<()> {
/// let api = Arc::new(ApiClient::new(&ApiConfig::default())?);
/// let mut weeks = WeekAggregator::new(api, WeeksConfig::default());
/// for week in weeks.load().await? {
///     println!("Week {} ({}): {}", week.number, week.virtue, week.status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct WeekAggregator {
    api: Arc<dyn CurriculumApi>,
    config: WeeksConfig,
    cancellation: CancellationToken,
    weeks: Vec<WeekSummary>,
    error: Option<String>,
}

impl WeekAggregator {
    /// Create an empty week list
    pub fn new(api: Arc<dyn CurriculumApi>, config: WeeksConfig) -> Self {
        Self {
            api,
            config,
            cancellation: CancellationToken::new(),
            weeks: Vec::new(),
            error: None,
        }
    }

    /// Tie the list's lifetime to `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Current week list (empty until loaded)
    pub fn weeks(&self) -> &[WeekSummary] {
        &self.weeks
    }

    /// One week of the current list
    pub fn week(&self, number: u32) -> Option<&WeekSummary> {
        self.weeks.iter().find(|w| w.number == number)
    }

    /// Last recorded error message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Rebuild the week list
    ///
    /// An unreachable backend is not an error: every week comes back
    /// pending and the reason is kept in [`error`](Self::error).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TequilaError::Cancelled`] if the list was torn down
    pub async fn load(&mut self) -> Result<&[WeekSummary]> {
        ensure_active(&self.cancellation)?;
        tracing::info!("Loading weeks...");
        self.error = None;

        let (completed, error) = match self.discover().await {
            Ok(found) => {
                tracing::info!("Found {} existing weeks", found.len());
                (self.completed_weeks(found).await?, None)
            }
            Err(e) if is_cancelled(&e) => return Err(e),
            Err(e) => {
                tracing::warn!("Backend not available or no weeks generated yet: {}", e);
                (BTreeSet::new(), Some(e.to_string()))
            }
        };
        ensure_active(&self.cancellation)?;

        self.weeks = (1..=self.config.total_weeks)
            .map(|n| {
                if completed.contains(&n) {
                    WeekSummary::completed(n)
                } else {
                    WeekSummary::pending(n)
                }
            })
            .collect();
        self.error = error;

        Ok(&self.weeks)
    }

    async fn discover(&self) -> Result<BTreeSet<u32>> {
        match self.config.discovery {
            WeekDiscovery::Probe => self.probe().await,
            WeekDiscovery::List => self.list().await,
        }
    }

    /// Probe week 1, then the rest of the probe range concurrently
    async fn probe(&self) -> Result<BTreeSet<u32>> {
        tracing::debug!("Checking backend connection...");
        guarded(&self.cancellation, self.api.get_compiled_week_spec(1)).await?;
        tracing::debug!("Backend connected, week 1 exists");

        let last = self.config.probe_through_week.min(self.config.total_weeks);
        let probes = (2..=last).map(|n| async move {
            match self.api.get_compiled_week_spec(n).await {
                Ok(_) => Some(n),
                Err(e) => {
                    tracing::debug!("Week {} not found: {}", n, e);
                    None
                }
            }
        });
        let results = guarded(&self.cancellation, async { Ok(join_all(probes).await) }).await?;

        let mut found: BTreeSet<u32> = results.into_iter().flatten().collect();
        found.insert(1);
        Ok(found)
    }

    async fn list(&self) -> Result<BTreeSet<u32>> {
        let response = guarded(&self.cancellation, self.api.list_weeks()).await?;
        Ok(response
            .weeks
            .into_iter()
            .filter(|w| w.has_spec && w.status != BackendWeekStatus::NotGenerated)
            .map(|w| w.week_number)
            .filter(|n| (1..=self.config.total_weeks).contains(n))
            .collect())
    }

    /// Narrow discovered weeks down to completed ones
    async fn completed_weeks(&self, found: BTreeSet<u32>) -> Result<BTreeSet<u32>> {
        if self.config.completeness == WeekCompleteness::Existence {
            return Ok(found);
        }

        let checks = found.into_iter().map(|n| async move {
            self.week_fields_complete(n).await.map(|done| (n, done))
        });
        let mut completed = BTreeSet::new();
        for result in join_all(checks).await {
            let (n, done) = result?;
            if done {
                completed.insert(n);
            }
        }
        Ok(completed)
    }

    /// Whether every field of every day of `week` is filled
    async fn week_fields_complete(&self, week: u32) -> Result<bool> {
        for day in 1..=DAYS_PER_WEEK {
            let loaded = fetch_day(self.api.as_ref(), week, day, &self.cancellation).await?;
            if !loaded.validated {
                tracing::debug!(
                    "Week {} day {} incomplete: {}/{} fields",
                    week,
                    day,
                    loaded.fields_complete,
                    loaded.total_fields
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Re-validate one week on the backend
    ///
    /// On success only that week's `validated` flag changes. Failures are
    /// recorded in [`error`](Self::error) and yield `None`.
    pub async fn validate_week(&mut self, number: u32) -> Option<ValidationResult> {
        let outcome = match validate_week_number(number) {
            Ok(()) => guarded(&self.cancellation, self.api.validate_week(number)).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                if self.cancellation.is_cancelled() {
                    return None;
                }
                if let Some(week) = self.weeks.iter_mut().find(|w| w.number == number) {
                    week.validated = result.is_valid;
                }
                tracing::info!("Week {} validation: {}", number, result.summary);
                Some(result)
            }
            Err(e) => {
                if !is_cancelled(&e) {
                    tracing::warn!("Validation failed for week {}: {}", number, e);
                    self.error = Some(e.to_string());
                }
                None
            }
        }
    }

    /// Export one week to a ZIP archive on the backend
    ///
    /// The week list itself is left as is.
    ///
    /// # Errors
    ///
    /// Returns the backend error, which is also recorded
    pub async fn export_week(&mut self, number: u32) -> Result<ExportResponse> {
        let outcome = match validate_week_number(number) {
            Ok(()) => guarded(&self.cancellation, self.api.export_week(number)).await,
            Err(e) => Err(e),
        };

        outcome.map_err(|e| {
            if !is_cancelled(&e) {
                tracing::warn!("Export failed for week {}: {}", number, e);
                self.error = Some(e.to_string());
            }
            e
        })
    }

    /// Reflect a generation progress record in the week list
    ///
    /// Returns true if a week's status changed.
    pub fn apply_progress(&mut self, progress: &GenerationProgress) -> bool {
        let Some(week) = self.weeks.iter_mut().find(|w| w.number == progress.week) else {
            return false;
        };

        let status = match progress.status {
            GenerationStatus::Generating | GenerationStatus::Validating => WeekStatus::Generating,
            GenerationStatus::Completed => WeekStatus::Completed,
            GenerationStatus::Error => WeekStatus::Pending,
        };
        if week.status == status {
            return false;
        }
        week.status = status;
        true
    }
}
