//! Week generation tracking
//!
//! A week is generated by a single hydrate call. The tracker publishes an
//! optimistic progress record as soon as the call is issued and a final
//! record when it resolves. Backend `progress` events, when forwarded via
//! [`GenerationTracker::apply_event`], take over the intermediate progress
//! for the week in flight.
//!
//! State lives behind a lock so that events can be applied while a
//! generation call is awaiting.

use crate::api::{CurriculumApi, ServerEvent, WeekHydrationResult};
use crate::cancel::{ensure_active, guarded};
use crate::error::{is_cancelled, Result};
use crate::models::{validate_week_number, GenerationProgress};

use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

/// Snapshot of the tracker's state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationState {
    /// A hydrate call is in flight
    pub generating: bool,
    /// Latest progress record
    pub progress: Option<GenerationProgress>,
    /// Message of the last failure
    pub error: Option<String>,
    /// Result of the last successful generation
    pub result: Option<WeekHydrationResult>,
    /// Progress is being driven by backend events
    pub server_driven: bool,
}

/// Drives week generation and exposes its progress
pub struct GenerationTracker {
    api: Arc<dyn CurriculumApi>,
    state: Arc<RwLock<GenerationState>>,
    cancellation: CancellationToken,
}

impl GenerationTracker {
    /// Create an idle tracker
    pub fn new(api: Arc<dyn CurriculumApi>) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(GenerationState::default())),
            cancellation: CancellationToken::new(),
        }
    }

    /// Tie the tracker's lifetime to `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Copy of the current state
    pub fn state(&self) -> GenerationState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether a hydrate call is in flight
    pub fn is_generating(&self) -> bool {
        self.state().generating
    }

    fn update(&self, f: impl FnOnce(&mut GenerationState)) {
        match self.state.write() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Generate one complete week
    ///
    /// # Errors
    ///
    /// Returns the hydrate error after recording it in the state
    pub async fn generate_week(&self, week: u32) -> Result<WeekHydrationResult> {
        validate_week_number(week)?;
        ensure_active(&self.cancellation)?;

        tracing::info!("Starting generation for week {}", week);
        self.update(|state| {
            state.generating = true;
            state.error = None;
            state.server_driven = false;
            state.progress = Some(GenerationProgress::starting(week));
        });

        let outcome = guarded(&self.cancellation, self.api.hydrate_week(week)).await;

        match outcome {
            Ok(result) => {
                ensure_active(&self.cancellation)?;
                tracing::info!("Week {} generation completed", week);
                self.update(|state| {
                    state.generating = false;
                    state.progress = Some(GenerationProgress::completed(week));
                    state.result = Some(result.clone());
                });
                Ok(result)
            }
            Err(e) if is_cancelled(&e) => Err(e),
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Week {} generation failed: {}", week, message);
                self.update(|state| {
                    state.generating = false;
                    state.error = Some(message.clone());
                    state.progress = Some(GenerationProgress::failed(week, message));
                });
                Err(e)
            }
        }
    }

    /// Generate weeks `from..=to` one at a time
    ///
    /// A failed week is logged and skipped; the returned results hold only
    /// the weeks that succeeded. Stops early only on cancellation.
    pub async fn generate_week_range(&self, from: u32, to: u32) -> Vec<WeekHydrationResult> {
        let mut results = Vec::new();

        for week in from..=to {
            match self.generate_week(week).await {
                Ok(result) => results.push(result),
                Err(e) if is_cancelled(&e) => break,
                Err(e) => {
                    tracing::error!("Week {} generation failed: {}", week, e);
                }
            }
        }

        tracing::info!(
            "Generated {} of {} weeks",
            results.len(),
            (to + 1).saturating_sub(from)
        );
        results
    }

    /// Clear all generation state
    pub fn reset(&self) {
        self.update(|state| *state = GenerationState::default());
    }

    /// Fold a backend event into the progress of the week in flight
    ///
    /// Only `progress` events for the week currently generating are
    /// applied. Returns true if the state changed.
    pub fn apply_event(&self, event: &ServerEvent) -> bool {
        let ServerEvent::Progress(progress) = event else {
            return false;
        };
        if self.cancellation.is_cancelled() {
            return false;
        }

        let mut applied = false;
        self.update(|state| {
            let in_flight = state.generating
                && state.progress.as_ref().map(|p| p.week) == Some(progress.week);
            if in_flight {
                state.progress = Some(progress.clone());
                state.server_driven = true;
                applied = true;
            }
        });
        applied
    }
}
