//! Tequila - Latin curriculum dashboard client library
//!
//! This library talks to the curriculum generation backend and assembles
//! the views a dashboard needs: the week list, the fields of a day, the
//! progress of a generation job and LLM usage.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: HTTP client, response types and the WebSocket event stream
//! - `weeks`: Week list discovery, validation and export
//! - `days`: Per-day field aggregation and editing
//! - `generation`: Week generation tracking
//! - `usage`: Usage statistics and background polling
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tequila::{ApiClient, Config, WeekAggregator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let api = Arc::new(ApiClient::new(&config.api)?);
//!     let mut weeks = WeekAggregator::new(api, config.weeks.clone());
//!     for week in weeks.load().await? {
//!         println!("Week {}: {}", week.number, week.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod days;
pub mod error;
pub mod generation;
pub mod models;
pub mod usage;
pub mod weeks;

mod cancel;

// Re-export commonly used types
pub use api::{ApiClient, CurriculumApi, EventStream, ServerEvent};
pub use config::Config;
pub use days::DayAggregator;
pub use error::{Result, TequilaError};
pub use generation::{GenerationState, GenerationTracker};
pub use models::{Day, GenerationProgress, GenerationStatus, WeekStatus, WeekSummary};
pub use usage::{UsageMonitor, UsagePoller, UsageSnapshot};
pub use weeks::WeekAggregator;
