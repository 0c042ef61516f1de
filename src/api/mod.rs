//! Curriculum backend API
//!
//! [`CurriculumApi`] is the seam between the aggregators and the backend:
//! [`ApiClient`] implements it over HTTP, and tests substitute their own
//! implementations. [`EventStream`] follows the backend's WebSocket.

pub mod client;
pub mod events;
pub mod types;

pub use client::ApiClient;
pub use events::{EventStream, ServerEvent};
pub use types::{
    CompiledWeekSpec, ExportResponse, FieldContent, FlintBundle, MessageResponse, SpecPart,
    UsageStats, ValidationResult, WeekHydrationResult, WeekListResponse,
};

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

/// One operation per backend endpoint
///
/// Implementations perform a single request per call: no retries and no
/// caching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CurriculumApi: Send + Sync {
    /// `GET /weeks`
    async fn list_weeks(&self) -> Result<WeekListResponse>;

    /// `POST /weeks/{week}/scaffold`
    async fn scaffold_week(&self, week: u32) -> Result<MessageResponse>;

    /// `POST /weeks/{week}/validate`
    async fn validate_week(&self, week: u32) -> Result<ValidationResult>;

    /// `POST /weeks/{week}/export`
    async fn export_week(&self, week: u32) -> Result<ExportResponse>;

    /// `GET /weeks/{week}/export/download`
    async fn download_week_export(&self, week: u32) -> Result<Bytes>;

    /// `GET /weeks/{week}/spec/parts/{part}`
    async fn get_week_spec_part(&self, week: u32, part: &str) -> Result<SpecPart>;

    /// `GET /weeks/{week}/spec/compiled`
    async fn get_compiled_week_spec(&self, week: u32) -> Result<CompiledWeekSpec>;

    /// `GET /weeks/{week}/days/{day}/fields/{field}`
    async fn get_day_field(&self, week: u32, day: u32, field: &str) -> Result<FieldContent>;

    /// `PUT /weeks/{week}/days/{day}/fields/{field}`
    async fn update_day_field(
        &self,
        week: u32,
        day: u32,
        field: &str,
        content: Value,
    ) -> Result<MessageResponse>;

    /// `GET /weeks/{week}/days/{day}/flint-bundle`
    async fn get_day_flint_bundle(&self, week: u32, day: u32) -> Result<FlintBundle>;

    /// `POST /gen/weeks/{week}/spec`
    async fn generate_week_spec(&self, week: u32) -> Result<MessageResponse>;

    /// `POST /gen/weeks/{week}/role-context`
    async fn generate_role_context(&self, week: u32) -> Result<MessageResponse>;

    /// `POST /gen/weeks/{week}/assets`
    async fn generate_assets(&self, week: u32) -> Result<MessageResponse>;

    /// `POST /gen/weeks/{week}/days/{day}/fields`
    async fn generate_day_fields(&self, week: u32, day: u32) -> Result<MessageResponse>;

    /// `POST /gen/weeks/{week}/days/{day}/document`
    async fn generate_day_document(&self, week: u32, day: u32) -> Result<MessageResponse>;

    /// `POST /gen/weeks/{week}/hydrate`
    async fn hydrate_week(&self, week: u32) -> Result<WeekHydrationResult>;

    /// `GET /usage`
    async fn get_usage(&self) -> Result<UsageStats>;

    /// `POST /usage/reset`
    async fn reset_usage(&self) -> Result<MessageResponse>;
}
