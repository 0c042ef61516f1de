/*!
Command handlers for the CLI

Each submodule backs one top-level command:

- `weeks`    : week list, validation, export, scaffolding, specs
- `days`     : day field view and editing
- `generate` : hydrate jobs and single-step generation
- `usage`    : usage stats
- `events`   : raw backend event stream

Handlers print to stdout and leave error reporting to `main`.
*/

use crate::api::{ApiClient, CurriculumApi};
use crate::config::Config;
use crate::error::Result;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod days;
pub mod events;
pub mod generate;
pub mod usage;
pub mod weeks;

/// Build the HTTP client for `config`
///
/// # Errors
///
/// Returns error if the HTTP client cannot be constructed
pub fn build_api(config: &Config) -> Result<Arc<dyn CurriculumApi>> {
    Ok(Arc::new(ApiClient::new(&config.api)?))
}

/// Token cancelled on Ctrl-C
///
/// Handlers hand it to every aggregator they create so an interrupt stops
/// in-flight requests without further state updates.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = trigger.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Interrupted, cancelling"),
                    Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
                }
                trigger.cancel();
            }
        }
    });
    token
}

/// Usage poll interval from config
pub(crate) fn poll_interval(config: &Config) -> Duration {
    Duration::from_millis(config.generation.usage_poll_interval_ms)
}

/// WebSocket keep-alive interval from config
pub(crate) fn ping_interval(config: &Config) -> Duration {
    Duration::from_secs(config.events.ping_interval_seconds)
}

/// Pretty-print any serializable value as JSON
pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(crate::error::TequilaError::Serialization)?;
    println!("{}", json);
    Ok(())
}

/// Render field or spec content for the terminal
///
/// Strings print as-is; other JSON values are pretty-printed.
pub(crate) fn render_content(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
