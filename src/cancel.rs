//! Cancellation scope shared by the aggregators
//!
//! Each aggregator owns a token. Network awaits race against it, and state
//! is only written back while it has not fired, so a torn-down component
//! never mutates state after the fact.

use crate::error::{Result, TequilaError};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Await `fut` unless `token` fires first
pub(crate) async fn guarded<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TequilaError::Cancelled.into()),
        result = fut => result,
    }
}

/// Fail with [`TequilaError::Cancelled`] if `token` has fired
pub(crate) fn ensure_active(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(TequilaError::Cancelled.into());
    }
    Ok(())
}
