//! Shared utilities for use cases.

use tokio_util::sync::CancellationToken;

/// Whether cancellation has been requested on an optional token.
pub(crate) fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(|t| t.is_cancelled())
}

/// Wait for cancellation; never resolves when there is no token.
pub(crate) async fn cancelled(token: &Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
