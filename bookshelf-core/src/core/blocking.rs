use crate::{BookshelfError, Result};

/// Runs SQLite work on tokio's blocking pool and awaits its result.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BookshelfError::Task(e.to_string()))?
}
