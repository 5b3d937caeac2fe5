//! Re-runnable queries bound to a store's change counter.
//!
//! A [`LiveQuery`] never caches rows. It pairs a `watch` receiver of the
//! store's change counter with a fetch closure; reading the query runs the
//! fetch, waiting for a change re-runs it once the counter moves. A new
//! subscriber therefore always sees the latest committed state.

use crate::core::blocking::run_blocking;
use crate::Result;
use std::sync::Arc;
use tokio::sync::watch;

type Fetch<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

/// An observable query result.
pub struct LiveQuery<T> {
    changes: watch::Receiver<u64>,
    fetch: Fetch<T>,
}

impl<T> Clone for LiveQuery<T> {
    fn clone(&self) -> Self {
        Self {
            changes: self.changes.clone(),
            fetch: Arc::clone(&self.fetch),
        }
    }
}

impl<T: Send + 'static> LiveQuery<T> {
    pub(crate) fn new<F>(changes: watch::Receiver<u64>, fetch: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            changes,
            fetch: Arc::new(fetch),
        }
    }

    /// Derives a query whose results are `f` applied to this query's results.
    pub fn map<U, F>(self, f: F) -> LiveQuery<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let fetch = self.fetch;
        LiveQuery {
            changes: self.changes,
            fetch: Arc::new(move || fetch().map(&f)),
        }
    }

    /// Runs the query on the calling thread without touching the change marker.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the underlying query fails.
    pub fn snapshot(&self) -> Result<T> {
        (self.fetch)()
    }

    /// Marks the current store state as seen and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the query fails, or
    /// [`crate::BookshelfError::Task`] if the blocking task could not complete.
    pub async fn current(&mut self) -> Result<T> {
        drop(self.changes.borrow_and_update());
        let fetch = Arc::clone(&self.fetch);
        run_blocking(move || fetch()).await
    }

    /// Waits until the store changes after the last read, then returns the new result.
    ///
    /// Returns immediately if a change already happened since the last
    /// [`current`](Self::current) or `changed` call. Once the store is gone
    /// nothing can change, and the returned future stays pending.
    ///
    /// # Errors
    ///
    /// Same as [`current`](Self::current).
    pub async fn changed(&mut self) -> Result<T> {
        if self.changes.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        self.current().await
    }

    /// Returns `true` if the store changed since the last read.
    pub fn has_changed(&self) -> bool {
        self.changes.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_changed_stays_pending_once_the_source_is_gone() {
        let (changes, receiver) = watch::channel(0u64);
        let mut query = LiveQuery::new(receiver, || Ok(7u32));
        drop(changes);

        let waited = timeout(Duration::from_millis(50), query.changed()).await;
        assert!(waited.is_err());
        assert_eq!(query.current().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_map_applies_to_every_read() {
        let (changes, receiver) = watch::channel(0u64);
        let mut query = LiveQuery::new(receiver, || Ok(vec![1, 2, 3])).map(|v: Vec<i32>| v.len());
        assert_eq!(query.current().await.unwrap(), 3);
        assert!(!query.has_changed());

        changes.send_replace(1);
        assert!(query.has_changed());
        assert_eq!(query.changed().await.unwrap(), 3);
    }
}
