//! A shared current-value cell fed by a [`LiveQuery`].
//!
//! The first [`StateObserver`] starts a single upstream task that copies
//! every query result into the cell; later observers share that task. When
//! the last observer is dropped the task is kept for a grace period, so a
//! screen that re-subscribes right away (a rotation, a quick back/forward)
//! does not re-run the query from scratch. After the grace period with no
//! observers the task is aborted. Aborting only stops the subscription; it
//! never cancels a write in flight.

use crate::{BookshelfError, LiveQuery, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long an unobserved upstream subscription is kept alive.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

type Source<T> = Box<dyn Fn() -> LiveQuery<T> + Send + Sync>;

/// Reference-counted, lazily started view of a live query.
pub struct SharedState<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    cell: watch::Sender<T>,
    source: Source<T>,
    grace: Duration,
    runtime: Handle,
    lifecycle: Mutex<Lifecycle>,
}

#[derive(Default)]
struct Lifecycle {
    observers: usize,
    upstream: Option<JoinHandle<()>>,
    teardown: Option<JoinHandle<()>>,
}

impl Lifecycle {
    fn upstream_running(&self) -> bool {
        self.upstream.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<T: Clone + Send + Sync + 'static> SharedState<T> {
    /// Creates the cell holding `initial` until the first query result arrives.
    ///
    /// `source` is called each time the upstream subscription (re)starts.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Runtime`] when called outside a tokio runtime.
    pub fn new<F>(initial: T, grace: Duration, source: F) -> Result<Self>
    where
        F: Fn() -> LiveQuery<T> + Send + Sync + 'static,
    {
        let runtime =
            Handle::try_current().map_err(|e| BookshelfError::Runtime(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                cell: watch::channel(initial).0,
                source: Box::new(source),
                grace,
                runtime,
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        })
    }

    /// The latest published value, or the initial one if nothing was published yet.
    pub fn value(&self) -> T {
        self.inner.cell.borrow().clone()
    }

    /// Registers an observer, starting the upstream subscription if needed.
    pub fn subscribe(&self) -> StateObserver<T> {
        let mut lifecycle = self.inner.lock();
        lifecycle.observers += 1;
        if let Some(pending) = lifecycle.teardown.take() {
            pending.abort();
        }
        if !lifecycle.upstream_running() {
            log::debug!("starting shared state subscription");
            let query = (self.inner.source)();
            let owner = Arc::downgrade(&self.inner);
            lifecycle.upstream = Some(self.inner.runtime.spawn(pump(owner, query)));
        }
        drop(lifecycle);

        StateObserver {
            receiver: self.inner.cell.subscribe(),
            owner: Arc::clone(&self.inner),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers
    }

    /// Whether the upstream subscription is currently running.
    pub fn is_active(&self) -> bool {
        self.inner.lock().upstream_running()
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_if_unobserved(&self) {
        let mut lifecycle = self.lock();
        lifecycle.teardown = None;
        if lifecycle.observers == 0 {
            if let Some(task) = lifecycle.upstream.take() {
                log::debug!("stopping idle shared state subscription");
                task.abort();
            }
        }
    }
}

impl<T: Send + Sync + 'static> Inner<T> {
    fn release(self: &Arc<Self>) {
        let mut lifecycle = self.lock();
        lifecycle.observers = lifecycle.observers.saturating_sub(1);
        if lifecycle.observers > 0 {
            return;
        }

        let owner = Arc::downgrade(self);
        let grace = self.grace;
        lifecycle.teardown = Some(self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(inner) = owner.upgrade() {
                inner.stop_if_unobserved();
            }
        }));
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for task in [lifecycle.upstream.take(), lifecycle.teardown.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

async fn pump<T: Send + Sync + 'static>(owner: Weak<Inner<T>>, mut query: LiveQuery<T>) {
    let mut next = query.current().await;
    loop {
        match next {
            Ok(value) => {
                let Some(inner) = owner.upgrade() else {
                    return;
                };
                inner.cell.send_replace(value);
            }
            Err(e) => log::warn!("shared state refresh failed: {e}"),
        }
        next = query.changed().await;
    }
}

/// A registered observer of a [`SharedState`]. Dropping it unregisters.
pub struct StateObserver<T: Send + Sync + 'static> {
    receiver: watch::Receiver<T>,
    owner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + 'static> StateObserver<T> {
    /// The latest published value.
    pub fn value(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits for the next published value.
    ///
    /// Returns `None` if the cell can no longer change.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl<T: Send + Sync + 'static> Drop for StateObserver<T> {
    fn drop(&mut self) {
        self.owner.release();
    }
}
