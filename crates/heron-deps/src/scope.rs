//! Request-scoped cleanup.
//!
//! Dependencies that acquire resources register cleanup actions on the
//! [`RequestScope`]. The scope runs them exactly once, in reverse order of
//! registration, when the request ends:
//!
//! - [`RequestScope::close`] runs them explicitly with the request outcome.
//! - If the scope is dropped without being closed (the request future was
//!   cancelled or timed out), the remaining actions run from `Drop` with
//!   [`ScopeOutcome::Failed`]. Synchronous actions run inline; if any action
//!   is asynchronous, all of them run on a task spawned on the current tokio
//!   runtime so that the reverse order is kept.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// How the request ended, as seen by cleanup actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOutcome {
    /// A response was produced from the handler's return value.
    Completed,
    /// Validation, a domain error, a fault, or cancellation ended the request.
    Failed,
}

enum Action {
    Sync(Box<dyn FnOnce(ScopeOutcome) + Send>),
    Async(Box<dyn FnOnce(ScopeOutcome) -> BoxFuture<'static, ()> + Send>),
}

struct Cleanup {
    label: String,
    action: Action,
}

impl Cleanup {
    async fn run(self, outcome: ScopeOutcome) {
        tracing::debug!(cleanup = %self.label, ?outcome, "Running scope cleanup");
        match self.action {
            Action::Sync(f) => f(outcome),
            Action::Async(f) => f(outcome).await,
        }
    }
}

#[derive(Default)]
struct ScopeInner {
    cleanups: Mutex<Vec<Cleanup>>,
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let pending = std::mem::take(self.cleanups.get_mut());
        if pending.is_empty() {
            return;
        }
        tracing::debug!(pending = pending.len(), "Request scope dropped before close");

        if pending.iter().all(|c| matches!(c.action, Action::Sync(_))) {
            for cleanup in pending.into_iter().rev() {
                if let Action::Sync(f) = cleanup.action {
                    f(ScopeOutcome::Failed);
                }
            }
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run_reversed(pending, ScopeOutcome::Failed));
            }
            Err(_) => {
                for cleanup in pending.into_iter().rev() {
                    match cleanup.action {
                        Action::Sync(f) => f(ScopeOutcome::Failed),
                        Action::Async(_) => tracing::warn!(
                            cleanup = %cleanup.label,
                            "No async runtime available; skipping async cleanup"
                        ),
                    }
                }
            }
        }
    }
}

async fn run_reversed(cleanups: Vec<Cleanup>, outcome: ScopeOutcome) {
    for cleanup in cleanups.into_iter().rev() {
        cleanup.run(outcome).await;
    }
}

/// Cleanup stack for one request. Cloning shares the same stack.
///
/// # Example
///
/// ```
/// use heron_deps::{RequestScope, ScopeOutcome};
/// use std::sync::{Arc, Mutex};
///
/// # tokio_test::block_on(async {
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let scope = RequestScope::new();
///
/// for name in ["db", "cache"] {
///     let log = Arc::clone(&log);
///     scope.defer(name, move |_| log.lock().unwrap().push(name));
/// }
///
/// scope.close(ScopeOutcome::Completed).await;
/// assert_eq!(*log.lock().unwrap(), vec!["cache", "db"]);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct RequestScope {
    inner: Arc<ScopeInner>,
}

impl RequestScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a synchronous cleanup action.
    pub fn defer<F>(&self, label: impl Into<String>, f: F)
    where
        F: FnOnce(ScopeOutcome) + Send + 'static,
    {
        self.push(label.into(), Action::Sync(Box::new(f)));
    }

    /// Registers an asynchronous cleanup action.
    pub fn defer_async<F, Fut>(&self, label: impl Into<String>, f: F)
    where
        F: FnOnce(ScopeOutcome) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.push(
            label.into(),
            Action::Async(Box::new(move |outcome| f(outcome).boxed())),
        );
    }

    fn push(&self, label: String, action: Action) {
        self.inner.cleanups.lock().push(Cleanup { label, action });
    }

    /// Number of cleanup actions not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.cleanups.lock().len()
    }

    /// Runs all registered cleanup actions in reverse order.
    ///
    /// Calling `close` again only runs actions registered since the last call.
    pub async fn close(&self, outcome: ScopeOutcome) {
        let cleanups = std::mem::take(&mut *self.inner.cleanups.lock());
        run_reversed(cleanups, outcome).await;
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<parking_lot::Mutex<Vec<String>>>, RequestScope) {
        (Arc::new(parking_lot::Mutex::new(Vec::new())), RequestScope::new())
    }

    #[tokio::test]
    async fn test_close_runs_in_reverse_once() {
        let (log, scope) = recorder();
        for name in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            scope.defer(name, move |_| log.lock().push(name.to_string()));
        }
        assert_eq!(scope.pending(), 3);

        scope.close(ScopeOutcome::Completed).await;
        scope.close(ScopeOutcome::Completed).await;

        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
        assert_eq!(scope.pending(), 0);
    }

    #[tokio::test]
    async fn test_async_cleanup_sees_outcome() {
        let (log, scope) = recorder();
        let sink = Arc::clone(&log);
        scope.defer_async("session", move |outcome| async move {
            tokio::task::yield_now().await;
            sink.lock().push(format!("{outcome:?}"));
        });

        scope.close(ScopeOutcome::Failed).await;
        assert_eq!(*log.lock(), vec!["Failed"]);
    }

    #[test]
    fn test_drop_runs_sync_cleanups() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let scope = RequestScope::new();
            let clone = scope.clone();
            let counter = Arc::clone(&calls);
            clone.defer("count", move |outcome| {
                assert_eq!(outcome, ScopeOutcome::Failed);
                counter.fetch_add(1, Ordering::SeqCst);
            });
            drop(clone);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_spawns_mixed_cleanups_in_order() {
        let (log, scope) = recorder();
        let first = Arc::clone(&log);
        scope.defer("first", move |_| first.lock().push("first".into()));
        let second = Arc::clone(&log);
        scope.defer_async("second", move |_| async move {
            second.lock().push("second".into());
        });
        drop(scope);

        for _ in 0..10 {
            if log.lock().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(*log.lock(), vec!["second", "first"]);
    }
}
