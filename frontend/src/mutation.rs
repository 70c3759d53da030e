//! Write operations with exactly-once success/error callbacks.

use std::{
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use futures::{future::BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::error::ApiError;

type WriteFn<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, ApiError>> + Send + Sync>;

/// Runs one write per call. It never retries, never merges concurrent calls
/// and never touches the query cache; callers invalidate what they changed.
pub struct MutationRunner<I, O> {
    name: &'static str,
    write: WriteFn<I, O>,
    in_flight: Arc<AtomicUsize>,
}

impl<I, O> Clone for MutationRunner<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            write: Arc::clone(&self.write),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<I, O> MutationRunner<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Runner around `write`; `name` labels its log lines.
    pub fn new<F, Fut>(name: &'static str, write: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
    {
        Self {
            name,
            write: Arc::new(move |input| write(input).boxed()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while at least one call is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Calls the write once. A panic inside the write, whether raised before
    /// its future exists or while it runs, comes back as
    /// [`ApiError::Internal`].
    pub async fn mutate(&self, input: I) -> Result<O, ApiError> {
        let _guard = InFlight::enter(&self.in_flight);
        let write = Arc::clone(&self.write);
        debug!(mutation = self.name, "mutation started");
        let outcome = AssertUnwindSafe(async move { write(input).await })
            .catch_unwind()
            .await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(mutation = self.name, "mutation panicked");
                Err(ApiError::Internal(format!("{} panicked", self.name)))
            },
        }
    }

    /// Calls the write once, then exactly one of `on_success` / `on_error`.
    pub async fn run<S, E>(&self, input: I, on_success: S, on_error: E)
    where
        S: FnOnce(O),
        E: FnOnce(ApiError),
    {
        match self.mutate(input).await {
            Ok(output) => {
                debug!(mutation = self.name, "mutation succeeded");
                on_success(output)
            },
            Err(err) => {
                warn!(mutation = self.name, error = %err, "mutation failed");
                on_error(err)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, time::Duration};

    use super::*;

    #[tokio::test]
    async fn failing_write_fires_only_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = MutationRunner::new("create", {
            let calls = Arc::clone(&calls);
            move |_: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(ApiError::Server {
                    status: 400,
                    message: "name is required".to_string(),
                }) }
            }
        });
        let successes = Cell::new(0);
        let errors = Cell::new(0);

        runner
            .run(1, |_| successes.set(successes.get() + 1), |_| errors.set(errors.get() + 1))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(successes.get(), 0);
        assert_eq!(errors.get(), 1);
        assert!(!runner.is_loading());
    }

    #[tokio::test]
    async fn synchronous_panic_still_reports_error() {
        let runner: MutationRunner<u32, u32> = MutationRunner::new("update", |id: u32| {
            if id == 0 {
                panic!("id must be positive");
            }
            async move { Ok(id) }
        });
        let seen = Cell::new(None);

        runner.run(0, |_| seen.set(Some(true)), |_| seen.set(Some(false))).await;

        assert_eq!(seen.get(), Some(false));
        assert!(!runner.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_runs_are_not_merged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = MutationRunner::new("delete", {
            let calls = Arc::clone(&calls);
            move |id: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, ApiError>(id)
                }
            }
        });

        let observer = runner.clone();
        let (a, b, loading) = tokio::join!(runner.mutate(7), runner.mutate(7), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            observer.is_loading()
        });

        assert_eq!(a, Ok(7));
        assert_eq!(b, Ok(7));
        assert!(loading);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!runner.is_loading());
    }
}
