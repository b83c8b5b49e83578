use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_LOOKUP_TIMEOUT_SECS};
use crate::error::BackendError;

/// Limits for concurrent backend lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    pub concurrency: usize,
    /// Applies to each lookup individually, measured once it holds a permit.
    pub lookup_timeout: Duration,
}

impl Default for FanOut {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        }
    }
}

/// Outcome of one lookup.
#[derive(Debug)]
pub(crate) enum Lookup<T> {
    Done(T),
    Failed(BackendError),
    TimedOut,
    Aborted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailureKind {
    Backend,
    TimedOut,
    Aborted,
}

impl<T> Lookup<T> {
    /// Splits into the value or a failure description.
    pub(crate) fn into_result(self) -> Result<T, (LookupFailureKind, Option<String>)> {
        match self {
            Lookup::Done(v) => Ok(v),
            Lookup::Failed(e) => Err((LookupFailureKind::Backend, Some(e.to_string()))),
            Lookup::TimedOut => Err((LookupFailureKind::TimedOut, None)),
            Lookup::Aborted(reason) => Err((LookupFailureKind::Aborted, Some(reason))),
        }
    }
}

/// Runs `lookup` for every key with at most `fan_out.concurrency` in flight.
///
/// Results come back in completion order. All lookups run on a [`JoinSet`],
/// so dropping the returned future aborts whatever is still pending and no
/// partial result is observable.
pub(crate) async fn run_bounded<K, T, F, Fut>(
    keys: Vec<K>,
    fan_out: &FanOut,
    lookup: F,
) -> Vec<(K, Lookup<T>)>
where
    K: Clone + Send + 'static,
    T: Send + 'static,
    F: Fn(&K) -> Fut,
    Fut: Future<Output = Result<T, BackendError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(fan_out.concurrency.max(1)));
    let timeout = fan_out.lookup_timeout;

    let mut set = JoinSet::new();
    let mut pending = HashMap::with_capacity(keys.len());

    for key in keys {
        let fut = lookup(&key);
        let sem = semaphore.clone();
        let owned_key = key.clone();

        let handle = set.spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return (owned_key, Lookup::Aborted("semaphore closed".to_string()));
            };

            let outcome = match tokio::time::timeout(timeout, fut).await {
                Ok(Ok(value)) => Lookup::Done(value),
                Ok(Err(e)) => Lookup::Failed(e),
                Err(_) => Lookup::TimedOut,
            };
            (owned_key, outcome)
        });
        pending.insert(handle.id(), key);
    }

    let mut results = Vec::with_capacity(pending.len());
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, (key, outcome))) => {
                pending.remove(&id);
                results.push((key, outcome));
            }
            Err(e) => {
                warn!(error = %e, "Lookup task did not complete");
                if let Some(key) = pending.remove(&e.id()) {
                    results.push((key, Lookup::Aborted(e.to_string())));
                }
            }
        }
    }

    results
}
