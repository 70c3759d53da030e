//! Query coordinator: one cache entry per key, de-duplicated fetches,
//! stale-while-revalidate and last-request-wins ordering.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    future::Future,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Identifier of a cached remote collection, e.g. `"students"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Key from any string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Read-only snapshot of one key's cache state.
#[derive(Debug)]
pub struct CacheEntry<T> {
    /// Last successful value; survives later failures and revalidation.
    pub value: Option<Arc<T>>,
    /// A request for the key is in flight.
    pub is_loading: bool,
    /// Error of the latest request, cleared by the next success.
    pub error: Option<ApiError>,
    /// When `value` was stored.
    pub fetched_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn empty() -> Self {
        Self {
            value: None,
            is_loading: false,
            error: None,
            fetched_at: None,
        }
    }
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, ApiError>>>;

#[derive(Default)]
struct Slot {
    value: Option<AnyValue>,
    error: Option<ApiError>,
    fetched_at: Option<Instant>,
    stale: bool,
    /// Generation of the newest request issued for this key.
    issued: u64,
    /// Generation of the newest response stored; older ones are dropped.
    applied: u64,
    /// Only the newest issued request; attaching callers share it.
    in_flight: Option<(u64, SharedFetch)>,
}

impl Slot {
    fn is_fresh(&self) -> bool {
        self.value.is_some() && self.error.is_none() && !self.stale
    }

    fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> CacheEntry<T> {
        let (value, type_error) = match self.value.clone().map(Arc::downcast::<T>) {
            Some(Ok(value)) => (Some(value), None),
            Some(Err(_)) => {
                warn!(%key, "cached value has a different type than requested");
                (None, Some(ApiError::Internal(format!("query `{key}` holds another type"))))
            },
            None => (None, None),
        };
        CacheEntry {
            value,
            is_loading: self.in_flight.is_some(),
            error: type_error.or_else(|| self.error.clone()),
            fetched_at: self.fetched_at,
        }
    }
}

/// Owns every [`CacheEntry`]. Clones share the same cache.
#[derive(Clone, Default)]
pub struct QueryClient {
    slots: Arc<Mutex<HashMap<QueryKey, Slot>>>,
}

impl QueryClient {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `key`, running `fetch_fn` only when nothing usable exists.
    ///
    /// A fresh cached value is returned without a request. While a request
    /// for `key` is in flight, callers attach to it instead of issuing
    /// another. Stale or failed entries re-run `fetch_fn`; the previous value
    /// stays readable through [`QueryClient::peek`] until the new one lands.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetch_fn: F) -> CacheEntry<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.clone()).or_default();
            let attached = match &slot.in_flight {
                Some((generation, pending)) if !slot.stale => {
                    debug!(%key, generation, "attaching to in-flight fetch");
                    Some(pending.clone())
                },
                _ => None,
            };
            match attached {
                Some(pending) => pending,
                None if slot.is_fresh() => return slot.snapshot(key),
                None => self.issue(key, slot, fetch_fn),
            }
        };

        // The spawned request stores its own outcome; waiting only orders us
        // after it.
        let _ = pending.await;
        self.peek(key)
    }

    /// Invalidates `key` and fetches it again.
    pub async fn refetch<T, F, Fut>(&self, key: &QueryKey, fetch_fn: F) -> CacheEntry<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.invalidate(key);
        self.fetch(key, fetch_fn).await
    }

    /// Marks `key` stale so the next [`QueryClient::fetch`] re-runs. Unknown
    /// keys are ignored.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(slot) = self.slots.lock().get_mut(key) {
            debug!(%key, "query invalidated");
            slot.stale = true;
        }
    }

    /// Current state of `key` without fetching. A value of another type reads as an [`ApiError::Internal`].
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> CacheEntry<T> {
        self.slots
            .lock()
            .get(key)
            .map(|slot| slot.snapshot(key))
            .unwrap_or_else(CacheEntry::empty)
    }

    /// Whether `key` was invalidated since its last fetch.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.slots.lock().get(key).is_some_and(|slot| slot.stale)
    }

    /// Whether a request for `key` is in flight.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Drops every entry, e.g. when the signed-in user changes.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    fn issue<T, F, Fut>(&self, key: &QueryKey, slot: &mut Slot, fetch_fn: F) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        slot.issued += 1;
        slot.stale = false;
        let generation = slot.issued;
        debug!(%key, generation, "issuing fetch");

        let slots = Arc::clone(&self.slots);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { fetch_fn().await })
                .catch_unwind()
                .await;
            let result = match outcome {
                Ok(result) => result.map(|value| Arc::new(value) as AnyValue),
                Err(_) => Err(ApiError::Internal(format!("fetch for `{task_key}` panicked"))),
            };
            store_result(&slots, &task_key, generation, &result);
            result
        });

        let pending = task
            .map(|joined| {
                joined.unwrap_or_else(|err| Err(ApiError::Internal(err.to_string())))
            })
            .boxed()
            .shared();
        slot.in_flight = Some((generation, pending.clone()));
        pending
    }
}

fn store_result(
    slots: &Mutex<HashMap<QueryKey, Slot>>,
    key: &QueryKey,
    generation: u64,
    result: &Result<AnyValue, ApiError>,
) {
    let mut slots = slots.lock();
    let Some(slot) = slots.get_mut(key) else {
        return;
    };
    if slot
        .in_flight
        .as_ref()
        .is_some_and(|(in_flight, _)| *in_flight == generation)
    {
        slot.in_flight = None;
    }
    if generation < slot.applied {
        debug!(%key, generation, applied = slot.applied, "discarding out-of-order response");
        return;
    }
    slot.applied = generation;
    match result {
        Ok(value) => {
            slot.value = Some(Arc::clone(value));
            slot.error = None;
            slot.fetched_at = Some(Instant::now());
        },
        Err(err) => {
            warn!(%key, generation, error = %err, "fetch failed");
            slot.error = Some(err.clone());
        },
    }
}
