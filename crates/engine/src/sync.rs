use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use clinicsched_core::{ScheduleError, ScheduleResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The value a row held before an optimistic toggle, captured so a failed
/// toggle restores exactly that value rather than flipping again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSnapshot<K> {
    pub key: K,
    pub original: bool,
    /// Sync generation the toggle started from. A revert is skipped once a
    /// newer load has replaced the collection.
    pub generation: u64,
}

/// Freshness and in-flight bookkeeping for one collection.
#[derive(Debug)]
pub(crate) struct SyncTracker<K> {
    generation: u64,
    stale: bool,
    last_synced_at: Option<DateTime<Utc>>,
    in_flight: HashSet<K>,
    cancel: CancellationToken,
}

impl<K> Default for SyncTracker<K> {
    fn default() -> Self {
        Self {
            generation: 0,
            stale: false,
            last_synced_at: None,
            in_flight: HashSet::new(),
            cancel: CancellationToken::new(),
        }
    }
}

impl<K> SyncTracker<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Bumped every time a fetched collection replaces the local one.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.generation += 1;
        self.stale = false;
        self.last_synced_at = Some(Utc::now());
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Claims `key` for one gateway call. Only one call per row may be in flight.
    pub(crate) fn begin_request(&mut self, key: &K) -> ScheduleResult<CancellationToken> {
        if !self.in_flight.insert(key.clone()) {
            return Err(ScheduleError::EditConflict(format!(
                "a request for {:?} is already in flight",
                key
            )));
        }
        Ok(self.cancel.child_token())
    }

    pub(crate) fn end_request(&mut self, key: &K) {
        self.in_flight.remove(key);
    }

    pub(crate) fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains(key)
    }

    /// Fails while a request for `key` is outstanding; its draft must not
    /// change under a save that has already been sent.
    pub(crate) fn ensure_idle(&self, key: &K) -> ScheduleResult<()> {
        if self.is_in_flight(key) {
            return Err(ScheduleError::EditConflict(format!(
                "{:?} has a request in flight",
                key
            )));
        }
        Ok(())
    }

    /// Token for calls that are not tied to a row, such as loads.
    pub(crate) fn token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub(crate) fn cancel_all(&mut self) {
        if !self.in_flight.is_empty() {
            debug!("cancelling requests for {:?}", self.in_flight);
        }
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
    }
}
