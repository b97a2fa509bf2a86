//! Snapshot cells and the published dashboard view.
//!
//! The monitor keeps exactly four pieces of shared state: the latest
//! [`Reading`], [`ThresholdConfig`], [`MediaRecord`] and [`ServerStatus`].
//! Each lives in its own [`SnapshotCell`] and is replaced wholesale.
//!
//! # Ordering
//!
//! Every fetch is stamped with a sequence number from [`SharedState::next_seq`]
//! *before* it is issued. A cell only accepts a value whose sequence is newer
//! than the one it holds, so a slow response can never overwrite a newer one
//! that completed first. Sources are independent: a fresh reading next to a
//! media record from an older cycle is a valid state.
//!
//! # Cancellation
//!
//! Once the state is deactivated (the poller was stopped) every further
//! update is dropped, including responses that were already in flight.
//!
//! # Publication
//!
//! After any update is applied the view is re-derived with
//! [`reconcile`](crate::view::reconcile) and published on a `watch` channel.
//! Updates from one poll cycle are applied and published together.
//!
//! The locks here are never held across an `.await`, so `std::sync::RwLock`
//! is used and the whole API is synchronous.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use firewatch_types::{MediaRecord, Reading, ServerStatus, ThresholdConfig};

use crate::events::{DEFAULT_EVENT_CAPACITY, EventDispatcher, Source};
use crate::view::{DashboardView, reconcile};

/// Latest value of one source, tagged with the sequence it was issued under.
#[derive(Debug, Clone)]
pub struct SnapshotCell<T> {
    value: Option<T>,
    seq: u64,
    updated_at: Option<OffsetDateTime>,
}

impl<T> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self {
            value: None,
            seq: 0,
            updated_at: None,
        }
    }
}

impl<T> SnapshotCell<T> {
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Sequence of the value currently held (0 if never set).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        self.updated_at
    }

    /// Replace the value if `seq` is newer than the current one.
    ///
    /// Returns `false` (and leaves the cell untouched) for a stale value.
    pub fn apply(&mut self, seq: u64, value: T) -> bool {
        if seq <= self.seq {
            return false;
        }
        self.value = Some(value);
        self.seq = seq;
        self.updated_at = Some(OffsetDateTime::now_utc());
        true
    }
}

/// A new value for one of the snapshot cells.
#[derive(Debug, Clone)]
pub enum SnapshotUpdate {
    Reading(Reading),
    Thresholds(ThresholdConfig),
    Media(MediaRecord),
    Status(ServerStatus),
}

impl SnapshotUpdate {
    pub fn source(&self) -> Source {
        match self {
            SnapshotUpdate::Reading(_) => Source::Readings,
            SnapshotUpdate::Thresholds(_) => Source::Thresholds,
            SnapshotUpdate::Media(_) => Source::Media,
            SnapshotUpdate::Status(_) => Source::Status,
        }
    }
}

/// The result of one fetch, ready to be applied.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub source: Source,
    pub seq: u64,
    /// Value to store: the response, or the fallback on failure.
    pub update: Option<SnapshotUpdate>,
    /// Error text if the fetch failed.
    pub error: Option<String>,
}

impl FetchOutcome {
    /// A successful fetch.
    pub fn success(seq: u64, update: SnapshotUpdate) -> Self {
        Self {
            source: update.source(),
            seq,
            update: Some(update),
            error: None,
        }
    }

    /// A failed fetch replaced by `fallback`.
    pub fn fallback(seq: u64, fallback: SnapshotUpdate, error: impl Into<String>) -> Self {
        Self {
            source: fallback.source(),
            seq,
            update: Some(fallback),
            error: Some(error.into()),
        }
    }

    /// A failed fetch that leaves its cell unchanged.
    pub fn failed(source: Source, seq: u64, error: impl Into<String>) -> Self {
        Self {
            source,
            seq,
            update: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// What happened to a [`FetchOutcome`] handed to [`SharedState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// The cell was replaced.
    Applied,
    /// A newer value was already present; discarded.
    Stale,
    /// Nothing to store (failed fetch without fallback).
    Unchanged,
    /// The state was deactivated; discarded.
    Inactive,
}

/// Fetch statistics for a single source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    pub success_count: u64,
    pub failure_count: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_success_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_error_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
}

impl SourceStats {
    fn record(&mut self, error: Option<&str>) {
        let now = OffsetDateTime::now_utc();
        match error {
            None => {
                self.success_count += 1;
                self.last_success_at = Some(now);
            }
            Some(error) => {
                self.failure_count += 1;
                self.last_error_at = Some(now);
                self.last_error = Some(error.to_string());
            }
        }
    }
}

#[derive(Debug, Default)]
struct Snapshots {
    reading: SnapshotCell<Reading>,
    thresholds: SnapshotCell<ThresholdConfig>,
    media: SnapshotCell<MediaRecord>,
    status: SnapshotCell<ServerStatus>,
    stats: HashMap<Source, SourceStats>,
}

impl Snapshots {
    fn store(&mut self, seq: u64, update: SnapshotUpdate) -> bool {
        match update {
            SnapshotUpdate::Reading(v) => self.reading.apply(seq, v),
            SnapshotUpdate::Thresholds(v) => self.thresholds.apply(seq, v),
            SnapshotUpdate::Media(v) => self.media.apply(seq, v),
            SnapshotUpdate::Status(v) => self.status.apply(seq, v),
        }
    }

    fn seq(&self, source: Source) -> u64 {
        match source {
            Source::Readings => self.reading.seq(),
            Source::Thresholds => self.thresholds.seq(),
            Source::Media => self.media.seq(),
            Source::Status => self.status.seq(),
        }
    }

    fn view(&self, base_origin: &str) -> DashboardView {
        reconcile(
            self.reading.get(),
            self.thresholds.get(),
            self.media.get(),
            self.status.get(),
            base_origin,
        )
    }
}

/// State shared by the poller, edit sessions and presentation.
pub struct SharedState {
    cells: RwLock<Snapshots>,
    next_seq: AtomicU64,
    base_origin: String,
    view_tx: watch::Sender<DashboardView>,
    events: EventDispatcher,
    cancel: CancellationToken,
}

impl SharedState {
    /// Create new state. Relative media URLs resolve against `base_origin`.
    pub fn new(base_origin: impl Into<String>) -> Arc<Self> {
        Self::with_event_capacity(base_origin, DEFAULT_EVENT_CAPACITY)
    }

    /// Create new state with a custom event channel capacity.
    pub fn with_event_capacity(base_origin: impl Into<String>, capacity: usize) -> Arc<Self> {
        let base_origin = base_origin.into();
        let snapshots = Snapshots::default();
        let (view_tx, _) = watch::channel(snapshots.view(&base_origin));
        Arc::new(Self {
            cells: RwLock::new(snapshots),
            next_seq: AtomicU64::new(0),
            base_origin,
            view_tx,
            events: EventDispatcher::new(capacity.max(1)),
            cancel: CancellationToken::new(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshots> {
        self.cells.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshots> {
        self.cells.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue the next sequence number. Call before starting a fetch.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn base_origin(&self) -> &str {
        &self.base_origin
    }

    /// Returns `true` until [`deactivate`](Self::deactivate) is called.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop accepting updates. Irreversible.
    pub fn deactivate(&self) {
        self.cancel.cancel();
    }

    /// Token cancelled on deactivation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Subscribe to view changes.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view_tx.subscribe()
    }

    /// The current view.
    pub fn view(&self) -> DashboardView {
        self.view_tx.borrow().clone()
    }

    /// Last confirmed thresholds, or the embedded default.
    pub fn thresholds(&self) -> ThresholdConfig {
        self.read().thresholds.get().copied().unwrap_or_default()
    }

    /// Returns `true` once the backend has confirmed a threshold value.
    pub fn thresholds_confirmed(&self) -> bool {
        self.read().thresholds.get().is_some()
    }

    /// Sequence currently held by a source's cell.
    pub fn cell_seq(&self, source: Source) -> u64 {
        self.read().seq(source)
    }

    pub fn stats(&self, source: Source) -> SourceStats {
        self.read().stats.get(&source).cloned().unwrap_or_default()
    }

    /// Apply a single fetch outcome.
    pub fn apply(&self, outcome: FetchOutcome) -> ApplyOutcome {
        self.apply_all(vec![outcome])
            .into_iter()
            .next()
            .unwrap_or(ApplyOutcome::Unchanged)
    }

    /// Apply several outcomes together, publishing the view at most once.
    pub fn apply_all(&self, outcomes: Vec<FetchOutcome>) -> Vec<ApplyOutcome> {
        let mut cells = self.write();

        // Checked under the lock so nothing lands after deactivate() returns.
        if !self.is_active() {
            debug!("Discarding {} update(s) after stop", outcomes.len());
            return vec![ApplyOutcome::Inactive; outcomes.len()];
        }

        let mut changed = false;
        let results = outcomes
            .into_iter()
            .map(|outcome| {
                cells
                    .stats
                    .entry(outcome.source)
                    .or_default()
                    .record(outcome.error.as_deref());

                match outcome.update {
                    None => ApplyOutcome::Unchanged,
                    Some(update) => {
                        if cells.store(outcome.seq, update) {
                            changed = true;
                            ApplyOutcome::Applied
                        } else {
                            debug!(
                                "Discarding stale {} response (seq {} <= {})",
                                outcome.source,
                                outcome.seq,
                                cells.seq(outcome.source)
                            );
                            ApplyOutcome::Stale
                        }
                    }
                }
            })
            .collect();

        if changed {
            self.view_tx.send_replace(cells.view(&self.base_origin));
        }

        results
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("base_origin", &self.base_origin)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
