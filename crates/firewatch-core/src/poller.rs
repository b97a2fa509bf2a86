//! Periodic polling of the backend.
//!
//! The [`Poller`] keeps the shared snapshots fresh. Readings, media and
//! status are fetched together on every cycle; thresholds are fetched once
//! at startup and afterwards only change through an edit session.
//!
//! A failed fetch never aborts the cycle: the source's fallback value is
//! substituted, a warning is logged and the other sources proceed. There is
//! no retry or backoff, the next tick simply tries again.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use firewatch_core::{HttpGateway, Poller, PollerOptions, SharedState};
//!
//! # async fn example() -> firewatch_core::Result<()> {
//! let gateway = HttpGateway::new("http://localhost:8000")?;
//! let state = SharedState::new("http://localhost:8000");
//!
//! let options = PollerOptions::builder()
//!     .poll_interval(Duration::from_secs(5))
//!     .build();
//!
//! let handle = Poller::new(gateway, state.clone()).start(options)?;
//! let mut view = state.subscribe();
//! view.changed().await.ok();
//! handle.stop();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use firewatch_types::{MediaRecord, Reading, ServerStatus};

use crate::error::{Error, Result};
use crate::events::{MonitorEvent, Source};
use crate::state::{ApplyOutcome, FetchOutcome, SharedState, SnapshotUpdate};
use crate::traits::{Gateway, GatewayResult};

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Options for the poller.
///
/// ```
/// use std::time::Duration;
/// use firewatch_core::PollerOptions;
///
/// let options = PollerOptions::builder()
///     .poll_interval(Duration::from_secs(1))
///     .fetch_thresholds(false)
///     .build();
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PollerOptions {
    /// Time between the starts of consecutive cycles.
    /// Default: 3 seconds.
    pub poll_interval: Duration,
    /// Whether to run the one-shot threshold fetch on start.
    /// Default: true.
    pub fetch_thresholds: bool,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_thresholds: true,
        }
    }
}

impl PollerOptions {
    /// Create a new builder for PollerOptions.
    pub fn builder() -> PollerOptionsBuilder {
        PollerOptionsBuilder::default()
    }

    /// Create options with a specific poll interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            poll_interval: interval,
            ..Default::default()
        }
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::invalid_config("poll_interval must be > 0"));
        }
        Ok(())
    }
}

/// Builder for PollerOptions.
#[derive(Debug, Clone, Default)]
pub struct PollerOptionsBuilder {
    options: PollerOptions,
}

impl PollerOptionsBuilder {
    /// Set the polling interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Set whether thresholds are fetched on start.
    #[must_use]
    pub fn fetch_thresholds(mut self, fetch: bool) -> Self {
        self.options.fetch_thresholds = fetch;
        self
    }

    /// Build the PollerOptions.
    #[must_use]
    pub fn build(self) -> PollerOptions {
        self.options
    }
}

/// Result of one source within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    /// The fetch succeeded (otherwise the fallback was used).
    pub ok: bool,
    pub outcome: ApplyOutcome,
}

/// Summary of one `refresh_all` cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub readings: SourceReport,
    pub media: SourceReport,
    pub status: SourceReport,
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
}

impl CycleReport {
    /// Returns `true` if every fetch in the cycle succeeded.
    pub fn all_ok(&self) -> bool {
        self.failed_sources().is_empty()
    }

    /// Sources whose fetch failed this cycle.
    pub fn failed_sources(&self) -> Vec<Source> {
        self.entries()
            .into_iter()
            .filter(|(_, r)| !r.ok)
            .map(|(s, _)| s)
            .collect()
    }

    /// Returns `true` if the results were discarded because the poller stopped.
    pub fn was_discarded(&self) -> bool {
        self.entries()
            .iter()
            .all(|(_, r)| r.outcome == ApplyOutcome::Inactive)
    }

    fn entries(&self) -> [(Source, SourceReport); 3] {
        [
            (Source::Readings, self.readings),
            (Source::Media, self.media),
            (Source::Status, self.status),
        ]
    }
}

/// Fetches snapshots from a [`Gateway`] into [`SharedState`].
pub struct Poller<G> {
    gateway: Arc<G>,
    state: Arc<SharedState>,
}

impl<G> Clone for Poller<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
        }
    }
}

fn outcome<T>(
    seq: u64,
    result: GatewayResult<T>,
    wrap: fn(T) -> SnapshotUpdate,
    fallback: impl FnOnce() -> T,
) -> FetchOutcome {
    match result {
        Ok(value) => FetchOutcome::success(seq, wrap(value)),
        Err(e) => {
            let fallback = wrap(fallback());
            warn!("Failed to fetch {}, using fallback: {}", fallback.source(), e);
            FetchOutcome::fallback(seq, fallback, e.to_string())
        }
    }
}

impl<G: Gateway + 'static> Poller<G> {
    /// Create a new poller.
    pub fn new(gateway: G, state: Arc<SharedState>) -> Self {
        Self::from_arc(Arc::new(gateway), state)
    }

    /// Create a poller sharing an existing gateway.
    pub fn from_arc(gateway: Arc<G>, state: Arc<SharedState>) -> Self {
        Self { gateway, state }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Fetch readings, media and status concurrently and apply the results.
    ///
    /// Never fails: each failed fetch is replaced by its fallback.
    pub async fn refresh_all(&self) -> CycleReport {
        let readings_seq = self.state.next_seq();
        let media_seq = self.state.next_seq();
        let status_seq = self.state.next_seq();

        let (readings, media, status) = tokio::join!(
            self.gateway.fetch_readings(),
            self.gateway.fetch_latest_media(),
            self.gateway.fetch_status(),
        );

        let outcomes = vec![
            outcome(readings_seq, readings, SnapshotUpdate::Reading, Reading::fallback),
            outcome(media_seq, media, SnapshotUpdate::Media, MediaRecord::fallback),
            outcome(status_seq, status, SnapshotUpdate::Status, ServerStatus::default),
        ];
        let failures: Vec<(Source, String)> = outcomes
            .iter()
            .filter_map(|o| o.error.clone().map(|e| (o.source, e)))
            .collect();
        let ok: Vec<bool> = outcomes.iter().map(FetchOutcome::is_success).collect();

        let applied = self.state.apply_all(outcomes);
        let report = CycleReport {
            readings: SourceReport { ok: ok[0], outcome: applied[0] },
            media: SourceReport { ok: ok[1], outcome: applied[1] },
            status: SourceReport { ok: ok[2], outcome: applied[2] },
            completed_at: OffsetDateTime::now_utc(),
        };

        if report.was_discarded() {
            debug!("Poll cycle finished after stop, results discarded");
            return report;
        }

        let events = self.state.events();
        for (source, error) in failures {
            events.send(MonitorEvent::SourceFailed { source, error });
        }
        debug!(
            "Poll cycle complete ({} of 3 sources ok)",
            3 - report.failed_sources().len()
        );
        events.send(MonitorEvent::CycleCompleted {
            report: report.clone(),
        });

        report
    }

    /// Fetch thresholds once.
    ///
    /// On failure the current thresholds (or the embedded default) stay in place.
    pub async fn refresh_thresholds(&self) -> ApplyOutcome {
        let seq = self.state.next_seq();

        match self.gateway.fetch_thresholds().await {
            Ok(thresholds) => {
                let applied = self
                    .state
                    .apply(FetchOutcome::success(seq, SnapshotUpdate::Thresholds(thresholds)));
                if applied == ApplyOutcome::Applied {
                    info!(
                        "Loaded thresholds: temperature_max={}, gas_max={}",
                        thresholds.temperature_max, thresholds.gas_max
                    );
                    self.state
                        .events()
                        .send(MonitorEvent::ThresholdsLoaded { thresholds });
                }
                applied
            }
            Err(e) => {
                let kept = self.state.thresholds();
                warn!(
                    "Failed to fetch thresholds, keeping temperature_max={}, gas_max={}: {}",
                    kept.temperature_max, kept.gas_max, e
                );
                let error = e.to_string();
                let applied = self
                    .state
                    .apply(FetchOutcome::failed(Source::Thresholds, seq, error.clone()));
                if applied != ApplyOutcome::Inactive {
                    self.state.events().send(MonitorEvent::SourceFailed {
                        source: Source::Thresholds,
                        error,
                    });
                }
                applied
            }
        }
    }

    /// Start polling in the background.
    ///
    /// The first cycle runs immediately. Cycles never overlap: a cycle that
    /// outlasts the interval delays the next tick instead of stacking up.
    pub fn start(self, options: PollerOptions) -> Result<PollerHandle> {
        options.validate()?;
        if !self.state.is_active() {
            return Err(Error::invalid_state("start poller", "stopped"));
        }

        let token = self.state.cancellation_token();
        info!(
            "Starting poller (interval {:?}, origin {})",
            options.poll_interval,
            self.state.base_origin()
        );

        let thresholds = options.fetch_thresholds.then(|| {
            let poller = self.clone();
            let token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => debug!("Threshold fetch cancelled"),
                    _ = poller.refresh_thresholds() => {}
                }
            })
        });

        let state = Arc::clone(&self.state);
        let poller = self;
        let task_token = token.clone();
        let cycle = tokio::spawn(async move {
            let mut ticker = interval(options.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Poller cancelled, stopping gracefully");
                        break;
                    }
                    _ = ticker.tick() => {
                        // An in-flight cycle is allowed to finish; its results
                        // are discarded by the state once stopped.
                        poller.refresh_all().await;
                    }
                }
            }

            poller.state.events().send(MonitorEvent::Stopped);
        });

        Ok(PollerHandle {
            cycle,
            thresholds,
            cancel_token: token,
            state,
        })
    }
}

/// Handle to a running poller.
///
/// Dropping the handle stops the poller.
pub struct PollerHandle {
    cycle: JoinHandle<()>,
    thresholds: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
    state: Arc<SharedState>,
}

impl PollerHandle {
    /// Stop polling.
    ///
    /// Cancels the timer and the pending threshold fetch. Responses still in
    /// flight are discarded; nothing is applied to the state afterwards.
    pub fn stop(&self) {
        if self.state.is_active() {
            info!("Stopping poller");
        }
        self.state.deactivate();
    }

    /// Stop polling and wait for the background tasks to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        let _ = (&mut self.cycle).await;
        if let Some(thresholds) = self.thresholds.take() {
            let _ = thresholds.await;
        }
    }

    /// Get a cancellation token that stops the poller when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Check if the polling task is still running.
    pub fn is_active(&self) -> bool {
        !self.cycle.is_finished()
    }

    /// Check if the poller has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.state.deactivate();
    }
}
