//! Threshold edit session.
//!
//! Editing thresholds is a small state machine:
//!
//! ```text
//!            begin_edit            commit
//! Viewing ─────────────▶ Editing ─────────▶ Saving
//!    ▲                      │                 │
//!    └──────── cancel ──────┘                 │
//!    └────────────── success / failure ───────┘
//! ```
//!
//! While `Viewing`, the draft mirrors the last confirmed thresholds. Edits
//! only touch the draft; the confirmed thresholds change only when the
//! backend accepts a commit, and then take the backend's returned value.
//!
//! # Example
//!
//! ```
//! use firewatch_core::{Monitor, MockGateway, EditState};
//! use firewatch_types::ThresholdField;
//!
//! # async fn example() -> firewatch_core::Result<()> {
//! let monitor = Monitor::new(MockGateway::new());
//! let session = monitor.edit_session();
//!
//! session.begin_edit()?;
//! session.set_field(ThresholdField::GasMax, "150")?;
//! let confirmed = session.commit().await?;
//!
//! assert_eq!(confirmed.gas_max, 150.0);
//! assert_eq!(session.state(), EditState::Viewing);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use firewatch_types::{ThresholdConfig, ThresholdField, ThresholdUpdate};

use crate::error::{Error, Result};
use crate::events::{MonitorEvent, Source};
use crate::state::{ApplyOutcome, FetchOutcome, SharedState, SnapshotUpdate};
use crate::traits::Gateway;

/// State of a [`ThresholdEditSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    Viewing,
    Editing,
    Saving,
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditState::Viewing => write!(f, "viewing"),
            EditState::Editing => write!(f, "editing"),
            EditState::Saving => write!(f, "saving"),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: EditState,
    /// Present only while editing or saving.
    draft: Option<ThresholdConfig>,
}

impl Inner {
    fn require_editing(&self) -> Result<()> {
        if self.state != EditState::Editing {
            return Err(Error::invalid_state("edit thresholds", self.state));
        }
        Ok(())
    }
}

/// Resets the session to `Viewing` when a commit ends, including when the
/// commit future is dropped mid-request.
struct SavingGuard<'a> {
    inner: &'a Mutex<Inner>,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.state = EditState::Viewing;
        inner.draft = None;
    }
}

/// Edits the thresholds and commits them to the backend.
pub struct ThresholdEditSession<G> {
    gateway: Arc<G>,
    state: Arc<SharedState>,
    inner: Mutex<Inner>,
}

impl<G: Gateway> ThresholdEditSession<G> {
    /// Create a session in the `Viewing` state.
    pub fn new(gateway: Arc<G>, state: Arc<SharedState>) -> Self {
        Self {
            gateway,
            state,
            inner: Mutex::new(Inner {
                state: EditState::Viewing,
                draft: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> EditState {
        self.lock().state
    }

    pub fn is_editing(&self) -> bool {
        self.state() == EditState::Editing
    }

    /// The values shown in the inputs: the draft while editing or saving,
    /// otherwise the confirmed thresholds.
    pub fn draft(&self) -> ThresholdConfig {
        self.lock()
            .draft
            .unwrap_or_else(|| self.state.thresholds())
    }

    /// `Viewing → Editing`. The draft starts from the confirmed thresholds.
    pub fn begin_edit(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != EditState::Viewing {
            return Err(Error::invalid_state("begin editing", inner.state));
        }
        inner.state = EditState::Editing;
        inner.draft = Some(self.state.thresholds());
        debug!("Threshold edit started");
        Ok(())
    }

    /// Parse `input` and store it in the draft.
    ///
    /// Only valid while `Editing`. Input that is not a finite number leaves
    /// the field unchanged.
    pub fn set_field(&self, field: ThresholdField, input: &str) -> Result<()> {
        self.lock().require_editing()?;
        let value = field.parse_value(input)?;
        self.set_value(field, value)
    }

    /// Store an already-parsed value in the draft.
    pub fn set_value(&self, field: ThresholdField, value: f64) -> Result<()> {
        let mut inner = self.lock();
        inner.require_editing()?;
        if !value.is_finite() {
            return Err(firewatch_types::ParseError::InvalidNumber {
                field: field.as_str().to_string(),
                value: value.to_string(),
            }
            .into());
        }
        if let Some(draft) = inner.draft.as_mut() {
            draft.set(field, value);
        }
        Ok(())
    }

    /// `Editing → Viewing`, discarding the draft.
    pub fn cancel(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != EditState::Editing {
            return Err(Error::invalid_state("cancel editing", inner.state));
        }
        inner.state = EditState::Viewing;
        inner.draft = None;
        debug!("Threshold edit cancelled");
        Ok(())
    }

    /// Send the draft to the backend.
    ///
    /// On success the confirmed thresholds become the value the backend
    /// returned. On failure they are left unchanged and the draft is
    /// discarded. Either way the session ends in `Viewing` and a notification
    /// event is sent, unless the monitor has been stopped. A response also
    /// supersedes any threshold fetch issued while the commit was in flight.
    /// A commit while another is in flight fails with
    /// [`Error::CommitInFlight`] and does not affect the first one.
    pub async fn commit(&self) -> Result<ThresholdConfig> {
        let draft = {
            let mut inner = self.lock();
            match inner.state {
                EditState::Editing => {}
                EditState::Saving => return Err(Error::CommitInFlight),
                EditState::Viewing => return Err(Error::invalid_state("commit", inner.state)),
            }
            inner.state = EditState::Saving;
            inner.draft.unwrap_or_else(|| self.state.thresholds())
        };
        let _guard = SavingGuard { inner: &self.inner };

        debug!(
            "Committing thresholds: temperature_max={}, gas_max={}",
            draft.temperature_max, draft.gas_max
        );
        let result = self
            .gateway
            .update_thresholds(&ThresholdUpdate::from(draft))
            .await;

        // Sequenced on completion: the write's response supersedes any
        // threshold fetch issued while it was in flight.
        let seq = self.state.next_seq();
        match result {
            Ok(confirmed) => {
                let outcome = self
                    .state
                    .apply(FetchOutcome::success(seq, SnapshotUpdate::Thresholds(confirmed)));
                if outcome == ApplyOutcome::Applied {
                    info!(
                        "Thresholds updated: temperature_max={}, gas_max={}",
                        confirmed.temperature_max, confirmed.gas_max
                    );
                    self.state.events().send(MonitorEvent::ThresholdsUpdated {
                        thresholds: confirmed,
                    });
                } else {
                    debug!("Threshold update accepted but not applied ({:?})", outcome);
                }
                Ok(confirmed)
            }
            Err(e) => {
                warn!("Failed to update thresholds: {}", e);
                let error = e.to_string();
                let outcome = self
                    .state
                    .apply(FetchOutcome::failed(Source::Thresholds, seq, error.clone()));
                if outcome != ApplyOutcome::Inactive {
                    self.state
                        .events()
                        .send(MonitorEvent::ThresholdUpdateFailed { error });
                }
                Err(e.into())
            }
        }
    }
}

impl<G> fmt::Debug for ThresholdEditSession<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThresholdEditSession")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGateway;

    fn session(gateway: MockGateway) -> (ThresholdEditSession<MockGateway>, Arc<SharedState>) {
        let state = SharedState::new("http://h");
        (ThresholdEditSession::new(Arc::new(gateway), state.clone()), state)
    }

    #[test]
    fn test_viewing_mirrors_confirmed() {
        let (session, _) = session(MockGateway::new());
        assert_eq!(session.state(), EditState::Viewing);
        assert_eq!(session.draft(), ThresholdConfig::default());
    }

    #[test]
    fn test_set_field_requires_editing() {
        let (session, _) = session(MockGateway::new());
        let err = session
            .set_field(ThresholdField::GasMax, "100")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert_eq!(err.to_string(), "Cannot edit thresholds while viewing");
    }

    #[test]
    fn test_bad_input_while_viewing_reports_state() {
        let (session, _) = session(MockGateway::new());
        let err = session
            .set_field(ThresholdField::TemperatureMax, "hot")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[test]
    fn test_non_finite_input_leaves_field() {
        let (session, _) = session(MockGateway::new());
        session.begin_edit().unwrap();
        session.set_field(ThresholdField::TemperatureMax, "45").unwrap();

        for bad in ["NaN", "inf", "", "abc"] {
            let err = session.set_field(ThresholdField::TemperatureMax, bad);
            assert!(matches!(err, Err(Error::InvalidValue(_))));
        }
        assert!(session.set_value(ThresholdField::TemperatureMax, f64::NAN).is_err());
        assert_eq!(session.draft().temperature_max, 45.0);
    }

    #[test]
    fn test_cancel_restores_confirmed() {
        let (session, state) = session(MockGateway::new());
        let seq = state.next_seq();
        state.apply(FetchOutcome::success(
            seq,
            SnapshotUpdate::Thresholds(ThresholdConfig::new(28.0, 150.0)),
        ));

        session.begin_edit().unwrap();
        assert_eq!(session.draft(), ThresholdConfig::new(28.0, 150.0));
        session.set_field(ThresholdField::GasMax, "999").unwrap();
        session.cancel().unwrap();

        assert_eq!(session.state(), EditState::Viewing);
        assert_eq!(session.draft(), ThresholdConfig::new(28.0, 150.0));
        assert_eq!(state.thresholds(), ThresholdConfig::new(28.0, 150.0));
    }

    #[test]
    fn test_double_begin_rejected() {
        let (session, _) = session(MockGateway::new());
        session.begin_edit().unwrap();
        assert!(session.begin_edit().is_err());
        assert!(session.is_editing());
    }

    #[tokio::test]
    async fn test_commit_from_viewing_rejected() {
        let (session, _) = session(MockGateway::new());
        let err = session.commit().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_commit_success_uses_server_value() {
        let gateway = MockGateway::builder()
            .update_response(ThresholdConfig::new(40.0, 300.0))
            .build();
        let (session, state) = session(gateway);
        let mut events = state.events().subscribe();

        session.begin_edit().unwrap();
        session.set_field(ThresholdField::TemperatureMax, "41").unwrap();
        let confirmed = session.commit().await.unwrap();

        assert_eq!(confirmed, ThresholdConfig::new(40.0, 300.0));
        assert_eq!(state.thresholds(), confirmed);
        assert_eq!(session.state(), EditState::Viewing);
        assert!(matches!(
            events.recv().await.unwrap(),
            MonitorEvent::ThresholdsUpdated { .. }
        ));
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_thresholds() {
        let gateway = MockGateway::builder().fail_update(true).build();
        let (session, state) = session(gateway);
        let mut events = state.events().subscribe();

        session.begin_edit().unwrap();
        session.set_field(ThresholdField::GasMax, "10").unwrap();
        let result = session.commit().await;

        assert!(matches!(result, Err(Error::Gateway(_))));
        assert_eq!(session.state(), EditState::Viewing);
        assert_eq!(state.thresholds(), ThresholdConfig::default());
        assert_eq!(session.draft(), ThresholdConfig::default());
        assert!(matches!(
            events.recv().await.unwrap(),
            MonitorEvent::ThresholdUpdateFailed { .. }
        ));
    }
}
