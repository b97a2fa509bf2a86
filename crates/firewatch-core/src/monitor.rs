//! The monitoring view's owner.
//!
//! A [`Monitor`] bundles everything that lives as long as a dashboard is on
//! screen: the gateway, the shared snapshots, the poller and the threshold
//! edit session. Dropping it stops polling.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::events::EventReceiver;
use crate::poller::{Poller, PollerHandle, PollerOptions};
use crate::session::ThresholdEditSession;
use crate::state::SharedState;
use crate::traits::Gateway;
use crate::view::DashboardView;

/// Owns the poller and edit session for one dashboard.
///
/// # Example
///
/// ```
/// use firewatch_core::{Monitor, MockGateway, PollerOptions};
///
/// #[tokio::main]
/// async fn main() -> firewatch_core::Result<()> {
///     let mut monitor = Monitor::new(MockGateway::new());
///     let mut view = monitor.subscribe();
///
///     monitor.start(PollerOptions::default())?;
///     view.changed().await.ok();
///     assert!(view.borrow().reading.is_some());
///
///     monitor.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct Monitor<G> {
    gateway: Arc<G>,
    state: Arc<SharedState>,
    session: Arc<ThresholdEditSession<G>>,
    handle: Option<PollerHandle>,
}

impl<G: Gateway + 'static> Monitor<G> {
    /// Create a monitor. Polling starts with [`start`](Self::start).
    pub fn new(gateway: G) -> Self {
        Self::from_arc(Arc::new(gateway))
    }

    /// Create a monitor sharing an existing gateway.
    pub fn from_arc(gateway: Arc<G>) -> Self {
        let state = SharedState::new(gateway.base_origin());
        let session = Arc::new(ThresholdEditSession::new(
            Arc::clone(&gateway),
            Arc::clone(&state),
        ));
        Self {
            gateway,
            state,
            session,
            handle: None,
        }
    }

    /// Start polling in the background.
    ///
    /// A monitor can be started once; after [`stop`](Self::stop) it stays stopped.
    pub fn start(&mut self, options: PollerOptions) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::invalid_state("start", "running"));
        }
        self.handle = Some(self.poller().start(options)?);
        Ok(())
    }

    /// Stop polling without waiting for the background tasks.
    pub fn stop(&self) {
        match &self.handle {
            Some(handle) => handle.stop(),
            None => self.state.deactivate(),
        }
    }

    /// Stop polling and wait for the background tasks to finish.
    pub async fn shutdown(&mut self) {
        match self.handle.take() {
            Some(handle) => handle.shutdown().await,
            None => self.state.deactivate(),
        }
    }

    /// Returns `true` while the polling task is running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(PollerHandle::is_active) && self.state.is_active()
    }

    /// A poller over this monitor's gateway and state, for manual refreshes.
    pub fn poller(&self) -> Poller<G> {
        Poller::from_arc(Arc::clone(&self.gateway), Arc::clone(&self.state))
    }

    /// The threshold edit session. There is one per monitor.
    pub fn edit_session(&self) -> Arc<ThresholdEditSession<G>> {
        Arc::clone(&self.session)
    }

    /// Subscribe to dashboard updates.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.state.subscribe()
    }

    /// Subscribe to monitor events.
    pub fn events(&self) -> EventReceiver {
        self.state.events().subscribe()
    }

    /// The current dashboard.
    pub fn view(&self) -> DashboardView {
        self.state.view()
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }
}

impl<G> std::fmt::Debug for Monitor<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state)
            .field("started", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGateway;

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let mut monitor = Monitor::new(MockGateway::new());
        monitor.start(PollerOptions::default()).unwrap();
        assert!(matches!(
            monitor.start(PollerOptions::default()),
            Err(Error::InvalidState { .. })
        ));
        monitor.shutdown().await;
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_stopped_monitor_cannot_restart() {
        let mut monitor = Monitor::new(MockGateway::new());
        monitor.stop();
        assert!(monitor.start(PollerOptions::default()).is_err());
    }

    #[test]
    fn test_uses_gateway_origin() {
        let gateway = MockGateway::builder().base_origin("http://host:8000/").build();
        let monitor = Monitor::new(gateway);
        assert_eq!(monitor.state().base_origin(), "http://host:8000");
        assert!(monitor.view().is_loading());
    }
}
