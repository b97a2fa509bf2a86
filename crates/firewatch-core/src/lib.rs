//! Monitoring core for the Firewatch fire-detection sensor network.
//!
//! This crate keeps a client's view of a remote sensor node fresh and
//! decides what the user should be alarmed about. It is presentation
//! agnostic: a terminal, desktop or web front end subscribes to the
//! [`DashboardView`] and renders it.
//!
//! # Features
//!
//! - **Polling**: readings, media and status every 3 seconds, thresholds once
//! - **Fallbacks**: a failing endpoint never blanks the others
//! - **Alert derivation**: local threshold breaches override the server status
//! - **Threshold editing**: a draft/commit session with rollback on failure
//! - **Media resolution**: server-relative URLs resolved against the backend origin
//! - **Ordering**: late responses never overwrite newer data
//!
//! # Quick Start
//!
//! ```no_run
//! use firewatch_core::{HttpGateway, Monitor, PollerOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = HttpGateway::new("http://localhost:8000")?;
//!     let mut monitor = Monitor::new(gateway);
//!     let mut view = monitor.subscribe();
//!
//!     monitor.start(PollerOptions::default())?;
//!
//!     while view.changed().await.is_ok() {
//!         let dashboard = view.borrow_and_update().clone();
//!         if let Some(status) = &dashboard.status {
//!             println!("{}: {}", status.label(), status.message);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod error;
pub mod events;
pub mod gateway;
pub mod media;
pub mod mock;
pub mod monitor;
pub mod poller;
pub mod session;
pub mod state;
pub mod traits;
pub mod view;

// Re-export the data model
pub use firewatch_types::{
    MediaRecord, ParseError, Reading, ServerStatus, StatusLevel, ThresholdConfig, ThresholdField,
    ThresholdUpdate,
};

// Core exports
pub use alert::{AlertEvaluation, EffectiveStatus, StatusSource, effective_status, evaluate};
pub use error::{Error, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, MonitorEvent, Source};
pub use gateway::GatewayError;
#[cfg(feature = "http")]
pub use gateway::HttpGateway;
pub use media::{ResolvedMedia, resolve_media, resolve_url};
pub use mock::{MockEndpoint, MockGateway, MockGatewayBuilder};
pub use monitor::Monitor;
pub use poller::{CycleReport, Poller, PollerHandle, PollerOptions, PollerOptionsBuilder};
pub use session::{EditState, ThresholdEditSession};
pub use state::{ApplyOutcome, SharedState, SourceStats};
pub use traits::{Gateway, GatewayResult};
pub use view::{CardAlerts, DashboardView, FireCard, reconcile};
