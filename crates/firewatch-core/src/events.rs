//! Monitor event system for notifications and diagnostics.
//!
//! The reconciled dashboard itself is published on a `watch` channel (see
//! [`crate::state`]); this module carries the discrete happenings around it:
//! finished poll cycles, per-source failures, and the success or failure
//! notification of a threshold update.

use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast;

use firewatch_types::ThresholdConfig;

use crate::poller::CycleReport;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// One of the four backend data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Readings,
    Thresholds,
    Media,
    Status,
}

impl Source {
    /// All sources, in display order.
    pub const ALL: [Source; 4] = [
        Source::Readings,
        Source::Thresholds,
        Source::Media,
        Source::Status,
    ];

    /// Endpoint path serving this source.
    pub fn path(&self) -> &'static str {
        match self {
            Source::Readings => "/sensors",
            Source::Thresholds => "/thresholds",
            Source::Media => "/media/latest",
            Source::Status => "/status",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Readings => "readings",
            Source::Thresholds => "thresholds",
            Source::Media => "media",
            Source::Status => "status",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by a running monitor.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A `refresh_all` cycle finished and its results were applied.
    CycleCompleted { report: CycleReport },
    /// A read failed; the fallback value was substituted.
    SourceFailed { source: Source, error: String },
    /// Thresholds were fetched from the backend.
    ThresholdsLoaded { thresholds: ThresholdConfig },
    /// A threshold update was accepted by the backend.
    ThresholdsUpdated { thresholds: ThresholdConfig },
    /// A threshold update failed; the confirmed thresholds are unchanged.
    ThresholdUpdateFailed { error: String },
    /// The poller was stopped.
    Stopped,
}

impl MonitorEvent {
    /// Returns `true` for events a user should be told about.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            MonitorEvent::ThresholdsUpdated { .. } | MonitorEvent::ThresholdUpdateFailed { .. }
        )
    }
}

/// Sender for monitor events.
pub type EventSender = broadcast::Sender<MonitorEvent>;

/// Receiver for monitor events.
pub type EventReceiver = broadcast::Receiver<MonitorEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity)
}

/// Fan-out point for monitor events.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = event_channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: MonitorEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = MonitorEvent::SourceFailed {
            source: Source::Media,
            error: "timeout".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "source_failed");
        assert_eq!(json["source"], "media");
        assert_eq!(json["error"], "timeout");

        let json = serde_json::to_value(MonitorEvent::ThresholdsUpdated {
            thresholds: ThresholdConfig::new(28.0, 150.0),
        })
        .unwrap();
        assert_eq!(json["type"], "thresholds_updated");
        assert_eq!(json["thresholds"]["gas_max"], 150.0);
    }

    #[test]
    fn test_notifications() {
        assert!(MonitorEvent::ThresholdUpdateFailed { error: "x".into() }.is_notification());
        assert!(!MonitorEvent::Stopped.is_notification());
    }

    #[test]
    fn test_source_paths() {
        assert_eq!(Source::Readings.path(), "/sensors");
        assert_eq!(Source::Media.path(), "/media/latest");
        assert_eq!(Source::Status.to_string(), "status");
    }

    #[tokio::test]
    async fn test_dispatcher_without_receivers() {
        let dispatcher = EventDispatcher::default();
        assert_eq!(dispatcher.receiver_count(), 0);
        dispatcher.send(MonitorEvent::Stopped);

        let mut rx = dispatcher.subscribe();
        dispatcher.send(MonitorEvent::Stopped);
        assert!(matches!(rx.recv().await.unwrap(), MonitorEvent::Stopped));
    }
}
