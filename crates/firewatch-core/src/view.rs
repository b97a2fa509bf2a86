//! The reconciled dashboard view.
//!
//! [`reconcile`] is a pure function of the latest snapshots. It is re-run
//! whenever any snapshot changes; nothing is cached between runs.

use serde::Serialize;

use firewatch_types::{MediaRecord, Reading, ServerStatus, ThresholdConfig};

use crate::alert::{AlertEvaluation, EffectiveStatus, effective_status, evaluate};
use crate::media::{ResolvedMedia, resolve_media};

/// State of the Fire Status card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FireCard {
    /// The node reported no fire flag at all.
    Unknown,
    Safe,
    Detected,
}

impl FireCard {
    /// Card text; the flag is shown as reported, the highlight follows the aggregate.
    pub fn label(&self) -> &'static str {
        match self {
            FireCard::Unknown => "---",
            FireCard::Safe => "Safe",
            FireCard::Detected => "DETECTED",
        }
    }
}

/// Per-card alert highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardAlerts {
    pub temperature: bool,
    pub gas: bool,
    /// Fire Status card: any local alert condition.
    pub fire: bool,
    pub fire_card: FireCard,
}

impl CardAlerts {
    fn new(reading: Option<&Reading>, alerts: &AlertEvaluation) -> Self {
        let fire_card = match reading.and_then(|r| r.fire_detected) {
            None => FireCard::Unknown,
            Some(false) => FireCard::Safe,
            Some(true) => FireCard::Detected,
        };
        Self {
            temperature: alerts.temperature_breach,
            gas: alerts.gas_breach,
            fire: alerts.is_fire_detected(),
            fire_card,
        }
    }
}

/// Everything the presentation layer needs, derived from the four snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// `None` until the first poll cycle has been applied.
    pub reading: Option<Reading>,
    pub thresholds: ThresholdConfig,
    /// `false` while `thresholds` is still the embedded default.
    pub thresholds_confirmed: bool,
    pub media: Option<ResolvedMedia>,
    pub server_status: Option<ServerStatus>,
    /// `None` while there is neither a server status nor a local alert.
    pub status: Option<EffectiveStatus>,
    pub alerts: AlertEvaluation,
    pub cards: CardAlerts,
}

impl DashboardView {
    /// Returns `true` until the first reading has arrived.
    pub fn is_loading(&self) -> bool {
        self.reading.is_none()
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        reconcile(None, None, None, None, "")
    }
}

/// Derive the dashboard from the latest snapshots.
///
/// `thresholds` is `None` while the backend has not confirmed a value; the
/// embedded default is used for evaluation in that case.
pub fn reconcile(
    reading: Option<&Reading>,
    thresholds: Option<&ThresholdConfig>,
    media: Option<&MediaRecord>,
    server_status: Option<&ServerStatus>,
    base_origin: &str,
) -> DashboardView {
    let effective_thresholds = thresholds.copied().unwrap_or_default();

    let alerts = reading
        .map(|r| evaluate(r, Some(&effective_thresholds)))
        .unwrap_or_default();

    let status = match server_status {
        Some(server) => Some(effective_status(&alerts, server)),
        None if alerts.is_fire_detected() => {
            Some(effective_status(&alerts, &ServerStatus::default()))
        }
        None => None,
    };

    DashboardView {
        reading: reading.cloned(),
        thresholds: effective_thresholds,
        thresholds_confirmed: thresholds.is_some(),
        media: media.map(|m| resolve_media(m, base_origin)),
        server_status: server_status.cloned(),
        status,
        alerts,
        cards: CardAlerts::new(reading, &alerts),
    }
}
