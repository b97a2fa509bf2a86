//! Synthetic backend for `--demo`.
//!
//! The temperature and gas level drift up past the default thresholds and
//! back down again, so every alert path is visible within a minute.

use std::sync::Arc;
use std::time::Duration;

use firewatch_core::{MockGateway, ServerStatus, StatusLevel};
use firewatch_types::Reading;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

pub const DEMO_ORIGIN: &str = "http://demo.firewatch.local";

/// Steps in one rise-and-fall period.
const PERIOD: u32 = 20;

pub fn demo_gateway() -> Arc<MockGateway> {
    Arc::new(
        MockGateway::builder()
            .base_origin(DEMO_ORIGIN)
            .reading(demo_reading(0))
            .build(),
    )
}

fn offset(step: u32) -> f64 {
    let phase = step % PERIOD;
    f64::from(phase.min(PERIOD - phase))
}

pub fn demo_reading(step: u32) -> Reading {
    let offset = offset(step);
    Reading {
        temperature: Some(24.0 + offset * 0.9),
        humidity: Some(45.0 - offset),
        gas_level: Some(110.0 + offset * 12.0),
        fire_detected: Some(false),
        timestamp: OffsetDateTime::now_utc(),
    }
}

/// The backend only notices once smoke is well established.
pub fn demo_status(step: u32) -> ServerStatus {
    if offset(step) >= 9.0 {
        ServerStatus::new(StatusLevel::Risk, "Humo detectado")
    } else {
        ServerStatus::default()
    }
}

/// Advance the simulated node every `interval` until aborted.
pub fn spawn_simulator(gateway: Arc<MockGateway>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut step: u32 = 0;
        loop {
            ticker.tick().await;
            gateway.set_reading(demo_reading(step)).await;
            gateway.set_status(demo_status(step)).await;
            step = step.wrapping_add(1);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewatch_core::{ThresholdConfig, evaluate};

    #[test]
    fn test_demo_starts_calm() {
        let alerts = evaluate(&demo_reading(0), Some(&ThresholdConfig::default()));
        assert!(!alerts.is_fire_detected());
        assert_eq!(demo_status(0).level, StatusLevel::Normal);
    }

    #[test]
    fn test_demo_peak_breaches_both() {
        let alerts = evaluate(&demo_reading(10), Some(&ThresholdConfig::default()));
        assert!(alerts.temperature_breach);
        assert!(alerts.gas_breach);
        assert_eq!(demo_status(10).level, StatusLevel::Risk);
    }

    #[test]
    fn test_demo_is_periodic() {
        assert_eq!(offset(3), offset(3 + PERIOD));
        assert_eq!(offset(PERIOD - 1), 1.0);
    }
}
