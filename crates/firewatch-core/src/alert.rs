//! Client-side alert derivation.
//!
//! The backend reports its own [`ServerStatus`], but the client evaluates the
//! latest [`Reading`] against the configured [`ThresholdConfig`] as well. A
//! local alert always overrides the server status, never the reverse.
//!
//! Everything here is a pure function of the latest snapshots; there is no
//! cached state to invalidate.
//!
//! # Example
//!
//! ```
//! use firewatch_core::alert::{evaluate, effective_status};
//! use firewatch_types::{Reading, ServerStatus, StatusLevel, ThresholdConfig};
//!
//! let mut reading = Reading::fallback();
//! reading.temperature = Some(35.0);
//! reading.gas_level = Some(50.0);
//! reading.fire_detected = Some(false);
//!
//! let thresholds = ThresholdConfig::new(30.0, 200.0);
//! let alerts = evaluate(&reading, Some(&thresholds));
//! assert!(alerts.temperature_breach);
//! assert!(!alerts.gas_breach);
//!
//! let status = effective_status(&alerts, &ServerStatus::default());
//! assert_eq!(status.level, StatusLevel::Confirmed);
//! ```

use serde::Serialize;

use firewatch_types::{Reading, ServerStatus, StatusLevel, ThresholdConfig};

/// Message shown whenever the local override fires.
pub const CRITICAL_ALERT_MESSAGE: &str = "CRITICAL ALERT: Hazardous Conditions Detected";

/// Outcome of evaluating one reading against the thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertEvaluation {
    /// The node's own detector reported a fire.
    pub fire_flag: bool,
    /// Temperature strictly above `temperature_max`.
    pub temperature_breach: bool,
    /// Gas level strictly above `gas_max`.
    pub gas_breach: bool,
}

impl AlertEvaluation {
    /// Any local condition holds. Drives the Fire Status card and the override.
    #[must_use]
    pub fn is_fire_detected(&self) -> bool {
        self.fire_flag || self.temperature_breach || self.gas_breach
    }
}

/// Strict breach check. Returns `false` when either side is unknown or not finite.
#[must_use]
pub fn breach(value: Option<f64>, max: Option<f64>) -> bool {
    match (value, max) {
        (Some(value), Some(max)) if value.is_finite() && max.is_finite() => value > max,
        _ => false,
    }
}

/// Evaluate a reading against the thresholds.
///
/// `thresholds` is `None` when no configuration is available; breaches then
/// cannot be evaluated but the fire flag still counts.
#[must_use]
pub fn evaluate(reading: &Reading, thresholds: Option<&ThresholdConfig>) -> AlertEvaluation {
    AlertEvaluation {
        fire_flag: reading.fire_detected == Some(true),
        temperature_breach: breach(reading.temperature, thresholds.map(|t| t.temperature_max)),
        gas_breach: breach(reading.gas_level, thresholds.map(|t| t.gas_max)),
    }
}

/// Where the effective status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    /// Server status passed through unmodified.
    Server,
    /// Local alert overrode the server status.
    LocalOverride,
}

/// The status actually shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveStatus {
    pub level: StatusLevel,
    pub message: String,
    pub source: StatusSource,
}

impl EffectiveStatus {
    /// Presentation label; unrecognized server levels render as "Unknown".
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.level.label()
    }

    /// Returns `true` if this status is exactly the given server status.
    #[must_use]
    pub fn is_passthrough_of(&self, server: &ServerStatus) -> bool {
        self.source == StatusSource::Server
            && self.level == server.level
            && self.message == server.message
    }
}

/// Combine the local evaluation with the server's status.
#[must_use]
pub fn effective_status(alerts: &AlertEvaluation, server: &ServerStatus) -> EffectiveStatus {
    if alerts.is_fire_detected() {
        EffectiveStatus {
            level: StatusLevel::Confirmed,
            message: CRITICAL_ALERT_MESSAGE.to_string(),
            source: StatusSource::LocalOverride,
        }
    } else {
        EffectiveStatus {
            level: server.level.clone(),
            message: server.message.clone(),
            source: StatusSource::Server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::OffsetDateTime;

    fn reading(temperature: Option<f64>, gas: Option<f64>, fire: Option<bool>) -> Reading {
        Reading {
            temperature,
            humidity: Some(40.0),
            gas_level: gas,
            fire_detected: fire,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn defaults() -> ThresholdConfig {
        ThresholdConfig::new(30.0, 200.0)
    }

    #[test]
    fn test_temperature_breach_scenario() {
        let r = reading(Some(35.0), Some(50.0), Some(false));
        let alerts = evaluate(&r, Some(&defaults()));

        assert!(alerts.temperature_breach);
        assert!(!alerts.gas_breach);
        assert!(!alerts.fire_flag);
        assert!(alerts.is_fire_detected());

        let status = effective_status(&alerts, &ServerStatus::default());
        assert_eq!(status.level, StatusLevel::Confirmed);
        assert_eq!(status.message, CRITICAL_ALERT_MESSAGE);
        assert_eq!(status.source, StatusSource::LocalOverride);
    }

    #[test]
    fn test_breach_is_strict() {
        let at = evaluate(&reading(Some(30.0), Some(200.0), None), Some(&defaults()));
        assert!(!at.temperature_breach);
        assert!(!at.gas_breach);
        assert!(!at.is_fire_detected());

        let above = evaluate(&reading(Some(30.01), Some(200.5), None), Some(&defaults()));
        assert!(above.temperature_breach);
        assert!(above.gas_breach);
    }

    #[test]
    fn test_unknown_values_cannot_breach() {
        let alerts = evaluate(&reading(None, None, None), Some(&defaults()));
        assert_eq!(alerts, AlertEvaluation::default());

        let alerts = evaluate(&reading(Some(99.0), Some(999.0), None), None);
        assert!(!alerts.temperature_breach);
        assert!(!alerts.gas_breach);
    }

    #[test]
    fn test_non_finite_thresholds_cannot_breach() {
        assert!(!breach(Some(10.0), Some(f64::NAN)));
        assert!(!breach(Some(f64::INFINITY), Some(10.0)));
    }

    #[test]
    fn test_fire_flag_independent_of_thresholds() {
        let alerts = evaluate(&reading(None, None, Some(true)), None);
        assert!(alerts.fire_flag);
        assert!(alerts.is_fire_detected());
    }

    #[test]
    fn test_one_unknown_does_not_mask_other_breach() {
        let alerts = evaluate(&reading(None, Some(250.0), None), Some(&defaults()));
        assert!(!alerts.temperature_breach);
        assert!(alerts.gas_breach);
        assert!(alerts.is_fire_detected());
    }

    #[test]
    fn test_passthrough_keeps_server_message() {
        let server = ServerStatus::new(StatusLevel::Risk, "Humo leve detectado");
        let alerts = evaluate(&reading(Some(20.0), Some(10.0), Some(false)), Some(&defaults()));
        let status = effective_status(&alerts, &server);

        assert!(status.is_passthrough_of(&server));
        assert_eq!(status.label(), "Risk");
    }

    #[test]
    fn test_passthrough_of_unknown_level() {
        let server = ServerStatus::new(StatusLevel::Unknown("Calibrando".into()), "cal");
        let status = effective_status(&AlertEvaluation::default(), &server);

        assert_eq!(status.level, StatusLevel::Unknown("Calibrando".into()));
        assert_eq!(status.label(), "Unknown");
    }

    #[test]
    fn test_override_never_downgrades() {
        let server = ServerStatus::new(StatusLevel::Confirmed, "Fuego confirmado");
        let status = effective_status(&AlertEvaluation::default(), &server);
        assert_eq!(status.level, StatusLevel::Confirmed);
        assert_eq!(status.message, "Fuego confirmado");
    }

    fn any_level() -> impl Strategy<Value = StatusLevel> {
        prop_oneof![
            Just(StatusLevel::Normal),
            Just(StatusLevel::Risk),
            Just(StatusLevel::Confirmed),
            "[a-z]{1,8}".prop_map(StatusLevel::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn fire_flag_always_confirms(
            t in proptest::option::of(-50.0f64..150.0),
            g in proptest::option::of(0.0f64..1000.0),
            level in any_level(),
            message in ".{0,20}",
        ) {
            let alerts = evaluate(&reading(t, g, Some(true)), Some(&defaults()));
            let status = effective_status(&alerts, &ServerStatus::new(level, message));
            prop_assert_eq!(status.level, StatusLevel::Confirmed);
        }

        #[test]
        fn temperature_breach_iff_strictly_above(t in -50.0f64..150.0, max in -50.0f64..150.0) {
            let th = ThresholdConfig::new(max, 200.0);
            let alerts = evaluate(&reading(Some(t), None, None), Some(&th));
            prop_assert_eq!(alerts.temperature_breach, t > max);
        }

        #[test]
        fn no_local_alert_means_exact_passthrough(
            t in proptest::option::of(-50.0f64..30.0),
            g in proptest::option::of(0.0f64..200.0),
            fire in proptest::option::of(Just(false)),
            level in any_level(),
            message in ".{0,20}",
        ) {
            let server = ServerStatus::new(level, message);
            let alerts = evaluate(&reading(t, g, fire), Some(&defaults()));
            prop_assert!(!alerts.is_fire_detected());
            let status = effective_status(&alerts, &server);
            prop_assert!(status.is_passthrough_of(&server));
        }
    }
}
