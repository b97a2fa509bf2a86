//! Core types for Firewatch sensor data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};

/// Image shown when the backend has no capture to offer.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/600x400?text=No+Image";

/// Default maximum temperature (°C) used until the backend provides one.
pub const DEFAULT_TEMPERATURE_MAX: f64 = 30.0;

/// Default maximum gas level (ppm) used until the backend provides one.
pub const DEFAULT_GAS_MAX: f64 = 200.0;

/// Message reported alongside the fallback `Normal` server status.
pub const NORMAL_STATUS_MESSAGE: &str = "System operating normally";

/// A single snapshot of the sensor node.
///
/// Every measurement is optional: `None` means the sensor was offline or its
/// value could not be parsed. Absent values are never coerced to zero or
/// `false`; downstream logic treats them as "cannot evaluate".
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "crate::wire::WireReading"))]
pub struct Reading {
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Gas (smoke) concentration in ppm.
    pub gas_level: Option<f64>,
    /// Whether the node's own detector reports a fire.
    pub fire_detected: Option<bool>,
    /// When the reading was taken (or received, if the backend omitted it).
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "time::serde::rfc3339::serialize")
    )]
    pub timestamp: OffsetDateTime,
}

impl Reading {
    /// A reading with every measurement unknown, stamped with `timestamp`.
    #[must_use]
    pub fn unknown(timestamp: OffsetDateTime) -> Self {
        Self {
            temperature: None,
            humidity: None,
            gas_level: None,
            fire_detected: None,
            timestamp,
        }
    }

    /// Fallback used when `GET /sensors` fails: all unknown, timestamp = now.
    #[must_use]
    pub fn fallback() -> Self {
        Self::unknown(OffsetDateTime::now_utc())
    }

    /// Returns `true` if no measurement is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.humidity.is_none()
            && self.gas_level.is_none()
            && self.fire_detected.is_none()
    }
}

/// Alert thresholds configured on the backend.
///
/// Always fully populated: either the last value accepted from the backend or
/// the embedded default.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdConfig {
    /// Maximum temperature in °C before a breach is raised.
    pub temperature_max: f64,
    /// Maximum gas level in ppm before a breach is raised.
    pub gas_max: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temperature_max: DEFAULT_TEMPERATURE_MAX,
            gas_max: DEFAULT_GAS_MAX,
        }
    }
}

impl ThresholdConfig {
    /// Create a new threshold configuration.
    #[must_use]
    pub fn new(temperature_max: f64, gas_max: f64) -> Self {
        Self {
            temperature_max,
            gas_max,
        }
    }

    /// Get the value of a single field.
    #[must_use]
    pub fn get(&self, field: ThresholdField) -> f64 {
        match field {
            ThresholdField::TemperatureMax => self.temperature_max,
            ThresholdField::GasMax => self.gas_max,
        }
    }

    /// Set the value of a single field.
    pub fn set(&mut self, field: ThresholdField, value: f64) {
        match field {
            ThresholdField::TemperatureMax => self.temperature_max = value,
            ThresholdField::GasMax => self.gas_max = value,
        }
    }
}

/// Partial threshold body accepted by `POST /thresholds`.
///
/// Absent fields are left untouched by the backend and omitted from the JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdUpdate {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub temperature_max: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub gas_max: Option<f64>,
}

impl ThresholdUpdate {
    /// Returns `true` if the update carries no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature_max.is_none() && self.gas_max.is_none()
    }

    /// Apply this update on top of `base`, returning the merged configuration.
    #[must_use]
    pub fn apply_to(&self, base: ThresholdConfig) -> ThresholdConfig {
        ThresholdConfig {
            temperature_max: self.temperature_max.unwrap_or(base.temperature_max),
            gas_max: self.gas_max.unwrap_or(base.gas_max),
        }
    }
}

impl From<ThresholdConfig> for ThresholdUpdate {
    fn from(config: ThresholdConfig) -> Self {
        Self {
            temperature_max: Some(config.temperature_max),
            gas_max: Some(config.gas_max),
        }
    }
}

/// An editable field of [`ThresholdConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ThresholdField {
    /// `temperature_max`
    TemperatureMax,
    /// `gas_max`
    GasMax,
}

impl ThresholdField {
    /// All editable fields, in display order.
    pub const ALL: [ThresholdField; 2] = [ThresholdField::TemperatureMax, ThresholdField::GasMax];

    /// Wire name of the field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdField::TemperatureMax => "temperature_max",
            ThresholdField::GasMax => "gas_max",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ThresholdField::TemperatureMax => "Max Temperature (°C)",
            ThresholdField::GasMax => "Max Gas Level (ppm)",
        }
    }

    /// Parse user input for this field as a finite number.
    ///
    /// # Examples
    ///
    /// ```
    /// use firewatch_types::ThresholdField;
    ///
    /// assert_eq!(ThresholdField::GasMax.parse_value(" 150 "), Ok(150.0));
    /// assert!(ThresholdField::GasMax.parse_value("NaN").is_err());
    /// assert!(ThresholdField::GasMax.parse_value("").is_err());
    /// ```
    pub fn parse_value(&self, input: &str) -> ParseResult<f64> {
        input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::InvalidNumber {
                field: self.as_str().to_string(),
                value: input.to_string(),
            })
    }
}

impl fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdField {
    type Err = ParseError;

    /// Accepts the wire name (`gas_max`), the kebab-case CLI name
    /// (`gas-max`) and the camelCase name (`gasMax`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "temperaturemax" | "tempmax" => Ok(ThresholdField::TemperatureMax),
            "gasmax" => Ok(ThresholdField::GasMax),
            _ => Err(ParseError::UnknownField(s.to_string())),
        }
    }
}

/// Latest captured media from the node's camera and microphone.
///
/// URLs may be server-relative (starting with `/`); they are resolved against
/// the gateway's base origin before presentation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "crate::wire::WireMedia"))]
pub struct MediaRecord {
    pub photo_url: Option<String>,
    pub audio_url: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "time::serde::rfc3339::serialize")
    )]
    pub timestamp: OffsetDateTime,
}

impl MediaRecord {
    /// Fallback used when `GET /media/latest` fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            photo_url: Some(PLACEHOLDER_IMAGE_URL.to_string()),
            audio_url: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Status level reported by the backend.
///
/// The backend labels levels in Spanish (`Riesgo`, `Confirmado`); English
/// labels are accepted too. Anything else is preserved as [`StatusLevel::Unknown`]
/// instead of failing the whole status record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum StatusLevel {
    Normal,
    Risk,
    Confirmed,
    /// An unrecognized level, kept verbatim.
    Unknown(String),
}

impl StatusLevel {
    /// Presentation label. Unrecognized levels render as `"Unknown"`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            StatusLevel::Normal => "Normal",
            StatusLevel::Risk => "Risk",
            StatusLevel::Confirmed => "Confirmed",
            StatusLevel::Unknown(_) => "Unknown",
        }
    }

    /// Returns `true` for `Risk` and `Confirmed`.
    #[must_use]
    pub fn is_alert(&self) -> bool {
        matches!(self, StatusLevel::Risk | StatusLevel::Confirmed)
    }
}

impl From<String> for StatusLevel {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "normal" => StatusLevel::Normal,
            "risk" | "riesgo" => StatusLevel::Risk,
            "confirmed" | "confirmado" => StatusLevel::Confirmed,
            _ => StatusLevel::Unknown(raw),
        }
    }
}

impl From<&str> for StatusLevel {
    fn from(raw: &str) -> Self {
        StatusLevel::from(raw.to_string())
    }
}

impl From<StatusLevel> for String {
    fn from(level: StatusLevel) -> Self {
        match level {
            StatusLevel::Unknown(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The backend's own assessment of the system.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "crate::wire::WireStatus"))]
pub struct ServerStatus {
    #[cfg_attr(feature = "serde", serde(rename = "status"))]
    pub level: StatusLevel,
    pub message: String,
}

impl ServerStatus {
    /// Create a new server status.
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl Default for ServerStatus {
    /// Fallback used when `GET /status` fails.
    fn default() -> Self {
        Self::new(StatusLevel::Normal, NORMAL_STATUS_MESSAGE)
    }
}
