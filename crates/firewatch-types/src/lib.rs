//! Platform-agnostic types for the Firewatch fire-detection sensor network.
//!
//! This crate provides the data model shared by the monitoring core
//! (firewatch-core) and any presentation layer built on top of it.
//!
//! # Features
//!
//! - Sensor readings with per-field "unknown" state
//! - Alert threshold configuration and partial updates
//! - Captured media records
//! - Server-reported status levels, including unrecognized ones
//! - Lenient wire parsing of the backend's JSON (behind the `serde` feature)
//!
//! # Example
//!
//! ```
//! use firewatch_types::{Reading, StatusLevel, ThresholdConfig};
//!
//! let thresholds = ThresholdConfig::default();
//! assert_eq!(thresholds.temperature_max, 30.0);
//!
//! assert_eq!(StatusLevel::from("Riesgo"), StatusLevel::Risk);
//! assert_eq!(StatusLevel::from("???").label(), "Unknown");
//!
//! assert!(Reading::fallback().is_empty());
//! ```

pub mod error;
pub mod types;
#[cfg(feature = "serde")]
mod wire;

pub use error::{ParseError, ParseResult};
pub use types::{
    DEFAULT_GAS_MAX, DEFAULT_TEMPERATURE_MAX, MediaRecord, NORMAL_STATUS_MESSAGE,
    PLACEHOLDER_IMAGE_URL, Reading, ServerStatus, StatusLevel, ThresholdConfig, ThresholdField,
    ThresholdUpdate,
};
