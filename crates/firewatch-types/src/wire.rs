//! Wire representations of backend payloads.
//!
//! The backend is loosely typed: any measurement may be `null`, a number, a
//! numeric string, or garbage, and some fields arrive under legacy names.
//! These structs accept all of that and convert into the strict public types,
//! turning anything unusable into `None` instead of rejecting the record.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use time::format_description::{self, well_known::Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::types::{MediaRecord, Reading, ServerStatus, StatusLevel};

/// `GET /sensors` payload.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireReading {
    #[serde(default, deserialize_with = "lenient_f64")]
    temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    gas_level: Option<f64>,
    /// Older firmware reports gas concentration under this name.
    #[serde(default, deserialize_with = "lenient_f64")]
    smoke_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    fire_detected: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: Option<OffsetDateTime>,
}

impl From<WireReading> for Reading {
    fn from(wire: WireReading) -> Self {
        Reading {
            temperature: wire.temperature,
            humidity: wire.humidity,
            gas_level: wire.gas_level.or(wire.smoke_level),
            fire_detected: wire.fire_detected,
            timestamp: wire.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
        }
    }
}

/// `GET /media/latest` payload.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireMedia {
    #[serde(default, deserialize_with = "lenient_text")]
    photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    annotated_image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    latest_photo: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    audio_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    latest_audio: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: Option<OffsetDateTime>,
}

impl From<WireMedia> for MediaRecord {
    fn from(wire: WireMedia) -> Self {
        MediaRecord {
            photo_url: wire
                .photo_url
                .or(wire.annotated_image_url)
                .or(wire.latest_photo),
            audio_url: wire.audio_url.or(wire.latest_audio),
            timestamp: wire.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
        }
    }
}

/// `GET /status` payload.
///
/// The level arrives under `status` or `level`. A level that is missing,
/// `null` or not a string still yields a record, with [`StatusLevel::Unknown`].
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireStatus {
    #[serde(default, deserialize_with = "lenient_label")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    message: Option<String>,
}

impl From<WireStatus> for ServerStatus {
    fn from(wire: WireStatus) -> Self {
        let level = wire
            .status
            .or(wire.level)
            .map_or_else(|| StatusLevel::Unknown(String::new()), StatusLevel::from);
        ServerStatus::new(level, wire.message.unwrap_or_default())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn loose<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Loose>, D::Error> {
    Option::<Loose>::deserialize(deserializer)
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = match loose(deserializer)? {
        Some(Loose::Number(n)) => Some(n),
        Some(Loose::Text(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Bool(b)) => Some(b),
        Some(Loose::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Text(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Scalars keep their text (`2` becomes `"2"`); objects and arrays are dropped.
fn lenient_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Text(s)) => Some(s),
        Some(Loose::Number(n)) => Some(n.to_string()),
        Some(Loose::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error> {
    Ok(match loose(deserializer)? {
        Some(Loose::Text(s)) => parse_timestamp(s.trim()),
        _ => None,
    })
}

/// RFC 3339, or a naive ISO 8601 date-time (as emitted by Python's
/// `datetime.isoformat()`) taken to be UTC.
fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }
    let naive = format_description::parse(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]",
    )
    .ok()?;
    PrimitiveDateTime::parse(s, &naive)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
