//! Media URL resolution.
//!
//! The backend may hand out server-relative paths (`/img/1.jpg`). These are
//! prefixed with the gateway's base origin before presentation; absolute
//! URLs pass through untouched.

use serde::Serialize;
use time::OffsetDateTime;

use firewatch_types::{MediaRecord, PLACEHOLDER_IMAGE_URL};

/// Media ready for presentation: absolute URLs, empty string when absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMedia {
    pub photo_url: String,
    pub audio_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ResolvedMedia {
    /// Returns `true` if there is audio to play.
    pub fn has_audio(&self) -> bool {
        !self.audio_url.is_empty()
    }
}

/// Resolve a single URL against `base_origin`.
///
/// ```
/// use firewatch_core::media::resolve_url;
///
/// assert_eq!(resolve_url("/img/1.jpg", "http://host:8000"), "http://host:8000/img/1.jpg");
/// assert_eq!(resolve_url("https://cdn/x.jpg", "http://host:8000"), "https://cdn/x.jpg");
/// ```
#[must_use]
pub fn resolve_url(url: &str, base_origin: &str) -> String {
    // "//cdn/x" is protocol-relative, not server-relative.
    if url.starts_with('/') && !url.starts_with("//") {
        format!("{}{}", base_origin.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

/// Resolve a media record for presentation.
///
/// When neither a photo nor audio is available the placeholder image is
/// supplied; a record with only audio keeps an empty photo URL.
#[must_use]
pub fn resolve_media(record: &MediaRecord, base_origin: &str) -> ResolvedMedia {
    let photo = record.photo_url.as_deref().map(|u| resolve_url(u, base_origin));
    let audio = record.audio_url.as_deref().map(|u| resolve_url(u, base_origin));

    let photo_url = match (&photo, &audio) {
        (None, None) => PLACEHOLDER_IMAGE_URL.to_string(),
        _ => photo.unwrap_or_default(),
    };

    ResolvedMedia {
        photo_url,
        audio_url: audio.unwrap_or_default(),
        timestamp: record.timestamp,
    }
}
