//! Trait abstractions for the remote data gateway.
//!
//! This module provides the [`Gateway`] trait that abstracts over the real
//! HTTP backend and the mock gateway used in tests and demo mode.

use async_trait::async_trait;

use firewatch_types::{MediaRecord, Reading, ServerStatus, ThresholdConfig, ThresholdUpdate};

use crate::gateway::GatewayError;

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// The five operations exposed by the backend.
///
/// Reads return the raw outcome; substituting fallbacks is the Poller's job,
/// so implementations should surface every failure as an error.
///
/// # Example
///
/// ```ignore
/// use firewatch_core::{Gateway, GatewayResult};
///
/// async fn print_temperature<G: Gateway>(gateway: &G) -> GatewayResult<()> {
///     let reading = gateway.fetch_readings().await?;
///     println!("Temperature: {:?}", reading.temperature);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Origin that server-relative media paths are resolved against,
    /// without a trailing slash (e.g. `http://host:8000`).
    fn base_origin(&self) -> &str;

    /// `GET /sensors`
    async fn fetch_readings(&self) -> GatewayResult<Reading>;

    /// `GET /thresholds`
    async fn fetch_thresholds(&self) -> GatewayResult<ThresholdConfig>;

    /// `POST /thresholds`, returning the server-normalized configuration.
    async fn update_thresholds(&self, update: &ThresholdUpdate) -> GatewayResult<ThresholdConfig>;

    /// `GET /media/latest`
    async fn fetch_latest_media(&self) -> GatewayResult<MediaRecord>;

    /// `GET /status`
    async fn fetch_status(&self) -> GatewayResult<ServerStatus>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    fn base_origin(&self) -> &str {
        (**self).base_origin()
    }

    async fn fetch_readings(&self) -> GatewayResult<Reading> {
        (**self).fetch_readings().await
    }

    async fn fetch_thresholds(&self) -> GatewayResult<ThresholdConfig> {
        (**self).fetch_thresholds().await
    }

    async fn update_thresholds(&self, update: &ThresholdUpdate) -> GatewayResult<ThresholdConfig> {
        (**self).update_thresholds(update).await
    }

    async fn fetch_latest_media(&self) -> GatewayResult<MediaRecord> {
        (**self).fetch_latest_media().await
    }

    async fn fetch_status(&self) -> GatewayResult<ServerStatus> {
        (**self).fetch_status().await
    }
}
