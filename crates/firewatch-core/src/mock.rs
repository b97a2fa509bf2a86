//! Mock gateway implementation for testing.
//!
//! This module provides a mock backend that can be used for unit testing
//! and for the CLI's demo mode, without a running Firewatch server.
//!
//! # Features
//!
//! - **Failure injection**: Fail individual endpoints, or the next N calls
//! - **Latency simulation**: Delay individual endpoints
//! - **Scripted responses**: Queue readings with their own delays to
//!   reproduce out-of-order completion

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use firewatch_types::{MediaRecord, Reading, ServerStatus, ThresholdConfig, ThresholdUpdate};

use crate::gateway::GatewayError;
use crate::traits::{Gateway, GatewayResult};

/// Endpoints of the mock, for per-endpoint configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEndpoint {
    Readings,
    Thresholds,
    UpdateThresholds,
    Media,
    Status,
}

impl MockEndpoint {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        self as usize
    }

    fn path(self) -> &'static str {
        match self {
            MockEndpoint::Readings => "/sensors",
            MockEndpoint::Thresholds | MockEndpoint::UpdateThresholds => "/thresholds",
            MockEndpoint::Media => "/media/latest",
            MockEndpoint::Status => "/status",
        }
    }
}

/// A mock Firewatch backend.
///
/// # Example
///
/// ```
/// use firewatch_core::{Gateway, MockGateway};
///
/// #[tokio::main]
/// async fn main() {
///     let gateway = MockGateway::builder().temperature(35.0).build();
///     let reading = gateway.fetch_readings().await.unwrap();
///     assert_eq!(reading.temperature, Some(35.0));
/// }
/// ```
pub struct MockGateway {
    base_origin: String,
    reading: RwLock<Reading>,
    scripted_readings: RwLock<VecDeque<(Duration, Reading)>>,
    thresholds: RwLock<ThresholdConfig>,
    /// Returned by `update_thresholds` instead of applying the update.
    update_response: RwLock<Option<ThresholdConfig>>,
    media: RwLock<MediaRecord>,
    status: RwLock<ServerStatus>,
    failing: [AtomicBool; MockEndpoint::COUNT],
    latency_ms: [AtomicU64; MockEndpoint::COUNT],
    calls: [AtomicU32; MockEndpoint::COUNT],
    remaining_failures: AtomicU32,
    last_update: RwLock<Option<ThresholdUpdate>>,
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("base_origin", &self.base_origin)
            .field("remaining_failures", &self.remaining_failures())
            .finish()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create a mock with default data: quiet readings, default thresholds.
    pub fn new() -> Self {
        MockGatewayBuilder::default().build()
    }

    /// Create a builder.
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder::default()
    }

    fn default_reading() -> Reading {
        Reading {
            temperature: Some(24.5),
            humidity: Some(45.0),
            gas_level: Some(120.0),
            fire_detected: Some(false),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    fn default_media() -> MediaRecord {
        MediaRecord {
            photo_url: Some("/media/snapshots/latest.jpg".to_string()),
            audio_url: Some("/media/audio/latest.wav".to_string()),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    async fn simulate(&self, endpoint: MockEndpoint) -> GatewayResult<()> {
        self.calls[endpoint.index()].fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms[endpoint.index()].load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let transient = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if transient || self.failing[endpoint.index()].load(Ordering::Relaxed) {
            return Err(GatewayError::NotReachable {
                url: format!("{}{}", self.base_origin, endpoint.path()),
                source: "mock failure".into(),
            });
        }
        Ok(())
    }

    // --- Test control ---

    pub async fn set_reading(&self, reading: Reading) {
        *self.reading.write().await = reading;
    }

    pub async fn set_temperature(&self, temperature: Option<f64>) {
        self.reading.write().await.temperature = temperature;
    }

    pub async fn set_gas_level(&self, gas_level: Option<f64>) {
        self.reading.write().await.gas_level = gas_level;
    }

    pub async fn set_fire_detected(&self, fire: Option<bool>) {
        self.reading.write().await.fire_detected = fire;
    }

    /// Queue readings returned (after their delay) before the regular one.
    pub async fn script_readings(&self, script: impl IntoIterator<Item = (Duration, Reading)>) {
        self.scripted_readings.write().await.extend(script);
    }

    pub async fn set_thresholds(&self, thresholds: ThresholdConfig) {
        *self.thresholds.write().await = thresholds;
    }

    /// Make `update_thresholds` return `response` regardless of the request.
    pub async fn set_update_response(&self, response: Option<ThresholdConfig>) {
        *self.update_response.write().await = response;
    }

    pub async fn set_media(&self, media: MediaRecord) {
        *self.media.write().await = media;
    }

    pub async fn set_status(&self, status: ServerStatus) {
        *self.status.write().await = status;
    }

    /// Make an endpoint fail until reset.
    pub fn set_failing(&self, endpoint: MockEndpoint, fail: bool) {
        self.failing[endpoint.index()].store(fail, Ordering::Relaxed);
    }

    /// Set simulated latency for an endpoint.
    ///
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_latency(&self, endpoint: MockEndpoint, latency: Duration) {
        self.latency_ms[endpoint.index()].store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Fail the next `count` calls on any endpoint, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    pub fn remaining_failures(&self) -> u32 {
        self.remaining_failures.load(Ordering::Relaxed)
    }

    /// Number of calls made to an endpoint, including failed ones.
    pub fn call_count(&self, endpoint: MockEndpoint) -> u32 {
        self.calls[endpoint.index()].load(Ordering::Relaxed)
    }

    /// The last body sent to `update_thresholds`.
    pub async fn last_update(&self) -> Option<ThresholdUpdate> {
        *self.last_update.read().await
    }
}

#[async_trait]
impl Gateway for MockGateway {
    fn base_origin(&self) -> &str {
        &self.base_origin
    }

    async fn fetch_readings(&self) -> GatewayResult<Reading> {
        let scripted = self.scripted_readings.write().await.pop_front();
        if let Some((delay, reading)) = scripted {
            self.calls[MockEndpoint::Readings.index()].fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(delay).await;
            return Ok(reading);
        }

        self.simulate(MockEndpoint::Readings).await?;
        Ok(self.reading.read().await.clone())
    }

    async fn fetch_thresholds(&self) -> GatewayResult<ThresholdConfig> {
        self.simulate(MockEndpoint::Thresholds).await?;
        Ok(*self.thresholds.read().await)
    }

    async fn update_thresholds(&self, update: &ThresholdUpdate) -> GatewayResult<ThresholdConfig> {
        *self.last_update.write().await = Some(*update);
        self.simulate(MockEndpoint::UpdateThresholds).await?;

        let mut thresholds = self.thresholds.write().await;
        *thresholds = match *self.update_response.read().await {
            Some(response) => response,
            None => update.apply_to(*thresholds),
        };
        Ok(*thresholds)
    }

    async fn fetch_latest_media(&self) -> GatewayResult<MediaRecord> {
        self.simulate(MockEndpoint::Media).await?;
        Ok(self.media.read().await.clone())
    }

    async fn fetch_status(&self) -> GatewayResult<ServerStatus> {
        self.simulate(MockEndpoint::Status).await?;
        Ok(self.status.read().await.clone())
    }
}

/// Builder for creating mock gateways with custom settings.
#[derive(Debug, Clone)]
pub struct MockGatewayBuilder {
    base_origin: String,
    reading: Reading,
    thresholds: ThresholdConfig,
    update_response: Option<ThresholdConfig>,
    media: MediaRecord,
    status: ServerStatus,
    failing: [bool; MockEndpoint::COUNT],
    latency: [Duration; MockEndpoint::COUNT],
}

impl Default for MockGatewayBuilder {
    fn default() -> Self {
        Self {
            base_origin: "http://mock.local:8000".to_string(),
            reading: MockGateway::default_reading(),
            thresholds: ThresholdConfig::default(),
            update_response: None,
            media: MockGateway::default_media(),
            status: ServerStatus::default(),
            failing: [false; MockEndpoint::COUNT],
            latency: [Duration::ZERO; MockEndpoint::COUNT],
        }
    }
}

impl MockGatewayBuilder {
    #[must_use]
    pub fn base_origin(mut self, origin: &str) -> Self {
        self.base_origin = origin.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn reading(mut self, reading: Reading) -> Self {
        self.reading = reading;
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.reading.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn gas_level(mut self, gas_level: f64) -> Self {
        self.reading.gas_level = Some(gas_level);
        self
    }

    #[must_use]
    pub fn fire_detected(mut self, fire: bool) -> Self {
        self.reading.fire_detected = Some(fire);
        self
    }

    #[must_use]
    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn update_response(mut self, response: ThresholdConfig) -> Self {
        self.update_response = Some(response);
        self
    }

    #[must_use]
    pub fn media(mut self, media: MediaRecord) -> Self {
        self.media = media;
        self
    }

    #[must_use]
    pub fn status(mut self, status: ServerStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn failing(mut self, endpoint: MockEndpoint, fail: bool) -> Self {
        self.failing[endpoint.index()] = fail;
        self
    }

    #[must_use]
    pub fn fail_thresholds(self, fail: bool) -> Self {
        self.failing(MockEndpoint::Thresholds, fail)
    }

    #[must_use]
    pub fn fail_update(self, fail: bool) -> Self {
        self.failing(MockEndpoint::UpdateThresholds, fail)
    }

    #[must_use]
    pub fn fail_media(self, fail: bool) -> Self {
        self.failing(MockEndpoint::Media, fail)
    }

    /// Fail every endpoint.
    #[must_use]
    pub fn fail_all(mut self, fail: bool) -> Self {
        self.failing = [fail; MockEndpoint::COUNT];
        self
    }

    #[must_use]
    pub fn latency(mut self, endpoint: MockEndpoint, latency: Duration) -> Self {
        self.latency[endpoint.index()] = latency;
        self
    }

    /// Build the mock gateway.
    #[must_use]
    pub fn build(self) -> MockGateway {
        MockGateway {
            base_origin: self.base_origin,
            reading: RwLock::new(self.reading),
            scripted_readings: RwLock::new(VecDeque::new()),
            thresholds: RwLock::new(self.thresholds),
            update_response: RwLock::new(self.update_response),
            media: RwLock::new(self.media),
            status: RwLock::new(self.status),
            failing: self.failing.map(AtomicBool::new),
            latency_ms: self.latency.map(|d| AtomicU64::new(d.as_millis() as u64)),
            calls: std::array::from_fn(|_| AtomicU32::new(0)),
            remaining_failures: AtomicU32::new(0),
            last_update: RwLock::new(None),
        }
    }
}
