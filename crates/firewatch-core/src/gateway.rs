//! HTTP client for the Firewatch backend REST API.
//!
//! [`HttpGateway`] implements [`Gateway`](crate::Gateway) over reqwest. The
//! backend origin is supplied by the caller (configuration or environment),
//! never hard-coded here.
//!
//! # Example
//!
//! ```no_run
//! use firewatch_core::{Gateway, HttpGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new("http://localhost:8000")?;
//!
//! let status = gateway.fetch_status().await?;
//! println!("Backend says: {} ({})", status.level, status.message);
//! # Ok(())
//! # }
//! ```

/// Boxed source error, so the error type stays independent of the transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The backend is not reachable.
    #[error("Gateway not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The backend answered, but the body could not be decoded.
    #[error("Invalid response from {url}: {source}")]
    InvalidResponse {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

impl GatewayError {
    /// Returns `true` if the backend could not be contacted at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, GatewayError::NotReachable { .. })
    }
}

/// Validate and normalize a base origin (trailing slashes removed).
pub fn normalize_origin(base_url: &str) -> Result<String, GatewayError> {
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(GatewayError::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

#[cfg(feature = "http")]
pub use self::http::HttpGateway;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use tracing::debug;

    use firewatch_types::{MediaRecord, Reading, ServerStatus, ThresholdConfig, ThresholdUpdate};

    use super::{GatewayError, normalize_origin};
    use crate::traits::{Gateway, GatewayResult};

    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// HTTP implementation of the backend gateway.
    #[derive(Debug, Clone)]
    pub struct HttpGateway {
        client: Client,
        base_url: String,
    }

    impl HttpGateway {
        /// Create a new gateway.
        ///
        /// # Arguments
        ///
        /// * `base_url` - The backend origin (e.g., "http://localhost:8000")
        pub fn new(base_url: &str) -> GatewayResult<Self> {
            Self::with_timeout(base_url, DEFAULT_TIMEOUT)
        }

        /// Create a gateway with a custom per-request timeout.
        pub fn with_timeout(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
            let base_url = normalize_origin(base_url)?;

            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| GatewayError::NotReachable {
                    url: base_url.clone(),
                    source: Box::new(e),
                })?;

            Ok(Self { client, base_url })
        }

        /// Create a gateway with a custom reqwest Client.
        pub fn with_client(base_url: &str, client: Client) -> GatewayResult<Self> {
            let base_url = normalize_origin(base_url)?;
            Ok(Self { client, base_url })
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        // ==================================================================
        // Internal HTTP helpers
        // ==================================================================

        async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
            let url = self.url(path);
            debug!("GET {}", url);
            let response = self.client.get(&url).send().await.map_err(|e| {
                GatewayError::NotReachable {
                    url: url.clone(),
                    source: Box::new(e),
                }
            })?;

            handle_response(&url, response).await
        }

        async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
            &self,
            path: &str,
            body: &B,
        ) -> GatewayResult<T> {
            let url = self.url(path);
            debug!("POST {}", url);
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| GatewayError::NotReachable {
                    url: url.clone(),
                    source: Box::new(e),
                })?;

            handle_response(&url, response).await
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> GatewayResult<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GatewayError::InvalidResponse {
                    url: url.to_string(),
                    source: Box::new(e),
                })
        } else {
            // FastAPI reports errors under "detail", other stacks under "error".
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| {
                    ["error", "detail"]
                        .iter()
                        .find_map(|key| v.get(*key).and_then(|e| e.as_str()).map(String::from))
                })
                .unwrap_or_else(|| status.to_string());

            Err(GatewayError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }

    #[async_trait]
    impl Gateway for HttpGateway {
        fn base_origin(&self) -> &str {
            &self.base_url
        }

        async fn fetch_readings(&self) -> GatewayResult<Reading> {
            self.get("/sensors").await
        }

        async fn fetch_thresholds(&self) -> GatewayResult<ThresholdConfig> {
            self.get("/thresholds").await
        }

        async fn update_thresholds(
            &self,
            update: &ThresholdUpdate,
        ) -> GatewayResult<ThresholdConfig> {
            self.post_json("/thresholds", update).await
        }

        async fn fetch_latest_media(&self) -> GatewayResult<MediaRecord> {
            self.get("/media/latest").await
        }

        async fn fetch_status(&self) -> GatewayResult<ServerStatus> {
            self.get("/status").await
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_gateway_creation() {
            let gateway = HttpGateway::new("http://localhost:8000");
            assert!(gateway.is_ok());

            let gateway = gateway.unwrap();
            assert_eq!(gateway.base_origin(), "http://localhost:8000");
        }

        #[test]
        fn test_gateway_normalizes_url() {
            let gateway = HttpGateway::new("http://host:8000//").unwrap();
            assert_eq!(gateway.base_origin(), "http://host:8000");
            assert_eq!(gateway.url("/sensors"), "http://host:8000/sensors");
        }

        #[test]
        fn test_gateway_invalid_url() {
            let result = HttpGateway::new("host:8000");
            assert!(matches!(result, Err(GatewayError::InvalidUrl(_))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_origin() {
        assert_eq!(
            normalize_origin(" https://fire.example.org/ ").unwrap(),
            "https://fire.example.org"
        );
        assert!(normalize_origin("").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::ApiError {
            status: 422,
            message: "gas_max must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "API error (422): gas_max must be positive");
        assert!(!err.is_unreachable());

        let err = GatewayError::NotReachable {
            url: "http://h/status".to_string(),
            source: "connection refused".into(),
        };
        assert!(err.is_unreachable());
        assert!(err.to_string().contains("http://h/status"));
        assert!(err.to_string().contains("connection refused"));
    }
}
