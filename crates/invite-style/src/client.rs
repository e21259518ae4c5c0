//! HTTP style-transfer client.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::adapter::StyleAdapter;
use crate::error::{StyleError, StyleResult};
use crate::types::{ErrorBody, HealthResponse, StyleRequest, StyleResponse};

/// Configuration for the style client.
#[derive(Debug, Clone)]
pub struct StyleClientConfig {
    /// Base URL of the style service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries on retryable errors
    pub max_retries: u32,
}

impl Default for StyleClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8010".to_string(),
            timeout: Duration::from_secs(900), // provider renders can take many minutes
            max_retries: 1,
        }
    }
}

impl StyleClientConfig {
    /// Create config from environment variables.
    ///
    /// Returns `None` when `STYLE_SERVICE_URL` is unset, meaning no styling
    /// service is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("STYLE_SERVICE_URL").ok()?;
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return None;
        }

        Some(Self {
            base_url,
            timeout: Duration::from_secs(
                std::env::var("STYLE_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            max_retries: std::env::var("STYLE_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        })
    }
}

/// [`StyleAdapter`] talking JSON to the style service.
pub struct HttpStyleAdapter {
    http: Client,
    config: StyleClientConfig,
}

impl HttpStyleAdapter {
    pub fn new(config: StyleClientConfig) -> StyleResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(StyleError::Network)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StyleClientConfig {
        &self.config
    }

    /// Check if the style service is healthy.
    pub async fn health_check(&self) -> StyleResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Style service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Style service health check error: {}", e);
                Ok(false)
            }
        }
    }

    async fn request_once(&self, request: &StyleRequest) -> StyleResult<PathBuf> {
        let url = format!("{}/v1/style", self.config.base_url);
        let timeout_secs = self.config.timeout.as_secs();

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| StyleError::from_transport(e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .ok()
                .filter(|e| !e.is_empty())
                .unwrap_or(body);
            return Err(classify_status(status, detail, timeout_secs));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StyleError::from_transport(e, timeout_secs))?;
        let parsed: StyleResponse = serde_json::from_slice(&bytes)
            .map_err(|e| StyleError::InvalidResponse(e.to_string()))?;

        if parsed.output_path.as_os_str().is_empty() {
            return Err(StyleError::InvalidResponse("empty output_path".to_string()));
        }

        Ok(parsed.output_path)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> StyleResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StyleResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Style request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn classify_status(status: StatusCode, detail: String, timeout_secs: u64) -> StyleError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StyleError::Timeout(timeout_secs),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            StyleError::Unsupported(format!("{}: {}", status, detail))
        }
        StatusCode::TOO_MANY_REQUESTS => StyleError::Unavailable(format!("{}: {}", status, detail)),
        s if s.is_server_error() => StyleError::Unavailable(format!("{}: {}", status, detail)),
        _ => StyleError::RequestFailed(format!("Style service returned {}: {}", status, detail)),
    }
}

#[async_trait]
impl StyleAdapter for HttpStyleAdapter {
    async fn apply_style(&self, request: &StyleRequest) -> StyleResult<PathBuf> {
        debug!(
            style = %request.style,
            video = %request.video_path.display(),
            "Sending style transfer request to {}",
            self.config.base_url
        );

        let output = self.with_retry(|| self.request_once(request)).await?;

        info!(style = %request.style, output = %output.display(), "Style transfer finished");
        Ok(output)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_models::StyleTag;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> StyleRequest {
        StyleRequest {
            video_path: PathBuf::from("/out/s1/job/enhanced.mp4"),
            style: StyleTag::Ghibli,
            prompt: StyleTag::Ghibli.compose_prompt(None),
            output_dir: PathBuf::from("/out/s1/job"),
        }
    }

    fn client(server: &MockServer, timeout: Duration, max_retries: u32) -> HttpStyleAdapter {
        HttpStyleAdapter::new(StyleClientConfig {
            base_url: server.uri(),
            timeout,
            max_retries,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = StyleClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(900));
        assert_eq!(config.max_retries, 1);
    }

    #[tokio::test]
    async fn test_apply_style_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/style"))
            .and(body_partial_json(json!({
                "style": "ghibli",
                "video_path": "/out/s1/job/enhanced.mp4"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"output_path": "/out/s1/job/styled.mp4"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let adapter = client(&server, Duration::from_secs(5), 0);
        let output = adapter.apply_style(&request()).await.unwrap();
        assert_eq!(output, PathBuf::from("/out/s1/job/styled.mp4"));
    }

    #[tokio::test]
    async fn test_unavailable_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/style"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/style"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output_path": "/tmp/styled.mp4"})))
            .with_priority(2)
            .mount(&server)
            .await;

        let adapter = client(&server, Duration::from_secs(5), 1);
        let output = adapter.apply_style(&request()).await.unwrap();
        assert_eq!(output, PathBuf::from("/tmp/styled.mp4"));
    }

    #[tokio::test]
    async fn test_unsupported_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/style"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": "unknown style"})))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = client(&server, Duration::from_secs(5), 3);
        let err = adapter.apply_style(&request()).await.unwrap_err();
        assert!(matches!(err, StyleError::Unsupported(ref m) if m.contains("unknown style")));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/style"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"output_path": "/tmp/styled.mp4"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let adapter = client(&server, Duration::from_millis(200), 0);
        let err = adapter.apply_style(&request()).await.unwrap_err();
        assert!(matches!(err, StyleError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_output_path_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/style"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let adapter = client(&server, Duration::from_secs(5), 0);
        let err = adapter.apply_style(&request()).await.unwrap_err();
        assert!(matches!(err, StyleError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(&server)
            .await;

        let adapter = client(&server, Duration::from_secs(5), 0);
        assert!(adapter.health_check().await.unwrap());
    }
}
