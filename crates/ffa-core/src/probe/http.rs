use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ProbeError, ProbeSuccess, UrlProber};

/// HTTP-based prober with connection pooling and a hard per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        let client = Self::build_client(timeout);
        Self { client, timeout }
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &crate::config::WorkerConfig) -> Self {
        Self::new(config.ping_timeout)
    }

    pub fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .pool_max_idle_per_host(20)
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client")
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl UrlProber for HttpProber {
    async fn probe(&self, url: &str) -> Result<ProbeSuccess, ProbeError> {
        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let elapsed = start.elapsed().as_millis() as u64;
                let status = response.status().as_u16();
                debug!(url, status, elapsed_ms = elapsed, "Probe completed");
                Ok(ProbeSuccess {
                    status_code: status,
                    response_time_ms: elapsed,
                })
            }
            Err(e) => {
                if e.is_timeout() {
                    Err(ProbeError::Timeout {
                        url: url.to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    })
                } else if e.is_connect() {
                    Err(ProbeError::Connect {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
                } else {
                    Err(ProbeError::Network {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn probe_reports_status_and_latency_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5));
        let result = prober.probe(&server.uri()).await.unwrap();
        assert_eq!(result.status_code, 200);
    }

    #[tokio::test]
    async fn probe_treats_500_as_completed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5));
        let result = prober.probe(&server.uri()).await.unwrap();
        assert_eq!(result.status_code, 500);
    }

    #[tokio::test]
    async fn probe_treats_404_as_completed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5));
        let result = prober.probe(&server.uri()).await.unwrap();
        assert_eq!(result.status_code, 404);
    }

    #[tokio::test]
    async fn probe_fails_on_unreachable_host() {
        // Port 1 on localhost: connection refused, no status code.
        let prober = HttpProber::new(Duration::from_secs(2));
        let err = prober.probe("http://127.0.0.1:1/").await.unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn probe_times_out_on_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_millis(200));
        let err = prober.probe(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
    }
}
