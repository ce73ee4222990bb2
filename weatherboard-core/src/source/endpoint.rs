use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{
    error::{FetchError, FetchResult, truncate_body},
    model::{self, SnapshotBatch},
};

use super::WeatherSource;

/// The dashboard's own JSON endpoint: one GET returns the whole batch.
#[derive(Debug, Clone)]
pub struct EndpointSource {
    url: String,
    http: Client,
}

impl EndpointSource {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("weatherboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { url, http })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WeatherSource for EndpointSource {
    async fn fetch_batch(&self) -> FetchResult<SnapshotBatch> {
        debug!(url = %self.url, "requesting weather batch");

        let res = self.http.get(&self.url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        model::decode_batch(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/api/weather")
    }

    // Loopback only; ignore any proxy set in the environment.
    fn source(url: String) -> EndpointSource {
        let http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        EndpointSource { url, http }
    }

    #[tokio::test]
    async fn server_error_becomes_status_with_truncated_body() {
        let url = serve_once("500 Internal Server Error", "x".repeat(300)).await;

        let err = source(url).fetch_batch().await.unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, format!("{}...", "x".repeat(200)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_decodes_the_batch() {
        let body = r#"[{"city": "Delhi", "current_temp": 33, "max_temp": 36, "min_temp": 28,
            "feels_like": 35, "condition": "haze", "humidity": 38, "wind_speed": 3.6}]"#;
        let url = serve_once("200 OK", body.to_string()).await;

        let batch = source(url).fetch_batch().await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].city, "Delhi");
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let url = serve_once("200 OK", "<html>oops</html>".to_string()).await;

        let err = source(url).fetch_batch().await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
