//! Secondary connectivity check against the gateway's HTTP listener.

use std::time::Duration;

use async_trait::async_trait;
use gatewatch_core::ports::HealthCheck;
use reqwest::{Client, StatusCode};
use tracing::debug;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// `HEAD /` on the loopback address; only a 200 counts as healthy.
pub struct HttpHealthCheck {
    client: Client,
    url: String,
}

impl HttpHealthCheck {
    pub fn new(port: u16) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(HEALTH_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: format!("http://127.0.0.1:{port}/"),
        })
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(url = %self.url, error = %e, "Health request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response and return the bound port.
    async fn serve_once(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        port
    }

    #[tokio::test]
    async fn ok_response_is_healthy() {
        let port =
            serve_once("HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;
        assert!(HttpHealthCheck::new(port).unwrap().check().await);
    }

    #[tokio::test]
    async fn server_error_is_unhealthy() {
        let port = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        assert!(!HttpHealthCheck::new(port).unwrap().check().await);
    }

    #[tokio::test]
    async fn refused_connection_is_unhealthy() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(!HttpHealthCheck::new(port).unwrap().check().await);
    }
}
