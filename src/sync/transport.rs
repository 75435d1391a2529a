//! Delivery of configuration payloads to a server's management API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::error::PushError;

/// Sends a complete configuration document to one server.
#[async_trait]
pub trait ConfigTransport: Send + Sync {
    /// Deliver `payload`. Only an HTTP 200 counts as success.
    async fn load(&self, server: &str, payload: Vec<u8>) -> Result<(), PushError>;
}

/// `POST http://<server>:<admin_port>/load` over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    admin_port: u16,
}

impl HttpTransport {
    pub fn new(admin_port: u16) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(PushError::Transport)?;
        Ok(Self { client, admin_port })
    }

    pub fn load_url(&self, server: &str) -> String {
        format!("http://{}:{}/load", server, self.admin_port)
    }
}

#[async_trait]
impl ConfigTransport for HttpTransport {
    async fn load(&self, server: &str, payload: Vec<u8>) -> Result<(), PushError> {
        let response = self
            .client
            .post(self.load_url(server))
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(PushError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(PushError::Body)?;

        if status != StatusCode::OK {
            return Err(PushError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
