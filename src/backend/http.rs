use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::{BackendError, CertificateBackend};
use crate::models::{AttendanceUpdate, Event, Participant};

/// reqwest client for the certificate REST backend.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("certificate-issuer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Turn a non-2xx response into `BackendError::Status`, preferring the
/// backend's `{"error": "..."}` message.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    log::error!("Certificate backend request failed ({}): {}", status, message);
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CertificateBackend for HttpBackend {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        self.get_json("eventos").await
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, BackendError> {
        self.get_json("participantes").await
    }

    async fn update_attendance(
        &self,
        participant_id: i64,
        attendance: &[bool],
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("participantes/{}/frequencia", participant_id));
        log::debug!("PUT {}", url);

        let response = self
            .client
            .put(&url)
            .json(&AttendanceUpdate { attendance })
            .send()
            .await?;
        check_status(response).await?;

        log::info!(
            "Attendance of participant {} updated ({} day(s) present)",
            participant_id,
            attendance.iter().filter(|d| **d).count()
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<Value, BackendError> {
        self.get_json("health").await
    }
}
