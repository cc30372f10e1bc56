//! Certificate backend - the REST service that owns events, participants
//! and attendance.
//!
//! The pipeline only reads snapshots through `CertificateBackend`; attendance
//! updates go through the same trait for the CLI.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Event, Participant};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to certificate backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("certificate backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("event {0} not found")]
    EventNotFound(i64),
    #[error("participant {0} not found")]
    ParticipantNotFound(i64),
}

#[async_trait]
pub trait CertificateBackend: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError>;

    /// Every participant of every event; filter with `participants_for_event`.
    async fn list_participants(&self) -> Result<Vec<Participant>, BackendError>;

    async fn update_attendance(
        &self,
        participant_id: i64,
        attendance: &[bool],
    ) -> Result<(), BackendError>;

    async fn health_check(&self) -> Result<serde_json::Value, BackendError>;

    async fn get_event(&self, event_id: i64) -> Result<Event, BackendError> {
        self.list_events()
            .await?
            .into_iter()
            .find(|event| event.id == event_id)
            .ok_or(BackendError::EventNotFound(event_id))
    }

    async fn participants_for_event(&self, event_id: i64) -> Result<Vec<Participant>, BackendError> {
        let participants = self.list_participants().await?;
        Ok(participants
            .into_iter()
            .filter(|p| p.event_id == event_id)
            .collect())
    }
}
