//! Single certificate for one participant.

use thiserror::Error;

use super::common::certificate_file_name;
use super::eligibility::compute_eligibility;
use super::template::CertificateRenderer;
use super::traits::{DocumentConverter, Validator};
use super::validation::ValidationErrors;
use super::{GeneratedFile, RenderFailure};
use crate::models::{Event, Participant};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("event cannot issue certificates: {0}")]
    InvalidEvent(#[from] ValidationErrors),
    #[error("participant {participant_id} is not enrolled in event {event_id}")]
    WrongEvent { participant_id: i64, event_id: i64 },
    #[error("participant {participant_id} has no recorded attendance")]
    NotEligible { participant_id: i64 },
    #[error("failed to generate certificate: {0}")]
    Render(#[from] RenderFailure),
}

pub async fn issue_certificate<C>(
    renderer: &CertificateRenderer,
    converter: &C,
    event: &Event,
    participant: &Participant,
) -> Result<GeneratedFile, IssueError>
where
    C: DocumentConverter + ?Sized,
{
    event.validate()?;

    if participant.event_id != event.id {
        return Err(IssueError::WrongEvent {
            participant_id: participant.id,
            event_id: event.id,
        });
    }

    let eligibility = compute_eligibility(event, participant);
    if !eligibility.is_eligible() {
        return Err(IssueError::NotEligible {
            participant_id: participant.id,
        });
    }

    let document = renderer.render(participant, event, &eligibility);
    let bytes = converter.convert(&document).await?;
    log::info!(
        "Issued certificate {} ({} hours) for {}",
        document.code,
        eligibility.credited_hours,
        participant.name
    );

    Ok(GeneratedFile {
        file_name: certificate_file_name(&participant.name),
        bytes,
    })
}
