//! Batch certificate runs.
//!
//! One run takes an event snapshot and its participants, renders and converts
//! a certificate for everyone who attended at least one day, and packs the
//! PDFs into a single ZIP. A failed conversion is recorded and the run moves
//! on; only a run that produced nothing at all fails as a whole.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::archive::{self, ArchiveError};
use super::common::{archive_file_name, certificate_file_name, certificate_name_stem};
use super::eligibility::compute_eligibility;
use super::template::CertificateRenderer;
use super::traits::{DocumentConverter, Validator};
use super::validation::ValidationErrors;
use super::{GeneratedFile, RenderFailure};
use crate::models::{Event, Participant};

/// A participant whose certificate could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub participant_id: i64,
    pub participant_name: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    /// ZIP archive bytes.
    pub archive: Vec<u8>,
    /// Suggested name for saving the archive.
    pub file_name: String,
    pub success_count: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("event cannot issue certificates: {0}")]
    InvalidEvent(#[from] ValidationErrors),
    #[error("event {event_id} has no participants")]
    NoParticipants { event_id: i64 },
    #[error("no participant of event {event_id} has any recorded attendance")]
    NoEligibleParticipants { event_id: i64 },
    #[error("no certificate could be generated ({} failure(s))", .failures.len())]
    BatchProducedNoOutput { failures: Vec<BatchFailure> },
    #[error("batch cancelled after {completed} of {total} certificate(s)")]
    Cancelled { completed: usize, total: usize },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("archive task failed: {0}")]
    PackTask(#[from] tokio::task::JoinError),
}

/// Runs batches with one renderer and one converter.
pub struct BatchRunner<C> {
    renderer: CertificateRenderer,
    converter: C,
    concurrency: usize,
}

impl<C: DocumentConverter> BatchRunner<C> {
    pub fn new(renderer: CertificateRenderer, converter: C) -> Self {
        Self {
            renderer,
            converter,
            concurrency: 1,
        }
    }

    /// Convert up to `concurrency` certificates at a time (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn renderer(&self) -> &CertificateRenderer {
        &self.renderer
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Generate certificates for every eligible participant of `event`.
    ///
    /// Participants enrolled in other events are ignored. `on_progress`
    /// receives `k / n` after the k-th of n eligible participants has been
    /// processed, whether it succeeded or failed. `cancel` is checked before
    /// each participant starts; conversions already running are finished.
    pub async fn run<F>(
        &self,
        event: &Event,
        participants: &[Participant],
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, BatchError>
    where
        F: FnMut(f64),
    {
        event.validate()?;

        let enrolled: Vec<&Participant> = participants
            .iter()
            .filter(|p| p.event_id == event.id)
            .collect();
        if enrolled.is_empty() {
            return Err(BatchError::NoParticipants { event_id: event.id });
        }

        let eligible: Vec<_> = enrolled
            .into_iter()
            .map(|p| (p, compute_eligibility(event, p)))
            .filter(|(_, eligibility)| eligibility.is_eligible())
            .collect();
        if eligible.is_empty() {
            return Err(BatchError::NoEligibleParticipants { event_id: event.id });
        }

        let run_id = Uuid::new_v4();
        let total = eligible.len();
        log::info!(
            "[{}] Generating {} certificate(s) for event {} ({})",
            run_id,
            total,
            event.id,
            event.name
        );

        let mut items = stream::iter(eligible.iter().enumerate())
            .map(|(index, (participant, eligibility))| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                let document = self.renderer.render(participant, event, eligibility);
                let result = self.converter.convert(&document).await;
                Some((index, *participant, result))
            })
            .buffer_unordered(self.concurrency);

        let mut processed: Vec<(usize, &Participant, Result<Vec<u8>, RenderFailure>)> =
            Vec::with_capacity(total);
        let mut cancelled = false;

        while let Some(item) = items.next().await {
            let Some((index, participant, result)) = item else {
                cancelled = true;
                continue;
            };

            if let Err(ref e) = result {
                log::warn!(
                    "[{}] Certificate for participant {} ({}) failed: {}",
                    run_id,
                    participant.id,
                    participant.name,
                    e
                );
            }
            processed.push((index, participant, result));
            on_progress(processed.len() as f64 / total as f64);
        }
        drop(items);

        if cancelled {
            log::info!(
                "[{}] Batch cancelled after {} of {} certificate(s)",
                run_id,
                processed.len(),
                total
            );
            return Err(BatchError::Cancelled {
                completed: processed.len(),
                total,
            });
        }

        // Names are handed out in input order so collisions resolve the same
        // way regardless of which conversion finished first.
        processed.sort_by_key(|(index, _, _)| *index);

        let mut names = FileNames::default();
        let mut files = Vec::with_capacity(processed.len());
        let mut failures = Vec::new();
        for (_, participant, result) in processed {
            match result {
                Ok(bytes) => files.push(GeneratedFile {
                    file_name: names.assign(participant),
                    bytes,
                }),
                Err(e) => failures.push(BatchFailure {
                    participant_id: participant.id,
                    participant_name: participant.name.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if files.is_empty() {
            log::error!(
                "[{}] Every certificate failed for event {} ({} failure(s))",
                run_id,
                event.id,
                failures.len()
            );
            return Err(BatchError::BatchProducedNoOutput { failures });
        }

        let success_count = files.len();
        let archive = tokio::task::spawn_blocking(move || archive::pack(&files)).await??;

        log::info!(
            "[{}] Batch finished: {} certificate(s), {} failure(s), archive {} bytes",
            run_id,
            success_count,
            failures.len(),
            archive.len()
        );

        Ok(BatchOutcome {
            run_id,
            archive,
            file_name: archive_file_name(&event.name, Utc::now().date_naive()),
            success_count,
            failures,
        })
    }
}

/// Hands out unique archive entry names.
#[derive(Debug, Default)]
struct FileNames {
    taken: HashSet<String>,
}

impl FileNames {
    /// `certificado-{name}.pdf`, then `-{id}`, then a counter.
    fn assign(&mut self, participant: &Participant) -> String {
        let mut candidate = certificate_file_name(&participant.name);

        if self.taken.contains(&candidate) {
            let stem = certificate_name_stem(&participant.name);
            candidate = format!("certificado-{}-{}.pdf", stem, participant.id);

            let mut counter = 2;
            while self.taken.contains(&candidate) {
                candidate = format!("certificado-{}-{}-{}.pdf", stem, participant.id, counter);
                counter += 1;
            }
        }

        self.taken.insert(candidate.clone());
        candidate
    }
}
