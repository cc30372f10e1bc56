//! Batch-mode front end: reads from the backend, runs the pipeline and writes
//! the results to disk.

pub mod args;

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, CertificateBackend, HttpBackend};
use crate::certificate::{
    issue_certificate, preview, BatchError, BatchRunner, CertificateRenderer, IssueStatus,
};
use crate::config::AppConfig;
pub use args::{Cli, Commands};

pub async fn execute(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(bin) = cli.typst_bin {
        config.typst_bin = bin;
    }

    let backend = HttpBackend::new(&config.api_url)?;
    log::debug!("Using certificate backend at {}", backend.base_url());

    match cli.command {
        Commands::Events => list_events(&backend).await,
        Commands::Preview { event, json } => show_preview(&backend, event, json).await,
        Commands::Issue {
            event,
            participant,
            out_dir,
        } => issue_one(&backend, &config, event, participant, &out_dir).await,
        Commands::Batch {
            event,
            out_dir,
            concurrency,
        } => {
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency.max(1);
            }
            run_batch(&backend, &config, event, &out_dir).await
        }
        Commands::Attendance { participant, days } => {
            set_attendance(&backend, participant, days.0).await
        }
        Commands::Health => {
            let health = backend.health_check().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(())
        }
    }
}

async fn list_events<B: CertificateBackend>(backend: &B) -> anyhow::Result<()> {
    let events = backend.list_events().await.context("failed to load events")?;
    if events.is_empty() {
        println!("Nenhum evento cadastrado.");
        return Ok(());
    }

    println!("{:>5}  {:<40} {:<30} {:>6} {:>5}", "ID", "Nome", "Datas", "Horas", "Dias");
    for event in events {
        println!(
            "{:>5}  {:<40} {:<30} {:>6} {:>5}",
            event.id, event.name, event.date_range_label, event.total_hours, event.total_days
        );
    }
    Ok(())
}

async fn show_preview<B: CertificateBackend>(
    backend: &B,
    event_id: i64,
    json: bool,
) -> anyhow::Result<()> {
    let event = backend.get_event(event_id).await?;
    let participants = backend.participants_for_event(event_id).await?;
    let table = preview(&event, &participants);

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("{} ({})", event.name, event.date_range_label);
    println!("Participantes com cadastro: {}", table.enrolled);
    println!("Participantes com presença (que receberão certificado): {}", table.eligible);
    println!();
    println!("{:<40} {:<16} {:>9} {:>13}  {}", "Nome", "CPF", "Presenças", "Carga Horária", "Status");
    for row in &table.rows {
        println!(
            "{:<40} {:<16} {:>9} {:>13}  {}",
            row.name,
            row.tax_id,
            format!("{}/{}", row.attended_days, row.total_days),
            format!("{} horas", row.credited_hours),
            row.status
        );
    }
    if table.rows.iter().all(|row| row.status == IssueStatus::NoAttendance) && !table.rows.is_empty() {
        println!();
        println!("Nenhum participante com presença registrada.");
    }
    Ok(())
}

async fn issue_one<B: CertificateBackend>(
    backend: &B,
    config: &AppConfig,
    event_id: i64,
    participant_id: i64,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let event = backend.get_event(event_id).await?;
    let participant = backend
        .participants_for_event(event_id)
        .await?
        .into_iter()
        .find(|p| p.id == participant_id)
        .ok_or(BackendError::ParticipantNotFound(participant_id))?;

    let renderer = CertificateRenderer::new(config.issuer.clone())?;
    let converter = config.converter();
    let file = issue_certificate(&renderer, &converter, &event, &participant).await?;

    let path = write_output(out_dir, &file.file_name, &file.bytes).await?;
    println!("Certificado gerado: {}", path.display());
    Ok(())
}

async fn run_batch<B: CertificateBackend>(
    backend: &B,
    config: &AppConfig,
    event_id: i64,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let event = backend.get_event(event_id).await?;
    let participants = backend.participants_for_event(event_id).await?;

    let renderer = CertificateRenderer::new(config.issuer.clone())?;
    let runner = BatchRunner::new(renderer, config.converter()).with_concurrency(config.concurrency);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received, stopping after the current certificate");
                cancel.cancel();
            }
        })
    };

    let mut last_reported = 0u32;
    let result = runner
        .run(
            &event,
            &participants,
            |progress| {
                let percent = (progress * 100.0).round() as u32;
                if percent >= last_reported + 10 || percent == 100 {
                    log::info!("Gerando {}%...", percent);
                    last_reported = percent;
                }
            },
            &cancel,
        )
        .await;
    ctrl_c.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(BatchError::BatchProducedNoOutput { failures }) => {
            for failure in &failures {
                eprintln!("  {} ({}): {}", failure.participant_name, failure.participant_id, failure.reason);
            }
            bail!("Nenhum certificado foi gerado.");
        }
        Err(BatchError::NoEligibleParticipants { .. }) => {
            bail!("Nenhum participante com presença registrada. Não é possível gerar certificados.")
        }
        Err(BatchError::NoParticipants { .. }) => bail!("Não há participantes para este evento!"),
        Err(e) => return Err(e.into()),
    };

    let path = write_output(out_dir, &outcome.file_name, &outcome.archive).await?;
    println!(
        "Certificados gerados com sucesso! Total: {} certificados.",
        outcome.success_count
    );
    println!("Arquivo: {}", path.display());

    if !outcome.failures.is_empty() {
        eprintln!("{} certificado(s) não puderam ser gerados:", outcome.failures.len());
        for failure in &outcome.failures {
            eprintln!("  {} ({}): {}", failure.participant_name, failure.participant_id, failure.reason);
        }
    }
    Ok(())
}

async fn set_attendance<B: CertificateBackend>(
    backend: &B,
    participant_id: i64,
    mut days: Vec<bool>,
) -> anyhow::Result<()> {
    let participant = backend
        .list_participants()
        .await?
        .into_iter()
        .find(|p| p.id == participant_id)
        .ok_or(BackendError::ParticipantNotFound(participant_id))?;
    let event = backend.get_event(participant.event_id).await?;

    days.resize(event.total_days as usize, false);
    backend
        .update_attendance(participant_id, &days)
        .await
        .with_context(|| format!("failed to update attendance of {}", participant.name))?;

    println!(
        "Frequência de {} atualizada: {}/{} dia(s).",
        participant.name,
        days.iter().filter(|d| **d).count(),
        event.total_days
    );
    Ok(())
}

async fn write_output(out_dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let path = out_dir.join(sanitize_filename::sanitize(file_name));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
