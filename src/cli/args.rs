//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "certificate-issuer",
    version,
    about = "Emissão de certificados de eventos em PDF, individual ou em lote"
)]
pub struct Cli {
    /// Certificate backend base URL
    #[arg(long, global = true, env = "CERTIFICATE_API_URL")]
    pub api_url: Option<String>,

    /// Path to the typst binary
    #[arg(long, global = true, env = "TYPST_BIN")]
    pub typst_bin: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered events
    Events,
    /// Show attendance, credited hours and issue status for an event
    Preview {
        #[arg(long)]
        event: i64,
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate one participant's certificate
    Issue {
        #[arg(long)]
        event: i64,
        #[arg(long)]
        participant: i64,
        /// Directory to write the PDF into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Generate every eligible certificate of an event into one ZIP
    Batch {
        #[arg(long)]
        event: i64,
        /// Directory to write the archive into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Certificates converted at the same time (overrides BATCH_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Replace a participant's attendance, e.g. --days 1,0,1
    Attendance {
        #[arg(long)]
        participant: i64,
        #[arg(long, value_parser = parse_days)]
        days: Attendance,
    },
    /// Check that the backend is reachable
    Health,
}

/// Parsed `--days` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attendance(pub Vec<bool>);

/// Accepts `1`/`0`, `true`/`false`, `p`/`f` (presente/falta), comma separated.
pub fn parse_days(value: &str) -> Result<Attendance, String> {
    if value.trim().is_empty() {
        return Ok(Attendance(Vec::new()));
    }

    value
        .split(',')
        .map(|day| match day.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "p" => Ok(true),
            "0" | "false" | "f" | "" => Ok(false),
            other => Err(format!("valor de presença inválido: '{}'", other)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Attendance)
}
