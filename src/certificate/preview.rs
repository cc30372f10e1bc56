//! Eligibility table shown before a batch is started.

use serde::Serialize;
use std::fmt;

use super::eligibility::compute_eligibility;
use crate::models::{Event, Participant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    CanIssue,
    NoAttendance,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CanIssue => f.write_str("Pode emitir"),
            Self::NoAttendance => f.write_str("Sem presenças"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub participant_id: i64,
    pub name: String,
    pub tax_id: String,
    pub attended_days: u32,
    pub total_days: u32,
    pub credited_hours: u32,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityPreview {
    pub event_id: i64,
    pub enrolled: usize,
    pub eligible: usize,
    pub rows: Vec<PreviewRow>,
}

/// One row per participant of `event`, in input order.
pub fn preview(event: &Event, participants: &[Participant]) -> EligibilityPreview {
    let rows: Vec<PreviewRow> = participants
        .iter()
        .filter(|p| p.event_id == event.id)
        .map(|p| {
            let eligibility = compute_eligibility(event, p);
            PreviewRow {
                participant_id: p.id,
                name: p.name.clone(),
                tax_id: p.tax_id.clone(),
                attended_days: eligibility.attended_days,
                total_days: eligibility.total_days,
                credited_hours: eligibility.credited_hours,
                status: if eligibility.is_eligible() {
                    IssueStatus::CanIssue
                } else {
                    IssueStatus::NoAttendance
                },
            }
        })
        .collect();

    EligibilityPreview {
        event_id: event.id,
        enrolled: rows.len(),
        eligible: rows
            .iter()
            .filter(|row| row.status == IssueStatus::CanIssue)
            .count(),
        rows,
    }
}
