//! Attendance → credited hours.

use serde::Serialize;

use crate::models::{Event, Participant};

/// Derived from an event and one participant's attendance; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EligibilityResult {
    pub attended_days: u32,
    pub total_days: u32,
    pub credited_hours: u32,
}

impl EligibilityResult {
    /// A certificate is issued for at least one day of presence.
    pub fn is_eligible(&self) -> bool {
        self.attended_days > 0
    }
}

/// Count attended days and credit hours in proportion.
///
/// Every `true` entry counts as an attended day; a short attendance vector
/// means the missing days were absences. Credited hours are rounded half up.
/// A vector longer than the event can therefore credit more than its total.
///
/// The event must have `total_days >= 1` (see the `Validator` impl for
/// `Event`); a zero-day event credits nothing instead of dividing by zero.
pub fn compute_eligibility(event: &Event, participant: &Participant) -> EligibilityResult {
    let attended_days = participant
        .attendance
        .iter()
        .filter(|present| **present)
        .count() as u32;

    let credited_hours = if event.total_days == 0 {
        0
    } else {
        round_half_up(event.total_hours * f64::from(attended_days) / f64::from(event.total_days))
    };

    EligibilityResult {
        attended_days,
        total_days: event.total_days,
        credited_hours,
    }
}

fn round_half_up(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value + 0.5).floor() as u32
}
