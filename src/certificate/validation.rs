//! Event checks run before any certificate is rendered.
//!
//! Every problem is collected so the operator can fix the event in one pass.
//! Messages are in Portuguese because they go straight to the operator.

use std::fmt;
use thiserror::Error;

use super::traits::Validator;
use crate::models::Event;

/// One rejected event field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{field}] {message}")]
pub struct ValidationError {
    /// Backend field name, e.g. `evento.dias`.
    pub field: &'static str,
    pub message: String,
    pub hint: Option<&'static str>,
}

impl ValidationError {
    fn blank(field: &'static str, label: &str) -> Self {
        Self {
            field,
            message: format!("{} não pode ficar em branco", label),
            hint: None,
        }
    }

    fn no_days(field: &'static str) -> Self {
        Self {
            field,
            message: "O evento precisa ter pelo menos 1 dia".to_string(),
            hint: Some("Informe o número de dias do evento, por exemplo: 3"),
        }
    }

    fn bad_hours(field: &'static str, value: f64) -> Self {
        Self {
            field,
            message: format!("Carga horária '{}' inválida", value),
            hint: Some("Use um número de horas maior ou igual a zero"),
        }
    }
}

/// Every problem found in one event.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    fn check(&mut self, ok: bool, error: impl FnOnce() -> ValidationError) {
        if !ok {
            self.0.push(error());
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evento inválido: {} problema(s)", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
            if let Some(hint) = error.hint {
                write!(f, " ({})", hint)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Validator for Event {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        errors.check(!self.name.trim().is_empty(), || {
            ValidationError::blank("evento.nome", "Nome do evento")
        });
        // Divisor of the credited-hours formula.
        errors.check(self.total_days > 0, || ValidationError::no_days("evento.dias"));
        errors.check(self.total_hours.is_finite() && self.total_hours >= 0.0, || {
            ValidationError::bad_hours("evento.carga_horaria", self.total_hours)
        });

        errors.finish()
    }
}
