use serde::{Deserialize, Serialize};

/// A training event as stored by the certificate backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    /// Free-form label printed on the certificate, e.g. "10, 11 e 12 de julho de 2025".
    #[serde(rename = "datas", default)]
    pub date_range_label: String,
    #[serde(rename = "carga_horaria")]
    pub total_hours: f64,
    #[serde(rename = "dias")]
    pub total_days: u32,
    /// One outline item per line.
    #[serde(rename = "conteudo", default)]
    pub content_outline: String,
}

impl Event {
    /// Outline items in order, trimmed, blank lines dropped.
    pub fn outline_items(&self) -> Vec<&str> {
        self.content_outline
            .split('\n')
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// A participant enrolled in exactly one event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    /// CPF, kept as the display string entered by the operator.
    #[serde(rename = "cpf", default)]
    pub tax_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "evento_id")]
    pub event_id: i64,
    /// Presence per event day; a missing entry means absent.
    #[serde(rename = "frequencia", default)]
    pub attendance: Vec<bool>,
}

#[derive(Serialize, Debug)]
pub struct AttendanceUpdate<'a> {
    #[serde(rename = "frequencia")]
    pub attendance: &'a [bool],
}
