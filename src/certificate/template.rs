//! Certificate templating.
//!
//! A certificate is emitted as Typst source. Everything that comes from the
//! backend or the issuer profile is bound once as an escaped string literal in
//! a `cert` dictionary; the page markup only refers to those bindings, so no
//! participant-entered text is ever parsed as markup.

use serde::Deserialize;
use std::fs;

use super::common::{get_static_dir, typst_string};
use super::eligibility::EligibilityResult;
use super::CertificateError;
use crate::models::{Event, Participant};

const STYLE_FILE: &str = "certificate.typ";

const FRONT_MARKUP: &str = r#"#certificate-page[
  #align(center)[
    #text(size: 18pt, weight: "bold")[#cert.municipality] \
    #text(size: 14pt)[#cert.department] \
    #text(size: 10pt)[CNPJ #cert.cnpj]
  ]
  #rule()
  #align(center, text(size: 24pt, weight: "bold")[C E R T I F I C A D O])
  #v(0.6em)
  #align(center)[
    #set text(size: 14pt)
    #set par(leading: 0.9em)
    Certificamos que *#cert.participant*, \
    CPF #cert.tax_id, participou de *#cert.event*, \
    oferecido pela #cert.offered_by, \
    nos dias #cert.dates, \
    perfazendo a carga horária de #cert.hours horas.
  ]
  #rule()
  #align(center, text(size: 20pt, weight: "bold")[#cert.participant])
  #rule()
  #v(1fr)
  #grid(
    columns: (1fr, 1fr),
    align(center)[*#cert.signatory_name* \ #text(size: 11pt)[#cert.signatory_title]],
    align(right + bottom)[#text(size: 9pt)[Código: #cert.code]],
  )
  #logo-slot()
]
"#;

const BACK_MARKUP: &str = r#"#certificate-page[
  #align(center, text(size: 20pt, weight: "bold", fill: accent)[#cert.outline_title])
  #v(1.2em)
  #set text(size: 12pt)
  #list(spacing: 0.7em, ..cert.outline)
]
"#;

/// Institutional texts printed on every certificate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IssuerProfile {
    pub municipality: String,
    pub department: String,
    pub cnpj: String,
    /// Completes "oferecido pela ..." in the certificate sentence.
    pub offered_by: String,
    pub signatory_name: String,
    pub signatory_title: String,
    pub outline_title: String,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        Self {
            municipality: "MUNICÍPIO DE CORONEL VIVIDA".to_string(),
            department: "Secretaria Municipal de Educação, Cultura e Desporto".to_string(),
            cnpj: "76.995.455/0001-56".to_string(),
            offered_by: "Sec. Mun. de Educação Cul. e Desporto de Coronel Vivida".to_string(),
            signatory_name: "Grasieil Cerbatto".to_string(),
            signatory_title: "Sec. Mun. de Educação Cul. e Desporto".to_string(),
            outline_title: "CONTEÚDO PROGRAMÁTICO".to_string(),
        }
    }
}

/// Self-contained Typst source for one participant's certificate.
///
/// Holds the pages separately so the converter decides page geometry and
/// page breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub participant_id: i64,
    pub code: String,
    pub style: String,
    pub bindings: String,
    pub front: String,
    pub back: String,
}

/// `CERT-{participant}-{event}`, printed on the front page.
pub fn certificate_code(participant: &Participant, event: &Event) -> String {
    format!("CERT-{}-{}", participant.id, event.id)
}

/// Renders certificates from the static style and an issuer profile.
#[derive(Debug, Clone)]
pub struct CertificateRenderer {
    style: String,
    issuer: IssuerProfile,
}

impl CertificateRenderer {
    /// Load the static style shipped with the crate.
    pub fn new(issuer: IssuerProfile) -> Result<Self, CertificateError> {
        let style_path = get_static_dir().join(STYLE_FILE);
        let style = fs::read_to_string(&style_path).map_err(CertificateError::TemplateIo)?;
        Ok(Self { style, issuer })
    }

    pub fn with_style(style: impl Into<String>, issuer: IssuerProfile) -> Self {
        Self {
            style: style.into(),
            issuer,
        }
    }

    pub fn issuer(&self) -> &IssuerProfile {
        &self.issuer
    }

    pub fn render(
        &self,
        participant: &Participant,
        event: &Event,
        eligibility: &EligibilityResult,
    ) -> RenderedDocument {
        let code = certificate_code(participant, event);

        RenderedDocument {
            participant_id: participant.id,
            bindings: self.render_bindings(participant, event, eligibility, &code),
            code,
            style: self.style.clone(),
            front: FRONT_MARKUP.to_string(),
            back: BACK_MARKUP.to_string(),
        }
    }

    fn render_bindings(
        &self,
        participant: &Participant,
        event: &Event,
        eligibility: &EligibilityResult,
        code: &str,
    ) -> String {
        let issuer = &self.issuer;
        let outline = typst_array(&event.outline_items());

        format!(
            r#"#let cert = (
  municipality: {},
  department: {},
  cnpj: {},
  offered_by: {},
  signatory_name: {},
  signatory_title: {},
  outline_title: {},
  participant: {},
  tax_id: {},
  event: {},
  dates: {},
  hours: {},
  code: {},
  outline: {},
)
"#,
            typst_string(&issuer.municipality),
            typst_string(&issuer.department),
            typst_string(&issuer.cnpj),
            typst_string(&issuer.offered_by),
            typst_string(&issuer.signatory_name),
            typst_string(&issuer.signatory_title),
            typst_string(&issuer.outline_title),
            typst_string(&participant.name.trim().to_uppercase()),
            typst_string(&participant.tax_id),
            typst_string(&event.name),
            typst_string(&event.date_range_label),
            typst_string(&eligibility.credited_hours.to_string()),
            typst_string(code),
            outline,
        )
    }
}

/// Typst array literal; a single element needs the trailing comma.
fn typst_array(items: &[&str]) -> String {
    let mut literal = String::from("(");
    for item in items {
        literal.push_str(&typst_string(item));
        literal.push_str(", ");
    }
    if items.len() == 1 {
        literal.truncate(literal.len() - 1);
    } else if !items.is_empty() {
        literal.truncate(literal.len() - 2);
    }
    literal.push(')');
    literal
}
