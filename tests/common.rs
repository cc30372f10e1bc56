#![allow(dead_code)]

use async_trait::async_trait;
use certificate_issuer::certificate::{
    CertificateRenderer, DocumentConverter, IssuerProfile, RenderFailure, RenderedDocument,
};
use certificate_issuer::models::{Event, Participant};
use lopdf::{dictionary, Document, Object};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn test_event(id: i64, total_hours: f64, total_days: u32) -> Event {
    Event {
        id,
        name: "Formação Continuada de Professores".to_string(),
        date_range_label: "10, 11 e 12 de julho de 2025".to_string(),
        total_hours,
        total_days,
        content_outline: "- PLANO DE FORMAÇÃO DE PROFESSORES\n- INCLUSÃO: DESAFIOS E PERCEPÇÕES"
            .to_string(),
    }
}

pub fn test_participant(id: i64, event_id: i64, name: &str, attendance: &[bool]) -> Participant {
    Participant {
        id,
        name: name.to_string(),
        tax_id: format!("000.000.000-{:02}", id % 100),
        email: None,
        event_id,
        attendance: attendance.to_vec(),
    }
}

pub fn test_renderer() -> CertificateRenderer {
    CertificateRenderer::with_style("// test style", IssuerProfile::default())
}

/// Build a minimal PDF with `pages` empty pages.
pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            });
            page_id.into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save test pdf");
    bytes
}

/// In-memory converter that records what it was asked to convert.
pub struct MockConverter {
    fail_for: HashSet<i64>,
    delay: Duration,
    converted: Mutex<Vec<i64>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockConverter {
    pub fn new() -> Self {
        Self {
            fail_for: HashSet::new(),
            delay: Duration::ZERO,
            converted: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fail conversion for these participant ids.
    pub fn failing(ids: &[i64]) -> Self {
        Self {
            fail_for: ids.iter().copied().collect(),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Participant ids in the order conversions started.
    pub fn converted(&self) -> Vec<i64> {
        self.converted.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn pdf_for(code: &str) -> Vec<u8> {
        format!("%PDF-mock {}", code).into_bytes()
    }
}

#[async_trait]
impl DocumentConverter for MockConverter {
    async fn convert(&self, document: &RenderedDocument) -> Result<Vec<u8>, RenderFailure> {
        self.converted.lock().unwrap().push(document.participant_id);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_for.contains(&document.participant_id) {
            return Err(RenderFailure::Other(format!(
                "simulated failure for {}",
                document.code
            )));
        }
        Ok(Self::pdf_for(&document.code))
    }
}
