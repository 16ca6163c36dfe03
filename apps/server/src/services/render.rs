//! Prescription document rendering
//!
//! The default [`CommandRenderer`] builds an HTML page from the gathered
//! [`PrescriptionDocument`] and pipes it through an HTML-to-PDF command
//! (`render.command`, e.g. `wkhtmltopdf - -`) reading stdin and writing the
//! PDF to stdout.

use async_trait::async_trait;
use serde::Serialize;
use std::{fmt::Write as _, process::Stdio, time::Duration};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{config::RenderConfig, models::AddressFields, Error, Result};

/// Which template a document is laid out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateKind {
    PatientPrescription,
    PetPrescription,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedLine {
    pub medicine_name: Option<String>,
    pub dosage: String,
    pub total_amount: String,
    pub administration_way: String,
}

/// Everything printed on a prescription. Dates are already `DD/MM/YYYY`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDocument {
    pub emission_date: String,
    pub expiration_date: String,
    pub observation: Option<String>,
    pub establishment_name: Option<String>,
    pub establishment_phone: Option<String>,
    pub establishment_address: AddressFields,
    pub patient_name: Option<String>,
    pub tutor_name: Option<String>,
    pub pet_name: Option<String>,
    pub pet_specie: Option<String>,
    pub professional_name: Option<String>,
    pub professional_phone: Option<String>,
    pub professional_document: Option<String>,
    pub professional_document_type: Option<String>,
    pub medicines: Vec<PrescribedLine>,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, kind: TemplateKind, document: &PrescriptionDocument) -> Result<Vec<u8>>;
}

fn esc(value: &str) -> String {
    html_escape::encode_text(value).into_owned()
}

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(esc).unwrap_or_default()
}

fn address_line(address: &AddressFields) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(street) = &address.street {
        match address.number {
            Some(number) => parts.push(format!("{street}, {number}")),
            None => parts.push(street.clone()),
        }
    }
    parts.extend(
        [&address.neighborhood, &address.city, &address.state, &address.post_code]
            .into_iter()
            .flatten()
            .cloned(),
    );
    esc(&parts.join(" - "))
}

/// The HTML page handed to the PDF command.
pub fn render_html(kind: TemplateKind, document: &PrescriptionDocument) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str("<title>Prescription</title><style>");
    html.push_str(
        "body{font-family:sans-serif;margin:32px}header{border-bottom:1px solid #444}\
         table{width:100%;border-collapse:collapse}td,th{padding:4px;text-align:left}\
         footer{margin-top:48px;text-align:center}",
    );
    html.push_str("</style></head><body><header>");
    let _ = write!(
        html,
        "<h1>{}</h1><p>{}</p><p>{}</p></header>",
        opt(&document.establishment_name),
        address_line(&document.establishment_address),
        opt(&document.establishment_phone),
    );

    html.push_str("<section class=\"subject\">");
    match kind {
        TemplateKind::PatientPrescription => {
            let _ = write!(html, "<p>Patient: {}</p>", opt(&document.patient_name));
        }
        TemplateKind::PetPrescription => {
            let _ = write!(
                html,
                "<p>Tutor: {}</p><p>Pet: {} ({})</p>",
                opt(&document.tutor_name),
                opt(&document.pet_name),
                opt(&document.pet_specie),
            );
        }
    }
    html.push_str("</section><table><thead><tr>");
    html.push_str("<th>Medicine</th><th>Dosage</th><th>Amount</th><th>Way</th></tr></thead><tbody>");
    for line in &document.medicines {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            opt(&line.medicine_name),
            esc(&line.dosage),
            esc(&line.total_amount),
            esc(&line.administration_way),
        );
    }
    html.push_str("</tbody></table>");

    if let Some(observation) = &document.observation {
        let _ = write!(html, "<p class=\"observation\">{}</p>", esc(observation));
    }
    let _ = write!(
        html,
        "<footer><p>{}</p><p>{} {}</p><p>Issued {} - valid until {}</p></footer></body></html>",
        opt(&document.professional_name),
        opt(&document.professional_document_type),
        opt(&document.professional_document),
        esc(&document.emission_date),
        esc(&document.expiration_date),
    );
    html
}

/// Renders through an external HTML-to-PDF command.
pub struct CommandRenderer {
    config: RenderConfig,
}

impl CommandRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    async fn run(&self, html: String) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Dependency(format!(
                    "failed to start renderer '{}': {e}",
                    self.config.command
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Dependency("renderer stdin unavailable".to_string()))?;
        let feed = tokio::spawn(async move {
            let written = stdin.write_all(html.as_bytes()).await;
            drop(stdin);
            written
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Dependency(format!("renderer failed: {e}")))?;
        feed.await
            .map_err(|e| Error::Dependency(format!("renderer input task failed: {e}")))?
            .map_err(|e| Error::Dependency(format!("failed to send page to renderer: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Dependency(format!(
                "renderer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(Error::Dependency("renderer produced no output".to_string()));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl DocumentRenderer for CommandRenderer {
    async fn render(&self, kind: TemplateKind, document: &PrescriptionDocument) -> Result<Vec<u8>> {
        let html = render_html(kind, document);
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let started = std::time::Instant::now();

        let bytes = tokio::time::timeout(timeout, self.run(html))
            .await
            .map_err(|_| {
                Error::Dependency(format!(
                    "renderer timed out after {}s",
                    self.config.timeout_seconds
                ))
            })??;

        tracing::debug!(
            template = ?kind,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prescription rendered"
        );
        Ok(bytes)
    }
}
