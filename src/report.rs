use chrono::{DateTime, Local};

use crate::models::RiskLevel;
use crate::narrative::ReportDocument;

const PREAMBLE: &str = "Prepared by sleuth from a single uploaded transaction batch. \
Findings are heuristic and require human review.";

/// Everything in the export that does not come from the narrative document.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub source_name: String,
    pub fingerprint: String,
    pub analyst_name: String,
    pub total_anomalies: usize,
    pub listed_anomalies: usize,
    pub risk_level: RiskLevel,
    pub generated_at: DateTime<Local>,
}

/// One line of an exported report. Text and PDF exports render the same
/// sequence; only the styling differs.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine {
    Title(String),
    Heading(String),
    Body(String),
    Rule,
    Blank,
}

impl ReportLine {
    pub fn text(&self) -> &str {
        match self {
            Self::Title(s) | Self::Heading(s) | Self::Body(s) => s,
            Self::Rule | Self::Blank => "",
        }
    }
}

/// Short form of the batch fingerprint shown in reports.
pub fn short_fingerprint(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(12)]
}

pub fn render_lines(doc: &ReportDocument, meta: &ReportMeta) -> Vec<ReportLine> {
    let mut lines = vec![
        ReportLine::Title(doc.title.clone()),
        ReportLine::Rule,
        ReportLine::Body(PREAMBLE.to_string()),
        ReportLine::Body(format!(
            "Source: {} (fingerprint {})",
            meta.source_name,
            short_fingerprint(&meta.fingerprint)
        )),
    ];
    if !meta.analyst_name.is_empty() {
        lines.push(ReportLine::Body(format!("Analyst: {}", meta.analyst_name)));
    }
    lines.push(ReportLine::Blank);

    for section in &doc.sections {
        lines.push(ReportLine::Heading(section.title.clone()));
        lines.extend(section.body_lines().into_iter().map(ReportLine::Body));
        lines.push(ReportLine::Blank);
    }

    lines.push(ReportLine::Heading("Summary".to_string()));
    lines.push(ReportLine::Body(format!("Total Anomalies: {}", meta.total_anomalies)));
    if meta.listed_anomalies < meta.total_anomalies {
        lines.push(ReportLine::Body(format!("Anomalies Listed: {}", meta.listed_anomalies)));
    }
    lines.push(ReportLine::Body(format!("Risk Level: {}", meta.risk_level.label())));
    lines.push(ReportLine::Body(format!(
        "Generated: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S")
    )));
    lines
}

pub fn render_text(doc: &ReportDocument, meta: &ReportMeta) -> String {
    let lines = render_lines(doc, meta);
    let width = lines.iter().map(|l| l.text().len()).max().unwrap_or(0).min(72);
    let mut out = String::new();
    for line in &lines {
        match line {
            ReportLine::Title(s) => out.push_str(s),
            ReportLine::Heading(s) => {
                out.push_str(s);
                out.push('\n');
                out.push_str(&"-".repeat(s.len()));
            }
            ReportLine::Body(s) => out.push_str(s),
            ReportLine::Rule => out.push_str(&"=".repeat(width)),
            ReportLine::Blank => {}
        }
        out.push('\n');
    }
    out
}
