//! One analysis run: upload -> detecting -> summarizing -> reporting -> complete.
//! Any failure drops the context back to upload with the message kept.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::agent::{decode, Agent, REPORTER, SUMMARIZER};
use crate::detector::{detect_anomalies, Detection};
use crate::error::{Result, SleuthError};
use crate::models::{RiskAssessment, Transaction};
use crate::narrative::{
    fallback_report, fallback_summary, report_instruction, summary_instruction, AnalysisPayload,
    ReportDocument, Summary,
};
use crate::parser::{decode_text, parse_transactions};
use crate::report::ReportMeta;
use crate::risk::assess_risk;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Stage {
    #[default]
    Upload,
    Detecting,
    Summarizing,
    Reporting,
    Complete,
}

#[derive(Debug, Default)]
pub struct PipelineContext {
    pub stage: Stage,
    pub file: Option<PathBuf>,
    pub fingerprint: Option<String>,
    pub transactions: Vec<Transaction>,
    pub detection: Option<Detection>,
    pub risk: Option<RiskAssessment>,
    pub summary: Option<Summary>,
    pub report: Option<ReportDocument>,
    pub error: Option<String>,
}

pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over with a new file. Clears results and any previous error.
    pub fn select_file(&mut self, path: &Path) {
        *self = Self {
            file: Some(path.to_path_buf()),
            ..Self::default()
        };
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }

    fn advance(&mut self, stage: Stage) {
        info!(from = ?self.stage, to = ?stage, "pipeline stage");
        self.stage = stage;
    }

    /// Drop everything from the aborted run; only the file and error survive.
    fn fail(&mut self, err: &SleuthError) {
        warn!(stage = ?self.stage, "pipeline failed: {err}");
        *self = Self {
            file: self.file.take(),
            error: Some(err.to_string()),
            ..Self::default()
        };
    }

    pub fn source_name(&self) -> String {
        self.file
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Export metadata for a completed run.
    pub fn report_meta(&self, analyst_name: &str) -> Option<ReportMeta> {
        let detection = self.detection.as_ref()?;
        let risk = self.risk.as_ref()?;
        Some(ReportMeta {
            source_name: self.source_name(),
            fingerprint: self.fingerprint.clone().unwrap_or_default(),
            analyst_name: analyst_name.to_string(),
            total_anomalies: detection.total,
            listed_anomalies: detection.anomalies.len(),
            risk_level: risk.risk_level,
            generated_at: Local::now(),
        })
    }
}

/// Run every stage for the selected file. On error the context is back at
/// `Stage::Upload` with `error` set, and the same error is returned.
pub fn run(ctx: &mut PipelineContext, agent: &dyn Agent, delimiter: u8) -> Result<()> {
    let result = run_stages(ctx, agent, delimiter);
    if let Err(e) = &result {
        ctx.fail(e);
    }
    result
}

fn run_stages(ctx: &mut PipelineContext, agent: &dyn Agent, delimiter: u8) -> Result<()> {
    let path = ctx
        .file
        .clone()
        .ok_or_else(|| SleuthError::Other("no file selected".into()))?;
    ctx.error = None;

    ctx.advance(Stage::Detecting);
    let bytes = std::fs::read(&path)?;
    ctx.fingerprint = Some(fingerprint(&bytes));
    let content = decode_text(bytes)?;
    detect(ctx, &content, delimiter)?;

    ctx.advance(Stage::Summarizing);
    let summary = summarize(ctx, agent)?;
    ctx.summary = Some(summary);

    ctx.advance(Stage::Reporting);
    let report = write_report(ctx, agent)?;
    ctx.report = Some(report);

    ctx.advance(Stage::Complete);
    Ok(())
}

fn detect(ctx: &mut PipelineContext, content: &str, delimiter: u8) -> Result<()> {
    let transactions = parse_transactions(content, delimiter)?;
    let detection = detect_anomalies(&transactions);
    let risk = assess_risk(detection.total);
    info!(
        transactions = transactions.len(),
        anomalies = detection.total,
        risk = risk.risk_level.label(),
        "detection finished"
    );
    ctx.transactions = transactions;
    ctx.detection = Some(detection);
    ctx.risk = Some(risk);
    Ok(())
}

fn detection_parts(ctx: &PipelineContext) -> Result<(&Detection, &RiskAssessment)> {
    match (&ctx.detection, &ctx.risk) {
        (Some(d), Some(r)) => Ok((d, r)),
        _ => Err(SleuthError::Other("detection has not run".into())),
    }
}

/// Decode an agent answer, or fall back when it is empty or malformed.
fn decode_or<T: serde::de::DeserializeOwned>(agent_id: &str, response: &str, fallback: T) -> T {
    if response.trim().is_empty() {
        debug!(agent = agent_id, "no response, using local fallback");
        return fallback;
    }
    decode(response).unwrap_or_else(|| {
        warn!(agent = agent_id, "undecodable response, using local fallback");
        fallback
    })
}

fn summarize(ctx: &PipelineContext, agent: &dyn Agent) -> Result<Summary> {
    let (detection, risk) = detection_parts(ctx)?;
    let flagged = detection.flagged(&ctx.transactions);
    let payload = AnalysisPayload {
        transaction_count: ctx.transactions.len(),
        total_anomalies: detection.total,
        risk,
        anomalies: &flagged,
    };
    let response = agent.ask(SUMMARIZER, &summary_instruction(&payload)?)?;
    let fallback = fallback_summary(ctx.transactions.len(), detection, risk);
    Ok(decode_or(SUMMARIZER, &response, fallback))
}

fn write_report(ctx: &PipelineContext, agent: &dyn Agent) -> Result<ReportDocument> {
    let (detection, risk) = detection_parts(ctx)?;
    let summary = ctx
        .summary
        .as_ref()
        .ok_or_else(|| SleuthError::Other("summary has not run".into()))?;
    let flagged = detection.flagged(&ctx.transactions);
    let payload = AnalysisPayload {
        transaction_count: ctx.transactions.len(),
        total_anomalies: detection.total,
        risk,
        anomalies: &flagged,
    };
    let response = agent.ask(REPORTER, &report_instruction(&payload, summary)?)?;
    let fallback = fallback_report(&flagged, summary, risk);
    Ok(decode_or(REPORTER, &response, fallback))
}
