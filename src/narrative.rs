//! Shapes the narrative agent is asked to produce, the instructions sent to
//! it and the locally built values used when its answer can't be decoded.

use serde::{Deserialize, Serialize};

use crate::detector::Detection;
use crate::error::Result;
use crate::fmt::money;
use crate::models::{AnomalyType, FlaggedTransaction, RiskAssessment, RiskLevel};

pub const REPORT_TITLE: &str = "Financial Anomaly Detection Report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub executive_summary: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyExplanation {
    pub transaction_id: String,
    pub anomaly_type: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub anomalies: Vec<AnomalyExplanation>,
    #[serde(default)]
    pub action_items: Vec<String>,
}

impl ReportSection {
    /// Content if present, else the anomaly explanations, else the action items.
    pub fn body_lines(&self) -> Vec<String> {
        if let Some(content) = &self.content {
            return content.lines().map(str::to_string).collect();
        }
        if !self.anomalies.is_empty() {
            return self
                .anomalies
                .iter()
                .map(|a| format!("- [{}] {}: {}", a.anomaly_type, a.transaction_id, a.explanation))
                .collect();
        }
        self.action_items.iter().map(|i| format!("- {i}")).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

/// Structured data embedded in every instruction.
#[derive(Serialize)]
pub struct AnalysisPayload<'a> {
    pub transaction_count: usize,
    pub total_anomalies: usize,
    pub risk: &'a RiskAssessment,
    pub anomalies: &'a [FlaggedTransaction],
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

pub fn summary_instruction(payload: &AnalysisPayload) -> Result<String> {
    let data = serde_json::to_string_pretty(payload)?;
    Ok(format!(
        "You are reviewing anomalies flagged in a batch of financial transactions.\n\
         Write a short executive summary and a list of key findings.\n\
         Respond with JSON only, shaped as \
         {{\"executive_summary\": string, \"key_findings\": [string]}}.\n\n\
         Analysis data:\n{data}\n"
    ))
}

pub fn report_instruction(payload: &AnalysisPayload, summary: &Summary) -> Result<String> {
    let data = serde_json::to_string_pretty(payload)?;
    let summary = serde_json::to_string_pretty(summary)?;
    Ok(format!(
        "Write an audit report for the flagged transactions below.\n\
         Respond with JSON only, shaped as {{\"title\": string, \"sections\": [{{\"title\": string, \
         \"content\": string?, \"anomalies\": [{{\"transaction_id\": string, \"anomaly_type\": string, \
         \"explanation\": string}}]?, \"action_items\": [string]?}}]}}.\n\n\
         Summary:\n{summary}\n\nAnalysis data:\n{data}\n"
    ))
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

const RECOMMENDED_ACTIONS: &[(RiskLevel, &[&str])] = &[
    (
        RiskLevel::High,
        &[
            "Escalate flagged transactions for immediate review",
            "Verify large and round-number transfers with the account owners",
            "Hold further transfers on affected accounts until reviewed",
        ],
    ),
    (
        RiskLevel::Medium,
        &[
            "Review flagged transactions within one business day",
            "Confirm closely spaced transactions were authorized",
        ],
    ),
    (
        RiskLevel::Low,
        &["Spot-check flagged transactions during routine reconciliation"],
    ),
];

pub fn recommended_actions(level: RiskLevel) -> Vec<String> {
    RECOMMENDED_ACTIONS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, items)| items.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

pub fn fallback_summary(transaction_count: usize, detection: &Detection, risk: &RiskAssessment) -> Summary {
    let mut executive_summary = format!(
        "Analyzed {transaction_count} transactions and detected {} anomalies. Overall risk is {}.",
        detection.total,
        risk.risk_level.label()
    );
    if detection.is_truncated() {
        executive_summary.push_str(&format!(
            " The first {} anomalies are listed.",
            detection.anomalies.len()
        ));
    }

    let mut key_findings = risk.patterns_detected.clone();
    for kind in [AnomalyType::Amount, AnomalyType::Timing, AnomalyType::Pattern] {
        let count = detection
            .anomalies
            .iter()
            .filter(|a| a.anomaly_type == kind)
            .count();
        if count > 0 {
            key_findings.push(format!("{count} x {}", kind.label()));
        }
    }

    Summary {
        executive_summary,
        key_findings,
    }
}

pub fn fallback_report(flagged: &[FlaggedTransaction], summary: &Summary, risk: &RiskAssessment) -> ReportDocument {
    let mut overview = summary.executive_summary.clone();
    for finding in &summary.key_findings {
        overview.push_str(&format!("\n- {finding}"));
    }

    let details = if flagged.is_empty() {
        ReportSection {
            title: "Anomaly Details".into(),
            content: Some("No anomalies detected.".into()),
            anomalies: Vec::new(),
            action_items: Vec::new(),
        }
    } else {
        ReportSection {
            title: "Anomaly Details".into(),
            content: None,
            anomalies: flagged
                .iter()
                .map(|f| AnomalyExplanation {
                    transaction_id: f.anomaly.transaction_id.clone(),
                    anomaly_type: f.anomaly.anomaly_type.label().to_string(),
                    explanation: format!(
                        "{} on {} at {}. {}",
                        money(f.amount),
                        f.date.format("%Y-%m-%d %H:%M"),
                        f.merchant,
                        f.anomaly.description
                    ),
                })
                .collect(),
            action_items: Vec::new(),
        }
    };

    ReportDocument {
        title: REPORT_TITLE.to_string(),
        sections: vec![
            ReportSection {
                title: "Executive Summary".into(),
                content: Some(overview),
                anomalies: Vec::new(),
                action_items: Vec::new(),
            },
            details,
            ReportSection {
                title: "Risk Assessment".into(),
                content: Some(format!(
                    "Risk level: {}\nPatterns: {}",
                    risk.risk_level.label(),
                    risk.patterns_detected.join(", ")
                )),
                anomalies: Vec::new(),
                action_items: Vec::new(),
            },
            ReportSection {
                title: "Recommended Actions".into(),
                content: None,
                anomalies: Vec::new(),
                action_items: recommended_actions(risk.risk_level),
            },
        ],
    }
}
