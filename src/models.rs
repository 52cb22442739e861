use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of an uploaded batch. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: f64,
    pub account: String,
    pub category: String,
    pub merchant: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyType {
    Amount,
    Timing,
    Pattern,
    /// Reserved; the detector never emits it.
    Category,
}

impl AnomalyType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Amount => "Amount Anomaly",
            Self::Timing => "Timing Anomaly",
            Self::Pattern => "Pattern Anomaly",
            Self::Category => "Category Anomaly",
        }
    }

    /// Suffix used when building anomaly ids (`<txn_id>_AMOUNT`).
    pub fn id_suffix(&self) -> &'static str {
        match self {
            Self::Amount => "AMOUNT",
            Self::Timing => "TIMING",
            Self::Pattern => "PATTERN",
            Self::Category => "CATEGORY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub transaction_id: String,
    pub anomaly_type: AnomalyType,
    pub confidence: f64,
    pub description: String,
}

impl Anomaly {
    pub fn new(txn: &Transaction, anomaly_type: AnomalyType, confidence: f64, description: String) -> Self {
        Self {
            id: format!("{}_{}", txn.id, anomaly_type.id_suffix()),
            transaction_id: txn.id.clone(),
            anomaly_type,
            confidence,
            description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub patterns_detected: Vec<String>,
}

/// An anomaly joined read-only with the transaction it points at.
#[derive(Debug, Clone, Serialize)]
pub struct FlaggedTransaction {
    pub anomaly: Anomaly,
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: f64,
    pub account: String,
    pub merchant: String,
}
