use crate::models::{RiskAssessment, RiskLevel};

const HIGH_ABOVE: usize = 7;
const MEDIUM_ABOVE: usize = 3;
const FREQUENT_ABOVE: usize = 5;

/// Classify a batch from its anomaly count. Callers pass the count before
/// any display truncation.
pub fn assess_risk(anomaly_count: usize) -> RiskAssessment {
    let risk_level = if anomaly_count > HIGH_ABOVE {
        RiskLevel::High
    } else if anomaly_count > MEDIUM_ABOVE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let patterns_detected = if anomaly_count > FREQUENT_ABOVE {
        vec![
            "High frequency of anomalies".to_string(),
            "Multiple suspect transactions".to_string(),
        ]
    } else {
        vec!["Isolated suspicious activity".to_string()]
    };

    RiskAssessment {
        risk_level,
        patterns_detected,
    }
}
