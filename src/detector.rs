//! Three threshold rules evaluated per transaction in one pass: amount
//! z-score, inter-transaction timing and round-number amounts.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::fmt::money;
use crate::models::{Anomaly, AnomalyType, FlaggedTransaction, Transaction};

/// Anomalies past this many are counted but not returned.
pub const MAX_REPORTED: usize = 10;

const AMOUNT_SIGMA_THRESHOLD: f64 = 2.0;
const AMOUNT_CONFIDENCE_SIGMAS: f64 = 3.0;
const AMOUNT_CONFIDENCE_CAP: f64 = 0.95;

const TIMING_WINDOW_HOURS: f64 = 1.0;
const TIMING_MEAN_RATIO: f64 = 0.5;
const TIMING_CONFIDENCE: f64 = 0.8;

const ROUND_AMOUNT: f64 = 100.0;
const PATTERN_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// First `MAX_REPORTED` anomalies in transaction-then-rule order.
    pub anomalies: Vec<Anomaly>,
    /// Count before truncation.
    pub total: usize,
}

impl Detection {
    pub fn is_truncated(&self) -> bool {
        self.total > self.anomalies.len()
    }

    /// Join each returned anomaly with its source transaction. With duplicate
    /// ids the first transaction carrying the id wins.
    pub fn flagged(&self, transactions: &[Transaction]) -> Vec<FlaggedTransaction> {
        let mut by_id: HashMap<&str, &Transaction> = HashMap::new();
        for txn in transactions {
            by_id.entry(txn.id.as_str()).or_insert(txn);
        }
        self.anomalies
            .iter()
            .filter_map(|a| {
                by_id.get(a.transaction_id.as_str()).map(|txn| FlaggedTransaction {
                    anomaly: a.clone(),
                    date: txn.date,
                    description: txn.description.clone(),
                    amount: txn.amount,
                    account: txn.account.clone(),
                    merchant: txn.merchant.clone(),
                })
            })
            .collect()
    }
}

/// Population mean and standard deviation.
pub fn mean_std(vals: &[f64]) -> (f64, f64) {
    if vals.is_empty() {
        return (0.0, 0.0);
    }
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let sq_diff: f64 = vals.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sq_diff / n).sqrt())
}

pub fn detect_anomalies(transactions: &[Transaction]) -> Detection {
    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let (mean, std) = mean_std(&amounts);
    debug!(mean, std, count = transactions.len(), "batch statistics");

    let mut anomalies = Vec::new();
    let mut total = 0usize;
    for (i, txn) in transactions.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &transactions[p]);
        let hits = [
            amount_rule(txn, mean, std),
            timing_rule(txn, prev, mean),
            pattern_rule(txn, mean),
        ];
        for anomaly in hits.into_iter().flatten() {
            debug!(id = %anomaly.id, confidence = anomaly.confidence, "anomaly");
            total += 1;
            if anomalies.len() < MAX_REPORTED {
                anomalies.push(anomaly);
            }
        }
    }

    Detection { anomalies, total }
}

fn amount_rule(txn: &Transaction, mean: f64, std: f64) -> Option<Anomaly> {
    if std <= 0.0 {
        return None;
    }
    let deviation = (txn.amount - mean).abs();
    if deviation <= AMOUNT_SIGMA_THRESHOLD * std {
        return None;
    }
    let confidence = (deviation / (AMOUNT_CONFIDENCE_SIGMAS * std)).min(AMOUNT_CONFIDENCE_CAP);
    let direction = if txn.amount > mean { "high" } else { "low" };
    Some(Anomaly::new(
        txn,
        AnomalyType::Amount,
        confidence,
        format!(
            "Unusually {direction} transaction amount of {} (batch average {})",
            money(txn.amount),
            money(mean)
        ),
    ))
}

// Input order, not date order: an out-of-order row gives a negative delta,
// which still counts as inside the window.
fn timing_rule(txn: &Transaction, prev: Option<&Transaction>, mean: f64) -> Option<Anomaly> {
    let prev = prev?;
    let hours = (txn.date - prev.date).num_milliseconds() as f64 / 3_600_000.0;
    if hours >= TIMING_WINDOW_HOURS || txn.amount.abs() <= TIMING_MEAN_RATIO * mean {
        return None;
    }
    Some(Anomaly::new(
        txn,
        AnomalyType::Timing,
        TIMING_CONFIDENCE,
        format!("Transaction occurred {hours:.1} hours after the previous transaction"),
    ))
}

fn pattern_rule(txn: &Transaction, mean: f64) -> Option<Anomaly> {
    if txn.amount % ROUND_AMOUNT != 0.0 || txn.amount <= mean {
        return None;
    }
    Some(Anomaly::new(
        txn,
        AnomalyType::Pattern,
        PATTERN_CONFIDENCE,
        format!("Round-number transaction of {} above the batch average", money(txn.amount)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::demo::SAMPLE_BATCH;
    use crate::parser::parse_transactions;
    use chrono::{Duration, TimeZone, Utc};

    fn make_batch(amounts: &[f64], spacing: Duration) -> Vec<Transaction> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| Transaction {
                id: format!("T{i}"),
                date: start + spacing * i as i32,
                description: "TEST VENDOR".to_string(),
                amount: *amount,
                account: "Checking".to_string(),
                category: "Uncategorized".to_string(),
                merchant: "TEST".to_string(),
            })
            .collect()
    }

    fn kinds_for(detection: &Detection, txn_id: &str) -> Vec<AnomalyType> {
        detection
            .anomalies
            .iter()
            .filter(|a| a.transaction_id == txn_id)
            .map(|a| a.anomaly_type)
            .collect()
    }

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_constant_amounts_never_raise_amount_anomaly() {
        let txns = make_batch(&[250.0; 12], Duration::days(1));
        let detection = detect_anomalies(&txns);
        assert!(detection
            .anomalies
            .iter()
            .all(|a| a.anomaly_type != AnomalyType::Amount));
    }

    #[test]
    fn test_empty_batch() {
        let detection = detect_anomalies(&[]);
        assert!(detection.anomalies.is_empty());
        assert_eq!(detection.total, 0);
    }

    #[test]
    fn test_sample_batch() {
        let txns = parse_transactions(SAMPLE_BATCH, b',').unwrap();
        assert_eq!(txns.len(), 10);
        let detection = detect_anomalies(&txns);

        assert_eq!(kinds_for(&detection, "T006"), vec![AnomalyType::Timing, AnomalyType::Pattern]);
        assert_eq!(
            kinds_for(&detection, "T008"),
            vec![AnomalyType::Amount, AnomalyType::Timing, AnomalyType::Pattern]
        );
        // multiple of 100 but below the mean
        assert!(kinds_for(&detection, "T007").is_empty());
        assert_eq!(detection.total, 5);
        assert!(!detection.is_truncated());

        let amount = &detection.anomalies[2];
        assert_eq!(amount.id, "T008_AMOUNT");
        assert!((amount.confidence - 0.6886).abs() < 0.001);
        assert!(amount.description.contains("high"));
        assert!(amount.description.contains("$2,000.00"));

        let timing = &detection.anomalies[3];
        assert!(timing.description.contains("0.7 hours"));
    }

    #[test]
    fn test_low_outlier_and_confidence_cap() {
        let mut amounts = vec![1000.0; 9];
        amounts.push(0.0);
        let txns = make_batch(&amounts, Duration::days(1));
        let detection = detect_anomalies(&txns);
        let amount = detection
            .anomalies
            .iter()
            .find(|a| a.anomaly_type == AnomalyType::Amount)
            .unwrap();
        assert_eq!(amount.transaction_id, "T9");
        assert!(amount.description.contains("low"));
        assert_eq!(amount.confidence, 0.95);
    }

    #[test]
    fn test_timing_uses_input_order() {
        let mut txns = make_batch(&[500.0, 510.0, 520.0], Duration::days(1));
        // third row dated before the second
        txns[2].date = txns[1].date - Duration::hours(5);
        let detection = detect_anomalies(&txns);
        assert_eq!(kinds_for(&detection, "T2"), vec![AnomalyType::Timing]);
        assert!(kinds_for(&detection, "T0").is_empty());
    }

    #[test]
    fn test_truncates_to_first_ten_but_counts_all() {
        // 100..=1200 one minute apart: mean 650, so rows from 400 up are timing
        // hits and rows from 700 up are also round-number hits (15 in total).
        let amounts: Vec<f64> = (1..=12).map(|i| i as f64 * 100.0).collect();
        let txns = make_batch(&amounts, Duration::minutes(1));
        let detection = detect_anomalies(&txns);
        assert_eq!(detection.total, 15);
        assert_eq!(detection.anomalies.len(), MAX_REPORTED);
        assert!(detection.is_truncated());
        let ids: Vec<&str> = detection.anomalies.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(
            &ids[..5],
            &["T3_TIMING", "T4_TIMING", "T5_TIMING", "T6_TIMING", "T6_PATTERN"]
        );
        assert_eq!(ids[9], "T9_TIMING");
    }

    #[test]
    fn test_anomalies_reference_batch_and_are_deterministic() {
        let txns = parse_transactions(SAMPLE_BATCH, b',').unwrap();
        let first = detect_anomalies(&txns);
        let second = detect_anomalies(&txns);
        assert_eq!(first, second);
        for a in &first.anomalies {
            assert!(txns.iter().any(|t| t.id == a.transaction_id));
        }
        let flagged = first.flagged(&txns);
        assert_eq!(flagged.len(), first.anomalies.len());
        assert_eq!(flagged[2].amount, 2000.0);
    }
}
