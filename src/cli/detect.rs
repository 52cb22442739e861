use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::detector::{detect_anomalies, Detection};
use crate::error::Result;
use crate::fmt::{anomaly_badge, money, percent, risk_badge};
use crate::models::{FlaggedTransaction, RiskAssessment};
use crate::parser::{decode_text, parse_transactions};
use crate::risk::assess_risk;
use crate::settings::load_settings;

#[derive(Serialize)]
struct DetectOutput<'a> {
    transactions: usize,
    total_anomalies: usize,
    anomalies: &'a [FlaggedTransaction],
    risk: &'a RiskAssessment,
}

pub fn run(file: &str, json: bool) -> Result<()> {
    let settings = load_settings();
    let content = decode_text(std::fs::read(file)?)?;
    let transactions = parse_transactions(&content, settings.delimiter_byte()?)?;
    let detection = detect_anomalies(&transactions);
    let risk = assess_risk(detection.total);
    let flagged = detection.flagged(&transactions);

    if json {
        let out = DetectOutput {
            transactions: transactions.len(),
            total_anomalies: detection.total,
            anomalies: &flagged,
            risk: &risk,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", format_detection(transactions.len(), &flagged, &detection, &risk));
    Ok(())
}

pub fn format_detection(
    transaction_count: usize,
    flagged: &[FlaggedTransaction],
    detection: &Detection,
    risk: &RiskAssessment,
) -> String {
    let mut out = String::new();

    if flagged.is_empty() {
        out.push_str(&format!(
            "{}\n",
            format!("No anomalies in {transaction_count} transactions.").green()
        ));
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Type", "Transaction", "Date", "Merchant", "Amount", "Confidence", "Details"]);
        for f in flagged {
            let amt = if f.amount < 0.0 {
                money(f.amount).red().to_string()
            } else {
                money(f.amount)
            };
            table.add_row(vec![
                Cell::new(anomaly_badge(f.anomaly.anomaly_type)),
                Cell::new(&f.anomaly.transaction_id),
                Cell::new(f.date.format("%Y-%m-%d %H:%M")),
                Cell::new(&f.merchant),
                Cell::new(amt),
                Cell::new(percent(f.anomaly.confidence)),
                Cell::new(&f.anomaly.description),
            ]);
        }
        out.push_str(&format!(
            "Anomalies ({} of {transaction_count} transactions flagged)\n{table}\n",
            detection.total
        ));
        if detection.is_truncated() {
            out.push_str(&format!(
                "{}\n",
                format!(
                    "Showing the first {} of {} anomalies.",
                    detection.anomalies.len(),
                    detection.total
                )
                .yellow()
            ));
        }
    }

    out.push_str(&format!("\n{}\n", risk_badge(risk.risk_level)));
    for pattern in &risk.patterns_detected {
        out.push_str(&format!("  - {pattern}\n"));
    }
    out
}
