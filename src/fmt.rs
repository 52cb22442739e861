use colored::{Color, ColoredString, Colorize};

use crate::models::{AnomalyType, RiskLevel};

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Confidence as a whole percentage: 0.688 -> "69%"
pub fn percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

// Badge table: one fixed color per anomaly type and risk level.
const ANOMALY_COLORS: &[(AnomalyType, Color)] = &[
    (AnomalyType::Amount, Color::Red),
    (AnomalyType::Timing, Color::Yellow),
    (AnomalyType::Pattern, Color::Magenta),
    (AnomalyType::Category, Color::Blue),
];

const RISK_COLORS: &[(RiskLevel, Color)] = &[
    (RiskLevel::High, Color::Red),
    (RiskLevel::Medium, Color::Yellow),
    (RiskLevel::Low, Color::Green),
];

fn lookup<K: PartialEq + Copy>(table: &[(K, Color)], key: K) -> Color {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, c)| *c)
        .unwrap_or(Color::White)
}

pub fn anomaly_badge(kind: AnomalyType) -> ColoredString {
    kind.label().color(lookup(ANOMALY_COLORS, kind)).bold()
}

pub fn risk_badge(level: RiskLevel) -> ColoredString {
    format!("{} Risk", level.label())
        .as_str()
        .color(lookup(RISK_COLORS, level))
        .bold()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(42.10), "$42.10");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.8), "80%");
        assert_eq!(percent(0.6886), "69%");
        assert_eq!(percent(0.95), "95%");
    }

    #[test]
    fn test_every_variant_has_a_color() {
        for kind in [
            AnomalyType::Amount,
            AnomalyType::Timing,
            AnomalyType::Pattern,
            AnomalyType::Category,
        ] {
            assert_ne!(lookup(ANOMALY_COLORS, kind), Color::White);
        }
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_ne!(lookup(RISK_COLORS, level), Color::White);
        }
    }
}
