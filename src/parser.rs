use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::{Result, SleuthError};
use crate::models::Transaction;

/// Rows with fewer fields than this are skipped.
pub const MIN_FIELDS: usize = 4;

const DEFAULT_ACCOUNT: &str = "Unknown";
const DEFAULT_CATEGORY: &str = "Uncategorized";
const DEFAULT_MERCHANT: &str = "Unknown";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Anything that does not parse to a finite number becomes 0.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    let (negate, digits) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    };
    let val = digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    if negate {
        -val
    } else {
        val
    }
}

pub fn parse_date_mdy(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let m: u32 = parts[0].parse().ok()?;
    let d: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Accepts RFC 3339, naive ISO date-times, ISO dates and US m/d/Y dates.
/// Anything without an offset is taken as UTC; date-only values land on midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date_mdy(raw))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

fn default_merchant(description: &str) -> String {
    description
        .split_whitespace()
        .next()
        .unwrap_or(DEFAULT_MERCHANT)
        .to_string()
}

fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

fn split_row(line: &str, delimiter: u8, line_no: usize) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(clean_field).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(SleuthError::Parse {
            line: line_no,
            message: e.to_string(),
        }),
    }
}

/// Uploaded batches must be UTF-8 text.
pub fn decode_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| SleuthError::Format("file is not valid UTF-8 text".into()))
}

// ---------------------------------------------------------------------------
// parse_transactions
// ---------------------------------------------------------------------------

/// Parse delimited text into transactions. The first non-empty line is a
/// header and is ignored; columns are positional:
/// id, date, description, amount, account, category, merchant.
pub fn parse_transactions(content: &str, delimiter: u8) -> Result<Vec<Transaction>> {
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l))
        .collect();
    if lines.len() < 2 {
        return Err(SleuthError::Format(
            "expected a header row and at least one transaction row".into(),
        ));
    }

    let now = Utc::now();
    let mut transactions = Vec::with_capacity(lines.len() - 1);
    for (index, (line_no, line)) in lines[1..].iter().enumerate() {
        let fields = split_row(line, delimiter, *line_no)?;
        if fields.len() < MIN_FIELDS {
            debug!(line = line_no, fields = fields.len(), "skipping short row");
            continue;
        }
        transactions.push(decode_row(&fields, index, *line_no, now)?);
    }
    debug!(count = transactions.len(), "parsed transactions");
    Ok(transactions)
}

fn decode_row(fields: &[String], index: usize, line_no: usize, now: DateTime<Utc>) -> Result<Transaction> {
    let field = |i: usize| fields.get(i).map(String::as_str).filter(|s| !s.is_empty());

    let id = field(0)
        .map(str::to_string)
        .unwrap_or_else(|| format!("txn-{}-{index}", now.timestamp_millis()));
    let date = match field(1) {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| SleuthError::Parse {
            line: line_no,
            message: format!("unrecognized date '{raw}'"),
        })?,
        None => now,
    };
    let description = fields[2].clone();
    let amount = field(3).map(parse_amount).unwrap_or(0.0);
    let account = field(4).unwrap_or(DEFAULT_ACCOUNT).to_string();
    let category = field(5).unwrap_or(DEFAULT_CATEGORY).to_string();
    let merchant = field(6)
        .map(str::to_string)
        .unwrap_or_else(|| default_merchant(&description));

    Ok(Transaction {
        id,
        date,
        description,
        amount,
        account,
        category,
        merchant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = "id,date,description,amount,account,category,merchant";

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), 1234.56);
        assert_eq!(parse_amount("\"500.00\""), 500.0);
        assert_eq!(parse_amount("  -42.50  "), -42.5);
        assert_eq!(parse_amount("0"), 0.0);
        assert_eq!(parse_amount("not_a_number"), 0.0);
    }

    #[test]
    fn test_parse_amount_parenthesized_and_currency() {
        assert_eq!(parse_amount("(500.00)"), -500.0);
        assert_eq!(parse_amount("$1,234.56"), 1234.56);
        assert_eq!(parse_amount("-$50.00"), -50.0);
    }

    #[test]
    fn test_non_finite_amounts_become_zero() {
        for raw in ["NaN", "inf", "-infinity", "(inf)", "1e999"] {
            assert_eq!(parse_amount(raw), 0.0, "{raw}");
        }
        let content = format!(
            "{HEADER}\nA,2024-01-15,First,NaN\nB,2024-01-15,Second,10\nC,2024-01-15,Third,20\nD,2024-01-15,Fourth,inf\n"
        );
        let txns = parse_transactions(&content, b',').unwrap();
        let amounts: Vec<f64> = txns.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![0.0, 10.0, 20.0, 0.0]);
        assert!(amounts.iter().all(|a| a.is_finite()));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15"), Some(midnight));
        assert_eq!(parse_timestamp("01/15/2024"), Some(midnight));
        assert_eq!(
            parse_timestamp("2024-01-15T10:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-01-15 10:30"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-01-15T12:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("02/30/2024"), None);
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"a,b".to_vec()).unwrap(), "a,b");
        let err = decode_text(vec![b'a', 0xff, b'b']).unwrap_err();
        assert!(matches!(err, SleuthError::Format(_)));
        assert!(err.to_string().starts_with("Invalid file format"));
    }

    #[test]
    fn test_header_only_is_format_error() {
        let err = parse_transactions(HEADER, b',').unwrap_err();
        assert!(matches!(err, SleuthError::Format(_)));
    }

    #[test]
    fn test_blank_lines_do_not_count() {
        let content = format!("\n\n{HEADER}\n   \n");
        let err = parse_transactions(&content, b',').unwrap_err();
        assert!(matches!(err, SleuthError::Format(_)));
    }

    #[test]
    fn test_short_rows_skipped_and_defaults_applied() {
        let content = format!(
            "{HEADER}\nT1,2024-01-15,Too short\nT2,2024-01-16,STAPLES OFFICE SUPPLY,42.10\n"
        );
        let txns = parse_transactions(&content, b',').unwrap();
        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.id, "T2");
        assert_eq!(t.amount, 42.10);
        assert_eq!(t.account, "Unknown");
        assert_eq!(t.category, "Uncategorized");
        assert_eq!(t.merchant, "STAPLES");
    }

    #[test]
    fn test_full_row_with_quotes() {
        let content = format!(
            "{HEADER}\n\"T9\",\"2024-03-01T08:15:00Z\",\"Wire, international\",\"2,000.00\",\"Checking\",\"Transfers\",\"Acme Bank\"\n"
        );
        let txns = parse_transactions(&content, b',').unwrap();
        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.id, "T9");
        assert_eq!(t.description, "Wire, international");
        assert_eq!(t.amount, 2000.0);
        assert_eq!(t.account, "Checking");
        assert_eq!(t.category, "Transfers");
        assert_eq!(t.merchant, "Acme Bank");
    }

    #[test]
    fn test_missing_values_are_synthesized() {
        let content = format!("{HEADER}\n,,,abc,\n");
        let txns = parse_transactions(&content, b',').unwrap();
        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert!(t.id.starts_with("txn-"));
        assert!(t.id.ends_with("-0"));
        assert_eq!(t.amount, 0.0);
        assert_eq!(t.account, "Unknown");
        assert_eq!(t.merchant, "Unknown");
        assert!((Utc::now() - t.date).num_seconds().abs() < 60);
    }

    #[test]
    fn test_bad_date_is_parse_error_with_line() {
        let content = format!("{HEADER}\nT1,2024-01-15,ok,1.00\nT2,not-a-date,bad,2.00\n");
        match parse_transactions(&content, b',').unwrap_err() {
            SleuthError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_delimiter_and_duplicate_ids() {
        let content = "id;date;description;amount\nA;2024-01-01;one;10\nA;2024-01-02;two;20\n";
        let txns = parse_transactions(content, b';').unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].id, txns[1].id);
        assert_eq!(txns[1].amount, 20.0);
    }
}
