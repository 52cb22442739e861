use std::path::PathBuf;

use crate::error::Result;

/// Ten transactions across two accounts with a handful of planted outliers:
/// a large cash withdrawal, round-dollar transfers and back-to-back spends.
pub const SAMPLE_BATCH: &str = "\
id,date,description,amount,account,category,merchant
T001,2024-01-15T09:00:00Z,Office supplies - Staples,124.56,Business Checking,Office,Staples
T002,2024-01-15T12:30:00Z,Coffee with client,8.95,Business Checking,Meals,Blue Bottle
T003,2024-01-16T10:00:00Z,Fuel,67.89,Corporate Card,Travel,Shell
T004,2024-01-17T14:00:00Z,Laptop purchase,1250.00,Corporate Card,Equipment,Apple
T005,2024-01-18T09:15:00Z,Team lunch,185.43,Corporate Card,Meals,Chipotle
T006,2024-01-18T09:45:00Z,Wire transfer,1500.00,Business Checking,Transfers,
T007,2024-01-19T11:00:00Z,ATM withdrawal,300.00,Business Checking,Cash,
T008,2024-01-19T11:40:00Z,Cash withdrawal,2000.00,Business Checking,Cash,
T009,2024-01-20T16:00:00Z,Software subscription,85.32,Corporate Card,Software,Adobe
T010,2024-01-21T08:00:00Z,Parking,6.78,Corporate Card,Travel,
";

const DEFAULT_OUTPUT: &str = "sample-transactions.csv";

pub fn run(output: Option<String>) -> Result<()> {
    let path = PathBuf::from(output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, SAMPLE_BATCH)?;
    println!("Wrote sample batch to {}", path.display());
    println!("Try: sleuth analyze {}", path.display());
    Ok(())
}
