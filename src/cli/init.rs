use comfy_table::Table;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path, Settings};

/// Apply any given overrides on top of the current settings, save them and
/// create the export directory.
pub fn run(
    export_dir: Option<String>,
    delimiter: Option<String>,
    analyst: Option<String>,
    agent_command: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    apply(&mut settings, export_dir, delimiter, analyst, agent_command)?;
    save_settings(&settings)?;

    let exports = settings.export_path();
    std::fs::create_dir_all(&exports)?;

    println!("Saved settings to {}", settings_path().display());
    println!("Reports export to {}", exports.display());
    Ok(())
}

fn apply(
    settings: &mut Settings,
    export_dir: Option<String>,
    delimiter: Option<String>,
    analyst: Option<String>,
    agent_command: Option<String>,
) -> Result<()> {
    if let Some(dir) = export_dir {
        settings.export_dir = shellexpand_path(&dir);
    }
    if let Some(d) = delimiter {
        settings.delimiter = d;
        settings.delimiter_byte()?;
    }
    if let Some(name) = analyst {
        settings.analyst_name = name.trim().to_string();
    }
    if let Some(cmd) = agent_command {
        let cmd = cmd.trim();
        settings.agent_command = (!cmd.is_empty()).then(|| cmd.to_string());
    }
    Ok(())
}

/// Print the effective settings.
pub fn show() -> Result<()> {
    let settings = load_settings();
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["settings file".to_string(), settings_path().display().to_string()]);
    table.add_row(vec!["export_dir".to_string(), settings.export_dir.clone()]);
    table.add_row(vec!["delimiter".to_string(), format!("{:?}", settings.delimiter)]);
    table.add_row(vec!["analyst_name".to_string(), settings.analyst_name.clone()]);
    table.add_row(vec![
        "agent_command".to_string(),
        settings.agent_command.clone().unwrap_or_else(|| "(offline)".to_string()),
    ]);
    println!("{table}");
    Ok(())
}
