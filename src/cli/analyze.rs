use crate::cli::detect::format_detection;
use crate::cli::export::write_report;
use crate::cli::{analyze_file, ExportFormat};
use crate::error::{Result, SleuthError};
use crate::report::render_text;
use crate::settings::load_settings;

pub fn run(file: &str, export: Option<String>, format: ExportFormat) -> Result<()> {
    let settings = load_settings();
    let ctx = analyze_file(file, &settings)?;

    let (Some(detection), Some(risk), Some(doc), Some(meta)) = (
        ctx.detection.as_ref(),
        ctx.risk.as_ref(),
        ctx.report.as_ref(),
        ctx.report_meta(&settings.analyst_name),
    ) else {
        return Err(SleuthError::Other("analysis did not complete".into()));
    };

    let flagged = detection.flagged(&ctx.transactions);
    println!("{}", format_detection(ctx.transactions.len(), &flagged, detection, risk));
    println!("{}", render_text(doc, &meta));

    if let Some(path) = export {
        write_report(&ctx, &settings, format, Some(path))?;
    }
    Ok(())
}
