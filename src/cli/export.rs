use std::path::PathBuf;

use crate::cli::{analyze_file, ExportFormat};
use crate::error::{Result, SleuthError};
use crate::pipeline::PipelineContext;
use crate::report::render_text;
use crate::settings::{load_settings, Settings};

fn default_path(settings: &Settings, format: ExportFormat) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    settings
        .export_path()
        .join(format!("anomaly-report-{date}.{}", format.extension()))
}

fn write_bytes(bytes: &[u8], path: &PathBuf) -> Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    let display = format!("{}", path.display());
    println!("Wrote {display}");
    Ok(display)
}

#[cfg(feature = "pdf")]
fn render_pdf(
    doc: &crate::narrative::ReportDocument,
    meta: &crate::report::ReportMeta,
) -> Result<Vec<u8>> {
    crate::pdf::render_report(doc, meta)
}

#[cfg(not(feature = "pdf"))]
fn render_pdf(
    _doc: &crate::narrative::ReportDocument,
    _meta: &crate::report::ReportMeta,
) -> Result<Vec<u8>> {
    Err(SleuthError::Other(
        "PDF export requires the 'pdf' feature. Rebuild with: cargo build --features pdf".into(),
    ))
}

/// Write the report of a completed run. Returns the written path.
pub fn write_report(
    ctx: &PipelineContext,
    settings: &Settings,
    format: ExportFormat,
    output: Option<String>,
) -> Result<String> {
    let (doc, meta) = match (ctx.report.as_ref(), ctx.report_meta(&settings.analyst_name)) {
        (Some(doc), Some(meta)) if ctx.is_complete() => (doc, meta),
        _ => return Err(SleuthError::Other("no completed analysis to export".into())),
    };
    let bytes = match format {
        ExportFormat::Text => render_text(doc, &meta).into_bytes(),
        ExportFormat::Pdf => render_pdf(doc, &meta)?,
    };
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(settings, format));
    write_bytes(&bytes, &path)
}

pub fn run(file: &str, output: Option<String>, format: ExportFormat) -> Result<()> {
    let settings = load_settings();
    let ctx = analyze_file(file, &settings)?;
    write_report(&ctx, &settings, format, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::OfflineAgent;
    use crate::cli::demo::SAMPLE_BATCH;
    use crate::narrative::REPORT_TITLE;
    use crate::pipeline;

    fn completed(dir: &std::path::Path) -> PipelineContext {
        let file = dir.join("batch.csv");
        std::fs::write(&file, SAMPLE_BATCH).unwrap();
        let mut ctx = PipelineContext::new();
        ctx.select_file(&file);
        pipeline::run(&mut ctx, &OfflineAgent, b',').unwrap();
        ctx
    }

    #[test]
    fn test_default_path_uses_export_dir() {
        let settings = Settings {
            export_dir: "/tmp/sleuth-exports".into(),
            ..Settings::default()
        };
        let path = default_path(&settings, ExportFormat::Pdf);
        assert!(path.starts_with("/tmp/sleuth-exports"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("anomaly-report-"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_write_text_report() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = completed(dir.path());
        let settings = Settings {
            analyst_name: "Dana".into(),
            ..Settings::default()
        };
        let out = dir.path().join("out").join("report.txt");
        write_report(&ctx, &settings, ExportFormat::Text, Some(out.to_string_lossy().to_string()))
            .unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Analyst: Dana"));
        assert!(text.contains("Total Anomalies: 5"));
        assert!(text.contains("Risk Level: Medium"));
    }

    #[test]
    fn test_incomplete_run_refuses_export() {
        let ctx = PipelineContext::new();
        let err = write_report(&ctx, &Settings::default(), ExportFormat::Text, None).unwrap_err();
        assert!(err.to_string().contains("no completed analysis"));
    }
}
