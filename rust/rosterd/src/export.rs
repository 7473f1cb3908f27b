use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const REPORT_ENTRY: &str = "report.txt";
pub const REPORT_BUNDLE_FORMAT: &str = "roster-report-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Bundle,
}

impl ReportFormat {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ReportFormat::Text),
            "zip" | "bundle" => Ok(ReportFormat::Bundle),
            other => Err(anyhow!("unsupported report format: {}", other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Bundle => "zip",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub format: ReportFormat,
    pub line_count: usize,
    pub sha256: String,
}

/// Text form of a rendered report: one line per entry, newline terminated.
pub fn report_text(lines: &[String]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn report_digest(lines: &[String]) -> String {
    format!("{:x}", Sha256::digest(report_text(lines).as_bytes()))
}

pub fn export_report(
    lines: &[String],
    out_path: &Path,
    format: ReportFormat,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let text = report_text(lines);
    let sha256 = format!("{:x}", Sha256::digest(text.as_bytes()));

    match format {
        ReportFormat::Text => {
            std::fs::write(out_path, text.as_bytes()).with_context(|| {
                format!("failed to write report {}", out_path.to_string_lossy())
            })?;
        }
        ReportFormat::Bundle => write_bundle(&text, lines.len(), &sha256, out_path)?,
    }

    Ok(ExportSummary {
        format,
        line_count: lines.len(),
        sha256,
    })
}

fn write_bundle(text: &str, line_count: usize, sha256: &str, out_path: &Path) -> anyhow::Result<()> {
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": REPORT_BUNDLE_FORMAT,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "lineCount": line_count,
        "sha256": sha256,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(REPORT_ENTRY, opts)
        .context("failed to start report entry")?;
    zip.write_all(text.as_bytes())
        .context("failed to write report entry")?;

    zip.finish().context("failed to finalize zip bundle")?;
    Ok(())
}
