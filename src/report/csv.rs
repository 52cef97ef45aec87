//! CSV report export (RFC 4180 compliant)

use crate::error::Result;
use crate::models::RunReport;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Escapes a field for CSV according to RFC 4180
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Exports the found accounts of a run report as a CSV file, one row
/// per account where the token exists
pub fn export(report: &RunReport, output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    let mut writer = std::io::BufWriter::new(file);

    writeln!(writer, "site,url,http_status,elapsed_ms")?;

    for o in report.found() {
        let row = format!(
            "{},{},{},{}",
            escape_csv(&o.site_name),
            escape_csv(&o.url),
            o.http_status.map(|s| s.to_string()).unwrap_or_default(),
            o.elapsed_ms,
        );
        writeln!(writer, "{row}")?;
    }

    writer.flush()?;
    info!("CSV report saved to {}", output_path.display());
    Ok(())
}
