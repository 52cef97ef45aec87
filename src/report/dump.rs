//! Raw response dumper for found accounts

use crate::error::Result;
use crate::models::RunReport;
use std::path::Path;
use tracing::info;

/// Picks a file extension by sniffing the body content
fn extension_for(body: &str) -> &'static str {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        "json"
    } else if trimmed.to_lowercase().contains("<html") {
        "html"
    } else {
        "txt"
    }
}

/// Writes each found account's response body to `dir/dump_{token}/{site}.{ext}`.
/// Returns the number of files written.
pub fn dump_responses(report: &RunReport, dir: &Path) -> Result<usize> {
    let dump_dir = dir.join(format!("dump_{}", report.token));
    std::fs::create_dir_all(&dump_dir)?;

    let mut written = 0;
    for outcome in report.found() {
        let Some(body) = outcome.body.as_deref() else {
            continue;
        };
        let file_name = format!(
            "{}.{}",
            outcome.site_name.replace([' ', '/'], "_"),
            extension_for(body)
        );
        std::fs::write(dump_dir.join(file_name), body)?;
        written += 1;
    }

    info!("Dumped {written} responses to {}", dump_dir.display());
    Ok(written)
}
