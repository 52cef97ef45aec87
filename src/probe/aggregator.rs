//! Aggregation of streamed outcomes into a sealed, catalog-ordered report

use crate::models::{ProbeOutcome, RunReport, Token};
use crate::probe::scheduler::{DETAIL_CANCELLED, DETAIL_DEADLINE};
use tokio::sync::mpsc;
use tracing::warn;

/// Drains the scheduler's outcome stream into a `RunReport`.
///
/// Arrival order is irrelevant: outcomes are stable-sorted by catalog index
/// so exports are reproducible run to run. The report is sealed once the
/// stream closes, whether by completion, deadline, or cancellation.
pub async fn aggregate(
    token: Token,
    total_sites: usize,
    mut outcomes: mpsc::Receiver<ProbeOutcome>,
) -> RunReport {
    let mut report = RunReport::new(token, total_sites);

    while let Some(outcome) = outcomes.recv().await {
        report.outcomes.push(outcome);
    }

    report.outcomes.sort_by_key(|o| o.catalog_index);
    report.unresolved = report
        .outcomes
        .iter()
        .filter(|o| {
            matches!(
                o.error_detail.as_deref(),
                Some(DETAIL_DEADLINE) | Some(DETAIL_CANCELLED)
            )
        })
        .count();

    if report.unresolved > 0 {
        warn!(
            "{} of {} probes for \"{}\" were cut short",
            report.unresolved, report.total_sites, report.token
        );
    }

    report.seal();
    report
}
