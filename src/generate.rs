use anyhow::{Context, Result};
use catholic_calendar_core::{CalendarSource, FeedConfig, build_icalendar, collect_records};
use std::path::{Path, PathBuf};

/// Fetch the given years, build the feed and write it to `output`.
///
/// Nothing is written when fetching or normalizing fails.
pub async fn generate_calendar<S: CalendarSource>(
    source: &S,
    years: &[i32],
    config: &FeedConfig,
    output: &Path,
) -> Result<PathBuf> {
    let records = collect_records(source, years)
        .await
        .context("Failed to fetch calendar data from romcal")?;

    let ics = build_icalendar(&records, config).context("Failed to build calendar feed")?;

    tokio::fs::write(output, ics)
        .await
        .with_context(|| format!("Failed to write calendar to {}", output.display()))?;

    tracing::info!(events = records.len(), path = %output.display(), "wrote calendar");
    Ok(output.to_path_buf())
}
