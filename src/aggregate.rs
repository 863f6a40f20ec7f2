//! Aggregation stage: fold the raw trip files into the published report.

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::ingest::stage_and_put;
use crate::revenue::{revenue_by_day, to_csv};
use crate::storage::ObjectStore;
use crate::trips::{TripRecord, parse_trips};

/// Content type recorded for the published report.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Reads every staged month, sums revenue per pickup date and publishes
/// the CSV report under the results prefix.
///
/// A missing raw object aborts the stage unless the config allows
/// skipping it, in which case the month is dropped with a warning. An
/// empty input set is always an error; publishing a header-only report
/// would silently mask a broken ingestion.
pub async fn run_aggregation<S: ObjectStore>(cfg: &PipelineConfig, store: &S) -> Result<()> {
    let mut trips: Vec<TripRecord> = Vec::new();
    let mut loaded_months = 0usize;

    for month in &cfg.months {
        let key = cfg.raw_key(month);
        let body = store
            .get(&key)
            .await
            .with_context(|| format!("reading raw object '{key}'"))?;
        let Some(body) = body else {
            if cfg.allow_missing_months {
                warn!(month = %month, key = %key, "Raw object missing, skipping month");
                continue;
            }
            bail!(
                "expected raw object '{key}' for month {month} is missing from bucket '{}'",
                cfg.bucket
            );
        };

        let mut month_trips =
            parse_trips(body).with_context(|| format!("decoding raw object '{key}'"))?;
        info!(month = %month, trips = month_trips.len(), "Loaded raw trip file");
        trips.append(&mut month_trips);
        loaded_months += 1;
    }

    if loaded_months == 0 {
        bail!("no raw trip files were available for the configured months");
    }

    let grouped = revenue_by_day(&trips);
    if grouped.dropped_rows > 0 {
        warn!(
            dropped = grouped.dropped_rows,
            "Dropped rows without a parseable pickup timestamp"
        );
    }
    info!(
        days = grouped.rows.len(),
        trips = trips.len(),
        "Aggregated revenue per pickup date"
    );

    let csv_bytes = to_csv(&grouped.rows)?;
    let result_key = cfg.result_key();
    stage_and_put(store, &result_key, csv_bytes.into(), CSV_CONTENT_TYPE, cfg.staging)
        .await
        .with_context(|| format!("publishing result '{result_key}'"))?;

    info!(key = %result_key, days = grouped.rows.len(), "Published revenue report");
    Ok(())
}
