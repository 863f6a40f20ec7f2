//! Ingestion stage: copy the source trip files into the raw prefix.

use anyhow::{Context, Result};
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::{PipelineConfig, StagingMode};
use crate::fetch::{HttpClient, fetch_bytes};
use crate::storage::ObjectStore;

/// Content type recorded for staged Parquet objects.
pub const PARQUET_CONTENT_TYPE: &str = "application/octet-stream";

/// Downloads every configured month and stores the bytes at its raw key.
///
/// Months are processed strictly in order and the first fetch or upload
/// failure aborts the stage; retry is the orchestrator's business.
/// Re-running against unchanged sources overwrites the same keys byte
/// for byte, so ingestion is idempotent.
pub async fn run_ingestion<C, S>(cfg: &PipelineConfig, http: &C, store: &S) -> Result<()>
where
    C: HttpClient,
    S: ObjectStore,
{
    for month in &cfg.months {
        let url = cfg.source_url(month);
        let key = cfg.raw_key(month);

        info!(month = %month, url = %url, "Downloading trip data");
        let body = fetch_bytes(http, &url)
            .await
            .with_context(|| format!("download failed for '{url}'"))?;

        info!(month = %month, key = %key, bytes = body.len(), "Uploading raw object");
        stage_and_put(store, &key, Bytes::from(body), PARQUET_CONTENT_TYPE, cfg.staging)
            .await
            .with_context(|| format!("upload failed for '{key}'"))?;
    }

    info!(months = cfg.months.len(), "Ingestion complete");
    Ok(())
}

/// Routes an upload body through the configured staging mode.
///
/// `Memory` puts the buffer directly. `TempFile` writes it to a
/// [`NamedTempFile`] and uploads from there; dropping the handle removes
/// the file on success, on upload failure, and on unwinding alike, so no
/// staging file ever outlives the call.
pub async fn stage_and_put<S: ObjectStore>(
    store: &S,
    key: &str,
    body: Bytes,
    content_type: &str,
    staging: StagingMode,
) -> Result<()> {
    match staging {
        StagingMode::Memory => store.put(key, body, content_type).await,
        StagingMode::TempFile => {
            let staged = NamedTempFile::new().context("creating staging temp file")?;
            std::fs::write(staged.path(), &body)
                .with_context(|| format!("writing staging file for '{key}'"))?;
            let restored = std::fs::read(staged.path())
                .with_context(|| format!("reading staging file for '{key}'"))?;
            store.put(key, Bytes::from(restored), content_type).await
        }
    }
}
