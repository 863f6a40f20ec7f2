//! Pipeline configuration.
//!
//! Everything tunable comes from the environment (after `dotenvy` has
//! loaded any `.env` file): bucket name, month window, result file name,
//! source base URL, and the upload staging mode. Storage prefixes and the
//! dataset slug are fixed naming conventions shared by ingestion and
//! aggregation.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::str::FromStr;

/// Storage prefix holding unmodified source data copies.
pub const RAW_PREFIX: &str = "raw";
/// Storage prefix holding derived outputs.
pub const RESULTS_PREFIX: &str = "results";
/// Dataset slug used in source file names and raw keys.
pub const DATASET: &str = "green_tripdata";

const DEFAULT_MONTHS: &str = "2025-01,2025-02,2025-03";
const DEFAULT_RESULT_NAME: &str = "revenue_per_day_2025.csv";
const DEFAULT_SOURCE_BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";

/// One calendar month of the aggregation window, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("month '{s}' is not in YYYY-MM form"))?;
        let year: i32 = year
            .parse()
            .with_context(|| format!("month '{s}' has a non-numeric year"))?;
        let month: u32 = month
            .parse()
            .with_context(|| format!("month '{s}' has a non-numeric month"))?;
        if !(1..=12).contains(&month) {
            bail!("month '{s}' is out of range (expected 01-12)");
        }
        Ok(Month { year, month })
    }
}

/// How upload bodies are staged before the storage put.
///
/// `Memory` puts the fetched or serialized buffer directly. `TempFile`
/// round-trips it through a scoped temp file first; the file is removed
/// when the handle drops, whether or not the upload succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagingMode {
    #[default]
    Memory,
    TempFile,
}

impl FromStr for StagingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StagingMode::Memory),
            "tempfile" => Ok(StagingMode::TempFile),
            other => bail!("unknown staging mode '{other}' (expected 'memory' or 'tempfile')"),
        }
    }
}

/// Typed view of the pipeline environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bucket: String,
    pub months: Vec<Month>,
    pub result_name: String,
    pub source_base_url: String,
    pub staging: StagingMode,
    pub allow_missing_months: bool,
}

impl PipelineConfig {
    /// Reads the configuration from the process environment.
    ///
    /// `PIPELINE_BUCKET` is required and its absence is a fatal error;
    /// every other variable falls back to the defaults of the original
    /// deployment (months 2025-01..03, `revenue_per_day_2025.csv`, the
    /// public CloudFront trip-data URL, in-memory staging).
    pub fn from_env() -> Result<Self> {
        let bucket = std::env::var("PIPELINE_BUCKET")
            .map_err(|_| anyhow::anyhow!("PIPELINE_BUCKET must be set to the target bucket name"))?;

        let months_raw =
            std::env::var("PIPELINE_MONTHS").unwrap_or_else(|_| DEFAULT_MONTHS.to_string());
        let months =
            parse_months(&months_raw).context("PIPELINE_MONTHS could not be parsed")?;

        let result_name = std::env::var("PIPELINE_RESULT_NAME")
            .unwrap_or_else(|_| DEFAULT_RESULT_NAME.to_string());
        let source_base_url = std::env::var("SOURCE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SOURCE_BASE_URL.to_string());

        let staging = match std::env::var("PIPELINE_STAGING") {
            Ok(raw) => raw.parse().context("PIPELINE_STAGING could not be parsed")?,
            Err(_) => StagingMode::default(),
        };

        let allow_missing_months = std::env::var("PIPELINE_ALLOW_MISSING_MONTHS")
            .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "True"))
            .unwrap_or(false);

        Ok(Self {
            bucket,
            months,
            result_name,
            source_base_url,
            staging,
            allow_missing_months,
        })
    }

    /// Source URL for one month of trip data.
    pub fn source_url(&self, month: &Month) -> String {
        format!(
            "{}/{DATASET}_{month}.parquet",
            self.source_base_url.trim_end_matches('/')
        )
    }

    /// Bucket key of the staged raw file for one month.
    pub fn raw_key(&self, month: &Month) -> String {
        format!("{RAW_PREFIX}/{DATASET}_{month}.parquet")
    }

    /// Bucket key of the published result CSV.
    pub fn result_key(&self) -> String {
        format!("{RESULTS_PREFIX}/{}", self.result_name)
    }
}

/// Parses a comma-separated `YYYY-MM` list. Blank entries are ignored;
/// an effectively empty list is an error.
pub fn parse_months(raw: &str) -> Result<Vec<Month>> {
    let months = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(Month::from_str)
        .collect::<Result<Vec<_>>>()?;

    if months.is_empty() {
        bail!("no months configured (expected a comma-separated YYYY-MM list)");
    }
    Ok(months)
}
