//! Decoding staged Parquet trip files into typed rows.
//!
//! Trip files arrive with whatever typing the upstream publisher used, so
//! the two columns aggregation needs are coerced rather than trusted:
//! pickup timestamps that are null or unparseable become `None`, fares
//! that are null or non-numeric become zero. Only file-level problems
//! (unreadable Parquet, a required column missing entirely) are errors.

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::warn;

/// Pickup timestamp column in green-taxi trip files.
pub const PICKUP_COLUMN: &str = "lpep_pickup_datetime";
/// Total fare column in green-taxi trip files.
pub const FARE_COLUMN: &str = "total_amount";

/// String timestamp layouts accepted for the pickup column. The fraction
/// is optional in both.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// One taxi trip, reduced to the two fields aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    /// Pickup timestamp; `None` when the source value was null or
    /// unparseable.
    pub pickup: Option<NaiveDateTime>,
    /// Trip total fare. Null and non-numeric source values coerce to zero.
    pub total_amount: f64,
}

/// Decodes a Parquet trip file into [`TripRecord`] rows.
///
/// Only the pickup and fare columns are read; everything else in the file
/// is skipped via projection. A file missing either column, or that is
/// not readable Parquet at all, is an error naming the problem.
pub fn parse_trips(bytes: Bytes) -> Result<Vec<TripRecord>> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context("not a readable Parquet file")?;

    let schema = builder.schema().clone();
    let pickup_idx = schema
        .index_of(PICKUP_COLUMN)
        .with_context(|| format!("trip file has no '{PICKUP_COLUMN}' column"))?;
    let fare_idx = schema
        .index_of(FARE_COLUMN)
        .with_context(|| format!("trip file has no '{FARE_COLUMN}' column"))?;

    let projection = ProjectionMask::roots(builder.parquet_schema(), [pickup_idx, fare_idx]);
    let reader = builder
        .with_projection(projection)
        .build()
        .context("building Parquet reader")?;

    let mut trips = Vec::new();
    for batch in reader {
        let batch = batch.context("decoding Parquet row batch")?;
        let batch_schema = batch.schema();

        let pickup_col = batch.column(batch_schema.index_of(PICKUP_COLUMN)?);
        let fare_col = batch.column(batch_schema.index_of(FARE_COLUMN)?);

        let pickups = pickup_values(pickup_col)?;
        let fares = fare_values(fare_col);

        trips.extend(
            pickups
                .into_iter()
                .zip(fares)
                .map(|(pickup, total_amount)| TripRecord {
                    pickup,
                    total_amount,
                }),
        );
    }

    Ok(trips)
}

/// Coerces the pickup column to per-row optional timestamps.
///
/// Timezone annotations on timestamp columns are ignored: the source
/// files carry naive local pickup times.
fn pickup_values(col: &ArrayRef) -> Result<Vec<Option<NaiveDateTime>>> {
    match col.data_type() {
        DataType::Timestamp(unit, _) => Ok(timestamp_values(col, unit)),
        DataType::Utf8 => Ok(col
            .as_string::<i32>()
            .iter()
            .map(|value| value.and_then(parse_datetime))
            .collect()),
        other => bail!(
            "unsupported type {other} for column '{PICKUP_COLUMN}' (expected timestamps or strings)"
        ),
    }
}

fn timestamp_values(col: &ArrayRef, unit: &TimeUnit) -> Vec<Option<NaiveDateTime>> {
    match unit {
        TimeUnit::Second => col
            .as_primitive::<TimestampSecondType>()
            .iter()
            .map(|value| {
                value
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|dt| dt.naive_utc())
            })
            .collect(),
        TimeUnit::Millisecond => col
            .as_primitive::<TimestampMillisecondType>()
            .iter()
            .map(|value| {
                value
                    .and_then(DateTime::from_timestamp_millis)
                    .map(|dt| dt.naive_utc())
            })
            .collect(),
        TimeUnit::Microsecond => col
            .as_primitive::<TimestampMicrosecondType>()
            .iter()
            .map(|value| {
                value
                    .and_then(DateTime::from_timestamp_micros)
                    .map(|dt| dt.naive_utc())
            })
            .collect(),
        TimeUnit::Nanosecond => col
            .as_primitive::<TimestampNanosecondType>()
            .iter()
            .map(|value| value.map(|nanos| DateTime::from_timestamp_nanos(nanos).naive_utc()))
            .collect(),
    }
}

/// Parses a string pickup value; `None` on anything unrecognized.
fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    // A bare date still carries a valid pickup date for grouping
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Coerces the fare column to per-row numbers, nulls and garbage to zero.
fn fare_values(col: &ArrayRef) -> Vec<f64> {
    match col.data_type() {
        DataType::Float64 => col
            .as_primitive::<Float64Type>()
            .iter()
            .map(|value| value.unwrap_or(0.0))
            .collect(),
        DataType::Float32 => col
            .as_primitive::<Float32Type>()
            .iter()
            .map(|value| value.map(f64::from).unwrap_or(0.0))
            .collect(),
        DataType::Int64 => col
            .as_primitive::<Int64Type>()
            .iter()
            .map(|value| value.map(|v| v as f64).unwrap_or(0.0))
            .collect(),
        DataType::Int32 => col
            .as_primitive::<Int32Type>()
            .iter()
            .map(|value| value.map(f64::from).unwrap_or(0.0))
            .collect(),
        DataType::Utf8 => col
            .as_string::<i32>()
            .iter()
            .map(|value| {
                value
                    .and_then(|raw| raw.trim().parse::<f64>().ok())
                    .unwrap_or(0.0)
            })
            .collect(),
        other => {
            warn!(
                column = FARE_COLUMN,
                data_type = %other,
                "Unsupported fare column type, treating all fares as zero"
            );
            vec![0.0; col.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, RecordBatch, StringArray, TimestampMicrosecondArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn parquet_bytes(batch: &RecordBatch) -> Bytes {
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        Bytes::from(buf)
    }

    fn micros(datetime: &str) -> i64 {
        NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
            .timestamp_micros()
    }

    fn naive(datetime: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_typed_timestamps_and_fares() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(
                PICKUP_COLUMN,
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new(FARE_COLUMN, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(TimestampMicrosecondArray::from(vec![
                    Some(micros("2025-01-05 08:15:00")),
                    Some(micros("2025-01-06 23:59:59")),
                    None,
                ])),
                Arc::new(Float64Array::from(vec![Some(10.5), Some(5.0), None])),
            ],
        )
        .unwrap();

        let trips = parse_trips(parquet_bytes(&batch)).unwrap();

        assert_eq!(trips.len(), 3);
        assert_eq!(trips[0].pickup, Some(naive("2025-01-05 08:15:00")));
        assert_eq!(trips[0].total_amount, 10.5);
        assert_eq!(trips[1].pickup, Some(naive("2025-01-06 23:59:59")));
        assert_eq!(trips[2].pickup, None);
        assert_eq!(trips[2].total_amount, 0.0);
    }

    #[test]
    fn test_parse_string_timestamps_with_garbage() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(PICKUP_COLUMN, DataType::Utf8, true),
            Field::new(FARE_COLUMN, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![
                    Some("2025-02-01 12:00:00"),
                    Some("2025-02-02T06:30:00.250"),
                    Some("2025-02-03"),
                    Some("not a timestamp"),
                    None,
                ])),
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
            ],
        )
        .unwrap();

        let trips = parse_trips(parquet_bytes(&batch)).unwrap();

        assert_eq!(trips[0].pickup, Some(naive("2025-02-01 12:00:00")));
        assert_eq!(
            trips[1].pickup.map(|p| p.date()),
            Some(NaiveDate::from_ymd_opt(2025, 2, 2).unwrap())
        );
        assert_eq!(trips[2].pickup, Some(naive("2025-02-03 00:00:00")));
        assert_eq!(trips[3].pickup, None);
        assert_eq!(trips[4].pickup, None);
    }

    #[test]
    fn test_parse_string_fares_coerce_to_zero() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(PICKUP_COLUMN, DataType::Utf8, true),
            Field::new(FARE_COLUMN, DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![
                    Some("2025-03-01 10:00:00"),
                    Some("2025-03-01 11:00:00"),
                    Some("2025-03-01 12:00:00"),
                ])),
                Arc::new(StringArray::from(vec![
                    Some("12.34"),
                    Some(" 7.0 "),
                    Some("abc"),
                ])),
            ],
        )
        .unwrap();

        let trips = parse_trips(parquet_bytes(&batch)).unwrap();

        assert_eq!(trips[0].total_amount, 12.34);
        assert_eq!(trips[1].total_amount, 7.0);
        assert_eq!(trips[2].total_amount, 0.0);
    }

    #[test]
    fn test_projection_skips_unrelated_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("vendor_id", DataType::Int64, true),
            Field::new(
                PICKUP_COLUMN,
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("passenger_count", DataType::Int64, true),
            Field::new(FARE_COLUMN, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![2])),
                Arc::new(TimestampMicrosecondArray::from(vec![Some(micros(
                    "2025-01-05 08:15:00",
                ))])),
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(Float64Array::from(vec![10.5])),
            ],
        )
        .unwrap();

        let trips = parse_trips(parquet_bytes(&batch)).unwrap();

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].pickup, Some(naive("2025-01-05 08:15:00")));
        assert_eq!(trips[0].total_amount, 10.5);
    }

    #[test]
    fn test_missing_pickup_column_is_error() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            FARE_COLUMN,
            DataType::Float64,
            true,
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Float64Array::from(vec![1.0]))]).unwrap();

        let err = parse_trips(parquet_bytes(&batch)).unwrap_err();
        assert!(format!("{err:#}").contains(PICKUP_COLUMN));
    }

    #[test]
    fn test_missing_fare_column_is_error() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            PICKUP_COLUMN,
            DataType::Utf8,
            true,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["2025-01-05 08:15:00"]))],
        )
        .unwrap();

        let err = parse_trips(parquet_bytes(&batch)).unwrap_err();
        assert!(format!("{err:#}").contains(FARE_COLUMN));
    }

    #[test]
    fn test_garbage_bytes_are_an_error() {
        assert!(parse_trips(Bytes::from_static(b"definitely not parquet")).is_err());
    }

    #[test]
    fn test_empty_file_yields_no_trips() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(
                PICKUP_COLUMN,
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new(FARE_COLUMN, DataType::Float64, true),
        ]));
        let batch = RecordBatch::new_empty(schema);

        let trips = parse_trips(parquet_bytes(&batch)).unwrap();
        assert!(trips.is_empty());
    }
}
