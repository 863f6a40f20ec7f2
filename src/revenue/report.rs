//! CSV serialization of the daily revenue table.

use anyhow::Result;
use csv::WriterBuilder;

use super::DailyRevenue;

/// Header of the published CSV, matching the aggregate's field names.
const HEADER: [&str; 2] = ["pickup_date", "revenue"];

/// Serializes revenue rows as a UTF-8 CSV document.
///
/// The header is written even when there are no rows, and the whole
/// document is built in memory so publication always uploads a complete
/// buffer. Identical rows always produce identical bytes, which is what
/// makes aggregation re-runs byte-for-byte idempotent.
pub fn to_csv(rows: &[DailyRevenue]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut buf);
        writer.write_record(HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(date: &str, revenue: f64) -> DailyRevenue {
        DailyRevenue {
            pickup_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            revenue,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let csv = to_csv(&[row("2025-01-05", 10.5), row("2025-01-06", 5.0)]).unwrap();
        let text = String::from_utf8(csv).unwrap();

        assert_eq!(text, "pickup_date,revenue\n2025-01-05,10.5\n2025-01-06,5.0\n");
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "pickup_date,revenue\n");
    }

    #[test]
    fn test_identical_rows_identical_bytes() {
        let rows = vec![row("2025-02-01", 7.25), row("2025-02-02", 0.0)];
        assert_eq!(to_csv(&rows).unwrap(), to_csv(&rows).unwrap());
    }
}
