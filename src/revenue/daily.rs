use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::trips::TripRecord;

/// Revenue for one pickup date: the sum of the total fare across every
/// trip picked up on that calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub pickup_date: NaiveDate,
    pub revenue: f64,
}

/// Aggregation result: one row per distinct pickup date, ascending, plus
/// the number of rows dropped for lacking a parseable pickup timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueByDay {
    pub rows: Vec<DailyRevenue>,
    pub dropped_rows: usize,
}

/// Groups trips by pickup date and sums fares.
///
/// The date buckets for the whole window live in one map, so a date that
/// appears in several input files still yields a single merged row.
/// Trips without a pickup timestamp are excluded from the grouping and
/// counted; their fares contribute nowhere.
pub fn revenue_by_day(trips: &[TripRecord]) -> RevenueByDay {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut dropped_rows = 0usize;

    for trip in trips {
        match trip.pickup {
            Some(pickup) => *by_day.entry(pickup.date()).or_insert(0.0) += trip.total_amount,
            None => dropped_rows += 1,
        }
    }

    let rows = by_day
        .into_iter()
        .map(|(pickup_date, revenue)| DailyRevenue {
            pickup_date,
            revenue,
        })
        .collect();

    RevenueByDay { rows, dropped_rows }
}
