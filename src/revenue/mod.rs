//! Daily revenue aggregation.
//!
//! [`revenue_by_day`] folds decoded trip rows into one revenue bucket per
//! pickup date; [`report`] serializes the buckets as the published CSV.

pub mod daily;
pub mod report;

pub use daily::{DailyRevenue, RevenueByDay, revenue_by_day};
pub use report::to_csv;
