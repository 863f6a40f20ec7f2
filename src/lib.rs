pub mod aggregate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod revenue;
pub mod storage;
pub mod trips;
