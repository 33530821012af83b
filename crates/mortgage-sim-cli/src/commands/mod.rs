pub mod batch;
pub mod metrics;
pub mod rates;
pub mod schedule;
