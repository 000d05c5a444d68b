//! 데이터 수집 모듈.

pub mod daily_ingest;
pub mod environment;

pub use daily_ingest::{BatchOutcome, DailyIngest, MarketOutcome};
pub use environment::check_environment;
