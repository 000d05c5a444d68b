//! Upbit 일봉 일일 수집기.
//!
//! 이 crate는 하루 한 번 실행되는 수집 배치를 제공합니다:
//! - 환경 사전 점검 (HTTP 클라이언트, DB 서버 접속)
//! - 마켓별 전일 일봉 수집 및 insert-ignore 저장
//! - 워터마크 파일로 같은 날 중복 실행 방지

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, WatermarkPolicy};
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
