//! 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - Upbit 일봉 REST 클라이언트
//! - MySQL 일봉 테이블 저장소 (insert-ignore)
//! - 마지막 수집 날짜를 기록하는 워터마크 파일
//! - 수집 배치가 의존하는 trait (`CandleSource`, `CandleStore`, `WatermarkStore`)

pub mod error;
pub mod provider;
pub mod storage;
pub mod traits;

pub use error::{DataError, Result};
pub use provider::upbit::{UpbitClient, UpbitClientConfig, UpbitDayCandle};
pub use storage::candles::{CandleRepository, DatabaseConfig};
pub use storage::watermark::FileWatermark;
pub use traits::{CandleSource, CandleStore, WatermarkStore};
