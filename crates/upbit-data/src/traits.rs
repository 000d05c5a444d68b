//! 수집 배치가 의존하는 데이터 계층 인터페이스.
//!
//! 배치는 구체 타입 대신 이 trait들을 통해 HTTP, DB, 파일에 접근하므로
//! 테스트에서 메모리 구현으로 대체할 수 있습니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use upbit_core::CandleRecord;

use crate::error::Result;
use crate::provider::upbit::UpbitDayCandle;

/// 일봉 캔들 공급자.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// 마켓의 가장 최근 일봉 하나를 조회합니다.
    ///
    /// 응답 배열이 비어 있으면 `Ok(None)`.
    async fn latest_day_candle(&self, market: &str) -> Result<Option<UpbitDayCandle>>;
}

/// 일봉 저장소.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// 데이터베이스와 테이블이 없으면 생성합니다.
    async fn ensure_schema(&self) -> Result<()>;

    /// (date, code)가 이미 있으면 아무것도 하지 않습니다.
    ///
    /// 새 행이 삽입되었으면 `true`.
    async fn insert_ignore(&self, record: &CandleRecord) -> Result<bool>;
}

/// 마지막으로 수집을 마친 날짜 기록.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// 기록이 없으면 `None`.
    async fn read(&self) -> Result<Option<NaiveDate>>;

    async fn write(&self, date: NaiveDate) -> Result<()>;
}
