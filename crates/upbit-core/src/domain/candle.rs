//! 일봉 캔들 타입.
//!
//! - `CandleRecord` - 테이블에 저장되는 마켓별 일봉 한 행
//! - `PriceRow` - 대시보드가 조회하는 축약된 행

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 캔들 타임스탬프에서 날짜로 쓰는 앞부분 길이 (`YYYY-MM-DD`).
const DATE_PREFIX_LEN: usize = 10;

/// 마켓별 일봉 레코드.
///
/// (date, code) 쌍은 테이블에서 유일하며, 한 번 저장된 행은 갱신되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct CandleRecord {
    /// 캔들 날짜 (KST 기준)
    pub date: NaiveDate,
    /// 마켓 코드 (예: KRW-BTC)
    pub code: String,
    /// 시가
    pub opening_price: f64,
    /// 종가
    pub closing_price: f64,
    /// 고가
    pub high_price: f64,
    /// 저가
    pub low_price: f64,
    /// 누적 거래량
    pub volume: f64,
    /// 전일 종가 (거래소 제공 값)
    pub prev_closing_price: f64,
}

impl CandleRecord {
    /// 전일 대비 가격 변화.
    pub fn price_change(&self) -> f64 {
        self.closing_price - self.prev_closing_price
    }
}

/// 대시보드 조회 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct PriceRow {
    pub date: NaiveDate,
    pub code: String,
    pub opening_price: f64,
    pub closing_price: f64,
    pub prev_closing_price: f64,
    pub volume: f64,
}

impl From<&CandleRecord> for PriceRow {
    fn from(record: &CandleRecord) -> Self {
        Self {
            date: record.date,
            code: record.code.clone(),
            opening_price: record.opening_price,
            closing_price: record.closing_price,
            prev_closing_price: record.prev_closing_price,
            volume: record.volume,
        }
    }
}

/// KST 캔들 타임스탬프에서 날짜를 추출합니다.
///
/// 앞 10자만 사용하므로 시각과 타임존 접미사는 버려집니다.
///
/// ```
/// use upbit_core::parse_candle_date;
///
/// let date = parse_candle_date("2024-12-10T00:00:00").unwrap();
/// assert_eq!(date.to_string(), "2024-12-10");
/// ```
pub fn parse_candle_date(timestamp_kst: &str) -> CoreResult<NaiveDate> {
    let prefix = timestamp_kst
        .get(..DATE_PREFIX_LEN)
        .ok_or_else(|| CoreError::InvalidDate(timestamp_kst.to_string()))?;

    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|e| CoreError::InvalidDate(format!("{}: {}", timestamp_kst, e)))
}

/// 기준일의 전날.
pub fn previous_day(today: NaiveDate) -> NaiveDate {
    today - Duration::days(1)
}
