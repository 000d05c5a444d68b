//! 일봉 파생 지표와 차트용 시계열.
//!
//! 조회된 행마다 다음 값을 붙입니다:
//! - `change_rate`: (종가 - 시가) / 시가 × 100
//! - `price_change`: 종가 - 전일 종가
//! - `cumulative_volume`: 마켓별 날짜순 누적 거래량

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use upbit_core::PriceRow;

use crate::error::Result;
use crate::rolling::rolling_mean;

/// 단기 이동평균 기간 (일).
pub const SHORT_MA_WINDOW: usize = 5;
/// 장기 이동평균 기간 (일).
pub const LONG_MA_WINDOW: usize = 10;

/// 파생 지표가 붙은 일봉 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub code: String,
    pub opening_price: f64,
    pub closing_price: f64,
    pub prev_closing_price: f64,
    pub volume: f64,
    /// 시가가 0이면 None
    pub change_rate: Option<f64>,
    pub price_change: f64,
    pub cumulative_volume: f64,
}

/// 행 목록에 파생 지표를 계산합니다.
///
/// 날짜순으로 안정 정렬한 뒤 마켓별 누적 거래량을 더해 나갑니다.
pub fn enrich(rows: &[PriceRow]) -> Vec<DailyMetrics> {
    let mut sorted: Vec<&PriceRow> = rows.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let mut running: HashMap<&str, f64> = HashMap::new();

    sorted
        .into_iter()
        .map(|row| {
            let total = running.entry(row.code.as_str()).or_insert(0.0);
            *total += row.volume;

            let change_rate = if row.opening_price == 0.0 {
                None
            } else {
                Some((row.closing_price - row.opening_price) / row.opening_price * 100.0)
            };

            DailyMetrics {
                date: row.date,
                code: row.code.clone(),
                opening_price: row.opening_price,
                closing_price: row.closing_price,
                prev_closing_price: row.prev_closing_price,
                volume: row.volume,
                change_rate,
                price_change: row.closing_price - row.prev_closing_price,
                cumulative_volume: *total,
            }
        })
        .collect()
}

/// 등장 순서대로 중복 없는 마켓 코드 목록.
pub fn coin_codes(metrics: &[DailyMetrics]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for m in metrics {
        if !codes.iter().any(|c| c == &m.code) {
            codes.push(m.code.clone());
        }
    }
    codes
}

/// 차트에 표시할 마켓 선택.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoinSelection {
    /// 전체 보기
    #[default]
    All,
    Coin(String),
}

impl CoinSelection {
    pub fn matches(&self, code: &str) -> bool {
        match self {
            CoinSelection::All => true,
            CoinSelection::Coin(c) => c == code,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CoinSelection::All => "전체 보기",
            CoinSelection::Coin(c) => c,
        }
    }
}

impl FromStr for CoinSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") || s == "전체 보기" {
            Ok(CoinSelection::All)
        } else {
            Ok(CoinSelection::Coin(s.to_string()))
        }
    }
}

/// 시계열로 뽑을 컬럼.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesField {
    Volume,
    CumulativeVolume,
    ChangeRate,
    ClosingPrice,
}

impl SeriesField {
    fn value(&self, m: &DailyMetrics) -> Option<f64> {
        match self {
            SeriesField::Volume => Some(m.volume),
            SeriesField::CumulativeVolume => Some(m.cumulative_volume),
            SeriesField::ChangeRate => m.change_rate,
            SeriesField::ClosingPrice => Some(m.closing_price),
        }
    }
}

/// 마켓 하나의 차트 선.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

/// 선택된 마켓들의 시계열을 마켓 등장 순서대로 만듭니다.
pub fn series(metrics: &[DailyMetrics], field: SeriesField, selection: &CoinSelection) -> Vec<Series> {
    coin_codes(metrics)
        .into_iter()
        .filter(|code| selection.matches(code))
        .map(|code| {
            let rows: Vec<&DailyMetrics> = metrics.iter().filter(|m| m.code == code).collect();
            Series {
                dates: rows.iter().map(|m| m.date).collect(),
                values: rows.iter().map(|m| field.value(m)).collect(),
                name: code,
            }
        })
        .collect()
}

/// 한 마켓의 종가와 이동평균선.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageView {
    pub code: String,
    pub dates: Vec<NaiveDate>,
    pub closing_prices: Vec<f64>,
    pub short_window: usize,
    pub short_ma: Vec<Option<f64>>,
    pub long_window: usize,
    pub long_ma: Vec<Option<f64>>,
}

/// 선택된 마켓의 5일/10일 이동평균을 계산합니다.
pub fn moving_averages(metrics: &[DailyMetrics], code: &str) -> Result<MovingAverageView> {
    let mut rows: Vec<&DailyMetrics> = metrics.iter().filter(|m| m.code == code).collect();
    rows.sort_by_key(|m| m.date);

    let closing_prices: Vec<f64> = rows.iter().map(|m| m.closing_price).collect();

    Ok(MovingAverageView {
        code: code.to_string(),
        dates: rows.iter().map(|m| m.date).collect(),
        short_window: SHORT_MA_WINDOW,
        short_ma: rolling_mean(&closing_prices, SHORT_MA_WINDOW)?,
        long_window: LONG_MA_WINDOW,
        long_ma: rolling_mean(&closing_prices, LONG_MA_WINDOW)?,
        closing_prices,
    })
}
