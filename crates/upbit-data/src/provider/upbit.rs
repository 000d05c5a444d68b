//! Upbit 시세 REST 클라이언트.
//!
//! 인증이 필요 없는 공개 캔들 API만 사용합니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use upbit_data::{UpbitClient, UpbitClientConfig};
//!
//! let client = UpbitClient::new(UpbitClientConfig::default())?;
//! if let Some(candle) = client.fetch_latest_day_candle("KRW-BTC").await? {
//!     let record = candle.to_record("KRW-BTC")?;
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use upbit_core::{parse_candle_date, CandleRecord};

use crate::error::{DataError, Result};
use crate::traits::CandleSource;

/// 공개 API 기본 주소.
pub const DEFAULT_BASE_URL: &str = "https://api.upbit.com";

/// 일봉 캔들 조회 경로.
const DAY_CANDLES_PATH: &str = "/v1/candles/days";

/// Upbit 일봉 응답 항목.
///
/// 저장에 필요한 필드만 필수이며 나머지는 있으면 보존합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpbitDayCandle {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub candle_date_time_utc: Option<String>,
    /// KST 기준 캔들 시작 시각 (예: 2024-12-10T09:00:00)
    pub candle_date_time_kst: String,
    pub opening_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    /// 종가 (당일 진행 중이면 현재가)
    pub trade_price: f64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub candle_acc_trade_price: Option<f64>,
    pub candle_acc_trade_volume: f64,
    pub prev_closing_price: f64,
    #[serde(default)]
    pub change_price: Option<f64>,
    #[serde(default)]
    pub change_rate: Option<f64>,
}

impl UpbitDayCandle {
    /// 저장용 레코드로 변환합니다.
    ///
    /// `code`는 응답의 `market`이 아니라 요청한 마켓 코드입니다.
    pub fn to_record(&self, code: &str) -> Result<CandleRecord> {
        Ok(CandleRecord {
            date: parse_candle_date(&self.candle_date_time_kst)?,
            code: code.to_string(),
            opening_price: self.opening_price,
            closing_price: self.trade_price,
            high_price: self.high_price,
            low_price: self.low_price,
            volume: self.candle_acc_trade_volume,
            prev_closing_price: self.prev_closing_price,
        })
    }
}

/// 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct UpbitClientConfig {
    pub base_url: String,
    /// 요청당 타임아웃
    pub timeout: Duration,
    /// 일시적 오류 재시도 횟수 (0이면 한 번만 요청)
    pub max_retries: u32,
    /// 재시도 기본 대기 시간 (시도 횟수만큼 곱해짐)
    pub retry_delay: Duration,
}

impl Default for UpbitClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Upbit REST 클라이언트.
#[derive(Clone)]
pub struct UpbitClient {
    client: reqwest::Client,
    config: UpbitClientConfig,
}

impl UpbitClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: UpbitClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("upbit-collector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            config: UpbitClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    pub fn config(&self) -> &UpbitClientConfig {
        &self.config
    }

    /// 최근 일봉 `count`개를 조회합니다 (최신순).
    pub async fn fetch_day_candles(&self, market: &str, count: u32) -> Result<Vec<UpbitDayCandle>> {
        let url = format!("{}{}", self.config.base_url, DAY_CANDLES_PATH);
        let count = count.to_string();

        debug!(market = market, url = %url, "Upbit 일봉 요청");

        let response = self
            .client
            .get(&url)
            .query(&[("count", count.as_str()), ("market", market)])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            DataError::Parse(format!("JSON 파싱 실패 ({}): {} - {}", market, e, body))
        })
    }

    /// 가장 최근 일봉 하나를 조회합니다 (재시도 포함).
    ///
    /// 네트워크 오류, 타임아웃, 429/5xx 응답만 재시도합니다.
    pub async fn fetch_latest_day_candle(&self, market: &str) -> Result<Option<UpbitDayCandle>> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_day_candles(market, 1).await {
                Ok(candles) => return Ok(candles.into_iter().next()),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        market = market,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "Upbit 요청 재시도 예정"
                    );
                    tokio::time::sleep(self.config.retry_delay * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CandleSource for UpbitClient {
    async fn latest_day_candle(&self, market: &str) -> Result<Option<UpbitDayCandle>> {
        self.fetch_latest_day_candle(market).await
    }
}
