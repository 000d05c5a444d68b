//! 일일 일봉 수집 배치.
//!
//! # 처리 순서
//!
//! 1. 스키마 확인 (데이터베이스, 테이블 생성)
//! 2. 워터마크가 어제 날짜면 종료 (HTTP 요청, 저장 모두 없음)
//! 3. 설정된 순서대로 마켓마다 조회 → 저장. 한 마켓의 실패는 다음 마켓에 영향 없음
//! 4. 정책에 따라 워터마크에 어제 날짜 기록
//!
//! 루프 도중 프로세스가 종료되면 워터마크는 기록되지 않으므로 다음 실행에서
//! 전체 배치를 다시 시도합니다.

use chrono::NaiveDate;
use std::time::{Duration, Instant};
use upbit_core::{previous_day, Market, MarketList};
use upbit_data::{CandleSource, CandleStore, WatermarkStore};

use crate::config::WatermarkPolicy;
use crate::{CollectionStats, CollectorConfig, Result};

/// 마켓 하나의 처리 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketOutcome {
    /// 새 행 저장
    Inserted(NaiveDate),
    /// 이미 같은 (date, code) 행이 있음
    Duplicate(NaiveDate),
    /// 응답 배열이 비어 있음
    Empty,
    /// 조회, 변환 또는 저장 실패
    Failed(String),
}

/// 배치 실행 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// 워터마크가 이미 어제 날짜라 아무것도 하지 않음
    Skipped { watermark: NaiveDate },
    /// 모든 마켓을 시도함
    Completed {
        stats: CollectionStats,
        watermark_written: bool,
    },
}

/// 일일 수집 배치.
pub struct DailyIngest<S, T, W> {
    source: S,
    store: T,
    watermark: W,
    markets: MarketList,
    request_delay: Duration,
    policy: WatermarkPolicy,
}

impl<S, T, W> DailyIngest<S, T, W>
where
    S: CandleSource,
    T: CandleStore,
    W: WatermarkStore,
{
    pub fn new(source: S, store: T, watermark: W, markets: MarketList) -> Self {
        Self {
            source,
            store,
            watermark,
            markets,
            request_delay: Duration::ZERO,
            policy: WatermarkPolicy::default(),
        }
    }

    /// 설정의 마켓 목록, 요청 간 딜레이, 워터마크 정책을 사용합니다.
    pub fn from_config(source: S, store: T, watermark: W, config: &CollectorConfig) -> Self {
        Self::new(source, store, watermark, config.markets.clone())
            .with_request_delay(config.ingest.request_delay())
            .with_policy(config.ingest.watermark_policy)
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_policy(mut self, policy: WatermarkPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 오늘 실행을 건너뛸지 확인합니다. 건너뛴다면 현재 워터마크를 반환.
    pub async fn already_collected(&self, today: NaiveDate) -> Result<Option<NaiveDate>> {
        let yesterday = previous_day(today);
        let watermark = self.watermark.read().await?;
        Ok(watermark.filter(|w| *w == yesterday))
    }

    /// 배치를 실행합니다.
    ///
    /// 스키마 생성과 워터마크 입출력 실패만 에러로 반환하고, 마켓별 실패는
    /// 통계에만 반영됩니다.
    pub async fn run(&self, today: NaiveDate) -> Result<BatchOutcome> {
        let start = Instant::now();
        let yesterday = previous_day(today);

        self.store.ensure_schema().await?;

        if let Some(watermark) = self.already_collected(today).await? {
            tracing::info!(watermark = %watermark, "이미 수집 완료된 날짜, 배치 건너뜀");
            return Ok(BatchOutcome::Skipped { watermark });
        }

        tracing::info!(
            markets = self.markets.len(),
            target_date = %yesterday,
            "일봉 수집 시작"
        );

        let mut stats = CollectionStats::new();

        for (idx, market) in self.markets.iter().enumerate() {
            stats.total += 1;

            tracing::debug!(
                market = %market.code,
                progress = format!("{}/{}", idx + 1, self.markets.len()),
                "수집 시작"
            );

            match self.ingest_market(market).await {
                MarketOutcome::Inserted(date) => {
                    stats.success += 1;
                    tracing::info!(market = %market.code, name = %market.name, date = %date, "저장 완료");
                }
                MarketOutcome::Duplicate(date) => {
                    stats.duplicates += 1;
                    tracing::info!(market = %market.code, date = %date, "이미 저장된 데이터");
                }
                MarketOutcome::Empty => {
                    stats.empty += 1;
                    tracing::warn!(market = %market.code, "데이터 없음");
                }
                MarketOutcome::Failed(error) => {
                    stats.errors += 1;
                    tracing::error!(market = %market.code, error = %error, "수집 실패");
                }
            }

            // Rate limiting
            if !self.request_delay.is_zero() && idx + 1 < self.markets.len() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        let watermark_written = match self.policy {
            WatermarkPolicy::Always => true,
            WatermarkPolicy::AllSucceeded => stats.all_succeeded(),
        };

        if watermark_written {
            self.watermark.write(yesterday).await?;
            tracing::info!(watermark = %yesterday, "워터마크 기록");
        } else {
            tracing::warn!(
                errors = stats.errors,
                empty = stats.empty,
                "실패한 마켓이 있어 워터마크를 기록하지 않음"
            );
        }

        stats.elapsed = start.elapsed();
        Ok(BatchOutcome::Completed {
            stats,
            watermark_written,
        })
    }

    /// 마켓 하나를 조회하고 저장합니다. 에러는 결과값으로 돌려줍니다.
    async fn ingest_market(&self, market: &Market) -> MarketOutcome {
        let candle = match self.source.latest_day_candle(&market.code).await {
            Ok(Some(candle)) => candle,
            Ok(None) => return MarketOutcome::Empty,
            Err(e) => return MarketOutcome::Failed(e.to_string()),
        };

        let record = match candle.to_record(&market.code) {
            Ok(record) => record,
            Err(e) => return MarketOutcome::Failed(e.to_string()),
        };

        match self.store.insert_ignore(&record).await {
            Ok(true) => MarketOutcome::Inserted(record.date),
            Ok(false) => MarketOutcome::Duplicate(record.date),
            Err(e) => MarketOutcome::Failed(format!("저장 실패: {}", e)),
        }
    }
}
