//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 일봉 데이터와 불량 이력은 메모리에 한 번에 적재되고, 타이머마다 전체를
//! 다시 읽어 교체합니다. 부분 갱신은 하지 않습니다.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use upbit_analytics::metrics::enrich;
use upbit_analytics::{DailyMetrics, DefectDataset};
use upbit_core::PriceRow;
use upbit_data::CandleRepository;

use crate::error::DashboardError;

/// 대시보드가 읽는 일봉 행 공급자.
#[async_trait]
pub trait PriceRowLoader: Send + Sync {
    async fn load_since(&self, since: NaiveDate) -> upbit_data::Result<Vec<PriceRow>>;
}

#[async_trait]
impl PriceRowLoader for CandleRepository {
    async fn load_since(&self, since: NaiveDate) -> upbit_data::Result<Vec<PriceRow>> {
        CandleRepository::load_since(self, since).await
    }
}

/// 마지막으로 적재된 일봉 데이터.
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    pub rows: Vec<PriceRow>,
    /// 파생 지표가 붙은 행 (날짜순)
    pub metrics: Vec<DailyMetrics>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// 마지막 재조회 실패 메시지 (성공하면 지워짐)
    pub last_error: Option<String>,
}

/// 애플리케이션 공유 상태.
pub struct AppState {
    /// 서버 버전
    pub version: String,
    pub started_at: DateTime<Utc>,
    /// 조회 시작일
    pub since: NaiveDate,
    loader: Arc<dyn PriceRowLoader>,
    defect_csv_path: Option<PathBuf>,
    pub prices: RwLock<PriceSnapshot>,
    pub defects: RwLock<Option<DefectDataset>>,
}

impl AppState {
    pub fn new(
        loader: Arc<dyn PriceRowLoader>,
        since: NaiveDate,
        defect_csv_path: Option<PathBuf>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
            since,
            loader,
            defect_csv_path,
            prices: RwLock::new(PriceSnapshot::default()),
            defects: RwLock::new(None),
        }
    }

    /// 서버 업타임(초)
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 불량 이력 CSV 경로가 설정되었는지 여부.
    pub fn defects_configured(&self) -> bool {
        self.defect_csv_path.is_some()
    }

    /// 일봉 데이터를 다시 읽어 교체합니다.
    ///
    /// 실패하면 이전 데이터를 유지하고 에러 메시지만 기록합니다.
    pub async fn reload_prices(&self) -> Result<usize, DashboardError> {
        match self.loader.load_since(self.since).await {
            Ok(rows) => {
                let metrics = enrich(&rows);
                let count = rows.len();

                let mut snapshot = self.prices.write().await;
                *snapshot = PriceSnapshot {
                    rows,
                    metrics,
                    loaded_at: Some(Utc::now()),
                    last_error: None,
                };

                tracing::info!(rows = count, since = %self.since, "일봉 데이터 적재");
                Ok(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "일봉 데이터 조회 실패, 이전 데이터 유지");
                self.prices.write().await.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// 불량 이력 CSV를 다시 읽습니다. 경로가 없으면 아무것도 하지 않습니다.
    pub async fn reload_defects(&self) -> Result<usize, DashboardError> {
        let Some(path) = self.defect_csv_path.clone() else {
            return Ok(0);
        };

        let loaded = tokio::task::spawn_blocking(move || DefectDataset::from_path(path))
            .await
            .map_err(|e| DashboardError::Config(format!("CSV 로드 작업 실패: {}", e)))?;

        match loaded {
            Ok(dataset) => {
                let count = dataset.records().len();
                *self.defects.write().await = Some(dataset);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "불량 이력 CSV 로드 실패");
                Err(e.into())
            }
        }
    }

    /// 두 데이터를 모두 다시 읽습니다. 실패는 로그로만 남깁니다.
    pub async fn reload_all(&self) {
        let _ = self.reload_prices().await;
        let _ = self.reload_defects().await;
    }
}

/// 주기적으로 전체 데이터를 다시 읽는 백그라운드 태스크.
///
/// 첫 재조회는 `period` 뒤에 일어나므로 시작 시 적재는 호출자가 합니다.
pub fn spawn_reload_task(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            tracing::debug!("대시보드 데이터 재조회");
            state.reload_all().await;
        }
    })
}
