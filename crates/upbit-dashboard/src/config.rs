//! 대시보드 설정.

use chrono::NaiveDate;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use upbit_data::DatabaseConfig;

use crate::error::DashboardError;

/// 기본 조회 시작일
pub const DEFAULT_SINCE: &str = "2024-12-10";

/// 대시보드 서버 설정
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// 바인드 주소
    pub addr: SocketAddr,
    /// 데이터베이스 접속 설정
    pub database: DatabaseConfig,
    /// 이 날짜 이후 행만 조회
    pub since: NaiveDate,
    /// 전체 데이터 재조회 주기
    pub refresh_interval: Duration,
    /// 불량 이력 CSV 경로
    pub defect_csv_path: PathBuf,
}

impl DashboardConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일 포함)
    pub fn from_env() -> Result<Self, DashboardError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = get("DASHBOARD_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8501".to_string())
            .parse()
            .map_err(|e| DashboardError::Config(format!("DASHBOARD_ADDR: {}", e)))?;

        let since_raw = get("DASHBOARD_SINCE").unwrap_or_else(|| DEFAULT_SINCE.to_string());
        let since = NaiveDate::parse_from_str(since_raw.trim(), "%Y-%m-%d")
            .map_err(|e| DashboardError::Config(format!("DASHBOARD_SINCE '{}': {}", since_raw, e)))?;

        let refresh_secs: u64 = get("DASHBOARD_REFRESH_SECS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(3600);
        if refresh_secs == 0 {
            return Err(DashboardError::Config(
                "DASHBOARD_REFRESH_SECS는 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(Self {
            addr,
            database: DatabaseConfig::from_lookup(&lookup)?,
            since,
            refresh_interval: Duration::from_secs(refresh_secs),
            defect_csv_path: get("DEFECT_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data.csv")),
        })
    }
}
