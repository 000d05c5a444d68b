//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use upbit_core::MarketList;
use upbit_data::{DatabaseConfig, UpbitClientConfig};

/// 기본 워터마크 파일 경로
pub const DEFAULT_WATERMARK_PATH: &str = "progress_second.txt";

/// 배치 종료 시 워터마크 기록 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkPolicy {
    /// 마켓별 결과와 관계없이 항상 기록
    #[default]
    Always,
    /// 모든 마켓이 에러/빈 응답 없이 끝났을 때만 기록
    AllSucceeded,
}

impl FromStr for WatermarkPolicy {
    type Err = CollectorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "all_succeeded" | "all-succeeded" => Ok(Self::AllSucceeded),
            other => Err(CollectorError::Config(format!(
                "알 수 없는 WATERMARK_POLICY: {}",
                other
            ))),
        }
    }
}

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 접속 설정
    pub database: DatabaseConfig,
    /// Upbit API 설정
    pub upbit: UpbitClientConfig,
    /// 수집 대상 마켓 (순서대로 처리)
    pub markets: MarketList,
    /// 일일 수집 설정
    pub ingest: IngestConfig,
}

/// 일일 수집 설정
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// 워터마크 파일 경로
    pub watermark_path: PathBuf,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 워터마크 기록 정책
    pub watermark_policy: WatermarkPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            watermark_path: PathBuf::from(DEFAULT_WATERMARK_PATH),
            request_delay_ms: 100,
            watermark_policy: WatermarkPolicy::default(),
        }
    }
}

impl IngestConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일 포함)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let database = DatabaseConfig::from_lookup(&env.0)?;

        let defaults = UpbitClientConfig::default();
        let upbit = UpbitClientConfig {
            base_url: env.get("UPBIT_API_URL").unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(env.parse("UPBIT_TIMEOUT_SECS", 10)),
            max_retries: env.parse("UPBIT_MAX_RETRIES", 0),
            retry_delay: Duration::from_millis(env.parse("UPBIT_RETRY_DELAY_MS", 500)),
        };

        let markets = match env.get("UPBIT_MARKETS") {
            Some(list) => MarketList::parse(&list)?,
            None => MarketList::default(),
        };

        let watermark_policy = match env.get("WATERMARK_POLICY") {
            Some(v) => v.parse()?,
            None => WatermarkPolicy::default(),
        };

        Ok(Self {
            database,
            upbit,
            markets,
            ingest: IngestConfig {
                watermark_path: env
                    .get("WATERMARK_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_WATERMARK_PATH)),
                request_delay_ms: env.parse("UPBIT_REQUEST_DELAY_MS", 100),
                watermark_policy,
            },
        })
    }
}

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    /// 빈 문자열은 설정되지 않은 것으로 취급
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
