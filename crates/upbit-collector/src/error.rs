//! 에러 타입 정의.

use thiserror::Error;
use upbit_data::DataError;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 환경 사전 점검 실패
    #[error("Environment check failed: {0}")]
    Environment(String),

    /// 데이터 계층 에러 (DB, 워터마크 파일)
    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<upbit_core::CoreError> for CollectorError {
    fn from(err: upbit_core::CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
