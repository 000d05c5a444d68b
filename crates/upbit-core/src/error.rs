//! 공통 에러 타입.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 마켓 코드
    #[error("잘못된 마켓 코드: {0}")]
    InvalidMarket(String),

    /// 날짜 파싱 에러
    #[error("날짜 파싱 에러: {0}")]
    InvalidDate(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
