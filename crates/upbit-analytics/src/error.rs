//! 분석 모듈 오류 타입.

use thiserror::Error;

/// 분석 관련 오류.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// 파일 입출력 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 형식 오류
    #[error("CSV error: {0}")]
    Csv(String),

    /// 잘못된 파라미터
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// 잘못된 데이터
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<csv::Error> for AnalyticsError {
    fn from(err: csv::Error) -> Self {
        AnalyticsError::Csv(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
