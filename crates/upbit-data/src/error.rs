//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 수집/저장 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 2xx가 아닌 HTTP 응답
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// JSON/필드 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    Query(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    Insert(String),

    /// 워터마크 파일 입출력 오류
    #[error("Watermark error: {0}")]
    Watermark(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// 재시도하면 성공할 수 있는 일시적 오류인지 확인.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(_) | DataError::Timeout(_) => true,
            DataError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => DataError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => DataError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => DataError::Connection("Connection pool timed out".to_string()),
            sqlx::Error::Database(db_err) => DataError::Query(db_err.message().to_string()),
            _ => DataError::Query(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::Parse(err.to_string())
        } else {
            DataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

impl From<upbit_core::CoreError> for DataError {
    fn from(err: upbit_core::CoreError) -> Self {
        match err {
            upbit_core::CoreError::InvalidDate(msg) => DataError::Parse(msg),
            other => DataError::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DataError::Network("reset".into()).is_retryable());
        assert!(DataError::Timeout("10s".into()).is_retryable());
        assert!(DataError::HttpStatus { status: 503, body: String::new() }.is_retryable());
        assert!(DataError::HttpStatus { status: 429, body: String::new() }.is_retryable());
        assert!(!DataError::HttpStatus { status: 404, body: String::new() }.is_retryable());
        assert!(!DataError::Parse("eof".into()).is_retryable());
    }

    #[test]
    fn test_invalid_date_maps_to_parse() {
        let err: DataError = upbit_core::CoreError::InvalidDate("x".into()).into();
        assert!(matches!(err, DataError::Parse(_)));
    }
}
