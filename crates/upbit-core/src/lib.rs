//! # Upbit Core
//!
//! Upbit 일봉 수집기와 대시보드가 공유하는 핵심 타입을 제공합니다:
//! - 일봉 캔들 레코드와 대시보드 조회 행
//! - 수집 대상 마켓 목록
//! - 로깅 인프라
//! - 공통 에러 타입

pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::*;
pub use logging::*;
