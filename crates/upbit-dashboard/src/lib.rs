//! Upbit 일봉 대시보드 서버.
//!
//! 수집된 일봉을 메모리에 적재해 시계열/상관관계/이동평균 화면을 제공하고,
//! 불량 이력 CSV로 Treemap 화면을 제공합니다.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::DashboardConfig;
pub use error::{ApiError, ApiErrorResponse, ApiResult, DashboardError};
pub use routes::create_router;
pub use state::{spawn_reload_task, AppState, PriceRowLoader, PriceSnapshot};
