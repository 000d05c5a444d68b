//! 헬스 체크 endpoint.
//!
//! 일봉 스냅샷과 불량 이력 데이터의 적재 상태를 보고합니다.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded" | "unhealthy")
    pub status: String,

    /// 서버 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 일봉 데이터 스냅샷
    pub prices: ComponentStatus,

    /// 불량 이력 CSV
    pub defects: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down" | "not_configured")
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            message: None,
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 일봉 데이터를 한 번도 적재하지 못했으면 503을 반환합니다.
/// GET /health/ready
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut overall_status = "healthy";
    let mut status_code = StatusCode::OK;

    let prices_status = {
        let snapshot = state.prices.read().await;
        match (&snapshot.loaded_at, &snapshot.last_error) {
            (Some(loaded_at), None) => ComponentStatus::up_with_info(format!(
                "{} rows since {}, loaded at {}",
                snapshot.rows.len(),
                state.since,
                loaded_at.to_rfc3339()
            )),
            (Some(_), Some(error)) => {
                // 이전 데이터로 계속 서비스
                overall_status = "degraded";
                ComponentStatus::down(error.clone())
            }
            (None, error) => {
                overall_status = "unhealthy";
                status_code = StatusCode::SERVICE_UNAVAILABLE;
                ComponentStatus::down(error.clone().unwrap_or_else(|| "아직 적재되지 않음".to_string()))
            }
        }
    };

    let defects_status = if state.defects_configured() {
        match state.defects.read().await.as_ref() {
            Some(dataset) => ComponentStatus::up_with_info(format!(
                "{} records, {} dropped, {} skipped lines",
                dataset.records().len(),
                dataset.dropped_rows(),
                dataset.skipped_lines()
            )),
            None => {
                if overall_status == "healthy" {
                    overall_status = "degraded";
                }
                ComponentStatus::down("CSV 로드 실패")
            }
        }
    } else {
        ComponentStatus::not_configured()
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            prices: prices_status,
            defects: defects_status,
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{row, state_with};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn ready(state: Arc<AppState>) -> (StatusCode, HealthResponse) {
        let app = Router::new()
            .route("/health/ready", get(health_ready))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let app = Router::new().route("/health", get(health_check));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_before_first_load_is_unavailable() {
        let (status, health) = ready(state_with(vec![])).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.status, "unhealthy");
        assert_eq!(health.components.prices.status, "down");
    }

    #[tokio::test]
    async fn test_ready_after_load_is_healthy() {
        let state = state_with(vec![row(10, "KRW-BTC", 100.0)]);
        state.reload_prices().await.unwrap();

        let (status, health) = ready(state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, "healthy");
        assert!(!health.version.is_empty());
        assert_eq!(health.components.defects.status, "not_configured");
        assert!(health
            .components
            .prices
            .message
            .unwrap()
            .starts_with("1 rows since 2024-12-10"));
    }
}
