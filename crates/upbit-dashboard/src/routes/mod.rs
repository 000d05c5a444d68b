//! 대시보드 라우트.
//!
//! # 라우트 구조
//!
//! - `/` - 대시보드 페이지 (Plotly)
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/timeseries` - 코인 시계열, 상관관계, 이동평균
//! - `/api/defects` - 불량 이력 Treemap

pub mod defects;
pub mod health;
pub mod timeseries;

pub use defects::{defects_router, DefectQuery, DefectSummaryResponse, YearsResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use timeseries::{
    timeseries_router, CoinListResponse, CoinQuery, CorrelationResponse, OverviewResponse,
};

use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// 대시보드 페이지.
///
/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// API 라우터 생성 (상태 미지정).
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .nest("/health", health_router())
        .nest("/api/timeseries", timeseries_router())
        .nest("/api/defects", defects_router())
}

/// 미들웨어까지 적용한 전체 라우터.
pub fn create_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        // 읽기 전용 GET API
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([axum::http::Method::GET]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorResponse;
    use crate::state::test_support::{row, state_with};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use upbit_analytics::{DefectDataset, DefectRecord};

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let app = create_router(state_with(vec![]));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("/api/timeseries/overview"));
    }

    #[tokio::test]
    async fn test_overview_through_router() {
        let state = state_with(vec![
            row(10, "KRW-BTC", 100.0),
            row(10, "KRW-ETH", 10.0),
            row(11, "KRW-BTC", 110.0),
            row(11, "KRW-ETH", 12.0),
            row(12, "KRW-BTC", 105.0),
            row(12, "KRW-ETH", 11.0),
        ]);
        state.reload_prices().await.unwrap();
        let app = create_router(state);

        let (status, body) = get_json(app, "/api/timeseries/overview").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selection"], "전체 보기");
        assert_eq!(body["volume"].as_array().unwrap().len(), 2);
        assert_eq!(body["cumulative_volume"][0]["values"][2], 3.0);
        assert_eq!(body["correlation"]["symbols"][0], "KRW-BTC");
        assert_eq!(body["correlation"]["rounded"][0][0], 1.0);
        assert!(body["moving_averages"].is_null());
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_moving_averages_requires_single_coin() {
        let state = state_with(vec![row(10, "KRW-BTC", 100.0)]);
        state.reload_prices().await.unwrap();
        let app = create_router(state);

        let (status, body) = get_json(app, "/api/timeseries/moving-averages").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiErrorResponse = serde_json::from_value(body).unwrap();
        assert_eq!(error.code, "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_defects_unavailable_without_dataset() {
        let app = create_router(state_with(vec![]));

        let (status, body) = get_json(app, "/api/defects/years").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "DEFECT_DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_defect_summary_through_router() {
        let state = state_with(vec![]);
        *state.defects.write().await = Some(DefectDataset::from_records(vec![DefectRecord {
            category: "누수".to_string(),
            subtype: "배관".to_string(),
            description: "배관 교체".to_string(),
            occurred: "2023-03-01".to_string(),
            year: Some(2023),
        }]));
        let app = create_router(state);

        let (status, body) = get_json(app.clone(), "/api/defects/years").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["years"][0], 2023);

        let (status, body) = get_json(app, "/api/defects/summary?year=2023").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "누수");
        assert_eq!(
            body["figure"]["ids"],
            serde_json::json!(["누수", "누수/배관", "누수/배관/1. 배관 교체 (1)"])
        );
    }
}
