//! 코인 시계열 대시보드 endpoint.
//!
//! 화면 구성:
//! - 거래량 / 누적 거래량 / 일일 변동률 시계열 (전체 또는 선택한 코인)
//! - 코인별 종가 상관관계 히트맵
//! - 선택한 코인의 5일/10일 이동평균선
//! - 데이터 요약 표

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use upbit_analytics::correlation::{correlation_matrix, PricePivot};
use upbit_analytics::metrics::{coin_codes, moving_averages, series};
use upbit_analytics::{CoinSelection, DailyMetrics, MovingAverageView, Series, SeriesField};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, PriceSnapshot};

/// 조회 결과가 비어 있을 때의 안내 문구.
pub const EMPTY_DATA_WARNING: &str = "데이터가 없습니다. 데이터를 수집 중인지 확인해주세요.";

/// 코인 선택 쿼리.
#[derive(Debug, Default, Deserialize)]
pub struct CoinQuery {
    /// 마켓 코드 또는 "전체 보기" (없으면 전체)
    #[serde(default)]
    pub coin: Option<String>,
}

impl CoinQuery {
    fn selection(&self) -> CoinSelection {
        self.coin
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or_default()
    }
}

/// 코인 선택 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct CoinListResponse {
    /// 첫 항목은 "전체 보기"
    pub options: Vec<String>,
}

/// 히트맵 데이터.
#[derive(Debug, Serialize, Deserialize)]
pub struct CorrelationResponse {
    pub symbols: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
    /// 소수점 둘째 자리 반올림 (셀 텍스트용)
    pub rounded: Vec<Vec<Option<f64>>>,
    pub period: usize,
}

/// 대시보드 한 화면 분량의 데이터.
#[derive(Debug, Serialize, Deserialize)]
pub struct OverviewResponse {
    /// 데이터가 없을 때만 채워짐 (나머지 차트는 비어 있음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// 선택 라벨 ("전체 보기" 또는 마켓 코드)
    pub selection: String,
    pub loaded_at: Option<DateTime<Utc>>,
    pub volume: Vec<Series>,
    pub cumulative_volume: Vec<Series>,
    pub change_rate: Vec<Series>,
    pub correlation: Option<CorrelationResponse>,
    /// 코인 하나를 선택했을 때만 계산
    pub moving_averages: Option<MovingAverageView>,
    /// 데이터 요약 표
    pub summary: Vec<DailyMetrics>,
}

impl OverviewResponse {
    fn empty(selection: &CoinSelection, loaded_at: Option<DateTime<Utc>>) -> Self {
        Self {
            warning: Some(EMPTY_DATA_WARNING.to_string()),
            selection: selection.label().to_string(),
            loaded_at,
            volume: Vec::new(),
            cumulative_volume: Vec::new(),
            change_rate: Vec::new(),
            correlation: None,
            moving_averages: None,
            summary: Vec::new(),
        }
    }
}

fn correlation_of(snapshot: &PriceSnapshot) -> ApiResult<CorrelationResponse> {
    let pivot = PricePivot::closing_prices(&snapshot.rows)?;
    let matrix = correlation_matrix(&pivot);
    Ok(CorrelationResponse {
        rounded: matrix.rounded(),
        symbols: matrix.symbols,
        matrix: matrix.matrix,
        period: matrix.period,
    })
}

fn require_known_coin(snapshot: &PriceSnapshot, selection: &CoinSelection) -> ApiResult<()> {
    match selection {
        CoinSelection::Coin(code) if !snapshot.metrics.iter().any(|m| &m.code == code) => {
            Err(ApiError::not_found(format!("데이터에 없는 코인입니다: {}", code)))
        }
        _ => Ok(()),
    }
}

/// 코인 선택 목록.
///
/// GET /api/timeseries/coins
pub async fn list_coins(State(state): State<Arc<AppState>>) -> Json<CoinListResponse> {
    let snapshot = state.prices.read().await;

    let mut options = vec![CoinSelection::All.label().to_string()];
    options.extend(coin_codes(&snapshot.metrics));

    Json(CoinListResponse { options })
}

/// 전체 화면 데이터.
///
/// GET /api/timeseries/overview?coin=KRW-BTC
pub async fn overview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoinQuery>,
) -> ApiResult<Json<OverviewResponse>> {
    let snapshot = state.prices.read().await;
    let selection = query.selection();

    if snapshot.metrics.is_empty() {
        return Ok(Json(OverviewResponse::empty(&selection, snapshot.loaded_at)));
    }
    require_known_coin(&snapshot, &selection)?;

    let moving_averages = match &selection {
        CoinSelection::Coin(code) => Some(moving_averages(&snapshot.metrics, code)?),
        CoinSelection::All => None,
    };

    let summary = snapshot
        .metrics
        .iter()
        .filter(|m| selection.matches(&m.code))
        .cloned()
        .collect();

    Ok(Json(OverviewResponse {
        warning: None,
        selection: selection.label().to_string(),
        loaded_at: snapshot.loaded_at,
        volume: series(&snapshot.metrics, SeriesField::Volume, &selection),
        cumulative_volume: series(&snapshot.metrics, SeriesField::CumulativeVolume, &selection),
        change_rate: series(&snapshot.metrics, SeriesField::ChangeRate, &selection),
        // 히트맵은 선택과 관계없이 전체 코인 대상
        correlation: Some(correlation_of(&snapshot)?),
        moving_averages,
        summary,
    }))
}

/// 시계열 하나 조회 쿼리.
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub field: SeriesField,
    #[serde(default)]
    pub coin: Option<String>,
}

/// 지정한 컬럼의 시계열.
///
/// GET /api/timeseries/series?field=cumulative_volume&coin=KRW-ETH
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesQuery>,
) -> ApiResult<Json<Vec<Series>>> {
    let snapshot = state.prices.read().await;
    let selection = CoinQuery { coin: query.coin }.selection();
    require_known_coin(&snapshot, &selection)?;

    Ok(Json(series(&snapshot.metrics, query.field, &selection)))
}

/// 종가 상관행렬.
///
/// GET /api/timeseries/correlation
pub async fn get_correlation(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CorrelationResponse>> {
    let snapshot = state.prices.read().await;
    Ok(Json(correlation_of(&snapshot)?))
}

/// 선택한 코인의 이동평균선.
///
/// GET /api/timeseries/moving-averages?coin=KRW-BTC
pub async fn get_moving_averages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoinQuery>,
) -> ApiResult<Json<MovingAverageView>> {
    let snapshot = state.prices.read().await;

    let code = match query.selection() {
        CoinSelection::Coin(code) => code,
        CoinSelection::All => {
            return Err(ApiError::bad_request(
                "이동평균선은 코인 하나를 선택해야 합니다",
            ))
        }
    };
    require_known_coin(&snapshot, &CoinSelection::Coin(code.clone()))?;

    Ok(Json(moving_averages(&snapshot.metrics, &code)?))
}

/// 시계열 라우터 생성.
pub fn timeseries_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/coins", get(list_coins))
        .route("/overview", get(overview))
        .route("/series", get(get_series))
        .route("/correlation", get(get_correlation))
        .route("/moving-averages", get(get_moving_averages))
}
