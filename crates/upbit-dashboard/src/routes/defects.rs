//! 불량 이력 Treemap 대시보드 endpoint.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use upbit_analytics::{DefectDataset, TreemapFigure, TreemapLeaf, TypeCount};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const NO_YEARS_MESSAGE: &str = "데이터에 사용 가능한 연도가 없습니다.";
pub const NO_DATA_FOR_YEAR_MESSAGE: &str = "선택한 연도에는 데이터가 없습니다.";

fn unavailable() -> ApiError {
    ApiError::unavailable("DEFECT_DATA_UNAVAILABLE", "불량 이력 데이터가 로드되지 않았습니다")
}

/// 연도 선택 목록.
#[derive(Debug, Serialize, Deserialize)]
pub struct YearsResponse {
    pub years: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// 연도/유형 선택 쿼리. 비어 있으면 첫 항목을 씁니다.
#[derive(Debug, Default, Deserialize)]
pub struct DefectQuery {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
}

/// 선택한 연도/유형의 집계.
#[derive(Debug, Serialize, Deserialize)]
pub struct DefectSummaryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub year: Option<i32>,
    /// 선택된 불량 유형
    pub category: Option<String>,
    /// 해당 연도의 유형 목록 (빈도 내림차순)
    pub type_counts: Vec<TypeCount>,
    pub leaves: Vec<TreemapLeaf>,
    pub figure: TreemapFigure,
}

impl DefectSummaryResponse {
    fn warning(message: &str, year: Option<i32>) -> Self {
        Self {
            warning: Some(message.to_string()),
            year,
            category: None,
            type_counts: Vec::new(),
            leaves: Vec::new(),
            figure: TreemapFigure::default(),
        }
    }
}

fn summarize(dataset: &DefectDataset, query: DefectQuery) -> ApiResult<DefectSummaryResponse> {
    let years = dataset.available_years();
    let Some(&first_year) = years.first() else {
        return Ok(DefectSummaryResponse::warning(NO_YEARS_MESSAGE, None));
    };

    let year = query.year.unwrap_or(first_year);
    if !years.contains(&year) {
        return Ok(DefectSummaryResponse::warning(NO_DATA_FOR_YEAR_MESSAGE, Some(year)));
    }

    let type_counts = dataset.type_counts(year);
    let category = match query.category {
        Some(c) if type_counts.iter().any(|t| t.category == c) => c,
        Some(c) => {
            return Err(ApiError::not_found(format!(
                "{}년에 없는 불량 유형입니다: {}",
                year, c
            )))
        }
        // 연도가 있으면 유형도 최소 하나 존재
        None => match type_counts.first() {
            Some(t) => t.category.clone(),
            None => return Ok(DefectSummaryResponse::warning(NO_DATA_FOR_YEAR_MESSAGE, Some(year))),
        },
    };

    let leaves = dataset.treemap_leaves(year, &category);
    let figure = TreemapFigure::from_leaves(&leaves);

    Ok(DefectSummaryResponse {
        warning: None,
        year: Some(year),
        category: Some(category),
        type_counts,
        leaves,
        figure,
    })
}

/// 연도 목록.
///
/// GET /api/defects/years
pub async fn list_years(State(state): State<Arc<AppState>>) -> ApiResult<Json<YearsResponse>> {
    let guard = state.defects.read().await;
    let dataset = guard.as_ref().ok_or_else(unavailable)?;

    let years = dataset.available_years();
    let warning = years.is_empty().then(|| NO_YEARS_MESSAGE.to_string());

    Ok(Json(YearsResponse { years, warning }))
}

/// 연도/유형별 Treemap 데이터.
///
/// GET /api/defects/summary?year=2023&type=누수
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DefectQuery>,
) -> ApiResult<Json<DefectSummaryResponse>> {
    let guard = state.defects.read().await;
    let dataset = guard.as_ref().ok_or_else(unavailable)?;

    Ok(Json(summarize(dataset, query)?))
}

/// 불량 이력 라우터 생성.
pub fn defects_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/years", get(list_years))
        .route("/summary", get(get_summary))
}
