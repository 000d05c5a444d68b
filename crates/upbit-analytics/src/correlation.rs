//! 상관계수 계산 모듈.
//!
//! 마켓 간 종가 움직임의 상관관계를 계산합니다.
//!
//! # 주요 기능
//!
//! - **피벗**: 날짜 × 마켓 종가 표 (없는 칸은 비어 있음)
//! - **Pearson 상관계수**: 두 시계열 간 선형 상관관계
//! - **상관행렬**: 마켓 쌍마다 두 값이 모두 있는 날짜만으로 계산
//!
//! # 예시
//!
//! ```rust,ignore
//! use upbit_analytics::correlation::{correlation_matrix, PricePivot};
//!
//! let pivot = PricePivot::closing_prices(&rows)?;
//! let matrix = correlation_matrix(&pivot);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use upbit_core::PriceRow;

use crate::error::{AnalyticsError, Result};

/// 상관행렬 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// 마켓 목록 (행/열 순서)
    pub symbols: Vec<String>,
    /// 상관계수 행렬 (N×N, -1.0 ~ 1.0). 계산할 수 없는 칸은 `None`
    pub matrix: Vec<Vec<Option<f64>>>,
    /// 분석 기간 (날짜 수)
    pub period: usize,
}

impl CorrelationMatrix {
    /// 두 마켓 간 상관계수.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.matrix[i][j]
    }

    /// 소수점 둘째 자리로 반올림한 표시용 행렬.
    pub fn rounded(&self) -> Vec<Vec<Option<f64>>> {
        self.matrix
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| v.map(|c| (c * 100.0).round() / 100.0))
                    .collect()
            })
            .collect()
    }
}

/// 날짜 × 마켓 피벗 표.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricePivot {
    /// 행 인덱스 (오름차순)
    pub dates: Vec<NaiveDate>,
    /// 열 인덱스 (마켓 코드 사전순)
    pub codes: Vec<String>,
    /// `cells[date][code]`
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PricePivot {
    /// 종가로 피벗 표를 만듭니다.
    ///
    /// 같은 (date, code)가 두 번 나오면 오류입니다.
    pub fn closing_prices(rows: &[PriceRow]) -> Result<Self> {
        let dates: Vec<NaiveDate> = rows
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes: Vec<String> = rows
            .iter()
            .map(|r| r.code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let date_index: BTreeMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let code_index: BTreeMap<&str, usize> = codes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut cells = vec![vec![None; codes.len()]; dates.len()];
        for row in rows {
            let cell = &mut cells[date_index[&row.date]][code_index[row.code.as_str()]];
            if cell.is_some() {
                return Err(AnalyticsError::InvalidData(format!(
                    "중복 행: {} {}",
                    row.date, row.code
                )));
            }
            *cell = Some(row.closing_price);
        }

        Ok(Self {
            dates,
            codes,
            cells,
        })
    }

    /// 한 마켓의 열.
    pub fn column(&self, index: usize) -> Vec<Option<f64>> {
        self.cells.iter().map(|row| row[index]).collect()
    }
}

/// Pearson 상관계수. 길이가 다르거나 2개 미만이거나 분산이 0이면 None.
pub fn calculate_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // 변동 없음
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// 두 열에서 값이 모두 있는 행만 골라 상관계수를 계산합니다.
fn pairwise_correlation(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    calculate_correlation(&x, &y)
}

/// 피벗 표의 모든 마켓 쌍에 대한 상관행렬.
pub fn correlation_matrix(pivot: &PricePivot) -> CorrelationMatrix {
    let n = pivot.codes.len();
    let columns: Vec<Vec<Option<f64>>> = (0..n).map(|i| pivot.column(i)).collect();
    let mut matrix = vec![vec![None; n]; n];

    for i in 0..n {
        for j in i..n {
            let corr = pairwise_correlation(&columns[i], &columns[j]);
            matrix[i][j] = corr;
            matrix[j][i] = corr;
        }
    }

    CorrelationMatrix {
        symbols: pivot.codes.clone(),
        matrix,
        period: pivot.dates.len(),
    }
}
