//! 이동평균.

use crate::error::{AnalyticsError, Result};

/// 단순 이동평균.
///
/// 창이 다 차기 전(처음 `window - 1`개)은 `None`이고, 그 이후는 직전
/// `window`개 값의 산술평균입니다. 데이터가 창보다 짧으면 전부 `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "이동평균 기간은 0보다 커야 합니다".to_string(),
        ));
    }

    let mut result = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if i + 1 < window {
            result.push(None);
        } else {
            let sum: f64 = values[i + 1 - window..=i].iter().sum();
            result.push(Some(sum / window as f64));
        }
    }

    Ok(result)
}
