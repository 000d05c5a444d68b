//! 대시보드 분석 모듈.
//!
//! 이 crate는 다음을 제공합니다:
//! - 일봉 파생 지표 (변동률, 전일 대비, 누적 거래량)
//! - 이동평균
//! - 날짜×마켓 피벗과 Pearson 상관행렬
//! - 불량 이력 CSV 정제와 Treemap 집계

pub mod correlation;
pub mod defects;
pub mod error;
pub mod metrics;
pub mod rolling;

pub use correlation::{calculate_correlation, correlation_matrix, CorrelationMatrix, PricePivot};
pub use defects::{DefectDataset, DefectRecord, TreemapFigure, TreemapLeaf, TypeCount};
pub use error::{AnalyticsError, Result};
pub use metrics::{CoinSelection, DailyMetrics, MovingAverageView, Series, SeriesField};
pub use rolling::rolling_mean;
