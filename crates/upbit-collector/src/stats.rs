//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 시도 마켓 수
    pub total: usize,
    /// 새로 저장된 마켓 수
    pub success: usize,
    /// 이미 저장되어 있던 마켓 수 (insert-ignore로 무시됨)
    pub duplicates: usize,
    /// 빈 응답 (조회 성공, 캔들 없음)
    pub empty: usize,
    /// 조회/변환/저장 에러 수
    pub errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 마켓이 에러/빈 응답 없이 처리되었는지
    pub fn all_succeeded(&self) -> bool {
        self.errors == 0 && self.empty == 0
    }

    /// 성공률 계산 (%). 중복도 저장된 것으로 봅니다.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.success + self.duplicates) as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            duplicates = self.duplicates,
            empty = self.empty,
            errors = self.errors,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
