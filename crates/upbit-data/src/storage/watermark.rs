//! 파일 기반 워터마크.
//!
//! 마지막으로 수집을 마친 날짜 하나(`YYYY-MM-DD`)를 텍스트 파일에 기록합니다.
//! 파일이 없거나 내용을 읽을 수 없으면 "수집 기록 없음"으로 취급합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::traits::WatermarkStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 텍스트 파일 워터마크.
#[derive(Debug, Clone)]
pub struct FileWatermark {
    path: PathBuf,
}

impl FileWatermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WatermarkStore for FileWatermark {
    async fn read(&self) -> Result<Option<NaiveDate>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "워터마크 파일 없음");
                return Ok(None);
            }
            Err(e) => {
                return Err(DataError::Watermark(format!(
                    "{} 읽기 실패: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let trimmed = content.trim();
        match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    content = trimmed,
                    error = %e,
                    "워터마크 내용을 해석할 수 없어 무시합니다"
                );
                Ok(None)
            }
        }
    }

    async fn write(&self, date: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DataError::Watermark(format!("{} 생성 실패: {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(&self.path, date.format(DATE_FORMAT).to_string())
            .await
            .map_err(|e| {
                DataError::Watermark(format!("{} 쓰기 실패: {}", self.path.display(), e))
            })?;

        debug!(path = %self.path.display(), date = %date, "워터마크 갱신");
        Ok(())
    }
}
