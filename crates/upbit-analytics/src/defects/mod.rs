//! 불량 이력 CSV 분석.
//!
//! # 처리 순서
//!
//! 1. `data.csv` 로드 (UTF-8, BOM 허용, 깨진 줄은 건너뜀)
//! 2. 불량 유형/발생 유형/조치 내용/발생일 중 하나라도 비어 있는 행 제거
//! 3. 조치 내용 정제 (`clean_text`) 후 발생일에서 연도 추출
//! 4. 연도별 불량 유형 빈도, (불량 유형, 발생 유형)별 Treemap 집계

pub mod text;
pub mod treemap;

pub use text::{clean_text, parse_year, STOP_WORDS};
pub use treemap::{format_actions, top_actions, TreemapFigure, TreemapLeaf, NO_ACTIONS_LABEL};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use treemap::TOP_ACTIONS;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV 원본 행. 다른 컬럼은 무시합니다.
#[derive(Debug, Deserialize)]
struct RawDefectRow {
    #[serde(rename = "TYPE_GBN_U_NM")]
    category: Option<String>,
    #[serde(rename = "TYPE_GBN_NM")]
    subtype: Option<String>,
    #[serde(rename = "JOCHI_DESCR")]
    description: Option<String>,
    #[serde(rename = "D_YMD")]
    occurred: Option<String>,
}

/// 빈 셀만 결측으로 봅니다. 공백만 있는 셀은 값으로 유지합니다.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 정제된 불량 이력 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectRecord {
    /// 불량 유형 (TYPE_GBN_U_NM)
    pub category: String,
    /// 발생 유형 (TYPE_GBN_NM)
    pub subtype: String,
    /// 정제된 조치 내용 (JOCHI_DESCR)
    pub description: String,
    /// 발생일 원문 (D_YMD)
    pub occurred: String,
    /// 발생 연도 (해석 불가 시 None)
    pub year: Option<i32>,
}

/// 불량 유형별 빈도.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub category: String,
    pub count: usize,
}

/// 로드된 불량 이력 전체.
#[derive(Debug, Clone, Default)]
pub struct DefectDataset {
    records: Vec<DefectRecord>,
    /// 형식 오류로 건너뛴 줄 수
    skipped_lines: usize,
    /// 필수 컬럼이 비어 제거된 행 수
    dropped_rows: usize,
}

impl DefectDataset {
    /// CSV 파일을 로드합니다.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;

        info!(
            path = %path.display(),
            records = dataset.records.len(),
            skipped_lines = dataset.skipped_lines,
            dropped_rows = dataset.dropped_rows,
            "불량 이력 로드 완료"
        );
        Ok(dataset)
    }

    /// 임의의 reader에서 CSV를 로드합니다.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(content);
        let headers = csv_reader.headers()?.clone();

        let mut dataset = Self::default();

        for result in csv_reader.records() {
            // 짧은 행은 빠진 컬럼을 비운 채로 읽고, 긴 행만 건너뜀
            let raw = match result {
                Ok(record) if record.len() > headers.len() => {
                    debug!(fields = record.len(), "컬럼이 많은 CSV 줄 건너뜀");
                    dataset.skipped_lines += 1;
                    continue;
                }
                Ok(mut record) => {
                    while record.len() < headers.len() {
                        record.push_field("");
                    }
                    match record.deserialize::<RawDefectRow>(Some(&headers)) {
                        Ok(raw) => raw,
                        Err(e) => {
                            debug!(error = %e, "CSV 줄 건너뜀");
                            dataset.skipped_lines += 1;
                            continue;
                        }
                    }
                }
                Err(e) => {
                    debug!(error = %e, "CSV 줄 건너뜀");
                    dataset.skipped_lines += 1;
                    continue;
                }
            };

            let (Some(category), Some(subtype), Some(description), Some(occurred)) = (
                non_empty(raw.category),
                non_empty(raw.subtype),
                non_empty(raw.description),
                non_empty(raw.occurred),
            ) else {
                dataset.dropped_rows += 1;
                continue;
            };

            dataset.records.push(DefectRecord {
                year: parse_year(&occurred),
                description: clean_text(&description),
                category,
                subtype,
                occurred,
            });
        }

        Ok(dataset)
    }

    /// 이미 정제된 레코드로 데이터셋을 만듭니다.
    pub fn from_records(records: Vec<DefectRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn records(&self) -> &[DefectRecord] {
        &self.records
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 데이터에 있는 연도 (오름차순).
    pub fn available_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().filter_map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// 연도별 불량 유형 빈도 (내림차순, 동률은 먼저 나온 유형 우선).
    pub fn type_counts(&self, year: i32) -> Vec<TypeCount> {
        let mut counts: Vec<TypeCount> = Vec::new();
        for record in self.records.iter().filter(|r| r.year == Some(year)) {
            match counts.iter_mut().find(|c| c.category == record.category) {
                Some(c) => c.count += 1,
                None => counts.push(TypeCount {
                    category: record.category.clone(),
                    count: 1,
                }),
            }
        }
        // 안정 정렬이므로 동률은 등장 순서 유지
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// 선택된 연도와 불량 유형의 Treemap 잎 노드.
    pub fn treemap_leaves(&self, year: i32, category: &str) -> Vec<TreemapLeaf> {
        let mut groups: Vec<(String, Vec<&str>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for record in self
            .records
            .iter()
            .filter(|r| r.year == Some(year) && r.category == category)
        {
            let i = *index.entry(record.subtype.as_str()).or_insert_with(|| {
                groups.push((record.subtype.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[i].1.push(record.description.as_str());
        }

        // 발생 유형 이름순
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        groups
            .into_iter()
            .map(|(subtype, descriptions)| {
                let top = top_actions(descriptions.iter().copied(), TOP_ACTIONS);
                TreemapLeaf {
                    category: category.to_string(),
                    subtype,
                    count: descriptions.len(),
                    actions_label: format_actions(&top),
                    top_actions: top,
                }
            })
            .collect()
    }

    /// 선택된 연도와 불량 유형의 Treemap 배열.
    pub fn treemap(&self, year: i32, category: &str) -> TreemapFigure {
        TreemapFigure::from_leaves(&self.treemap_leaves(year, category))
    }
}
