//! 불량 유형 Treemap 집계.
//!
//! 계층은 불량 유형 → 발생 유형 → 상위 조치 내용이며, 잎 노드의 값은
//! 해당 (불량 유형, 발생 유형) 조합의 건수입니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 조치 내용이 하나도 없을 때의 라벨.
pub const NO_ACTIONS_LABEL: &str = "조치 내용 없음";

/// 잎 노드마다 보여줄 조치 개수.
pub const TOP_ACTIONS: usize = 5;

/// 설명들을 줄 단위 조치로 나누어 빈도 상위 `n`개를 반환합니다.
///
/// 빈도가 같으면 먼저 나온 조치가 앞에 옵니다.
pub fn top_actions<'a>(descriptions: impl IntoIterator<Item = &'a str>, n: usize) -> Vec<(String, usize)> {
    // 조치 -> (빈도, 최초 등장 순서)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0;

    for description in descriptions {
        for action in description.split('\n').map(str::trim).filter(|a| !a.is_empty()) {
            let entry = counts.entry(action).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(n)
        .map(|(action, (count, _))| (action.to_string(), count))
        .collect()
}

/// 조치 목록을 `<br>`로 이어진 번호 목록으로 만듭니다.
pub fn format_actions(actions: &[(String, usize)]) -> String {
    if actions.is_empty() {
        return NO_ACTIONS_LABEL.to_string();
    }

    actions
        .iter()
        .enumerate()
        .map(|(i, (action, count))| format!("{}. {} ({})", i + 1, action, count))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// (불량 유형, 발생 유형) 조합 하나.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapLeaf {
    pub category: String,
    pub subtype: String,
    pub count: usize,
    pub top_actions: Vec<(String, usize)>,
    /// 잎 노드 라벨 (`format_actions` 결과)
    pub actions_label: String,
}

/// Plotly treemap trace에 그대로 넣을 수 있는 배열들.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreemapFigure {
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    pub parents: Vec<String>,
    pub values: Vec<usize>,
}

impl TreemapFigure {
    /// 잎 노드에서 세 단계 계층을 만듭니다. 부모 값은 자식 합계입니다.
    pub fn from_leaves(leaves: &[TreemapLeaf]) -> Self {
        let mut figure = Self::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for leaf in leaves {
            let category_id = leaf.category.clone();
            let subtype_id = format!("{}/{}", leaf.category, leaf.subtype);
            let leaf_id = format!("{}/{}", subtype_id, leaf.actions_label);

            for (id, label, parent) in [
                (category_id.clone(), leaf.category.clone(), String::new()),
                (subtype_id.clone(), leaf.subtype.clone(), category_id.clone()),
                (leaf_id, leaf.actions_label.clone(), subtype_id),
            ] {
                match index.get(&id) {
                    Some(&i) => figure.values[i] += leaf.count,
                    None => {
                        index.insert(id.clone(), figure.ids.len());
                        figure.ids.push(id);
                        figure.labels.push(label);
                        figure.parents.push(parent);
                        figure.values.push(leaf.count);
                    }
                }
            }
        }

        figure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_actions_ranked_by_count_then_first_seen() {
        let descriptions = [
            "필터 교체\n배관 청소",
            "배관 청소\n센서 점검",
            "센서 점검\n배관 청소",
            "  \n필터 교체 ",
        ];
        let top = top_actions(descriptions.iter().copied(), 5);

        assert_eq!(
            top,
            vec![
                ("배관 청소".to_string(), 3),
                ("필터 교체".to_string(), 2),
                ("센서 점검".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_top_actions_limited_to_n() {
        let descriptions = ["a\nb\nc\nd\ne\nf\ng"];
        assert_eq!(top_actions(descriptions.iter().copied(), 5).len(), 5);
    }

    #[test]
    fn test_format_actions() {
        let actions = vec![("배관 청소".to_string(), 3), ("필터 교체".to_string(), 1)];
        assert_eq!(format_actions(&actions), "1. 배관 청소 (3)<br>2. 필터 교체 (1)");
        assert_eq!(format_actions(&[]), NO_ACTIONS_LABEL);
    }

    #[test]
    fn test_figure_hierarchy_and_sums() {
        let leaves = vec![
            TreemapLeaf {
                category: "누수".into(),
                subtype: "배관".into(),
                count: 3,
                top_actions: vec![],
                actions_label: "1. 교체 (3)".into(),
            },
            TreemapLeaf {
                category: "누수".into(),
                subtype: "밸브".into(),
                count: 2,
                top_actions: vec![],
                actions_label: "1. 조임 (2)".into(),
            },
        ];
        let figure = TreemapFigure::from_leaves(&leaves);

        assert_eq!(figure.ids.len(), 5);
        assert_eq!(figure.ids[0], "누수");
        assert_eq!(figure.parents[0], "");
        assert_eq!(figure.values[0], 5);
        assert_eq!(figure.parents[1], "누수");
        assert_eq!(figure.parents[2], "누수/배관");
        assert_eq!(figure.labels[4], "1. 조임 (2)");
    }
}
