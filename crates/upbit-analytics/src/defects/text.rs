//! 조치 내용 텍스트 정제.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// 제거할 조사 목록.
pub const STOP_WORDS: [&str; 17] = [
    "은", "는", "이", "가", "을", "를", "에", "에서", "으로", "도", "만", "의", "와", "과", "에게",
    "한테", "께",
];

/// 단어 문자도 공백도 아닌 문자.
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// 단독으로 떨어져 있는 불용어.
static STOP_WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b({})\b", STOP_WORDS.join("|"))).expect("valid regex")
});

/// 특수기호를 지우고 단독 불용어를 제거합니다.
///
/// 공백과 줄바꿈은 그대로 남기므로 줄 단위 조치 항목이 유지됩니다.
pub fn clean_text(text: &str) -> String {
    let without_punctuation = PUNCTUATION.replace_all(text, "");
    STOP_WORD_PATTERN
        .replace_all(&without_punctuation, "")
        .into_owned()
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"];

/// 발생일 문자열에서 연도를 추출합니다. 해석할 수 없으면 None.
pub fn parse_year(raw: &str) -> Option<i32> {
    let date_part = raw
        .trim()
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()?;

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .map(|d| chrono::Datelike::year(&d))
}
