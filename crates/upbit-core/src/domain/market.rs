//! 수집 대상 마켓 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// 기본 수집 대상 (표시 이름, 마켓 코드). 수집 순서를 그대로 따릅니다.
const DEFAULT_MARKETS: [(&str, &str); 10] = [
    ("ICX", "KRW-ICX"),
    ("AERGO", "KRW-AERGO"),
    ("META", "KRW-META"),
    ("BORA", "KRW-BORA"),
    ("BTC", "KRW-BTC"),
    ("ETH", "KRW-ETH"),
    ("XRP", "KRW-XRP"),
    ("SOL", "KRW-SOL"),
    ("USDT", "KRW-USDT"),
    ("ADA", "KRW-ADA"),
];

/// 수집 대상 마켓.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    /// 표시 이름 (예: BTC)
    pub name: String,
    /// 거래소 마켓 코드 (예: KRW-BTC)
    pub code: String,
}

impl Market {
    /// 이름과 코드를 검증하여 마켓을 생성합니다.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> CoreResult<Self> {
        let code = code.into();
        validate_code(&code)?;
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidMarket(format!("빈 이름: {}", code)));
        }
        Ok(Self { name, code })
    }

    /// 코드만으로 마켓을 생성합니다. 이름은 코드의 기준 자산 부분입니다.
    pub fn from_code(code: impl Into<String>) -> CoreResult<Self> {
        let code = code.into();
        validate_code(&code)?;
        let name = code
            .split_once('-')
            .map(|(_, base)| base.to_string())
            .unwrap_or_else(|| code.clone());
        Ok(Self { name, code })
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

impl FromStr for Market {
    type Err = CoreError;

    /// `NAME:CODE` 또는 `CODE` 형식을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((name, code)) => Self::new(name.trim(), code.trim()),
            None => Self::from_code(s),
        }
    }
}

/// 마켓 코드는 `QUOTE-BASE` 형식의 영숫자여야 합니다.
fn validate_code(code: &str) -> CoreResult<()> {
    let valid = match code.split_once('-') {
        Some((quote, base)) => {
            !quote.is_empty()
                && !base.is_empty()
                && quote.chars().all(|c| c.is_ascii_alphanumeric())
                && base.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    };

    // 테이블의 code 컬럼은 VARCHAR(20)
    if valid && code.len() <= 20 {
        Ok(())
    } else {
        Err(CoreError::InvalidMarket(code.to_string()))
    }
}

/// 순서가 고정된 수집 대상 목록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketList(Vec<Market>);

impl MarketList {
    /// 마켓 목록을 생성합니다. 중복 코드는 처음 것만 남깁니다.
    pub fn new(markets: Vec<Market>) -> Self {
        let mut unique: Vec<Market> = Vec::with_capacity(markets.len());
        for market in markets {
            if !unique.iter().any(|m| m.code == market.code) {
                unique.push(market);
            }
        }
        Self(unique)
    }

    /// 쉼표로 구분된 목록을 파싱합니다 (예: "BTC:KRW-BTC,KRW-ETH").
    pub fn parse(list: &str) -> CoreResult<Self> {
        let markets = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Market::from_str)
            .collect::<CoreResult<Vec<_>>>()?;

        if markets.is_empty() {
            return Err(CoreError::Config("마켓 목록이 비어 있습니다".to_string()));
        }

        Ok(Self::new(markets))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 마켓 코드 목록.
    pub fn codes(&self) -> Vec<&str> {
        self.0.iter().map(|m| m.code.as_str()).collect()
    }
}

impl Default for MarketList {
    fn default() -> Self {
        Self(
            DEFAULT_MARKETS
                .iter()
                .map(|(name, code)| Market {
                    name: name.to_string(),
                    code: code.to_string(),
                })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a MarketList {
    type Item = &'a Market;
    type IntoIter = std::slice::Iter<'a, Market>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_from_str_with_name() {
        let market: Market = "Bitcoin:KRW-BTC".parse().unwrap();
        assert_eq!(market.name, "Bitcoin");
        assert_eq!(market.code, "KRW-BTC");
    }

    #[test]
    fn test_market_from_bare_code() {
        let market: Market = " KRW-ETH ".parse().unwrap();
        assert_eq!(market.name, "ETH");
        assert_eq!(market.code, "KRW-ETH");
    }

    #[test]
    fn test_market_rejects_bad_codes() {
        assert!("BTC".parse::<Market>().is_err());
        assert!("KRW-".parse::<Market>().is_err());
        assert!("KRW-BTC'; DROP".parse::<Market>().is_err());
        assert!(":KRW-BTC".parse::<Market>().is_err());
    }

    #[test]
    fn test_default_list_order() {
        let list = MarketList::default();
        assert_eq!(list.len(), 10);
        let codes = list.codes();
        assert_eq!(codes[0], "KRW-ICX");
        assert_eq!(codes[4], "KRW-BTC");
        assert_eq!(codes[9], "KRW-ADA");
    }

    #[test]
    fn test_parse_list_dedups_and_keeps_order() {
        let list = MarketList::parse("KRW-ETH, BTC:KRW-BTC,,KRW-ETH").unwrap();
        assert_eq!(list.codes(), vec!["KRW-ETH", "KRW-BTC"]);
    }

    #[test]
    fn test_parse_empty_list_fails() {
        assert!(MarketList::parse(" , ").is_err());
    }
}
