//! 도메인 타입 통합 테스트

use chrono::NaiveDate;
use upbit_core::{parse_candle_date, CandleRecord, MarketList, PriceRow};

#[test]
fn test_candle_record_serializes_iso_date() {
    let record = CandleRecord {
        date: parse_candle_date("2024-12-10T00:00:00").unwrap(),
        code: "KRW-BTC".to_string(),
        opening_price: 143_000_000.0,
        closing_price: 144_500_000.0,
        high_price: 145_000_000.0,
        low_price: 142_000_000.0,
        volume: 2_345.67,
        prev_closing_price: 143_100_000.0,
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["date"], "2024-12-10");
    assert_eq!(json["code"], "KRW-BTC");

    let back: CandleRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_price_rows_follow_market_order() {
    let markets = MarketList::parse("BTC:KRW-BTC,ETH:KRW-ETH").unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 12, 11).unwrap();

    let rows: Vec<PriceRow> = markets
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let record = CandleRecord {
                date,
                code: m.code.clone(),
                opening_price: 1.0 + i as f64,
                closing_price: 2.0 + i as f64,
                high_price: 3.0,
                low_price: 0.5,
                volume: 10.0,
                prev_closing_price: 1.5,
            };
            PriceRow::from(&record)
        })
        .collect();

    assert_eq!(rows[0].code, "KRW-BTC");
    assert_eq!(rows[1].code, "KRW-ETH");
    assert_eq!(rows[1].closing_price, 3.0);
}
