//! 조회 행 → 파생 지표 → 차트 데이터까지의 흐름 테스트.

use chrono::NaiveDate;
use upbit_analytics::correlation::{correlation_matrix, PricePivot};
use upbit_analytics::metrics::{enrich, moving_averages, series};
use upbit_analytics::{CoinSelection, DefectDataset, SeriesField};
use upbit_core::PriceRow;

fn row(day: u32, code: &str, close: f64, volume: f64) -> PriceRow {
    PriceRow {
        date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap(),
        code: code.to_string(),
        opening_price: close - 1.0,
        closing_price: close,
        prev_closing_price: close - 2.0,
        volume,
    }
}

fn sample_rows() -> Vec<PriceRow> {
    let mut rows = Vec::new();
    for day in 10..=21 {
        let t = (day - 10) as f64;
        rows.push(row(day, "KRW-BTC", 100.0 + t, 1.0));
        rows.push(row(day, "KRW-ETH", 50.0 + 2.0 * t, 2.0));
    }
    rows
}

#[test]
fn test_metrics_to_chart_series() {
    let metrics = enrich(&sample_rows());

    let cumulative = series(&metrics, SeriesField::CumulativeVolume, &CoinSelection::All);
    assert_eq!(cumulative.len(), 2);
    assert_eq!(cumulative[0].name, "KRW-BTC");
    assert_eq!(cumulative[0].values.last().copied().flatten(), Some(12.0));
    assert_eq!(cumulative[1].values.last().copied().flatten(), Some(24.0));

    let json = serde_json::to_value(&cumulative[1]).unwrap();
    assert_eq!(json["name"], "KRW-ETH");
    assert_eq!(json["dates"][0], "2024-12-10");
}

#[test]
fn test_moving_average_view_for_selected_coin() {
    let metrics = enrich(&sample_rows());
    let view = moving_averages(&metrics, "KRW-ETH").unwrap();

    assert_eq!(view.closing_prices.len(), 12);
    assert_eq!(view.short_ma.iter().filter(|v| v.is_some()).count(), 8);
    assert_eq!(view.long_ma.iter().filter(|v| v.is_some()).count(), 3);
    // (50 + 52 + 54 + 56 + 58) / 5
    assert!((view.short_ma[4].unwrap() - 54.0).abs() < 1e-9);
}

#[test]
fn test_correlation_heatmap_values() {
    let pivot = PricePivot::closing_prices(&sample_rows()).unwrap();
    let matrix = correlation_matrix(&pivot);

    assert_eq!(matrix.symbols, vec!["KRW-BTC", "KRW-ETH"]);
    assert_eq!(matrix.rounded()[0][1], Some(1.0));
}

#[test]
fn test_defect_dataset_summary() {
    let csv = "TYPE_GBN_U_NM,TYPE_GBN_NM,JOCHI_DESCR,D_YMD\n\
전기,차단기,차단기 교체,2024-02-01\n\
전기,차단기,차단기 교체,2024-03-01\n\
기계,모터,모터 점검,2024-04-01\n\
기계,모터,모터 점검,2023-04-01\n";
    let dataset = DefectDataset::from_reader(csv.as_bytes()).unwrap();

    assert_eq!(dataset.available_years(), vec![2023, 2024]);

    let counts = dataset.type_counts(2024);
    assert_eq!(counts[0].category, "전기");
    assert_eq!(counts[0].count, 2);

    let figure = dataset.treemap(2024, "전기");
    assert_eq!(figure.ids, vec!["전기", "전기/차단기", "전기/차단기/1. 차단기 교체 (2)"]);
    assert_eq!(figure.values, vec![2, 2, 2]);
}
