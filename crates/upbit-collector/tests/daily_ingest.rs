//! 일일 수집 배치 테스트.
//!
//! HTTP, DB, 워터마크 파일을 메모리 구현으로 대체하여 배치 흐름만 검증합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use upbit_collector::modules::{BatchOutcome, DailyIngest};
use upbit_collector::WatermarkPolicy;
use upbit_core::{CandleRecord, MarketList};
use upbit_data::{
    CandleSource, CandleStore, DataError, FileWatermark, Result, UpbitClient, UpbitClientConfig,
    UpbitDayCandle, WatermarkStore,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn candle(kst: &str, close: f64) -> UpbitDayCandle {
    UpbitDayCandle {
        market: None,
        candle_date_time_utc: None,
        candle_date_time_kst: kst.to_string(),
        opening_price: close - 10.0,
        high_price: close + 10.0,
        low_price: close - 20.0,
        trade_price: close,
        timestamp: None,
        candle_acc_trade_price: None,
        candle_acc_trade_volume: 1.5,
        prev_closing_price: close - 5.0,
        change_price: None,
        change_rate: None,
    }
}

#[derive(Clone)]
enum Reply {
    Candle(UpbitDayCandle),
    Empty,
    HttpError(u16),
    BadTimestamp,
}

#[derive(Clone, Default)]
struct FakeSource {
    replies: Arc<HashMap<String, Reply>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeSource {
    fn new(replies: Vec<(&str, Reply)>) -> Self {
        Self {
            replies: Arc::new(
                replies
                    .into_iter()
                    .map(|(code, reply)| (code.to_string(), reply))
                    .collect(),
            ),
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleSource for FakeSource {
    async fn latest_day_candle(&self, market: &str) -> Result<Option<UpbitDayCandle>> {
        self.requests.lock().unwrap().push(market.to_string());
        match self.replies.get(market) {
            Some(Reply::Candle(c)) => Ok(Some(c.clone())),
            Some(Reply::Empty) | None => Ok(None),
            Some(Reply::HttpError(status)) => Err(DataError::HttpStatus {
                status: *status,
                body: "error".to_string(),
            }),
            Some(Reply::BadTimestamp) => Ok(Some(candle("2024-12", 1.0))),
        }
    }
}

#[derive(Clone, Default)]
struct FakeStore {
    rows: Arc<Mutex<Vec<CandleRecord>>>,
    schema_calls: Arc<Mutex<usize>>,
    insert_calls: Arc<Mutex<usize>>,
}

impl FakeStore {
    fn rows(&self) -> Vec<CandleRecord> {
        self.rows.lock().unwrap().clone()
    }

    fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().unwrap()
    }
}

#[async_trait]
impl CandleStore for FakeStore {
    async fn ensure_schema(&self) -> Result<()> {
        *self.schema_calls.lock().unwrap() += 1;
        Ok(())
    }

    async fn insert_ignore(&self, record: &CandleRecord) -> Result<bool> {
        *self.insert_calls.lock().unwrap() += 1;
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.date == record.date && r.code == record.code)
        {
            return Ok(false);
        }
        rows.push(record.clone());
        Ok(true)
    }
}

#[derive(Clone, Default)]
struct FakeWatermark {
    value: Arc<Mutex<Option<NaiveDate>>>,
    writes: Arc<Mutex<usize>>,
}

impl FakeWatermark {
    fn with(date: NaiveDate) -> Self {
        let w = Self::default();
        *w.value.lock().unwrap() = Some(date);
        w
    }

    fn value(&self) -> Option<NaiveDate> {
        *self.value.lock().unwrap()
    }

    fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl WatermarkStore for FakeWatermark {
    async fn read(&self) -> Result<Option<NaiveDate>> {
        Ok(self.value())
    }

    async fn write(&self, date: NaiveDate) -> Result<()> {
        *self.writes.lock().unwrap() += 1;
        *self.value.lock().unwrap() = Some(date);
        Ok(())
    }
}

fn markets(list: &str) -> MarketList {
    MarketList::parse(list).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 12, 11)
}

#[tokio::test]
async fn test_skips_when_watermark_is_yesterday() {
    let source = FakeSource::new(vec![("KRW-BTC", Reply::Candle(candle("2024-12-10T09:00:00", 100.0)))]);
    let store = FakeStore::default();
    let watermark = FakeWatermark::with(date(2024, 12, 10));

    let ingest = DailyIngest::new(
        source.clone(),
        store.clone(),
        watermark.clone(),
        markets("KRW-BTC,KRW-ETH"),
    );
    let outcome = ingest.run(today()).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome::Skipped {
            watermark: date(2024, 12, 10)
        }
    );
    assert!(source.requests().is_empty());
    assert_eq!(store.insert_calls(), 0);
    assert_eq!(watermark.writes(), 0);
}

#[tokio::test]
async fn test_older_watermark_runs_batch() {
    let source = FakeSource::new(vec![("KRW-BTC", Reply::Candle(candle("2024-12-10T09:00:00", 100.0)))]);
    let store = FakeStore::default();
    let watermark = FakeWatermark::with(date(2024, 12, 8));

    let ingest = DailyIngest::new(source.clone(), store.clone(), watermark.clone(), markets("KRW-BTC"));
    let outcome = ingest.run(today()).await.unwrap();

    assert!(matches!(outcome, BatchOutcome::Completed { .. }));
    assert_eq!(source.requests(), vec!["KRW-BTC"]);
    assert_eq!(watermark.value(), Some(date(2024, 12, 10)));
}

#[tokio::test]
async fn test_btc_success_eth_failure_still_writes_watermark() {
    let source = FakeSource::new(vec![
        ("KRW-BTC", Reply::Candle(candle("2024-12-10T00:00:00", 143_000_000.0))),
        ("KRW-ETH", Reply::HttpError(500)),
    ]);
    let store = FakeStore::default();
    let watermark = FakeWatermark::default();

    let ingest = DailyIngest::new(
        source.clone(),
        store.clone(),
        watermark.clone(),
        markets("KRW-BTC,KRW-ETH"),
    );
    let outcome = ingest.run(today()).await.unwrap();

    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].code, "KRW-BTC");
    assert_eq!(rows[0].date, date(2024, 12, 10));
    assert_eq!(rows[0].closing_price, 143_000_000.0);

    assert_eq!(watermark.value(), Some(date(2024, 12, 10)));

    match outcome {
        BatchOutcome::Completed {
            stats,
            watermark_written,
        } => {
            assert!(watermark_written);
            assert_eq!(stats.total, 2);
            assert_eq!(stats.success, 1);
            assert_eq!(stats.errors, 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_every_market_attempted_in_order_despite_failures() {
    let source = FakeSource::new(vec![
        ("KRW-ICX", Reply::Empty),
        ("KRW-BTC", Reply::HttpError(503)),
        ("KRW-ETH", Reply::BadTimestamp),
        ("KRW-XRP", Reply::Candle(candle("2024-12-10T09:00:00", 3000.0))),
    ]);
    let store = FakeStore::default();
    let watermark = FakeWatermark::default();

    let ingest = DailyIngest::new(
        source.clone(),
        store.clone(),
        watermark.clone(),
        markets("KRW-ICX,KRW-BTC,KRW-ETH,KRW-XRP"),
    );
    let outcome = ingest.run(today()).await.unwrap();

    assert_eq!(
        source.requests(),
        vec!["KRW-ICX", "KRW-BTC", "KRW-ETH", "KRW-XRP"]
    );
    assert_eq!(store.rows().len(), 1);
    assert_eq!(watermark.writes(), 1);

    if let BatchOutcome::Completed { stats, .. } = outcome {
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.success, 1);
    } else {
        panic!("batch should complete");
    }
}

#[tokio::test]
async fn test_all_failures_still_mark_day_done_by_default() {
    let source = FakeSource::new(vec![]);
    let watermark = FakeWatermark::default();

    let ingest = DailyIngest::new(
        source,
        FakeStore::default(),
        watermark.clone(),
        markets("KRW-BTC,KRW-ETH"),
    );
    ingest.run(today()).await.unwrap();

    assert_eq!(watermark.value(), Some(date(2024, 12, 10)));
}

#[tokio::test]
async fn test_all_succeeded_policy_keeps_old_watermark_on_failure() {
    let source = FakeSource::new(vec![
        ("KRW-BTC", Reply::Candle(candle("2024-12-10T09:00:00", 100.0))),
        ("KRW-ETH", Reply::Empty),
    ]);
    let watermark = FakeWatermark::with(date(2024, 12, 9));

    let ingest = DailyIngest::new(
        source,
        FakeStore::default(),
        watermark.clone(),
        markets("KRW-BTC,KRW-ETH"),
    )
    .with_policy(WatermarkPolicy::AllSucceeded);
    let outcome = ingest.run(today()).await.unwrap();

    assert!(matches!(
        outcome,
        BatchOutcome::Completed {
            watermark_written: false,
            ..
        }
    ));
    assert_eq!(watermark.value(), Some(date(2024, 12, 9)));
    assert_eq!(watermark.writes(), 0);
}

#[tokio::test]
async fn test_all_succeeded_policy_writes_when_clean() {
    let source = FakeSource::new(vec![(
        "KRW-BTC",
        Reply::Candle(candle("2024-12-10T09:00:00", 100.0)),
    )]);
    let watermark = FakeWatermark::default();

    let ingest = DailyIngest::new(source, FakeStore::default(), watermark.clone(), markets("KRW-BTC"))
        .with_policy(WatermarkPolicy::AllSucceeded);
    ingest.run(today()).await.unwrap();

    assert_eq!(watermark.value(), Some(date(2024, 12, 10)));
}

#[tokio::test]
async fn test_existing_row_counted_as_duplicate_and_kept() {
    let store = FakeStore::default();
    store
        .insert_ignore(&candle("2024-12-10T09:00:00", 100.0).to_record("KRW-BTC").unwrap())
        .await
        .unwrap();

    let source = FakeSource::new(vec![(
        "KRW-BTC",
        Reply::Candle(candle("2024-12-10T09:00:00", 999.0)),
    )]);
    let ingest = DailyIngest::new(source, store.clone(), FakeWatermark::default(), markets("KRW-BTC"));
    let outcome = ingest.run(today()).await.unwrap();

    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].closing_price, 100.0);

    if let BatchOutcome::Completed { stats, .. } = outcome {
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.success, 0);
    } else {
        panic!("batch should complete");
    }
}

#[tokio::test]
async fn test_schema_ensured_every_run() {
    let store = FakeStore::default();
    let watermark = FakeWatermark::with(date(2024, 12, 10));

    let ingest = DailyIngest::new(FakeSource::default(), store.clone(), watermark, markets("KRW-BTC"));
    ingest.run(today()).await.unwrap();
    ingest.run(today()).await.unwrap();

    assert_eq!(*store.schema_calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_http_client_and_file_watermark_end_to_end() {
    let mut server = mockito::Server::new_async().await;

    let btc = server
        .mock("GET", "/v1/candles/days")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("market".into(), "KRW-BTC".into()),
            mockito::Matcher::UrlEncoded("count".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{
                "market": "KRW-BTC",
                "candle_date_time_kst": "2024-12-10T09:00:00",
                "opening_price": 100.0,
                "high_price": 120.0,
                "low_price": 90.0,
                "trade_price": 110.0,
                "candle_acc_trade_volume": 12.5,
                "prev_closing_price": 95.0
            }]"#,
        )
        .expect(1)
        .create_async()
        .await;

    let eth = server
        .mock("GET", "/v1/candles/days")
        .match_query(mockito::Matcher::UrlEncoded(
            "market".into(),
            "KRW-ETH".into(),
        ))
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let client = UpbitClient::new(UpbitClientConfig {
        base_url: server.url(),
        ..Default::default()
    })
    .unwrap();

    let path = std::env::temp_dir()
        .join(format!("upbit-collector-{}", uuid::Uuid::new_v4()))
        .join("progress.txt");
    let store = FakeStore::default();

    let ingest = DailyIngest::new(
        client,
        store.clone(),
        FileWatermark::new(&path),
        markets("BTC:KRW-BTC,ETH:KRW-ETH"),
    );
    ingest.run(today()).await.unwrap();

    btc.assert_async().await;
    eth.assert_async().await;

    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].volume, 12.5);
    assert_eq!(rows[0].prev_closing_price, 95.0);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), "2024-12-10");

    // 같은 날 두 번째 실행은 요청 없이 종료
    let second = DailyIngest::new(
        FakeSource::default(),
        store.clone(),
        FileWatermark::new(&path),
        markets("KRW-BTC"),
    );
    assert!(matches!(
        second.run(today()).await.unwrap(),
        BatchOutcome::Skipped { .. }
    ));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
