use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use httpmock::prelude::*;
use klinegate_core::{
    AssetClass, Frequency, KlineError, KlineProvider, KlineRequest, RawFrame, RequestWindow,
    normalize,
};
use klinegate_tq::{BridgeSession, KlineSession, MAX_COUNT, TqConnector};
use serde_json::json;

fn request(freq: Frequency, count: usize) -> KlineRequest {
    KlineRequest {
        symbol: "SHFE.cu2009".into(),
        frequency: freq,
        asset: AssetClass::Future,
        window: RequestWindow::Count {
            through: NaiveDate::from_ymd_opt(2020, 7, 20).unwrap(),
            count,
        },
    }
}

fn nanos(h: u32, m: u32) -> i64 {
    Utc.with_ymd_and_hms(2020, 7, 20, h, m, 0)
        .unwrap()
        .timestamp_nanos_opt()
        .unwrap()
}

struct Recording {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl KlineSession for Recording {
    async fn kline_serial(
        &mut self,
        symbol: &str,
        duration_seconds: i64,
        data_length: usize,
    ) -> Result<RawFrame, KlineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(symbol, "SHFE.cu2009");
        assert_eq!(duration_seconds, 1800);
        assert_eq!(data_length, MAX_COUNT);
        Ok(RawFrame::new(
            ["datetime", "open", "high", "low", "close", "volume", "symbol"],
            vec![vec![
                json!(nanos(1, 30)),
                json!(51000.0),
                json!(51200.0),
                json!(50900.0),
                json!(51100.0),
                json!(1200.0),
                json!("SHFE.cu2009"),
            ]],
        ))
    }
}

#[tokio::test]
async fn session_is_reused_and_timestamps_are_local() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tq = TqConnector::new(Recording {
        calls: Arc::clone(&calls),
    });
    for _ in 0..2 {
        let raw = tq.fetch(&request(Frequency::M30, 20_000)).await.unwrap();
        let bars = normalize(raw).unwrap();
        // opened 09:30, stamped at its 10:00 close
        assert_eq!(bars.bars()[0].dt_string(), "2020-07-20 10:00:00");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn bridge_session_opens_once_and_reads_columns() {
    let server = MockServer::start_async().await;
    let open = server
        .mock_async(|when, then| {
            when.method(POST).path("/session");
            then.status(200).json_body(json!({"session": "s1"}));
        })
        .await;
    let serial = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/kline_serial")
                .body_includes("\"session\":\"s1\"")
                .body_includes("\"duration_seconds\":86400");
            then.status(200).json_body(json!({
                "columns": ["datetime", "open", "high", "low", "close", "volume", "symbol"],
                "rows": [
                    [nanos(0, 0) - 8 * 3_600_000_000_000, 1.0, 1.0, 1.0, 1.0, 5.0, "SHFE.cu2009"],
                    [null, 1.0, 1.0, 1.0, 1.0, 5.0, "SHFE.cu2009"]
                ]
            }));
        })
        .await;

    let mut session = BridgeSession::new(reqwest::Client::new(), &server.base_url()).unwrap();
    let frame = session.kline_serial("SHFE.cu2009", 86_400, 10).await.unwrap();
    assert_eq!(frame.len(), 2);
    open.assert_async().await;
    serial.assert_async().await;

    let tq = TqConnector::new(session);
    // the connector keeps using session "s1"
    let raw = tq.fetch(&request(Frequency::Daily, 10)).await.unwrap();
    assert_eq!(normalize(raw).unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_session_is_reopened_then_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/session");
            then.status(200).json_body(json!({"session": "gone"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/kline_serial");
            then.status(404);
        })
        .await;

    let tq = TqConnector::new(BridgeSession::new(reqwest::Client::new(), &server.base_url()).unwrap());
    let err = tq.fetch(&request(Frequency::M1, 100)).await.unwrap_err();
    match err {
        KlineError::VendorUnavailable { vendor, msg } => {
            assert_eq!(vendor, "tq");
            assert!(msg.contains("reopen"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn empty_serial_is_data_empty() {
    struct Empty;
    #[async_trait]
    impl KlineSession for Empty {
        async fn kline_serial(&mut self, _: &str, _: i64, _: usize) -> Result<RawFrame, KlineError> {
            Ok(RawFrame::default())
        }
    }
    let err = TqConnector::new(Empty)
        .fetch(&request(Frequency::Weekly, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::VendorDataEmpty { .. }));
}

#[tokio::test]
async fn minute_bars_are_stamped_at_close() {
    struct OneMinute;
    #[async_trait]
    impl KlineSession for OneMinute {
        async fn kline_serial(&mut self, _: &str, secs: i64, _: usize) -> Result<RawFrame, KlineError> {
            assert_eq!(secs, 60);
            Ok(RawFrame::new(
                ["datetime", "open", "high", "low", "close", "volume"],
                vec![vec![json!(nanos(1, 30)), json!(1.0), json!(1.0), json!(1.0), json!(1.0), json!(1.0)]],
            ))
        }
    }
    let raw = TqConnector::new(OneMinute)
        .fetch(&request(Frequency::M1, 10))
        .await
        .unwrap();
    let bars = normalize(raw).unwrap();
    assert_eq!(bars.bars()[0].dt_string(), "2020-07-20 09:31:00");
}
