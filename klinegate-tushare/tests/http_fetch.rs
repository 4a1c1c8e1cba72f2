use std::sync::Arc;

use chrono::NaiveDate;
use httpmock::prelude::*;
use klinegate_core::{
    AssetClass, BasicProvider, Frequency, KlineError, KlineProvider, KlineRequest, RequestWindow,
    StaticToken, VendorConnector, normalize,
};
use klinegate_tushare::{TushareClient, TushareConnector};
use rust_decimal::Decimal;
use serde_json::json;

fn connector(server: &MockServer) -> TushareConnector {
    TushareConnector::new(TushareClient::new(
        reqwest::Client::new(),
        server.url("/"),
        Arc::new(StaticToken::new("tushare", "test-token")),
    ))
}

fn request(freq: Frequency, asset: AssetClass) -> KlineRequest {
    KlineRequest {
        symbol: "000001.SZ".into(),
        frequency: freq,
        asset,
        window: RequestWindow::Range {
            start: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
            through: NaiveDate::from_ymd_opt(2020, 7, 20).unwrap(),
        },
    }
}

fn table(fields: &[&str], items: serde_json::Value) -> serde_json::Value {
    json!({"code": 0, "msg": "", "data": {"fields": fields, "items": items}})
}

#[tokio::test]
async fn daily_equity_is_forward_adjusted() {
    let server = MockServer::start_async().await;
    let daily = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .body_includes("\"api_name\":\"daily\"")
                .body_includes("\"token\":\"test-token\"")
                .body_includes("\"end_date\":\"20200720\"");
            then.status(200).json_body(table(
                &["ts_code", "trade_date", "open", "close", "high", "low", "vol"],
                json!([
                    ["000001.SZ", "20200720", 10.0, 11.0, 12.0, 9.0, 1000.0],
                    ["000001.SZ", "20200717", 10.0, 11.0, 12.0, 9.0, 800.0],
                ]),
            ));
        })
        .await;
    let adj = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .body_includes("\"api_name\":\"adj_factor\"");
            then.status(200).json_body(table(
                &["ts_code", "trade_date", "adj_factor"],
                json!([
                    ["000001.SZ", "20200720", 2.0],
                    ["000001.SZ", "20200717", 1.0],
                ]),
            ));
        })
        .await;

    let c = connector(&server);
    let raw = c
        .fetch(&request(Frequency::Daily, AssetClass::Equity))
        .await
        .unwrap();
    daily.assert_async().await;
    adj.assert_async().await;

    let bars = normalize(raw).unwrap();
    assert_eq!(bars.len(), 2);
    let first = &bars.bars()[0];
    assert_eq!(first.dt_string(), "2020-07-17 00:00:00");
    assert_eq!(first.open, Decimal::new(500, 2));
    assert_eq!(first.close, Decimal::new(550, 2));
    assert_eq!(first.vol, Decimal::from(800));
    let last = &bars.bars()[1];
    assert_eq!(last.close, Decimal::new(1100, 2));
    assert_eq!(last.symbol, "000001.SZ");
}

#[tokio::test]
async fn intraday_index_skips_adjustment_and_session_open() {
    let server = MockServer::start_async().await;
    let mins = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .body_includes("\"api_name\":\"idx_mins\"")
                .body_includes("\"freq\":\"1min\"")
                .body_includes("\"end_date\":\"2020-07-21 00:00:00\"");
            then.status(200).json_body(table(
                &["ts_code", "trade_time", "open", "close", "high", "low", "vol"],
                json!([
                    ["000001.SZ", "2020-07-20 09:31:00", 3.0, 3.1, 3.2, 2.9, 10],
                    ["000001.SZ", "2020-07-20 09:30:00", 3.0, 3.0, 3.0, 3.0, 0],
                ]),
            ));
        })
        .await;

    let raw = connector(&server)
        .fetch(&request(Frequency::M1, AssetClass::Index))
        .await
        .unwrap();
    mins.assert_async().await;
    let bars = normalize(raw).unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars.bars()[0].dt_string(), "2020-07-20 09:31:00");
}

#[tokio::test]
async fn nonzero_code_is_vendor_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(200)
                .json_body(json!({"code": 40101, "msg": "bad token", "data": null}));
        })
        .await;
    let err = connector(&server)
        .fetch(&request(Frequency::Weekly, AssetClass::Index))
        .await
        .unwrap_err();
    match err {
        KlineError::VendorUnavailable { vendor, msg } => {
            assert_eq!(vendor, "tushare");
            assert!(msg.contains("bad token"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn zero_rows_is_data_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(200).json_body(table(
                &["ts_code", "trade_date", "open", "close", "high", "low", "vol"],
                json!([]),
            ));
        })
        .await;
    let err = connector(&server)
        .fetch(&request(Frequency::Daily, AssetClass::Fund))
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::VendorDataEmpty { .. }));
}

#[tokio::test]
async fn unsupported_asset_fails_before_any_call() {
    let server = MockServer::start_async().await;
    let err = connector(&server)
        .fetch(&request(Frequency::Daily, AssetClass::Crypto))
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::InvalidParameter(_)));
    let err = connector(&server)
        .fetch(&request(Frequency::Weekly, AssetClass::Future))
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::InvalidFrequency(_)));
}

#[tokio::test]
async fn basic_is_served_from_cache_after_first_lookup() {
    let server = MockServer::start_async().await;
    let basic = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .body_includes("\"api_name\":\"stock_basic\"");
            then.status(200).json_body(table(
                &["ts_code", "name", "area", "industry", "list_date"],
                json!([
                    ["000001.SZ", "平安银行", "深圳", "银行", "19910403"],
                    ["600000.SH", "浦发银行", "上海", "银行", "19991110"],
                ]),
            ));
        })
        .await;

    let c = connector(&server);
    let first = c.basic("600000.SH").await.unwrap();
    assert_eq!(first[0]["symbol"], "600000.SH");
    assert_eq!(first[0]["name"], "浦发银行");
    assert_eq!(first[0]["list_date"], "19991110");

    let second = c.basic("000001.SZ").await.unwrap();
    assert_eq!(second[0]["industry"], "银行");
    basic.assert_async().await;

    let missing = c.basic("999999.SH").await.unwrap_err();
    assert!(matches!(missing, KlineError::VendorDataEmpty { .. }));
}

#[test]
fn advertises_both_capabilities() {
    let server = MockServer::start();
    let c = connector(&server);
    assert!(c.as_kline_provider().is_some());
    assert!(c.as_basic_provider().is_some());
    assert_eq!(c.vendor(), "tushare");
    let kp = c.as_kline_provider().unwrap();
    assert_eq!(kp.supported_frequencies().len(), 7);
}
