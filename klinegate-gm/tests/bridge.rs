use std::sync::Arc;

use chrono::NaiveDate;
use httpmock::prelude::*;
use klinegate_core::{
    AssetClass, Frequency, KlineError, KlineProvider, KlineRequest, RequestWindow, StaticToken,
    normalize,
};
use klinegate_gm::GmConnector;
use serde_json::json;

fn request(freq: Frequency) -> KlineRequest {
    KlineRequest {
        symbol: "SHSE.600000".into(),
        frequency: freq,
        asset: AssetClass::Equity,
        window: RequestWindow::Count {
            through: NaiveDate::from_ymd_opt(2020, 7, 20).unwrap(),
            count: 3000,
        },
    }
}

fn connector(server: &MockServer) -> GmConnector {
    GmConnector::new(
        reqwest::Client::new(),
        &server.base_url(),
        Arc::new(StaticToken::new("gm", "gm-token")),
    )
    .unwrap()
}

#[tokio::test]
async fn history_n_records_are_normalized() {
    let server = MockServer::start_async().await;
    let hist = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/history_n")
                .body_includes("\"frequency\":\"300s\"")
                .body_includes("\"count\":3000")
                .body_includes("\"token\":\"gm-token\"")
                .body_includes("\"end_time\":\"2020-07-21 00:00:00\"");
            then.status(200).json_body(json!({
                "code": 0,
                "data": [
                    {"symbol": "SHSE.600000", "eob": "2020-07-20T09:40:00+08:00", "open": 10.0, "close": 10.1, "high": 10.2, "low": 9.9, "volume": 3000, "bob": "2020-07-20T09:35:00+08:00"},
                    {"symbol": "SHSE.600000", "eob": "2020-07-20T09:35:00+08:00", "open": 9.9, "close": 10.0, "high": 10.05, "low": 9.85, "volume": 2500}
                ]
            }));
        })
        .await;

    let raw = connector(&server).fetch(&request(Frequency::M5)).await.unwrap();
    hist.assert_async().await;
    assert_eq!(raw.frame.columns.len(), 7);

    let bars = normalize(raw).unwrap();
    let dts: Vec<String> = bars.iter().map(|b| b.dt_string()).collect();
    assert_eq!(dts, vec!["2020-07-20 09:35:00", "2020-07-20 09:40:00"]);
}

#[tokio::test]
async fn daily_count_ends_on_the_trade_date() {
    let server = MockServer::start_async().await;
    let hist = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/history_n")
                .body_includes("\"frequency\":\"1d\"")
                .body_includes("\"end_time\":\"2020-07-20 00:00:00\"");
            then.status(200).json_body(json!({
                "code": 0,
                "data": [
                    {"symbol": "SHSE.600000", "eob": "2020-07-20T00:00:00+08:00", "open": 10.0, "close": 10.1, "high": 10.2, "low": 9.9, "volume": 3000}
                ]
            }));
        })
        .await;

    let raw = connector(&server).fetch(&request(Frequency::Daily)).await.unwrap();
    hist.assert_async().await;
    assert_eq!(normalize(raw).unwrap().len(), 1);
}

#[tokio::test]
async fn weekly_is_rejected_without_calling_terminal() {
    let server = MockServer::start_async().await;
    let err = connector(&server)
        .fetch(&request(Frequency::Weekly))
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::InvalidFrequency(_)));
}

#[tokio::test]
async fn bridge_error_code_is_vendor_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/history_n");
            then.status(200)
                .json_body(json!({"code": 1020, "msg": "terminal not logged in"}));
        })
        .await;
    let err = connector(&server)
        .fetch(&request(Frequency::Daily))
        .await
        .unwrap_err();
    match err {
        KlineError::VendorUnavailable { msg, .. } => assert!(msg.contains("not logged in")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn empty_data_is_data_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/history_n");
            then.status(200).json_body(json!({"code": 0, "data": []}));
        })
        .await;
    let err = connector(&server)
        .fetch(&request(Frequency::Daily))
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::VendorDataEmpty { .. }));
}

#[test]
fn malformed_endpoint_is_invalid_parameter() {
    let err = GmConnector::new(
        reqwest::Client::new(),
        "not a url",
        Arc::new(StaticToken::new("gm", "t")),
    )
    .err()
    .unwrap();
    assert!(matches!(err, KlineError::InvalidParameter(_)));
}
