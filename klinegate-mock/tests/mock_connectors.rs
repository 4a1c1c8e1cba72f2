use chrono::NaiveDate;
use klinegate_core::{
    AssetClass, Frequency, KlineError, KlineRequest, RawFrame, RequestWindow, VendorConnector,
    WindowPolicy, normalize,
};
use klinegate_mock::{DynamicMockConnector, MockBehavior, MockConnector};
use serde_json::json;

fn through() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 7, 20).unwrap()
}

fn req(symbol: &str, frequency: Frequency, window: RequestWindow) -> KlineRequest {
    KlineRequest {
        symbol: symbol.into(),
        frequency,
        asset: AssetClass::Index,
        window,
    }
}

#[tokio::test]
async fn recorded_daily_fixture_is_clipped_at_trade_date() {
    let mock = MockConnector::new();
    let kp = mock.as_kline_provider().expect("kline provider");
    let window = RequestWindow::Range {
        start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        through: through(),
    };
    let bars = normalize(kp.fetch(&req("000001.SH", Frequency::Daily, window)).await.unwrap()).unwrap();
    assert_eq!(bars.len(), 9);
    assert_eq!(bars.bars()[0].dt_string(), "2020-07-08 00:00:00");
    assert_eq!(bars.bars()[8].dt_string(), "2020-07-20 00:00:00");
}

#[tokio::test]
async fn synthetic_count_window_yields_exact_count() {
    let mock = MockConnector::counting(5000);
    let kp = mock.as_kline_provider().unwrap();
    let window = RequestWindow::Count {
        through: through(),
        count: 300,
    };
    let bars = normalize(kp.fetch(&req("IF9999", Frequency::M5, window)).await.unwrap()).unwrap();
    assert_eq!(bars.len(), 300);
    assert_eq!(bars.bars()[299].dt_string(), "2020-07-20 15:00:00");
    assert_eq!(kp.window_policy(), WindowPolicy::Count { max: 5000 });
}

#[tokio::test]
async fn magic_symbols_force_error_paths() {
    let mock = MockConnector::new();
    let kp = mock.as_kline_provider().unwrap();
    let w = RequestWindow::Count {
        through: through(),
        count: 10,
    };
    assert!(matches!(
        kp.fetch(&req("FAIL", Frequency::Daily, w)).await,
        Err(KlineError::VendorUnavailable { .. })
    ));
    assert!(matches!(
        kp.fetch(&req("EMPTY", Frequency::Daily, w)).await,
        Err(KlineError::VendorDataEmpty { .. })
    ));
    let bp = mock.as_basic_provider().unwrap();
    assert_eq!(bp.basic("600519.SH").await.unwrap()[0]["name"], "贵州茅台");
}

#[tokio::test]
async fn dynamic_mock_replays_script_and_logs_requests() {
    let (mock, controller) = DynamicMockConnector::new_with_controller("P0");
    let frame = RawFrame::new(
        ["symbol", "dt", "open", "close", "high", "low", "vol"],
        vec![vec![
            json!("A"),
            json!("2020-07-20 00:00:00"),
            json!(1),
            json!(2),
            json!(3),
            json!(0.5),
            json!(10),
        ]],
    );
    controller
        .set_kline_behavior("A", MockBehavior::Return(frame))
        .await;
    controller
        .set_kline_behavior("B", MockBehavior::Fail(KlineError::vendor("P0", "boom")))
        .await;

    let kp = mock.as_kline_provider().unwrap();
    let w = RequestWindow::Count {
        through: through(),
        count: 10,
    };
    let bars = normalize(kp.fetch(&req("A", Frequency::Daily, w)).await.unwrap()).unwrap();
    assert_eq!(bars.len(), 1);
    assert!(kp.fetch(&req("B", Frequency::Daily, w)).await.is_err());
    assert!(matches!(
        kp.fetch(&req("C", Frequency::Daily, w)).await,
        Err(KlineError::VendorDataEmpty { .. })
    ));

    let seen: Vec<String> = controller
        .requests()
        .await
        .into_iter()
        .map(|r| r.symbol)
        .collect();
    assert_eq!(seen, vec!["A", "B", "C"]);
    assert!(mock.as_basic_provider().is_none());
}
