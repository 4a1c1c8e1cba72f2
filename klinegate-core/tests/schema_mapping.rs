use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use klinegate_core::{
    AssetClass, Column, Frequency, KlineRequest, RawFrame, RawVendorResponse, RequestWindow,
    TimestampEncoding, VendorSchema, normalize,
};
use serde_json::json;

const VENDOR_SCHEMA: VendorSchema = VendorSchema {
    aliases: &[
        ("code", Column::Symbol),
        ("trade_time", Column::Dt),
        ("trade_date", Column::Dt),
        ("open", Column::Open),
        ("close", Column::Close),
        ("high", Column::High),
        ("low", Column::Low),
        ("volume", Column::Vol),
    ],
    timestamp: TimestampEncoding::Text,
    drop_session_open: NaiveTime::from_hms_opt(9, 30, 0),
    start_stamped: false,
};

fn window() -> RequestWindow {
    RequestWindow::Range {
        start: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
        through: NaiveDate::from_ymd_opt(2020, 7, 20).unwrap(),
    }
}

fn req(frequency: Frequency) -> KlineRequest {
    KlineRequest {
        symbol: "600000.SH".into(),
        frequency,
        asset: AssetClass::Equity,
        window: window(),
    }
}

#[test]
fn csv_frame_maps_aliases_and_falls_back_to_request_symbol() {
    let csv = "\
trade_time,open,close,high,low,volume
2020-07-20 09:32:00,10.1,10.2,10.3,10.0,500
2020-07-20 09:31:00,10.0,10.1,10.2,9.9,400
";
    let seq = normalize(RawVendorResponse {
        vendor: "csv",
        request: req(Frequency::M1),
        schema: VENDOR_SCHEMA,
        frame: RawFrame::from_csv(csv),
    })
    .unwrap();
    assert_eq!(seq.len(), 2);
    assert_eq!(seq.bars()[0].dt_string(), "2020-07-20 09:31:00");
    assert!(seq.iter().all(|b| b.symbol == "600000.SH"));
}

#[test]
fn session_open_stamp_is_dropped_for_intraday_only() {
    let frame = RawFrame::new(
        ["code", "trade_time", "open", "close", "high", "low", "volume"],
        vec![
            vec![json!("600000.SH"), json!("2020-07-20 09:30:00"), json!(1), json!(1), json!(1), json!(1), json!(1)],
            vec![json!("600000.SH"), json!("2020-07-20 09:31:00"), json!(1), json!(1), json!(1), json!(1), json!(1)],
        ],
    );
    let intraday = normalize(RawVendorResponse {
        vendor: "t",
        request: req(Frequency::M1),
        schema: VENDOR_SCHEMA,
        frame: frame.clone(),
    })
    .unwrap();
    assert_eq!(intraday.len(), 1);
    assert_eq!(intraday.bars()[0].dt_string(), "2020-07-20 09:31:00");

    let daily = normalize(RawVendorResponse {
        vendor: "t",
        request: req(Frequency::Daily),
        schema: VENDOR_SCHEMA,
        frame,
    })
    .unwrap();
    assert_eq!(daily.len(), 2);
}

#[test]
fn epoch_nanos_are_converted_to_exchange_time() {
    let schema = VendorSchema {
        aliases: &[
            ("datetime", Column::Dt),
            ("open", Column::Open),
            ("close", Column::Close),
            ("high", Column::High),
            ("low", Column::Low),
            ("volume", Column::Vol),
        ],
        timestamp: TimestampEncoding::EpochNanos,
        drop_session_open: None,
        start_stamped: false,
    };
    // 2020-07-20 01:31:00 UTC is 09:31 in Shanghai
    let nanos = Utc
        .with_ymd_and_hms(2020, 7, 20, 1, 31, 0)
        .unwrap()
        .timestamp_nanos_opt()
        .unwrap();
    let seq = normalize(RawVendorResponse {
        vendor: "tq",
        request: req(Frequency::M1),
        schema,
        frame: RawFrame::new(
            ["datetime", "open", "close", "high", "low", "volume"],
            vec![vec![json!(nanos), json!(3.0), json!(3.1), json!(3.2), json!(2.9), json!(10.0)]],
        ),
    })
    .unwrap();
    assert_eq!(seq.bars()[0].dt_string(), "2020-07-20 09:31:00");
}

#[test]
fn offset_timestamps_are_converted_to_exchange_time() {
    let schema = VendorSchema {
        aliases: &[
            ("eob", Column::Dt),
            ("open", Column::Open),
            ("close", Column::Close),
            ("high", Column::High),
            ("low", Column::Low),
            ("volume", Column::Vol),
        ],
        timestamp: TimestampEncoding::Text,
        drop_session_open: None,
        start_stamped: false,
    };
    let seq = normalize(RawVendorResponse {
        vendor: "gm",
        request: req(Frequency::M5),
        schema,
        frame: RawFrame::new(
            ["eob", "open", "close", "high", "low", "volume"],
            vec![vec![
                json!("2020-07-20T02:35:00Z"),
                json!(1),
                json!(1),
                json!(1),
                json!(1),
                json!(1),
            ]],
        ),
    })
    .unwrap();
    assert_eq!(seq.bars()[0].dt_string(), "2020-07-20 10:35:00");
}

#[test]
fn empty_frame_with_full_header_is_empty_sequence() {
    let seq = normalize(RawVendorResponse {
        vendor: "t",
        request: req(Frequency::Daily),
        schema: VENDOR_SCHEMA,
        frame: RawFrame::new(["trade_date", "open", "close", "high", "low", "volume"], vec![]),
    })
    .unwrap();
    assert!(seq.is_empty());
}

const OPEN_STAMPED: VendorSchema = VendorSchema {
    aliases: &[
        ("datetime", Column::Dt),
        ("open", Column::Open),
        ("close", Column::Close),
        ("high", Column::High),
        ("low", Column::Low),
        ("volume", Column::Vol),
    ],
    timestamp: TimestampEncoding::EpochNanos,
    drop_session_open: None,
    start_stamped: true,
};

fn utc_nanos(d: u32, h: u32, m: u32) -> i64 {
    Utc.with_ymd_and_hms(2020, 7, d, h, m, 0)
        .unwrap()
        .timestamp_nanos_opt()
        .unwrap()
}

fn open_stamped(frequency: Frequency, starts: &[i64]) -> Vec<String> {
    let rows = starts
        .iter()
        .map(|n| vec![json!(n), json!(3.0), json!(3.1), json!(3.2), json!(2.9), json!(10.0)])
        .collect();
    normalize(RawVendorResponse {
        vendor: "tq",
        request: req(frequency),
        schema: OPEN_STAMPED,
        frame: RawFrame::new(["datetime", "open", "close", "high", "low", "volume"], rows),
    })
    .unwrap()
    .iter()
    .map(|b| b.dt_string())
    .collect()
}

#[test]
fn open_stamped_intraday_bars_are_moved_to_their_close() {
    // 01:30 UTC opens the 09:30 Shanghai minute
    assert_eq!(
        open_stamped(Frequency::M1, &[utc_nanos(20, 1, 30)]),
        ["2020-07-20 09:31:00"]
    );
    assert_eq!(
        open_stamped(Frequency::M30, &[utc_nanos(20, 1, 30), utc_nanos(20, 6, 30)]),
        ["2020-07-20 10:00:00", "2020-07-20 15:00:00"]
    );
}

#[test]
fn open_stamped_shift_happens_before_window_clip() {
    // opens 23:55 on the trade date, closes at the window's exclusive end
    assert_eq!(
        open_stamped(Frequency::M5, &[utc_nanos(20, 6, 55), utc_nanos(20, 15, 55)]),
        ["2020-07-20 15:00:00"]
    );
}

#[test]
fn open_stamped_daily_bars_keep_their_date() {
    // 16:00 UTC on the 19th is midnight of the 20th in Shanghai
    assert_eq!(
        open_stamped(Frequency::Daily, &[utc_nanos(19, 16, 0)]),
        ["2020-07-20 00:00:00"]
    );
}
