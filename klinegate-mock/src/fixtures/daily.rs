use klinegate_core::RawFrame;
use serde_json::json;

use super::COLUMNS;

/// Ten recorded sessions of the Shanghai composite, July 2020, newest first.
/// The last row lies past 2020-07-20 so a window ending there clips it.
const SH_COMPOSITE: &[(&str, f64, f64, f64, f64, f64)] = &[
    ("20200721", 3336.59, 3320.89, 3348.13, 3300.12, 3.655e10),
    ("20200720", 3219.41, 3314.15, 3314.68, 3219.41, 4.142e10),
    ("20200717", 3211.05, 3214.13, 3237.82, 3181.51, 3.702e10),
    ("20200716", 3360.08, 3210.10, 3361.71, 3210.10, 4.870e10),
    ("20200715", 3415.58, 3361.30, 3420.98, 3347.04, 4.451e10),
    ("20200714", 3433.02, 3414.62, 3433.70, 3353.07, 4.806e10),
    ("20200713", 3445.33, 3443.29, 3458.79, 3381.25, 5.510e10),
    ("20200710", 3425.49, 3383.32, 3429.61, 3375.59, 5.183e10),
    ("20200709", 3398.86, 3450.59, 3456.97, 3394.83, 5.778e10),
    ("20200708", 3340.98, 3403.44, 3403.98, 3338.08, 6.339e10),
];

pub fn by_symbol(symbol: &str) -> Option<RawFrame> {
    let rows = match symbol {
        "000001.SH" | "000001.XSHG" | "SHSE.000001" => SH_COMPOSITE,
        _ => return None,
    };
    Some(RawFrame::new(
        COLUMNS,
        rows.iter()
            .map(|(d, o, c, h, l, v)| {
                vec![json!(symbol), json!(d), json!(o), json!(c), json!(h), json!(l), json!(v)]
            })
            .collect(),
    ))
}
