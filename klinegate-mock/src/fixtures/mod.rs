pub mod basic;
pub mod daily;
pub mod synthetic;

use klinegate_core::{Column, TimestampEncoding, VendorSchema};

/// Fixture frames use short vendor-style labels so the normalizer's column
/// mapping is exercised, not bypassed.
pub const SCHEMA: VendorSchema = VendorSchema {
    aliases: &[
        ("code", Column::Symbol),
        ("time", Column::Dt),
        ("o", Column::Open),
        ("c", Column::Close),
        ("h", Column::High),
        ("l", Column::Low),
        ("v", Column::Vol),
    ],
    timestamp: TimestampEncoding::Text,
    drop_session_open: None,
    start_stamped: false,
};

pub const COLUMNS: [&str; 7] = ["code", "time", "o", "c", "h", "l", "v"];
