use serde_json::{Value, json};

pub fn by_symbol(ts_code: &str) -> Option<Value> {
    let (name, area, industry, list_date) = match ts_code {
        "000001.SZ" => ("平安银行", "深圳", "银行", "19910403"),
        "600000.SH" => ("浦发银行", "上海", "银行", "19991110"),
        "600519.SH" => ("贵州茅台", "贵州", "白酒", "20010827"),
        _ => return None,
    };
    Some(json!([{
        "ts_code": ts_code,
        "symbol": ts_code,
        "name": name,
        "area": area,
        "industry": industry,
        "list_date": list_date,
    }]))
}
