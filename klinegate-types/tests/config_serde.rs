use klinegate_types::{Frequency, KlineError, ServiceConfig, VendorKind};

#[test]
fn empty_toml_yields_defaults() {
    let cfg: ServiceConfig = toml::from_str("").unwrap();
    assert_eq!(cfg, ServiceConfig::default());
    assert_eq!(cfg.port, 8005);
    assert_eq!(cfg.analysis.ma_params, vec![5, 20]);
    assert_eq!(cfg.analysis.max_count, 5000);
}

#[test]
fn partial_toml_overrides_only_given_keys() {
    let cfg: ServiceConfig = toml::from_str(
        r#"
        vendor = "joinquant"
        bar_count = 3000

        [analysis]
        use_macd = false

        [tushare]
        token = "abc"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.vendor, VendorKind::JoinQuant);
    assert_eq!(cfg.bar_count, 3000);
    assert!(!cfg.analysis.use_macd);
    assert!(cfg.analysis.use_xd);
    assert_eq!(cfg.tushare.token, "abc");
    assert_eq!(cfg.tushare.base_url, "http://api.tushare.pro");
}

#[test]
fn vendor_aliases_parse() {
    assert_eq!("jq".parse::<VendorKind>().unwrap(), VendorKind::JoinQuant);
    assert_eq!("TQ".parse::<VendorKind>().unwrap(), VendorKind::Tq);
    assert!(matches!(
        "bloomberg".parse::<VendorKind>(),
        Err(KlineError::InvalidParameter(_))
    ));
}

#[test]
fn frequency_serde_uses_wire_codes() {
    let s = serde_json::to_string(&Frequency::M30).unwrap();
    assert_eq!(s, "\"30min\"");
    let f: Frequency = serde_json::from_str("\"W\"").unwrap();
    assert_eq!(f, Frequency::Weekly);
}

#[test]
fn error_round_trips_through_json() {
    let e = KlineError::normalization("tushare", "missing column 'dt'", &["a".to_string()]);
    let json = serde_json::to_string(&e).unwrap();
    let back: KlineError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
}

#[test]
fn connector_key_short_name() {
    let key = klinegate_types::ConnectorKey::new("klinegate-tushare");
    assert_eq!(key.short(), "tushare");
    assert_eq!(key.to_string(), "klinegate-tushare");
    assert_eq!(klinegate_types::ConnectorKey::new("dyn").short(), "dyn");
}

#[test]
fn client_errors_are_the_argument_errors() {
    assert!(KlineError::InvalidFrequency("3min".into()).is_client_error());
    assert!(KlineError::InvalidParameter("asset".into()).is_client_error());
    assert!(KlineError::unsupported("basic").is_client_error());
    assert!(!KlineError::vendor("tq", "down").is_client_error());
    assert!(!KlineError::empty("x").is_client_error());
    assert!(!KlineError::Analysis("boom".into()).is_client_error());
}
