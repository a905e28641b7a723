use reserve_check::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../reserve-check.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.client.bkr_exe, "auto");
    assert!(!cfg.output.report_filename.is_empty());
}

#[test]
fn empty_config_falls_back_to_defaults() {
    let cfg: Config = toml::from_str("").expect("parse TOML");
    assert_eq!(cfg.client.timeout_seconds, 300);
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.output.pretty);
}
