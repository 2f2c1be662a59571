use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn missing_file() -> &'static Path {
    Path::new("/definitely/not/here/atm.toml")
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(missing_file(), env_from(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.printer_baud_rate, 9600);
    assert_eq!(settings.rfid_mode, RfidMode::Hardware);
}

#[test]
fn port_replaces_only_the_port() {
    let settings = load_settings_from(missing_file(), env_from(&[("PORT", "8080")]));
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
}

#[test]
fn prefixed_env_wins_over_plain() {
    let settings = load_settings_from(
        missing_file(),
        env_from(&[
            ("PRINTER_PORT", "/dev/ttyUSB0"),
            ("APP__PRINTER_PORT", "/dev/ttyS1"),
            ("PRINTER_BAUD_RATE", "19200"),
            ("RFID_MODE", "mock"),
        ]),
    );
    assert_eq!(settings.printer_port.as_deref(), Some("/dev/ttyS1"));
    assert_eq!(settings.printer_baud_rate, 19200);
    assert_eq!(settings.rfid_mode, RfidMode::Mock);
}

#[test]
fn invalid_values_keep_defaults() {
    let settings = load_settings_from(
        missing_file(),
        env_from(&[
            ("PORT", "not-a-port"),
            ("PRINTER_BAUD_RATE", "fast"),
            ("RFID_MODE", "quantum"),
            ("APP__RFID_POLL_INTERVAL_MS", "0"),
        ]),
    );
    assert_eq!(settings, Settings::default());
}

#[test]
fn settings_file_is_read_then_overridden_by_env() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("atm_server_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("atm.toml");
    fs::write(
        &path,
        r#"
bind_addr = "127.0.0.1:4000"
rfid_mode = "disabled"
rfid_poll_interval_ms = "250"
printer_port = "/dev/usb/lp0"
"#,
    )
    .expect("write settings");

    let settings = load_settings_from(&path, env_from(&[("APP__BIND_ADDR", "127.0.0.1:5000")]));
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.rfid_mode, RfidMode::Disabled);
    assert_eq!(settings.rfid_poll_interval_ms, Some(250));
    assert_eq!(settings.printer_port.as_deref(), Some("/dev/usb/lp0"));

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn rfid_mode_parses_case_insensitively() {
    assert_eq!("MOCK".parse::<RfidMode>(), Ok(RfidMode::Mock));
    assert_eq!(" off ".parse::<RfidMode>(), Ok(RfidMode::Disabled));
    assert!("nfc".parse::<RfidMode>().is_err());
}
