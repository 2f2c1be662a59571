use std::{collections::HashMap, fs, path::Path, str::FromStr};

use tracing::warn;

const SETTINGS_FILE: &str = "atm.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfidMode {
    Hardware,
    Mock,
    Disabled,
}

impl FromStr for RfidMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hardware" => Ok(Self::Hardware),
            "mock" => Ok(Self::Mock),
            "disabled" | "off" => Ok(Self::Disabled),
            other => Err(format!("unknown rfid mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub users_path: Option<String>,
    pub rfid_mode: RfidMode,
    pub rfid_poll_interval_ms: Option<u64>,
    pub printer_port: Option<String>,
    pub printer_baud_rate: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:3001".into(),
            users_path: None,
            rfid_mode: RfidMode::Hardware,
            rfid_poll_interval_ms: None,
            printer_port: None,
            printer_baud_rate: 9600,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then the environment. For each setting
/// the `APP__` variable wins over the plain one.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
        }
    }

    if let Some(port) = env("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => settings.server_bind = with_port(&settings.server_bind, port),
            Err(_) => warn!(%port, "ignoring invalid PORT"),
        }
    }
    if let Some(v) = pick(&env, "SERVER_BIND", "APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = pick(&env, "USERS_PATH", "APP__USERS_PATH") {
        settings.users_path = Some(v);
    }
    if let Some(v) = pick(&env, "RFID_MODE", "APP__RFID_MODE") {
        set_rfid_mode(&mut settings, &v);
    }
    if let Some(v) = env("APP__RFID_POLL_INTERVAL_MS") {
        set_poll_interval(&mut settings, &v);
    }
    if let Some(v) = pick(&env, "PRINTER_PORT", "APP__PRINTER_PORT") {
        settings.printer_port = Some(v).filter(|p| !p.trim().is_empty());
    }
    if let Some(v) = pick(&env, "PRINTER_BAUD_RATE", "APP__PRINTER_BAUD_RATE") {
        set_baud_rate(&mut settings, &v);
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("users_path") {
        settings.users_path = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("rfid_mode") {
        set_rfid_mode(settings, v);
    }
    if let Some(v) = file_cfg.get("rfid_poll_interval_ms") {
        set_poll_interval(settings, v);
    }
    if let Some(v) = file_cfg.get("printer_port") {
        settings.printer_port = Some(v.clone()).filter(|p| !p.trim().is_empty());
    }
    if let Some(v) = file_cfg.get("printer_baud_rate") {
        set_baud_rate(settings, v);
    }
}

fn pick(env: &impl Fn(&str) -> Option<String>, plain: &str, prefixed: &str) -> Option<String> {
    env(prefixed).or_else(|| env(plain))
}

fn set_rfid_mode(settings: &mut Settings, raw: &str) {
    match raw.parse() {
        Ok(mode) => settings.rfid_mode = mode,
        Err(error) => warn!(%error, "keeping rfid mode {:?}", settings.rfid_mode),
    }
}

fn set_poll_interval(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => settings.rfid_poll_interval_ms = Some(ms),
        _ => warn!(value = %raw, "ignoring invalid rfid poll interval"),
    }
}

fn set_baud_rate(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u32>() {
        Ok(baud) if baud > 0 => settings.printer_baud_rate = baud,
        _ => warn!(value = %raw, "ignoring invalid printer baud rate"),
    }
}

fn with_port(bind: &str, port: u16) -> String {
    let host = bind.rsplit_once(':').map_or(bind, |(host, _)| host);
    format!("{host}:{port}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
