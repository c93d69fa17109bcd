//! Logging setup for sfxlib binaries: plain `env_logger` output or JSON lines

use chrono::{Local, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;

/// Environment variable holding the log level (`info`, `json:debug`, ...)
pub const LOG_LEVEL_ENV: &str = "SFXLIB_LOG_LEVEL";

/// Environment variable redirecting JSON log lines to a file
pub const LOG_PATH_ENV: &str = "SFXLIB_LOG_PATH";

/// JSON logger implementation
#[derive(Debug)]
pub struct JsonLogger {
    level: Level,
    target_file: Mutex<Option<std::fs::File>>,
}

/// Split a level string into (json output requested, level name)
fn split_level_spec(level_str: &str) -> (bool, &str) {
    if let Some(stripped) = level_str.strip_prefix("json:") {
        (true, stripped)
    } else if level_str == "json" {
        (true, "info")
    } else {
        (false, level_str)
    }
}

fn parse_level_filter(name: &str) -> LevelFilter {
    match name {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

impl JsonLogger {
    /// Create a new JSON logger
    pub fn new(level: Level, log_path: Option<String>) -> Self {
        let target_file = if let Some(path) = log_path {
            OpenOptions::new().create(true).append(true).open(path).ok()
        } else {
            None
        };

        JsonLogger {
            level,
            target_file: Mutex::new(target_file),
        }
    }

    /// Initialize the logger from a level string; returns the effective level name
    pub fn init_with_level(level_str: &str) -> String {
        let (use_json, actual_level) = split_level_spec(level_str);

        if !use_json {
            env_logger::Builder::new()
                .filter_level(parse_level_filter(actual_level))
                .format(|buf, record| {
                    writeln!(
                        buf,
                        "[{} {} {}] {}",
                        Local::now().format("%Y-%m-%dT%H:%M:%S"),
                        record.level(),
                        record.target(),
                        record.args()
                    )
                })
                .init();
            return actual_level.to_string();
        }

        let level = parse_level_filter(actual_level)
            .to_level()
            .unwrap_or(Level::Info);
        let logger = Box::new(JsonLogger::new(level, env::var(LOG_PATH_ENV).ok()));

        if let Err(e) = log::set_boxed_logger(logger) {
            eprintln!("Failed to initialize JSON logger: {e}");
            return actual_level.to_string();
        }

        log::set_max_level(level.to_level_filter());
        actual_level.to_string()
    }

    /// Initialize from `SFXLIB_LOG_LEVEL`, defaulting to `info`
    pub fn init() -> String {
        let log_level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
        Self::init_with_level(&log_level)
    }

    fn render(record: &Record<'_>) -> String {
        let log_entry = json!({
            "@timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            "@level": record.level().to_string().to_lowercase(),
            "@message": record.args().to_string(),
            "@module": record.target(),
            "@pid": std::process::id(),
        });
        format!("{}\n", serde_json::to_string(&log_entry).unwrap_or_default())
    }
}

impl Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::render(record);
        if let Ok(mut file_guard) = self.target_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let _ = file.write_all(line.as_bytes());
                let _ = file.flush();
                return;
            }
        }
        let _ = io::stderr().write_all(line.as_bytes());
    }

    fn flush(&self) {
        if let Ok(mut file_guard) = self.target_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let _ = file.flush();
            }
        }
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_level_spec() {
        assert_eq!(split_level_spec("debug"), (false, "debug"));
        assert_eq!(split_level_spec("json:trace"), (true, "trace"));
        assert_eq!(split_level_spec("json"), (true, "info"));
    }

    #[test]
    fn test_unknown_level_defaults_to_info() {
        assert_eq!(parse_level_filter("chatty"), LevelFilter::Info);
        assert_eq!(parse_level_filter("off"), LevelFilter::Off);
    }

    #[test]
    fn test_render_is_json_line() {
        let line = JsonLogger::render(
            &Record::builder()
                .args(format_args!("packed {} modules", 64))
                .level(Level::Info)
                .target("sfxlib::sfx::packer")
                .build(),
        );
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["@level"], "info");
        assert_eq!(value["@message"], "packed 64 modules");
        assert_eq!(value["@module"], "sfxlib::sfx::packer");
    }
}
