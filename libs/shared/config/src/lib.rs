use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 280;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 300;
pub const DEFAULT_PILL_REMINDER_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cycle_data_path: Option<String>,
    pub notification_check_interval_seconds: u64,
    pub notification_retry_delay_seconds: u64,
    pub pill_reminder_window_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cycle_data_path: None,
            notification_check_interval_seconds: DEFAULT_CHECK_INTERVAL_SECONDS,
            notification_retry_delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
            pill_reminder_window_minutes: DEFAULT_PILL_REMINDER_WINDOW_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            cycle_data_path: env::var("CYCLE_DATA_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .or_else(|| {
                    warn!("CYCLE_DATA_PATH not set, starting with an empty cycle store");
                    None
                }),
            notification_check_interval_seconds: non_zero_or_default(
                "NOTIFICATION_CHECK_INTERVAL_SECONDS",
                parse_or_default("NOTIFICATION_CHECK_INTERVAL_SECONDS", DEFAULT_CHECK_INTERVAL_SECONDS),
                DEFAULT_CHECK_INTERVAL_SECONDS,
            ),
            notification_retry_delay_seconds: non_zero_or_default(
                "NOTIFICATION_RETRY_DELAY_SECONDS",
                parse_or_default("NOTIFICATION_RETRY_DELAY_SECONDS", DEFAULT_RETRY_DELAY_SECONDS),
                DEFAULT_RETRY_DELAY_SECONDS,
            ),
            pill_reminder_window_minutes: parse_or_default(
                "PILL_REMINDER_WINDOW_MINUTES",
                DEFAULT_PILL_REMINDER_WINDOW_MINUTES,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.cycle_data_path.is_some()
            && self.notification_check_interval_seconds > 0
            && self.pill_reminder_window_minutes >= 0
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}

// A zero wait would turn the worker loop into a busy spin.
fn non_zero_or_default(key: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        warn!("{} must be greater than zero, using default {}", key, default);
        return default;
    }
    value
}
