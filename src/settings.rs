use once_cell::sync::Lazy;
use std::{env, time::Duration};

/// Holds all tunables, read-once from ENV with fallbacks.
pub struct Settings {
    pub hosts: Vec<String>,
    pub port: u16,
    pub connect_timeout: Duration,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_attempt_cap: u32,
    pub fallback_name: String,
    pub max_line_length: usize,
    pub event_buffer_capacity: usize,
}

impl Settings {
    fn from_env() -> Self {
        // optionally load .env
        let _ = dotenvy::dotenv();

        fn parse_num<T: std::str::FromStr>(var: &str, default: T) -> T {
            env::var(var)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        }

        // helper to parse millis into Duration
        fn parse_millis(var: &str, default_ms: u64) -> Duration {
            Duration::from_millis(parse_num(var, default_ms))
        }

        fn parse_list(var: &str, default: &[&str]) -> Vec<String> {
            let parsed: Vec<String> = env::var(var)
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            if parsed.is_empty() {
                default.iter().map(|s| s.to_string()).collect()
            } else {
                parsed
            }
        }

        let fallback_name = env::var("CHAT_FALLBACK_NAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "Anonimo".to_string());

        Settings {
            hosts: parse_list("CHAT_HOSTS", &["192.168.2.101", "192.168.1.150"]),
            port: parse_num("CHAT_PORT", 5555),
            connect_timeout: parse_millis("CHAT_CONNECT_TIMEOUT_MS", 3_000),
            base_backoff: parse_millis("CHAT_BASE_BACKOFF_MS", 1_000),
            max_backoff: parse_millis("CHAT_MAX_BACKOFF_MS", 10_000),
            backoff_attempt_cap: parse_num("CHAT_BACKOFF_ATTEMPT_CAP", 4),
            fallback_name,
            max_line_length: parse_num("CHAT_MAX_LINE_LENGTH", 64 * 1024),
            event_buffer_capacity: parse_num("CHAT_EVENT_BUFFER_CAPACITY", 100),
        }
    }
}

/// Global settings instance
pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);
