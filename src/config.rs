use std::time::Duration;

use crate::settings::SETTINGS;
use crate::{Backoff, ChatError};

/// Per-client configuration. `Default` copies the global [`SETTINGS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Hosts tried in order on every connection attempt, all on `port`.
    pub hosts: Vec<String>,
    pub port: u16,
    /// Bound on each individual host connect.
    pub connect_timeout: Duration,
    pub backoff: Backoff,
    /// Display name used when an empty one is given.
    pub fallback_name: String,
    /// Display name sent in the first handshake.
    pub user_name: String,
    pub max_line_length: usize,
    pub event_buffer_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            hosts: SETTINGS.hosts.clone(),
            port: SETTINGS.port,
            connect_timeout: SETTINGS.connect_timeout,
            backoff: Backoff::new(
                SETTINGS.base_backoff,
                SETTINGS.max_backoff,
                SETTINGS.backoff_attempt_cap,
            ),
            fallback_name: SETTINGS.fallback_name.clone(),
            user_name: SETTINGS.fallback_name.clone(),
            max_line_length: SETTINGS.max_line_length,
            event_buffer_capacity: SETTINGS.event_buffer_capacity,
        }
    }
}

impl ChatConfig {
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_user_name(mut self, user_name: &str) -> Self {
        self.user_name = self.clean_user_name(user_name);
        self
    }

    pub fn with_fallback_name(mut self, fallback_name: &str) -> Self {
        self.fallback_name = fallback_name.trim().to_string();
        self
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// `host:port` strings in the order they are tried.
    pub fn endpoints(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| format!("{}:{}", host, self.port))
            .collect()
    }

    /// Trims a display name, falling back to `fallback_name` when empty.
    pub fn clean_user_name(&self, user_name: &str) -> String {
        let cleaned = user_name.trim();
        if cleaned.is_empty() {
            self.fallback_name.clone()
        } else {
            cleaned.to_string()
        }
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.hosts.is_empty() {
            return Err(ChatError::NoCandidates);
        }
        if self.port == 0 {
            return Err(ChatError::InvalidConfig("port must be non-zero".to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(ChatError::InvalidConfig(
                "connect timeout must be non-zero".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(ChatError::InvalidConfig(
                "max line length must be non-zero".to_string(),
            ));
        }
        if self.fallback_name.is_empty() {
            return Err(ChatError::InvalidConfig(
                "fallback name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
