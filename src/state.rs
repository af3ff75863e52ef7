use serde::{Deserialize, Serialize};

use crate::message::{is_system_notice, ChatLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
        }
    }

    /// True while a connection is being established or is up.
    pub fn is_active(self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}

/// Snapshot of a chat connection as observed by a front-end.
///
/// Published through a `watch` channel and only ever replaced whole, so a
/// reader never sees a half-applied update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatSession {
    pub state: ConnectionState,
    pub last_error: Option<String>,
    /// Raw received lines, in arrival order.
    pub messages: Vec<String>,
    pub unread_count: u32,
    pub user_name: String,
    /// Lines typed while disconnected, flushed after the next handshake.
    pub pending: Vec<String>,
    pub open: bool,
    /// `host:port` being tried or connected to.
    pub endpoint: Option<String>,
}

impl ChatSession {
    pub(crate) fn new(user_name: String) -> Self {
        Self {
            user_name,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state == ConnectionState::Connecting
    }

    pub fn status(&self) -> &'static str {
        self.state.label()
    }

    /// Received lines split into author and body.
    pub fn lines(&self) -> Vec<ChatLine> {
        self.messages.iter().map(|raw| ChatLine::parse(raw)).collect()
    }

    /// Appends a received line; counts it as unread unless the chat is open
    /// or the line is a join/leave notice.
    pub(crate) fn push_received(&mut self, line: String) {
        if self.open {
            self.unread_count = 0;
        } else if !is_system_notice(&line) {
            self.unread_count = self.unread_count.saturating_add(1);
        }
        self.messages.push(line);
    }

    pub(crate) fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.endpoint = None;
    }

    /// Serializes the snapshot for a front-end that consumes JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
