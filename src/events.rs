use std::time::Duration;

use crate::message::ChatLine;

// Event types for observers
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Connecting { endpoint: String },
    Connected { endpoint: String },
    /// `reason` is `None` for a clean close or an explicit disconnect.
    Disconnected { reason: Option<String> },
    Message(ChatLine),
    ReconnectScheduled { attempt: u32, delay: Duration },
    Error(String),
}

impl ChatEvent {
    // Get the name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            ChatEvent::Connecting { .. } => "connecting",
            ChatEvent::Connected { .. } => "connected",
            ChatEvent::Disconnected { .. } => "disconnected",
            ChatEvent::Message(_) => "message",
            ChatEvent::ReconnectScheduled { .. } => "reconnectScheduled",
            ChatEvent::Error(_) => "error",
        }
    }

    /// If this event carries a received line, returns it
    pub fn line(&self) -> Option<&ChatLine> {
        match self {
            ChatEvent::Message(line) => Some(line),
            _ => None,
        }
    }
}
