//! Async client for the restaurant staff chat.
//!
//! The chat server speaks plain newline-delimited UTF-8 over TCP. A client
//! connects to the first reachable host out of a fixed list, writes its
//! display name as the handshake line, and from then on every line in either
//! direction is a chat message. [`ChatClient`] wraps that in a small state
//! machine with queued offline sends and capped exponential reconnects.
//!
//! ```no_run
//! use staff_chat::{ChatClient, ChatConfig};
//!
//! # async fn run() -> Result<(), staff_chat::ChatError> {
//! let client = ChatClient::new(ChatConfig::default().with_user_name("Alice"))?;
//! let mut session = client.subscribe();
//! client.connect();
//! client.send("kaixo!");
//!
//! while session.changed().await.is_ok() {
//!     let snapshot = session.borrow().clone();
//!     println!("{} ({} unread)", snapshot.status(), snapshot.unread_count);
//! }
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```
mod backoff;
pub use backoff::Backoff;
mod client;
pub use client::ChatClient;
mod codec;
pub use codec::ChatCodec;
mod config;
pub use config::ChatConfig;
mod error;
pub use error::ChatError;
mod events;
pub use events::ChatEvent;
mod message;
pub use message::{is_system_notice, ChatLine};
pub mod settings;
mod state;
pub use state::{ChatSession, ConnectionState};
