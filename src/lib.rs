//! # irc-session
//!
//! A single-connection IRC client engine: it owns one server
//! connection, performs the registration handshake, frames and decodes
//! the line-oriented wire protocol, tracks per-channel user lists,
//! rate-limits outbound traffic, and emits a structured [`Event`] for
//! every recognized server message.
//!
//! ## Features
//!
//! - Streaming byte-to-line framing with three-stage encoding fallback
//!   (configured encoding → Latin-1 → Windows-1252 lossy)
//! - NAMES aggregation across repeated 353 replies
//! - Nickname-collision renegotiation with an unbounded fallback chain
//! - Deterministic, virtual-clock flood control on the send path
//! - Structured error events for ~40 numeric error replies
//! - Optional TLS via `tokio-rustls` (the default `tls` feature)

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ```no_run
//! use irc_session::{Client, Config, Event};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     nickname: "ferris".to_string(),
//!     alternate: "ferris_".to_string(),
//!     ..Config::new("irc.libera.chat", 6667)
//! };
//!
//! let (client, mut events) = Client::connect(config).await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         Event::Registered { .. } => client.join("#rust", None)?,
//!         Event::Public { nickname, text } => println!("<{}> {}", nickname, text),
//!         Event::Disconnected { reason } => {
//!             println!("disconnected: {}", reason);
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod casemap;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod flood;
pub mod line;
pub mod names;
pub mod numerics;
pub mod registration;
pub mod session;
pub mod tokens;
pub mod transport;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::client::{Client, EventStream, HEARTBEAT_INTERVAL};
pub use self::config::Config;
pub use self::error::{ConfigError, ProtocolError, SessionError};
pub use self::event::Event;
pub use self::flood::{FloodQueue, FLOOD_TIMER_RESOLUTION};
pub use self::line::{LineCodec, MAX_LINE_LEN};
pub use self::names::{sort_by_privilege, NamesAggregator};
pub use self::numerics::{error_shape, map_error, ErrorReply, ReplyShape};
pub use self::registration::{NickFallback, Phase, Registration};
pub use self::session::{Session, SessionAction};
pub use self::transport::Transport;
