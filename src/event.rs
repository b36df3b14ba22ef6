//! Structured events emitted to the presentation layer.
//!
//! One variant per recognized inbound condition, each carrying only the
//! fields relevant to its kind. Events are immutable values owned by the
//! consumer once emitted; emission never blocks protocol processing.
//!
//! For a PRIVMSG the raw [`Event::Message`] is always emitted first,
//! followed by exactly one of [`Event::Action`], [`Event::Public`], or
//! [`Event::Private`].

/// An event produced by the protocol dispatcher.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Event {
    /// The socket is connected; registration is about to start.
    Connected {
        /// Server host from the configuration.
        server: String,
        /// Server port from the configuration.
        port: u16,
    },
    /// Numeric 001: the server accepted registration.
    Registered { server: String, port: u16 },
    /// Numeric 433 renegotiated the nickname.
    NickCollision { old: String, new: String },
    /// Raw PRIVMSG, emitted before public/private/action specialization.
    Message {
        nickname: String,
        /// `user@host` part of the prefix, absent when the prefix has no `!`.
        host: Option<String>,
        target: String,
        text: String,
    },
    /// Channel message addressed to someone other than us.
    Public { nickname: String, text: String },
    /// PRIVMSG addressed to our own nickname.
    Private { nickname: String, text: String },
    /// CTCP ACTION ("emote") carried inside a PRIVMSG.
    Action { nickname: String, text: String },
    /// Server PING answered with PONG.
    Ping { server: String, port: u16 },
    /// Complete NAMES list for a channel (353 replies closed by 366).
    UserList {
        channel: String,
        /// Raw nick-with-prefix entries as accumulated.
        users: Vec<String>,
    },
    /// A user joined a channel.
    UserJoin {
        nickname: String,
        host: Option<String>,
        channel: String,
    },
    /// A user left a channel.
    UserPart {
        nickname: String,
        host: Option<String>,
        channel: String,
        reason: Option<String>,
    },
    /// A user disconnected from the network.
    UserQuit {
        nickname: String,
        host: Option<String>,
        reason: Option<String>,
    },
    /// A user changed nickname.
    NickChange {
        nickname: String,
        host: Option<String>,
        new: String,
    },
    /// We were invited to a channel.
    Invite {
        nickname: String,
        host: Option<String>,
        channel: String,
    },
    /// Numeric 381: operator status confirmed.
    Oper { server: String, port: u16 },
    /// Message of the day, flushed as one event at end-of-MOTD.
    Motd { text: String },
    /// Numeric 004: server identification.
    ServerInfo { hostname: String },
    /// A numeric error reply (the ~40-code table).
    ProtocolError {
        code: u16,
        targets: Vec<String>,
        reason: String,
    },
    /// Heartbeat: uptime in whole heartbeat intervals.
    Tick { uptime: u64 },
    /// The connection ended. Emitted exactly once, for every terminal
    /// condition, as the last event of the session.
    Disconnected {
        /// Human-readable cause ("stopped", "quit", or the I/O error).
        reason: String,
    },
}
