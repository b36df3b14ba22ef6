//! Registration handshake and nickname fallback.
//!
//! Sans-IO state tracking for the connection lifecycle: it consumes
//! handshake milestones and produces the raw lines to send, without
//! touching the network. The driver applies the lines; tests exercise
//! the transitions directly.
//!
//! Phase order is `Disconnected → Connecting → AwaitingWelcome →
//! Registered`. Greeting lines (`PROTOCTL`, optional `PASS`, `NICK`,
//! `USER`) are produced on connect; numeric 001 completes registration.
//! A 433 reply renegotiates the nickname: the first collision switches
//! to the configured alternate, every later one appends `_`, without
//! bound, until the server accepts one.

use crate::config::Config;

/// Connection lifecycle phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Not yet connected.
    #[default]
    Disconnected,
    /// Socket connect in progress.
    Connecting,
    /// Greeting sent, waiting for numeric 001.
    AwaitingWelcome,
    /// Welcome received; the session is fully registered.
    Registered,
}

/// Outcome of a nickname collision: the rename that was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NickFallback {
    /// Nickname before the switch.
    pub old: String,
    /// Nickname now in use.
    pub new: String,
}

/// Registration state machine.
#[derive(Clone, Debug)]
pub struct Registration {
    nickname: String,
    alternate: String,
    phase: Phase,
    tried_alternate: bool,
}

impl Registration {
    /// Create the machine with the configured nickname pair.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            nickname: config.nickname.clone(),
            alternate: config.alternate.clone(),
            phase: Phase::Disconnected,
            tried_alternate: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The nickname currently claimed with the server.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Mark the socket connect as started.
    pub fn connecting(&mut self) {
        self.phase = Phase::Connecting;
    }

    /// Produce the greeting lines sent immediately after the socket is
    /// up, and advance to [`Phase::AwaitingWelcome`].
    ///
    /// These bypass the flood queue: nothing else can be in flight yet.
    pub fn greeting(&mut self, config: &Config) -> Vec<String> {
        self.phase = Phase::AwaitingWelcome;

        let mut lines = Vec::with_capacity(4);
        // Ask for hostmasks and all status symbols in NAMES replies.
        lines.push("PROTOCTL UHNAMES NAMESX".to_string());
        if let Some(ref password) = config.password {
            lines.push(format!("PASS {}", password));
        }
        lines.push(format!("NICK {}", self.nickname));
        lines.push(format!(
            "USER {} 0 0 :{}",
            config.username, config.realname
        ));
        lines
    }

    /// Numeric 001 arrived: registration is complete.
    pub fn welcome(&mut self) {
        self.phase = Phase::Registered;
    }

    /// Numeric 433 arrived: pick the next nickname in the fallback
    /// chain and report the rename. The caller resends `NICK`.
    pub fn nick_in_use(&mut self) -> NickFallback {
        let old = self.nickname.clone();
        if !self.tried_alternate && self.nickname != self.alternate {
            self.tried_alternate = true;
            self.nickname = self.alternate.clone();
        } else {
            self.tried_alternate = true;
            self.nickname.push('_');
        }
        NickFallback {
            old,
            new: self.nickname.clone(),
        }
    }
}
