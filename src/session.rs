//! Sans-IO protocol dispatcher.
//!
//! [`Session`] consumes decoded lines and produces actions — events to
//! emit and raw lines to send — without performing any I/O. The async
//! driver in [`client`](crate::client) applies the actions; tests feed
//! lines directly and assert on the actions.
//!
//! Dispatch is first-match-wins, evaluated in a fixed priority order:
//! `PING` → 001 → 433 → `PRIVMSG` → 366 → 353 → `PART` → `JOIN` →
//! `QUIT` → `NICK` → `INVITE` → 381 → 375/372/376 → 004 → the numeric
//! error table. Anything else is silently dropped.

use tracing::trace;

use crate::casemap::irc_eq;
use crate::config::Config;
use crate::event::Event;
use crate::names::NamesAggregator;
use crate::numerics::map_error;
use crate::registration::{Phase, Registration};
use crate::tokens::{join_rest, tokenize, trailing};

/// CTCP delimiter byte as it appears in PRIVMSG payloads.
const CTCP_MARKER: char = '\u{1}';

/// An effect the driver must apply, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    /// Publish this event to the consumer.
    Emit(Event),
    /// Write this raw line to the socket now, bypassing the flood queue
    /// (registration greeting, `PONG`, `NICK` renegotiation).
    SendNow(String),
}

/// Protocol state for one connection: registration progress, the NAMES
/// accumulation table, and the MOTD buffer.
#[derive(Debug)]
pub struct Session {
    config: Config,
    registration: Registration,
    names: NamesAggregator,
    motd: Vec<String>,
    server_hostname: Option<String>,
    server_software: Option<String>,
}

impl Session {
    /// Create the dispatcher for a validated configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let registration = Registration::new(&config);
        Self {
            config,
            registration,
            names: NamesAggregator::new(),
            motd: Vec::new(),
            server_hostname: None,
            server_software: None,
        }
    }

    /// The nickname currently claimed with the server.
    #[must_use]
    pub fn nickname(&self) -> &str {
        self.registration.nickname()
    }

    /// Current registration phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.registration.phase()
    }

    /// Server software string from numeric 004, once seen.
    #[must_use]
    pub fn server_software(&self) -> Option<&str> {
        self.server_software.as_deref()
    }

    /// The socket is up: announce the connection and produce the
    /// registration greeting.
    pub fn on_connected(&mut self) -> Vec<SessionAction> {
        self.registration.connecting();
        let mut actions = vec![SessionAction::Emit(Event::Connected {
            server: self.config.server.clone(),
            port: self.config.port,
        })];
        actions.extend(
            self.registration
                .greeting(&self.config)
                .into_iter()
                .map(SessionAction::SendNow),
        );
        actions
    }

    /// Dispatch one decoded line.
    pub fn handle_line(&mut self, line: &str) -> Vec<SessionAction> {
        let tokens = tokenize(line);
        let Some(first) = tokens.first() else {
            return Vec::new();
        };

        // PING carries the command as the very first token; everything
        // else routes on the token after the prefix.
        if first.eq_ignore_ascii_case("ping") {
            let mut actions = Vec::new();
            if let Some(token) = tokens.get(1) {
                actions.push(SessionAction::SendNow(format!("PONG {}", token)));
            }
            actions.push(SessionAction::Emit(Event::Ping {
                server: self.config.server.clone(),
                port: self.config.port,
            }));
            return actions;
        }

        let Some(command) = tokens.get(1).copied() else {
            return Vec::new();
        };

        match command {
            "001" => {
                self.registration.welcome();
                vec![SessionAction::Emit(Event::Registered {
                    server: self.config.server.clone(),
                    port: self.config.port,
                })]
            }
            "433" => {
                let fallback = self.registration.nick_in_use();
                vec![
                    SessionAction::SendNow(format!("NICK {}", fallback.new)),
                    SessionAction::Emit(Event::NickCollision {
                        old: fallback.old,
                        new: fallback.new,
                    }),
                ]
            }
            _ if command.eq_ignore_ascii_case("privmsg") => self.handle_privmsg(&tokens),
            "366" => {
                let Some(channel) = tokens.get(3) else {
                    return Vec::new();
                };
                let users = self.names.end_names(channel);
                vec![SessionAction::Emit(Event::UserList {
                    channel: channel.to_string(),
                    users,
                })]
            }
            "353" => {
                if self.names.add_names(line).is_none() {
                    trace!(line, "unparseable NAMES reply dropped");
                }
                Vec::new()
            }
            _ if command.eq_ignore_ascii_case("part") => {
                let (nickname, host) = split_prefix(tokens[0]);
                let Some(channel) = tokens.get(2) else {
                    return Vec::new();
                };
                vec![SessionAction::Emit(Event::UserPart {
                    nickname,
                    host,
                    channel: channel.trim_start_matches(':').to_string(),
                    reason: trailing(&tokens[3..]),
                })]
            }
            _ if command.eq_ignore_ascii_case("join") => {
                let (nickname, host) = split_prefix(tokens[0]);
                let Some(channel) = tokens.get(2) else {
                    return Vec::new();
                };
                vec![SessionAction::Emit(Event::UserJoin {
                    nickname,
                    host,
                    channel: channel.trim_start_matches(':').to_string(),
                })]
            }
            _ if command.eq_ignore_ascii_case("quit") => {
                let (nickname, host) = split_prefix(tokens[0]);
                vec![SessionAction::Emit(Event::UserQuit {
                    nickname,
                    host,
                    reason: trailing(&tokens[2..]),
                })]
            }
            _ if command.eq_ignore_ascii_case("nick") => {
                let (nickname, host) = split_prefix(tokens[0]);
                let Some(new) = tokens.get(2) else {
                    return Vec::new();
                };
                vec![SessionAction::Emit(Event::NickChange {
                    nickname,
                    host,
                    new: new.trim_start_matches(':').to_string(),
                })]
            }
            _ if command.eq_ignore_ascii_case("invite") => {
                let (nickname, host) = split_prefix(tokens[0]);
                let Some(channel) = tokens.get(3) else {
                    return Vec::new();
                };
                vec![SessionAction::Emit(Event::Invite {
                    nickname,
                    host,
                    channel: channel.trim_start_matches(':').to_string(),
                })]
            }
            "381" => vec![SessionAction::Emit(Event::Oper {
                server: self.config.server.clone(),
                port: self.config.port,
            })],
            "375" => {
                self.motd.clear();
                Vec::new()
            }
            "372" => {
                self.motd.push(trailing(&tokens[2..]).unwrap_or_default());
                Vec::new()
            }
            "376" => {
                let text = self.motd.join("\n");
                self.motd.clear();
                vec![SessionAction::Emit(Event::Motd { text })]
            }
            "004" => self.handle_myinfo(&tokens),
            _ => {
                if let Ok(code) = command.parse::<u16>() {
                    if let Some(reply) = map_error(code, line, &tokens) {
                        return vec![SessionAction::Emit(Event::ProtocolError {
                            code: reply.code,
                            targets: reply.targets,
                            reason: reply.reason,
                        })];
                    }
                }
                trace!(line, "unhandled line dropped");
                Vec::new()
            }
        }
    }

    fn handle_privmsg(&mut self, tokens: &[&str]) -> Vec<SessionAction> {
        let (nickname, host) = split_prefix(tokens[0]);
        let Some(target) = tokens.get(2) else {
            return Vec::new();
        };
        let text = join_rest(&tokens[3..]);

        // The raw message event always fires first; specialization
        // follows with exactly one of action, public, or private.
        let mut actions = vec![SessionAction::Emit(Event::Message {
            nickname: nickname.clone(),
            host,
            target: target.to_string(),
            text: text.clone(),
        })];

        if let Some(emote) = strip_ctcp_action(&text) {
            actions.push(SessionAction::Emit(Event::Action {
                nickname,
                text: emote,
            }));
        } else if irc_eq(target, self.registration.nickname()) {
            actions.push(SessionAction::Emit(Event::Private { nickname, text }));
        } else {
            actions.push(SessionAction::Emit(Event::Public { nickname, text }));
        }
        actions
    }

    fn handle_myinfo(&mut self, tokens: &[&str]) -> Vec<SessionAction> {
        // ":server 004 me <servername> <version> <umodes> <cmodes>"
        let Some(hostname) = tokens.get(3) else {
            return Vec::new();
        };
        if self.server_hostname.is_some() {
            return Vec::new();
        }
        self.server_hostname = Some(hostname.to_string());
        self.server_software = tokens.get(4).map(|s| s.to_string());
        vec![SessionAction::Emit(Event::ServerInfo {
            hostname: hostname.to_string(),
        })]
    }
}

/// Split a `:nick!user@host` prefix token into the nickname and the
/// part after `!`, which is absent for server prefixes.
fn split_prefix(token: &str) -> (String, Option<String>) {
    let prefix = token.trim_start_matches(':');
    match prefix.split_once('!') {
        Some((nick, host)) => (nick.to_string(), Some(host.to_string())),
        None => (prefix.to_string(), None),
    }
}

/// Detect a CTCP ACTION payload; returns the emote text with the marker
/// and trailing delimiter stripped and whitespace trimmed.
fn strip_ctcp_action(text: &str) -> Option<String> {
    if !text.contains("\u{1}ACTION") {
        return None;
    }
    let stripped = text.replace("\u{1}ACTION", "");
    let stripped = stripped
        .strip_suffix(CTCP_MARKER)
        .unwrap_or(&stripped)
        .trim();
    Some(stripped.to_string())
}
