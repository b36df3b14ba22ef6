//! NAMES reply aggregation and privilege classification.
//!
//! Channel membership arrives as one or more 353 replies terminated by a
//! 366. Partial replies for a channel accumulate here until the end
//! marker, at which point the collected list is handed back and the
//! accumulation is cleared.
//!
//! Accumulation and privilege ordering are two distinct steps:
//! accumulation deduplicates raw entries without promising an order,
//! while [`sort_by_privilege`] derives the display order (ops, voiced,
//! normal) from the prefix symbols.

use std::collections::HashMap;

/// Accumulates raw nick-with-prefix entries per channel across
/// consecutive 353 replies.
#[derive(Debug, Default)]
pub struct NamesAggregator {
    channels: HashMap<String, Vec<String>>,
}

impl NamesAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one 353 line into the accumulation.
    ///
    /// The channel name is the text between the `=` separator and the
    /// colon that follows it; the nicks are the whitespace tokens after
    /// that colon. Duplicate raw entries are dropped. Returns the
    /// channel the line applied to, or `None` when the line does not
    /// carry the expected separators.
    pub fn add_names(&mut self, line: &str) -> Option<&str> {
        let (_, rest) = line.split_once('=')?;
        let (channel_part, users_part) = rest.split_once(':')?;
        let channel = channel_part.trim();
        if channel.is_empty() {
            return None;
        }

        let entry = self.channels.entry(channel.to_string()).or_default();
        for nick in users_part.split_whitespace() {
            if !entry.iter().any(|existing| existing == nick) {
                entry.push(nick.to_string());
            }
        }
        self.channels.get_key_value(channel).map(|(k, _)| k.as_str())
    }

    /// Take the accumulated entries for `channel`, clearing them for the
    /// next NAMES cycle. Unknown channels yield an empty list.
    pub fn end_names(&mut self, channel: &str) -> Vec<String> {
        self.channels.remove(channel).unwrap_or_default()
    }

    /// Number of channels currently mid-accumulation.
    #[must_use]
    pub fn pending_channels(&self) -> usize {
        self.channels.len()
    }
}

/// Derive the display order from raw nick-with-prefix entries.
///
/// An entry may carry a `user@host` suffix after `!`; only the nick
/// segment before it is inspected. A segment containing `@` is an
/// operator, one containing `+` is voiced, anything else is normal.
/// Operators sort first, then voiced, then normal; source order is kept
/// within each class. Prefix symbols are stripped from the result.
#[must_use]
pub fn sort_by_privilege(raw: &[String]) -> Vec<String> {
    let mut ops = Vec::new();
    let mut voiced = Vec::new();
    let mut normal = Vec::new();

    for entry in raw {
        let nick = match entry.split_once('!') {
            Some((nick, _)) => nick,
            None => entry.as_str(),
        };
        let display = nick.trim_start_matches(['@', '+']).to_string();
        if nick.contains('@') {
            ops.push(display);
        } else if nick.contains('+') {
            voiced.push(display);
        } else {
            normal.push(display);
        }
    }

    ops.extend(voiced);
    ops.extend(normal);
    ops
}
