//! Reply tokenization.
//!
//! IRC lines are split into whitespace-delimited tokens. The trailing
//! parameter — everything after a lone `:` — is reconstructed by joining
//! the token that starts with `:` with all tokens after it and stripping
//! the leading colon. Prefixed lines begin with a `:sender` token, so
//! callers choose where the trailing search starts; the dispatcher knows
//! which shape applies per message type.

/// Split a line into whitespace-delimited tokens, preserving order.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Reconstruct the trailing parameter from a token slice.
///
/// The first token that begins with `:` starts the trailing text; it and
/// every following token are joined with single spaces, minus the colon.
/// Returns `None` when no token in the slice starts with `:`.
pub fn trailing(tokens: &[&str]) -> Option<String> {
    let start = tokens.iter().position(|t| t.starts_with(':'))?;
    let mut text = tokens[start..].join(" ");
    text.remove(0);
    Some(text)
}

/// Join a token slice into free text, stripping a leading `:` if the
/// first token carries one.
///
/// Unlike [`trailing`] this does not search: the caller has already
/// consumed the fixed parameters and everything left is the payload.
pub fn join_rest(tokens: &[&str]) -> String {
    let mut text = tokens.join(" ");
    if text.starts_with(':') {
        text.remove(0);
    }
    text
}
