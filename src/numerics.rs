//! Numeric error-reply mapping.
//!
//! Servers report failures as three-digit numeric replies. A fixed table
//! maps each recognized code to one of three shapes — no target, one
//! target, or two targets — and the mapper extracts the targets and the
//! human-readable reason from the raw line. Numerics outside the table
//! are not errors; the dispatcher's other handlers see them instead.

use crate::tokens::join_rest;

/// Parameter shape of a recognized numeric error reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyShape {
    /// The whole payload is the reason, e.g. `451 :You have not registered`.
    NoTarget,
    /// One target precedes the reason, e.g. `401 <nick> :No such nick`.
    SingleTarget,
    /// Two targets precede the reason, e.g. `441 <nick> <channel> :...`.
    DoubleTarget,
}

/// A structured numeric error reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReply {
    /// Numeric code (400–502).
    pub code: u16,
    /// Zero, one, or two targets depending on the code's shape.
    pub targets: Vec<String>,
    /// Human-readable reason text.
    pub reason: String,
}

/// Look up the shape of a numeric error code.
///
/// Returns `None` for numerics that are not error replies (including
/// 433, which the dispatcher handles as a nick collision).
pub fn error_shape(code: u16) -> Option<ReplyShape> {
    use ReplyShape::*;
    let shape = match code {
        400 => NoTarget,
        401..=407 => SingleTarget,
        409 => NoTarget,
        411 | 412 => NoTarget,
        413..=415 => SingleTarget,
        421 => SingleTarget,
        422 => NoTarget,
        423 => SingleTarget,
        424 => NoTarget,
        431 => NoTarget,
        432 => SingleTarget,
        436 => SingleTarget,
        441 => DoubleTarget,
        442 => SingleTarget,
        444 => SingleTarget,
        445 | 446 => NoTarget,
        451 => NoTarget,
        461 => SingleTarget,
        462..=465 => NoTarget,
        467 => SingleTarget,
        471..=476 => SingleTarget,
        478 => DoubleTarget,
        481 => NoTarget,
        482 => SingleTarget,
        483 => NoTarget,
        485 => NoTarget,
        491 => NoTarget,
        501 | 502 => NoTarget,
        _ => return None,
    };
    Some(shape)
}

/// Build an [`ErrorReply`] from a recognized numeric line.
///
/// `tokens` is the full token stream of the line, starting with the
/// `:server` prefix. Returns `None` when `code` is not in the table.
pub fn map_error(code: u16, line: &str, tokens: &[&str]) -> Option<ErrorReply> {
    // 400 is reported by servers with wildly varying payloads; it is
    // mapped to a fixed reason.
    if code == 400 {
        return Some(ErrorReply {
            code,
            targets: Vec::new(),
            reason: "Unknown error".to_string(),
        });
    }

    match error_shape(code)? {
        ReplyShape::NoTarget => Some(ErrorReply {
            code,
            targets: Vec::new(),
            reason: no_target_reason(line),
        }),
        ReplyShape::SingleTarget => {
            let (targets, reason) = take_targets(tokens, 1);
            Some(ErrorReply {
                code,
                targets,
                reason,
            })
        }
        ReplyShape::DoubleTarget => {
            let (targets, reason) = take_targets(tokens, 2);
            Some(ErrorReply {
                code,
                targets,
                reason,
            })
        }
    }
}

/// Reason text for no-target replies: everything after the first `:`
/// beyond the leading prefix colon.
fn no_target_reason(line: &str) -> String {
    let tail = line.strip_prefix(':').unwrap_or(line);
    match tail.find(':') {
        Some(idx) => tail[idx + 1..].to_string(),
        None => "Unknown error".to_string(),
    }
}

/// Consume server prefix, code, and the requesting nick, then `count`
/// target tokens; whatever remains (minus a leading `:`) is the reason.
fn take_targets(tokens: &[&str], count: usize) -> (Vec<String>, String) {
    // tokens: [":server", "<code>", "<me>", targets..., reason...]
    let rest = tokens.get(3..).unwrap_or(&[]);
    if rest.len() < count {
        return (Vec::new(), "Unknown error".to_string());
    }
    let targets = rest[..count].iter().map(|t| t.to_string()).collect();
    (targets, join_rest(&rest[count..]))
}
