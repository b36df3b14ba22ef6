//! Flood-controlled outbound queue over a virtual clock.
//!
//! Outbound rate limiting avoids server-side throttling for sending too
//! fast. Timing is virtual: the clock only advances when the flood timer
//! ticks, by a fixed resolution each time, which makes the queue fully
//! deterministic and testable without wall-clock sleeps.
//!
//! A line may leave the queue only when `last_send + send_rate <= clock`
//! (or when nothing has ever been sent), and at most one line per tick.
//! Every actual transmission — queued or direct — stamps `last_send`.

use std::collections::VecDeque;

/// Virtual seconds added to the clock per flood-timer tick.
pub const FLOOD_TIMER_RESOLUTION: f64 = 0.1;

/// FIFO queue of raw outbound lines gated by the virtual clock.
#[derive(Debug)]
pub struct FloodQueue {
    enabled: bool,
    send_rate: f64,
    resolution: f64,
    clock: f64,
    last_send: f64,
    pending: VecDeque<String>,
}

impl FloodQueue {
    /// Create a queue. `send_rate` is in virtual seconds; when `enabled`
    /// is false every offered line passes straight through.
    #[must_use]
    pub fn new(enabled: bool, send_rate: f64) -> Self {
        Self {
            enabled,
            send_rate,
            resolution: FLOOD_TIMER_RESOLUTION,
            clock: 0.0,
            last_send: 0.0,
            pending: VecDeque::new(),
        }
    }

    /// Offer a line for transmission.
    ///
    /// Returns `Some(line)` when the caller must write it now (flood
    /// protection disabled, or the rate window is open); the caller then
    /// calls [`mark_sent`](Self::mark_sent). Returns `None` when the
    /// line was queued for a later tick.
    pub fn offer(&mut self, line: String) -> Option<String> {
        if !self.enabled {
            return Some(line);
        }
        if self.last_send + self.send_rate <= self.clock {
            Some(line)
        } else {
            self.pending.push_back(line);
            None
        }
    }

    /// Advance the virtual clock by one resolution step and release at
    /// most one queued line if the rate window is open.
    ///
    /// The first-ever transmission is released immediately: with no send
    /// recorded yet there is nothing to pace against.
    pub fn tick(&mut self) -> Option<String> {
        self.clock += self.resolution;
        if !self.enabled {
            return None;
        }
        if self.last_send == 0.0 || self.last_send + self.send_rate <= self.clock {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Record that a line was actually written to the socket.
    pub fn mark_sent(&mut self) {
        self.last_send = self.clock;
    }

    /// Discard every queued line. Used on terminal write errors; queued
    /// lines are never retried.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of lines awaiting flood clearance.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Current virtual clock value.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }
}
