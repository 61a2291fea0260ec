//! Last-request-wins bookkeeping
//!
//! A view that re-fetches while an earlier fetch is still in flight must
//! not let the earlier response overwrite the newer one. Each request gets a
//! [`Ticket`]; only the most recent ticket issued for a key is accepted.

use std::collections::HashMap;
use std::hash::Hash;

/// Identifies one request; ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct RequestSequencer<K> {
    next: u64,
    latest: HashMap<K, Ticket>,
}

impl<K> Default for RequestSequencer<K> {
    fn default() -> Self {
        Self {
            next: 1,
            latest: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy + std::fmt::Debug> RequestSequencer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `key`, superseding any outstanding one.
    pub fn issue(&mut self, key: K) -> Ticket {
        let ticket = Ticket(self.next);
        self.next += 1;
        self.latest.insert(key, ticket);
        ticket
    }

    pub fn is_current(&self, key: K, ticket: Ticket) -> bool {
        self.latest.get(&key) == Some(&ticket)
    }

    /// Whether a response carrying `ticket` should be applied.
    ///
    /// Accepting clears the key, so a duplicate delivery is rejected.
    pub fn accept(&mut self, key: K, ticket: Ticket) -> bool {
        if self.is_current(key, ticket) {
            self.latest.remove(&key);
            true
        } else {
            tracing::debug!(?key, ticket = ticket.0, "dropping stale response");
            false
        }
    }

    /// Forget any outstanding request for `key`; its response will be dropped.
    pub fn invalidate(&mut self, key: K) {
        self.latest.remove(&key);
    }

    /// True while a request for `key` has been issued but not accepted.
    pub fn is_pending(&self, key: K) -> bool {
        self.latest.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue("logs");
        let second = seq.issue("logs");
        assert!(second > first);

        assert!(!seq.accept("logs", first));
        assert!(seq.accept("logs", second));
        assert!(!seq.accept("logs", second), "duplicate delivery is dropped");
    }

    #[test]
    fn test_keys_are_independent() {
        let mut seq = RequestSequencer::new();
        let logs = seq.issue("logs");
        let kb = seq.issue("kb");
        let _newer_logs = seq.issue("logs");

        assert!(seq.accept("kb", kb));
        assert!(!seq.accept("logs", logs));
        assert!(seq.is_pending("logs"));
    }

    #[test]
    fn test_invalidate_drops_in_flight() {
        let mut seq = RequestSequencer::new();
        let ticket = seq.issue("rank");
        seq.invalidate("rank");
        assert!(!seq.is_pending("rank"));
        assert!(!seq.accept("rank", ticket));
    }
}
