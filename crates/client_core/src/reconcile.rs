//! Last-writer-wins guard for refresh fetches.
//!
//! Refresh-on-focus and polling may overlap with each other and with an
//! in-flight booking. Every fetch takes a ticket before it starts; its result
//! is applied only if no newer fetch has been issued in the meantime.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct Latest<T> {
    issued: u64,
    applied: u64,
    value: Option<T>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            applied: 0,
            value: None,
        }
    }
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Stores `value` if `ticket` belongs to the newest issued fetch.
    /// Returns whether the value was applied.
    pub fn complete(&mut self, ticket: FetchTicket, value: T) -> bool {
        if ticket.0 != self.issued || ticket.0 <= self.applied {
            debug!(
                ticket = ticket.0,
                issued = self.issued,
                applied = self.applied,
                "reconcile: discarding stale fetch result"
            );
            return false;
        }
        self.applied = ticket.0;
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn applied_sequence(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_fetch_finishing_last_is_discarded() {
        let mut latest = Latest::new();
        let first = latest.begin();
        let second = latest.begin();

        assert!(latest.complete(second, "fresh"));
        assert!(!latest.complete(first, "stale"));
        assert_eq!(latest.get(), Some(&"fresh"));
        assert_eq!(latest.applied_sequence(), second.sequence());
    }

    #[test]
    fn result_is_dropped_once_a_newer_fetch_is_issued() {
        let mut latest = Latest::new();
        let first = latest.begin();
        let _second = latest.begin();

        assert!(!latest.is_current(first));
        assert!(!latest.complete(first, 1));
        assert_eq!(latest.get(), None);
    }

    #[test]
    fn ticket_cannot_be_applied_twice() {
        let mut latest = Latest::new();
        let ticket = latest.begin();
        assert!(latest.complete(ticket, 1));
        assert!(!latest.complete(ticket, 2));
        assert_eq!(latest.get(), Some(&1));
    }
}
