//! Session list bucketing for the Upcoming / Active / Closed tabs.
//!
//! Bucketing is driven by `status` alone; the session date is never consulted.
//! Sessions whose status the client does not recognise land in no bucket and
//! are only counted.

use shared::{domain::SessionStatus, protocol::SessionRecord};

use crate::reconcile::{FetchTicket, Latest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Upcoming,
    Active,
    Closed,
}

impl Bucket {
    pub fn for_status(status: &SessionStatus) -> Option<Self> {
        match status {
            SessionStatus::Upcoming => Some(Bucket::Upcoming),
            SessionStatus::Active => Some(Bucket::Active),
            SessionStatus::Completed | SessionStatus::Cancelled => Some(Bucket::Closed),
            SessionStatus::Unknown(_) => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::Upcoming => "Upcoming",
            Bucket::Active => "Active",
            Bucket::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionBuckets {
    pub upcoming: Vec<SessionRecord>,
    pub active: Vec<SessionRecord>,
    pub closed: Vec<SessionRecord>,
    pub unclassified: usize,
}

impl SessionBuckets {
    pub fn bucket(&self, bucket: Bucket) -> &[SessionRecord] {
        match bucket {
            Bucket::Upcoming => &self.upcoming,
            Bucket::Active => &self.active,
            Bucket::Closed => &self.closed,
        }
    }

    pub fn len(&self) -> usize {
        self.upcoming.len() + self.active.len() + self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions sessions into display buckets, preserving input order.
pub fn categorize(sessions: &[SessionRecord]) -> SessionBuckets {
    let mut buckets = SessionBuckets::default();
    for session in sessions {
        match Bucket::for_status(&session.status) {
            Some(Bucket::Upcoming) => buckets.upcoming.push(session.clone()),
            Some(Bucket::Active) => buckets.active.push(session.clone()),
            Some(Bucket::Closed) => buckets.closed.push(session.clone()),
            None => buckets.unclassified += 1,
        }
    }
    buckets
}

/// Session list screen state: the latest accepted fetch and its buckets.
#[derive(Debug, Default)]
pub struct SessionBoard {
    sessions: Latest<Vec<SessionRecord>>,
    buckets: SessionBuckets,
}

impl SessionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&mut self) -> FetchTicket {
        self.sessions.begin()
    }

    /// Applies a finished fetch. Stale results leave the board untouched.
    pub fn apply(&mut self, ticket: FetchTicket, sessions: Vec<SessionRecord>) -> bool {
        let buckets = categorize(&sessions);
        if !self.sessions.complete(ticket, sessions) {
            return false;
        }
        self.buckets = buckets;
        true
    }

    pub fn buckets(&self) -> &SessionBuckets {
        &self.buckets
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shared::domain::SessionId;

    use super::*;

    fn session(id: i64, date: (i32, u32, u32), status: &str) -> SessionRecord {
        SessionRecord {
            id: SessionId(id),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("date"),
            start_time: None,
            end_time: None,
            status: SessionStatus::from(status.to_string()),
            participants: Vec::new(),
        }
    }

    #[test]
    fn completed_is_closed_regardless_of_date() {
        let sessions = vec![
            session(1, (2020, 1, 1), "COMPLETED"),
            session(2, (2099, 12, 31), "COMPLETED"),
        ];
        let buckets = categorize(&sessions);
        assert_eq!(buckets.closed.len(), 2);
        assert!(buckets.upcoming.is_empty());
        assert!(buckets.active.is_empty());
    }

    #[test]
    fn partitions_by_status_and_preserves_order() {
        let sessions = vec![
            session(1, (2025, 5, 12), "UPCOMING"),
            session(2, (2025, 5, 12), "ACTIVE"),
            session(3, (2025, 5, 12), "CANCELLED"),
            session(4, (2025, 5, 13), "scheduled"),
            session(5, (2025, 5, 13), "on-hold"),
        ];
        let buckets = categorize(&sessions);
        let upcoming: Vec<_> = buckets.upcoming.iter().map(|s| s.id).collect();
        assert_eq!(upcoming, vec![SessionId(1), SessionId(4)]);
        assert_eq!(buckets.bucket(Bucket::Active)[0].id, SessionId(2));
        assert_eq!(buckets.bucket(Bucket::Closed)[0].id, SessionId(3));
        assert_eq!(buckets.unclassified, 1);
        assert_eq!(buckets.len(), 4);
    }

    #[test]
    fn missing_or_null_status_is_unclassified() {
        let sessions: Vec<SessionRecord> = serde_json::from_value(serde_json::json!([
            { "sessionId": 1, "sessionDate": "2025-05-12", "status": "UPCOMING" },
            { "sessionId": 2, "sessionDate": "2025-05-13" },
            { "sessionId": 3, "sessionDate": "2025-05-14", "status": null }
        ]))
        .expect("deserialize");
        let buckets = categorize(&sessions);
        assert_eq!(buckets.upcoming.len(), 1);
        assert_eq!(buckets.unclassified, 2);
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn board_ignores_stale_refresh() {
        let mut board = SessionBoard::new();
        let slow = board.begin_refresh();
        let fast = board.begin_refresh();

        assert!(board.apply(fast, vec![session(7, (2025, 6, 1), "ACTIVE")]));
        assert!(!board.apply(slow, vec![session(8, (2025, 6, 1), "UPCOMING")]));
        assert_eq!(board.buckets().active.len(), 1);
        assert!(board.buckets().upcoming.is_empty());
    }
}
