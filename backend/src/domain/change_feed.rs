//! Broadcast of row changes to realtime subscribers.
//!
//! Subscribers receive every event and filter to their own owner id. A
//! subscriber that falls behind loses the oldest events; clients treat each
//! event as a hint to re-fetch, so a missed one only delays a refresh.

use shared::{ChangeEvent, ChangeKind};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const CLASSES: &str = "classes";
    pub const STUDENTS: &str = "students";
    pub const STAFF: &str = "staff";
    pub const ATTENDANCE: &str = "attendance";
    pub const SALARY_RECORDS: &str = "salary_records";
    pub const EXPENSES: &str = "expenses";
    pub const EXAM_RESULTS: &str = "exam_results";
    pub const DRIVERS: &str = "drivers";
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, owner_id: &str, table: &str, kind: ChangeKind, row_id: &str) {
        let event = ChangeEvent {
            table: table.to_string(),
            kind,
            row_id: row_id.to_string(),
            owner_id: owner_id.to_string(),
        };
        // No subscribers is not an error
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!("Published {:?} on {} for {} to {} subscriber(s)", kind, table, row_id, receivers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish("owner-1", tables::STUDENTS, ChangeKind::Update, "student::1");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, "students");
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.owner_id, "owner-1");
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::new();
        feed.publish("o", tables::CLASSES, ChangeKind::Insert, "class::1");
    }
}
