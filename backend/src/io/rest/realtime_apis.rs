//! # Realtime Change Feed
//!
//! Server-Sent Events carrying every `ChangeEvent` of the signed-in owner.
//! Clients re-fetch the affected table when an event arrives.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use shared::ChangeEvent;
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tracing::{info, warn};

use super::Owner;
use crate::AppState;

pub const CHANGE_EVENT_NAME: &str = "change";

/// Changes belonging to one owner; other owners' events never leave here
pub fn owner_changes(
    receiver: broadcast::Receiver<ChangeEvent>,
    owner_id: String,
) -> impl Stream<Item = ChangeEvent> {
    BroadcastStream::new(receiver).filter_map(move |message| match message {
        Ok(change) if change.owner_id == owner_id => Some(change),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("Realtime subscriber lagged, skipped {} events", skipped);
            None
        }
    })
}

pub async fn change_stream(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("GET /api/realtime - owner {}", owner_id);

    let stream = owner_changes(state.change_feed.subscribe(), owner_id).filter_map(|change| {
        match Event::default().event(CHANGE_EVENT_NAME).json_data(&change) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!("Dropping unserialisable change event: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change_feed::tables;
    use crate::domain::ChangeFeed;
    use shared::ChangeKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_feed_only_yields_the_callers_changes() {
        let feed = ChangeFeed::new();
        let stream = owner_changes(feed.subscribe(), "school-a".to_string());
        tokio::pin!(stream);

        feed.publish("school-b", tables::STUDENTS, ChangeKind::Insert, "student::b1");
        feed.publish("school-a", tables::CLASSES, ChangeKind::Update, "class::a1");
        feed.publish("school-b", tables::EXPENSES, ChangeKind::Delete, "expense::b2");
        feed.publish("school-a", tables::STUDENTS, ChangeKind::Insert, "student::a2");

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!((first.owner_id.as_str(), first.row_id.as_str()), ("school-a", "class::a1"));
        assert_eq!((second.owner_id.as_str(), second.row_id.as_str()), ("school-a", "student::a2"));

        // Nothing else is queued for this owner
        feed.publish("school-b", tables::STAFF, ChangeKind::Insert, "staff::b3");
        let pending = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(pending.is_err());
    }
}
