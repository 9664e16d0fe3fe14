use chrono::Utc;
use dacroq_model::api_v1::{ChangeEvent, ChangeKind, Collection, WaitChangesResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::time::{timeout_at, Instant};

const CHANNEL_CAPACITY: usize = 256;
/// Events kept for clients resuming from a cursor.
const BACKLOG_CAPACITY: usize = 256;

struct Backlog {
    last_seq: u64,
    events: VecDeque<ChangeEvent>,
}

/// In-process fan out of record changes to long-polling clients.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
    backlog: Arc<Mutex<Backlog>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            backlog: Arc::new(Mutex::new(Backlog {
                last_seq: 0,
                events: VecDeque::with_capacity(BACKLOG_CAPACITY),
            })),
        }
    }
}

impl ChangeFeed {
    fn backlog(&self) -> MutexGuard<'_, Backlog> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish<I: ToString>(&self, collection: Collection, id: I, kind: ChangeKind) {
        // Sequence numbers are handed out and sent under the lock so that
        // subscribers see them in order.
        let mut backlog = self.backlog();
        backlog.last_seq += 1;
        let event = ChangeEvent {
            seq: backlog.last_seq,
            collection,
            id: id.to_string(),
            kind,
            time: Utc::now(),
        };
        if backlog.events.len() == BACKLOG_CAPACITY {
            backlog.events.pop_front();
        }
        backlog.events.push_back(event.clone());
        // Nobody listening is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes and returns the retained events after `since` in one step,
    /// so nothing published in between is missed or seen twice. Also returns
    /// the current cursor.
    fn subscribe_since(
        &self,
        since: Option<u64>,
        collection: Option<Collection>,
    ) -> (broadcast::Receiver<ChangeEvent>, Vec<ChangeEvent>, u64) {
        let backlog = self.backlog();
        let receiver = self.sender.subscribe();
        let cursor = backlog.last_seq;
        // A cursor from before a restart is ahead of ours
        let since = match since {
            Some(since) if since <= cursor => since,
            _ => return (receiver, Vec::new(), cursor),
        };
        if let Some(oldest) = backlog.events.front() {
            if oldest.seq > since + 1 {
                log::debug!(
                    "Change cursor {} is older than the backlog, {} events dropped",
                    since,
                    oldest.seq - since - 1
                );
            }
        }
        let missed = backlog
            .events
            .iter()
            .filter(|event| event.seq > since && matches(event, collection))
            .cloned()
            .collect();
        (receiver, missed, cursor)
    }

    /// Long poll. Retained events after `since` are returned straight away,
    /// otherwise waits up to `wait` for the next matching change.
    pub async fn wait(
        &self,
        since: Option<u64>,
        collection: Option<Collection>,
        wait: Duration,
    ) -> WaitChangesResponse {
        let (receiver, missed, cursor) = self.subscribe_since(since, collection);
        let events = if missed.is_empty() {
            wait_for_changes(receiver, collection, wait).await
        } else {
            missed
        };
        let cursor = events.last().map_or(cursor, |event| event.seq.max(cursor));
        WaitChangesResponse { events, cursor }
    }
}

fn matches(event: &ChangeEvent, collection: Option<Collection>) -> bool {
    collection.map_or(true, |c| c == event.collection)
}

/// Waits for the first event matching `collection`, then returns it together
/// with any further matching events already queued. Returns an empty list if
/// nothing arrives before `wait` elapses.
async fn wait_for_changes(
    mut receiver: broadcast::Receiver<ChangeEvent>,
    collection: Option<Collection>,
    wait: Duration,
) -> Vec<ChangeEvent> {
    let deadline = Instant::now() + wait;
    let mut events = Vec::new();
    loop {
        match timeout_at(deadline, receiver.recv()).await {
            Err(_) => return events,
            Ok(Ok(event)) => {
                if matches(&event, collection) {
                    events.push(event);
                    break;
                }
            }
            Ok(Err(RecvError::Lagged(skipped))) => {
                log::warn!("Change feed receiver lagged, skipped {} events", skipped);
            }
            Ok(Err(RecvError::Closed)) => return events,
        }
    }
    loop {
        match receiver.try_recv() {
            Ok(event) => {
                if matches(&event, collection) {
                    events.push(event);
                }
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_only_matching_collection() {
        let feed = ChangeFeed::default();
        let receiver = feed.sender.subscribe();
        feed.publish(Collection::Posts, 1, ChangeKind::Created);
        feed.publish(Collection::Tests, 7, ChangeKind::Updated);
        feed.publish(Collection::Tests, 8, ChangeKind::Deleted);
        let events =
            wait_for_changes(receiver, Some(Collection::Tests), Duration::from_secs(1)).await;
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
    }

    #[tokio::test]
    async fn times_out_with_no_events() {
        let feed = ChangeFeed::default();
        let receiver = feed.sender.subscribe();
        feed.publish(Collection::Docs, "intro", ChangeKind::Updated);
        let events =
            wait_for_changes(receiver, Some(Collection::Users), Duration::from_millis(50)).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn unfiltered_wait_wakes_on_publish() {
        let feed = ChangeFeed::default();
        let receiver = feed.sender.subscribe();
        let publisher = feed.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            publisher.publish(Collection::System, "maintenance", ChangeKind::Updated);
        });
        let events = wait_for_changes(receiver, None, Duration::from_secs(5)).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].collection, Collection::System);
    }

    #[tokio::test]
    async fn events_between_polls_are_delivered() {
        let feed = ChangeFeed::default();
        feed.publish(Collection::Tests, 1, ChangeKind::Created);
        let first = feed
            .wait(Some(0), Some(Collection::Tests), Duration::from_millis(50))
            .await;
        assert_eq!(first.events.len(), 1);
        assert_eq!(first.cursor, 1);

        // Published while no request is open
        feed.publish(Collection::Tests, 2, ChangeKind::Updated);
        feed.publish(Collection::Posts, 9, ChangeKind::Created);
        feed.publish(Collection::Tests, 3, ChangeKind::Updated);

        let second = feed
            .wait(
                Some(first.cursor),
                Some(Collection::Tests),
                Duration::from_millis(50),
            )
            .await;
        let ids: Vec<_> = second.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(second.cursor, 4);

        let third = feed
            .wait(
                Some(second.cursor),
                Some(Collection::Tests),
                Duration::from_millis(50),
            )
            .await;
        assert!(third.events.is_empty());
        assert_eq!(third.cursor, 4);
    }

    #[tokio::test]
    async fn cursor_ahead_of_feed_waits_for_new_events() {
        let feed = ChangeFeed::default();
        feed.publish(Collection::Docs, "intro", ChangeKind::Updated);
        let response = feed
            .wait(Some(500), None, Duration::from_millis(50))
            .await;
        assert!(response.events.is_empty());
        assert_eq!(response.cursor, 1);
    }

    #[test]
    fn backlog_is_bounded() {
        let feed = ChangeFeed::default();
        for id in 0..BACKLOG_CAPACITY + 10 {
            feed.publish(Collection::Tests, id, ChangeKind::Created);
        }
        let backlog = feed.backlog();
        assert_eq!(backlog.events.len(), BACKLOG_CAPACITY);
        assert_eq!(backlog.events.front().map(|e| e.seq), Some(11));
        assert_eq!(backlog.last_seq, (BACKLOG_CAPACITY + 10) as u64);
    }
}
