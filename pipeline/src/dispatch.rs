//! Outbound alert notification queue.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::VecDeque;

use log::{info, warn};

use crate::monitor::AlertEpisode;
use crate::traits::NotificationTransport;

/// Send attempts per queued notification before it is dropped.
pub const MAX_SEND_ATTEMPTS: u32 = 2;

/// Topics the mobile host subscribes to.
pub const TOPIC_ALERT_DATA: &str = "topic/msgData";
pub const TOPIC_ALERT_IMAGE: &str = "topic/msgImage";
pub const TOPIC_OVERVIEW: &str = "topic/grid";

struct QueuedNotification {
    topic: &'static str,
    payload: Vec<u8>,
    attempts: u32,
}

/// FIFO queue decoupling alert production from the transport. One head
/// item is attempted per flush; an item leaves the queue exactly when it
/// was sent successfully or its attempt counter reached the cap.
#[derive(Default)]
pub struct AlertDispatcher {
    queue: VecDeque<QueuedNotification>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues both payloads for one episode: the data message first, then
    /// the annotated snapshot.
    pub fn enqueue(&mut self, episode: &AlertEpisode, image: Vec<u8>) {
        let message = format!("{}/{}", episode.object_id, episode.triggered_at);
        self.queue.push_back(QueuedNotification {
            topic: TOPIC_ALERT_DATA,
            payload: message.into_bytes(),
            attempts: 0,
        });
        self.queue.push_back(QueuedNotification {
            topic: TOPIC_ALERT_IMAGE,
            payload: image,
            attempts: 0,
        });
    }

    /// Attempts delivery of the queue head. Call once per processing
    /// cycle; the queue drains over successive cycles. Items whose attempt
    /// counter already sits at the cap are discarded without another send.
    pub fn flush(&mut self, transport: &dyn NotificationTransport) {
        let Some(head) = self.queue.front_mut() else {
            return;
        };

        if head.attempts >= MAX_SEND_ATTEMPTS {
            warn!(
                "discarding {} notification with exhausted attempts",
                head.topic
            );
            self.queue.pop_front();
            return;
        }

        match transport.send(head.topic, &head.payload) {
            Ok(()) => {
                info!("alert notification sent on {}", head.topic);
                self.queue.pop_front();
            }
            Err(err) => {
                head.attempts += 1;
                warn!(
                    "alert notification on {} failed (attempt {}/{}): {err}",
                    head.topic, head.attempts, MAX_SEND_ATTEMPTS
                );
                if head.attempts == MAX_SEND_ATTEMPTS {
                    warn!("giving up on {} notification", head.topic);
                    self.queue.pop_front();
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::cell::RefCell;
    use std::time::Instant;

    /// Transport double scripted with per-call outcomes; records every
    /// attempted send.
    struct ScriptedTransport {
        outcomes: RefCell<VecDeque<Result<(), TransportError>>>,
        sent: RefCell<Vec<(String, Vec<u8>)>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<(), TransportError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn attempts(&self) -> Vec<(String, Vec<u8>)> {
            self.sent.borrow().clone()
        }
    }

    impl NotificationTransport for ScriptedTransport {
        fn send(&self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
            self.sent
                .borrow_mut()
                .push((topic.to_string(), payload.to_vec()));
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    fn episode(id: u64) -> AlertEpisode {
        AlertEpisode {
            object_id: id,
            entered_at: Instant::now(),
            triggered_at: "2026-08-06 10:15:00".to_string(),
        }
    }

    #[test]
    fn enqueue_orders_data_before_image() {
        let mut dispatcher = AlertDispatcher::new();
        dispatcher.enqueue(&episode(5), b"jpeg".to_vec());
        let transport = ScriptedTransport::new(vec![]);

        dispatcher.flush(&transport);
        dispatcher.flush(&transport);

        let sent = transport.attempts();
        assert_eq!(sent[0].0, TOPIC_ALERT_DATA);
        assert_eq!(sent[0].1, b"5/2026-08-06 10:15:00".to_vec());
        assert_eq!(sent[1].0, TOPIC_ALERT_IMAGE);
        assert_eq!(sent[1].1, b"jpeg".to_vec());
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn one_item_per_flush() {
        let mut dispatcher = AlertDispatcher::new();
        dispatcher.enqueue(&episode(1), Vec::new());
        let transport = ScriptedTransport::new(vec![]);

        dispatcher.flush(&transport);
        assert_eq!(transport.attempts().len(), 1);
        assert_eq!(dispatcher.pending(), 1);
    }

    #[test]
    fn item_is_dropped_after_the_second_failure() {
        let mut dispatcher = AlertDispatcher::new();
        dispatcher.enqueue(&episode(1), Vec::new());
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Unreachable("refused".into())),
            Err(TransportError::Unreachable("refused".into())),
        ]);

        dispatcher.flush(&transport);
        assert_eq!(dispatcher.pending(), 2);
        dispatcher.flush(&transport);
        // Data message dropped after the second failure; image is next.
        assert_eq!(dispatcher.pending(), 1);
        dispatcher.flush(&transport);
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(transport.attempts().len(), 3);
    }

    #[test]
    fn failure_then_success_keeps_fifo_order() {
        let mut dispatcher = AlertDispatcher::new();
        dispatcher.enqueue(&episode(1), b"one".to_vec());
        dispatcher.enqueue(&episode(2), b"two".to_vec());
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::InvalidAddress("bad host".into())),
        ]);

        for _ in 0..5 {
            dispatcher.flush(&transport);
        }

        let topics: Vec<String> = transport.attempts().iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            topics,
            vec![
                TOPIC_ALERT_DATA,
                TOPIC_ALERT_DATA,
                TOPIC_ALERT_IMAGE,
                TOPIC_ALERT_DATA,
                TOPIC_ALERT_IMAGE,
            ]
        );
        assert_eq!(dispatcher.pending(), 0);
    }
}
