//! Notifications published by the list controller.
//!
//! Every subscriber owns a crossbeam receiver; the bus pushes each event to
//! all live senders in publish order. Receivers that were dropped are pruned
//! on the next publish.

use crossbeam_channel::{unbounded, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    Created {
        list_id: i64,
        category_id: i64,
    },
    Updated {
        list_id: i64,
        category_id: i64,
    },
    Deleted {
        list_id: i64,
        category_id: i64,
    },
    Renamed {
        list_id: i64,
        old_name: String,
        new_name: String,
        category_id: i64,
    },
    /// Name-keyed variants kept for consumers that predate list ids.
    LegacyCreated {
        name: String,
        category_id: i64,
    },
    LegacyUpdated {
        name: String,
        category_id: i64,
    },
    LegacyDeleted {
        name: String,
        category_id: i64,
    },
    ExecutionStarted {
        list_id: i64,
        total_items: usize,
    },
    ExecutionStep {
        /// 1-based.
        step: usize,
        label: String,
    },
    ExecutionCompleted {
        list_id: i64,
    },
    ExecutionCancelled,
    Error(String),
}

impl ListEvent {
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            ListEvent::LegacyCreated { .. }
                | ListEvent::LegacyUpdated { .. }
                | ListEvent::LegacyDeleted { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<ListEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ListEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: ListEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order_to_every_subscriber() {
        let mut bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(ListEvent::ExecutionStarted {
            list_id: 7,
            total_items: 2,
        });
        bus.publish(ListEvent::ExecutionCancelled);

        for rx in [first, second] {
            let received: Vec<_> = rx.try_iter().collect();
            assert_eq!(
                received,
                vec![
                    ListEvent::ExecutionStarted {
                        list_id: 7,
                        total_items: 2
                    },
                    ListEvent::ExecutionCancelled,
                ]
            );
        }
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ListEvent::Error("boom".into()));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().ok(), Some(ListEvent::Error("boom".into())));
    }
}
