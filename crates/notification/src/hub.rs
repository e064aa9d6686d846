use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::{Error, Notification};

type Handler = Arc<dyn Fn(Notification) + Send + Sync>;

struct Slot {
    generation: u64,
    handler: Handler,
}

#[derive(Default)]
struct State {
    next_generation: u64,
    slot: Option<Slot>,
}

/// Single-slot publish/subscribe transport between notification producers
/// and the one inbox that renders them.
///
/// Delivery is synchronous on the publisher's thread, in publish order, and
/// at most once: with nobody subscribed a notification is dropped for good.
/// The hub never stores notifications.
#[derive(Clone, Default)]
pub struct Hub {
    state: Arc<Mutex<State>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a handler received the notification and returned
    /// normally.
    pub fn publish(&self, notification: Notification) -> bool {
        // Cloned out so the handler runs unlocked and may publish again.
        let handler = lock(&self.state)
            .slot
            .as_ref()
            .map(|slot| slot.handler.clone());

        let Some(handler) = handler else {
            tracing::debug!(id = %notification.id, "notification_dropped");
            return false;
        };

        let id = notification.id.clone();
        match catch_unwind(AssertUnwindSafe(|| handler(notification))) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(id = %id, panic = %panic_message(e.as_ref()), "notification_handler_panicked");
                false
            }
        }
    }

    /// Installs `handler` as the delivery target, replacing any previous one.
    pub fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);

        if let Some(previous) = &state.slot {
            tracing::warn!(
                generation = previous.generation,
                "notification_handler_replaced"
            );
        }

        self.install(&mut state, Arc::new(handler))
    }

    /// Like [`Hub::subscribe`], but refuses to replace an existing handler.
    pub fn try_subscribe<F>(&self, handler: F) -> Result<Unsubscribe, Error>
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);

        if state.slot.is_some() {
            return Err(Error::SlotOccupied);
        }

        Ok(self.install(&mut state, Arc::new(handler)))
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.state).slot.is_some()
    }

    fn install(&self, state: &mut State, handler: Handler) -> Unsubscribe {
        state.next_generation += 1;
        let generation = state.next_generation;
        state.slot = Some(Slot {
            generation,
            handler,
        });

        Unsubscribe {
            state: Arc::downgrade(&self.state),
            generation,
        }
    }
}

/// Detaches the handler it was returned for. Calling it more than once, or
/// after another handler took the slot, does nothing.
#[must_use = "keep this to detach the handler later"]
pub struct Unsubscribe {
    state: Weak<Mutex<State>>,
    generation: u64,
}

impl Unsubscribe {
    pub fn unsubscribe(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let removed = {
            let mut state = lock(&state);
            let owned = state
                .slot
                .as_ref()
                .is_some_and(|slot| slot.generation == self.generation);

            if owned {
                state.slot.take()
            } else {
                None
            }
        };

        // Dropped here, outside the lock, in case the handler owns resources
        // whose teardown publishes.
        drop(removed);
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NotificationKind;

    fn notification(id: &str) -> Notification {
        Notification::builder()
            .id(id)
            .kind(NotificationKind::Reminder)
            .title("Take pill")
            .message("...")
            .date("2024-01-01T08:00:00")
            .build()
            .unwrap()
    }

    fn collector(hub: &Hub) -> (Arc<Mutex<Vec<String>>>, Unsubscribe) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let unsubscribe = hub.subscribe(move |n| sink.lock().unwrap().push(n.id));
        (seen, unsubscribe)
    }

    #[test]
    fn test_delivers_in_publish_order() {
        let hub = Hub::new();
        let (seen, _unsubscribe) = collector(&hub);

        let ids: Vec<String> = (0..100).map(|i| format!("n{}", i)).collect();
        for id in &ids {
            assert!(hub.publish(notification(id)));
        }

        assert_eq!(*seen.lock().unwrap(), ids);
    }

    #[test]
    fn test_publish_without_subscriber_is_dropped() {
        let hub = Hub::new();
        assert!(!hub.publish(notification("early")));

        let (seen, _unsubscribe) = collector(&hub);
        assert!(seen.lock().unwrap().is_empty());

        hub.publish(notification("late"));
        assert_eq!(*seen.lock().unwrap(), vec!["late".to_string()]);
    }

    #[test]
    fn test_second_subscribe_replaces_first() {
        let hub = Hub::new();
        let (first, first_unsubscribe) = collector(&hub);
        let (second, _second_unsubscribe) = collector(&hub);

        hub.publish(notification("a"));
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(*second.lock().unwrap(), vec!["a".to_string()]);

        // The stale guard must not detach the current handler.
        first_unsubscribe.unsubscribe();
        assert!(hub.is_subscribed());
        hub.publish(notification("b"));
        assert_eq!(second.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_try_subscribe_refuses_occupied_slot() {
        let hub = Hub::new();
        let (_seen, unsubscribe) = collector(&hub);

        assert!(matches!(hub.try_subscribe(|_| {}), Err(Error::SlotOccupied)));

        unsubscribe.unsubscribe();
        assert!(hub.try_subscribe(|_| {}).is_ok());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let hub = Hub::new();
        let (seen, unsubscribe) = collector(&hub);

        unsubscribe.unsubscribe();
        unsubscribe.unsubscribe();

        assert!(!hub.is_subscribed());
        assert!(!hub.publish(notification("x")));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_after_hub_dropped() {
        let hub = Hub::new();
        let unsubscribe = hub.subscribe(|_| {});
        drop(hub);
        unsubscribe.unsubscribe();
    }

    #[test]
    fn test_handler_panic_is_contained() {
        let hub = Hub::new();
        let _unsubscribe = hub.subscribe(|n| {
            if n.id == "bad" {
                panic!("handler failed");
            }
        });

        assert!(!hub.publish(notification("bad")));
        assert!(hub.publish(notification("good")));
    }

    #[test]
    fn test_handler_may_publish() {
        let hub = Hub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let inner_hub = hub.clone();
        let _unsubscribe = hub.subscribe(move |n| {
            sink.lock().unwrap().push(n.id.clone());
            if n.id == "outer" {
                inner_hub.publish(notification("inner"));
            }
        });

        hub.publish(notification("outer"));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["outer".to_string(), "inner".to_string()]
        );
    }

    #[test]
    fn test_publish_from_many_threads() {
        let hub = Hub::new();
        let (seen, _unsubscribe) = collector(&hub);

        let workers: Vec<_> = (0..4)
            .map(|t| {
                let hub = hub.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        hub.publish(notification(&format!("t{}-{}", t, i)));
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 100);

        // Per-publisher order survives interleaving.
        for t in 0..4 {
            let prefix = format!("t{}-", t);
            let mine: Vec<&String> = seen.iter().filter(|id| id.starts_with(&prefix)).collect();
            let expected: Vec<String> = (0..25).map(|i| format!("t{}-{}", t, i)).collect();
            assert_eq!(mine, expected.iter().collect::<Vec<_>>());
        }
    }
}
