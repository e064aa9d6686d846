use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;

use crate::{Error, Filter, Hub, Inbox, Notification, NotificationStore, StoreKey, Unsubscribe};

enum Command {
    Deliver(Notification),
    Extend(Vec<Notification>, Sender<usize>),
    MarkAsRead(String, Sender<bool>),
    MarkAllAsRead(Sender<usize>),
    Delete(String, Sender<Option<Notification>>),
    DeleteAllRead(Sender<usize>),
    List(Filter, Sender<Vec<Notification>>),
    UnreadCount(Sender<usize>),
    Shutdown,
}

/// Owns the [`Inbox`] on a dedicated thread. Notifications published on the
/// hub from any thread are marshaled onto that thread, so the inbox has
/// exactly one writer.
pub struct InboxHandler {
    tx: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    unsubscribe: Option<Unsubscribe>,
}

impl InboxHandler {
    pub fn new(hub: &Hub, store: Option<NotificationStore>) -> Self {
        // A store that could not be read is never written back over.
        let (inbox, store) = match store {
            Some(store) => match load(&store) {
                Some(inbox) => (inbox, Some(store)),
                None => (Inbox::new(), None),
            },
            None => (Inbox::new(), None),
        };

        let (tx, rx) = std::sync::mpsc::channel::<Command>();

        let handle = std::thread::spawn(move || {
            Self::worker_loop(rx, inbox, store);
        });

        let hub_tx = tx.clone();
        let unsubscribe = hub.subscribe(move |notification| {
            if hub_tx.send(Command::Deliver(notification)).is_err() {
                tracing::warn!("inbox_owner_gone");
            }
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
            unsubscribe: Some(unsubscribe),
        }
    }

    fn worker_loop(rx: Receiver<Command>, mut inbox: Inbox, store: Option<NotificationStore>) {
        tracing::info!(count = inbox.len(), "inbox_owner_started");

        while let Ok(command) = rx.recv() {
            let changed = match command {
                Command::Deliver(notification) => inbox.add(notification),
                Command::Extend(notifications, reply) => {
                    let added = inbox.extend(notifications);
                    let _ = reply.send(added);
                    added > 0
                }
                Command::MarkAsRead(id, reply) => {
                    let was_unread = inbox.get(&id).is_some_and(|n| !n.is_read);
                    let _ = reply.send(inbox.mark_as_read(&id));
                    was_unread
                }
                Command::MarkAllAsRead(reply) => {
                    let changed = inbox.mark_all_as_read();
                    let _ = reply.send(changed);
                    changed > 0
                }
                Command::Delete(id, reply) => {
                    let removed = inbox.delete(&id);
                    let changed = removed.is_some();
                    let _ = reply.send(removed);
                    changed
                }
                Command::DeleteAllRead(reply) => {
                    let removed = inbox.delete_all_read();
                    let _ = reply.send(removed);
                    removed > 0
                }
                Command::List(filter, reply) => {
                    let _ = reply.send(inbox.filter(&filter));
                    false
                }
                Command::UnreadCount(reply) => {
                    let _ = reply.send(inbox.unread_count());
                    false
                }
                Command::Shutdown => break,
            };

            if changed {
                if let Some(store) = &store {
                    save(store, &inbox);
                }
            }
        }

        tracing::info!(count = inbox.len(), "inbox_owner_stopped");
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T, Error> {
        let tx = self.tx.as_ref().ok_or(Error::OwnerStopped)?;
        let (reply_tx, reply_rx) = std::sync::mpsc::channel();

        tx.send(make(reply_tx)).map_err(|_| Error::OwnerStopped)?;
        reply_rx.recv().map_err(|_| Error::OwnerStopped)
    }

    /// Adds notifications that did not come through the hub, such as a
    /// digest rebuilt from another store. Returns how many were new.
    pub fn extend(&self, notifications: Vec<Notification>) -> Result<usize, Error> {
        self.request(|reply| Command::Extend(notifications, reply))
    }

    pub fn mark_as_read(&self, id: impl Into<String>) -> Result<bool, Error> {
        let id = id.into();
        self.request(|reply| Command::MarkAsRead(id, reply))
    }

    pub fn mark_all_as_read(&self) -> Result<usize, Error> {
        self.request(Command::MarkAllAsRead)
    }

    pub fn delete(&self, id: impl Into<String>) -> Result<Option<Notification>, Error> {
        let id = id.into();
        self.request(|reply| Command::Delete(id, reply))
    }

    pub fn delete_all_read(&self) -> Result<usize, Error> {
        self.request(Command::DeleteAllRead)
    }

    pub fn list(&self, filter: Filter) -> Result<Vec<Notification>, Error> {
        self.request(|reply| Command::List(filter, reply))
    }

    pub fn unread_count(&self) -> Result<usize, Error> {
        self.request(Command::UnreadCount)
    }

    pub fn stop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe.unsubscribe();
        }

        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Command::Shutdown);
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("inbox_owner_panicked");
            }
        }
    }
}

impl Drop for InboxHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `None` when the saved list cannot be read at all. Single entries that do
/// not decode are skipped.
fn load(store: &NotificationStore) -> Option<Inbox> {
    let saved = match store.get::<Vec<serde_json::Value>>(StoreKey::Notifications) {
        Ok(saved) => saved.unwrap_or_default(),
        Err(e) => {
            tracing::error!(error = ?e, "load_notifications_failed");
            return None;
        }
    };

    let notifications = saved
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Notification>(value) {
            Ok(notification) => Some(notification),
            Err(e) => {
                tracing::warn!(error = %e, "saved_notification_skipped");
                None
            }
        })
        .collect();

    Some(Inbox::from_saved(notifications))
}

fn save(store: &NotificationStore, inbox: &Inbox) {
    if let Err(e) = store.set(StoreKey::Notifications, inbox.as_slice()) {
        tracing::error!(error = ?e, "save_notifications_failed");
    }
}
