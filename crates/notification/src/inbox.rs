use crate::{next_id, Notification, NotificationKind};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Unread,
    Read,
}

/// Tab and type predicates, intersected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub tab: Tab,
    pub kind: Option<NotificationKind>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn tab(tab: Tab) -> Self {
        Self { tab, kind: None }
    }

    pub fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        let tab_ok = match self.tab {
            Tab::All => true,
            Tab::Unread => !notification.is_read,
            Tab::Read => notification.is_read,
        };

        tab_ok && self.kind.map_or(true, |kind| notification.kind == kind)
    }
}

/// The authoritative notification list, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbox {
    items: Vec<Notification>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an inbox from a previously saved list, applying the same
    /// dedup as [`Inbox::add`].
    pub fn from_saved(saved: Vec<Notification>) -> Self {
        let mut inbox = Self::new();
        inbox.extend(saved);
        inbox
    }

    /// First write wins: a notification whose id is already present is
    /// ignored and `false` is returned. An empty id is replaced with a fresh
    /// one.
    pub fn add(&mut self, mut notification: Notification) -> bool {
        if notification.id.is_empty() {
            notification.id = next_id("notification");
        }

        if self.contains(&notification.id) {
            tracing::debug!(id = %notification.id, "duplicate_notification_ignored");
            return false;
        }

        self.items.push(notification);
        true
    }

    /// Returns how many were actually added.
    pub fn extend(&mut self, notifications: impl IntoIterator<Item = Notification>) -> usize {
        let mut added = 0;
        for notification in notifications {
            if self.add(notification) {
                added += 1;
            }
        }
        added
    }

    /// Idempotent. Returns `false` only when the id is unknown.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Returns how many changed state.
    pub fn mark_all_as_read(&mut self) -> usize {
        let mut changed = 0;
        for n in self.items.iter_mut().filter(|n| !n.is_read) {
            n.is_read = true;
            changed += 1;
        }
        changed
    }

    pub fn delete(&mut self, id: &str) -> Option<Notification> {
        let index = self.items.iter().position(|n| n.id == id)?;
        Some(self.items.remove(index))
    }

    /// Removes exactly the notifications that are read right now.
    pub fn delete_all_read(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_read);
        before - self.items.len()
    }

    pub fn filter(&self, filter: &Filter) -> Vec<Notification> {
        self.items
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|n| n.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
