use healthhub_store::ScopedStoreKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum StoreKey {
    #[strum(serialize = "health_notifications")]
    Notifications,
}

impl ScopedStoreKey for StoreKey {}

pub type NotificationStore = healthhub_store::ScopedStore<StoreKey>;
