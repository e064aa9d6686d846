use healthhub_store::ScopedStoreKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum StoreKey {
    #[strum(serialize = "telehealth_appointments")]
    Appointments,
}

impl ScopedStoreKey for StoreKey {}

pub type TelehealthStore = healthhub_store::ScopedStore<StoreKey>;
