#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] healthhub_store::Error),

    #[error(transparent)]
    Build(#[from] healthhub_notification_interface::Error),

    #[error("a handler is already subscribed")]
    SlotOccupied,

    #[error("inbox owner has stopped")]
    OwnerStopped,
}
