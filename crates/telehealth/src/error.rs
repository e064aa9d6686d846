use crate::AppointmentStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] healthhub_store::Error),

    #[error("appointment not found: {0}")]
    NotFound(String),

    #[error("appointment {id} is already {status}")]
    NotScheduled {
        id: String,
        status: AppointmentStatus,
    },

    #[error("doctor name is required")]
    MissingDoctor,
}
