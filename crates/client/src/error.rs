#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("Server returned error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response from server")]
    UnexpectedResponse,

    #[error("Not logged in")]
    NotAuthenticated,
}

impl Error {
    /// What the UI shows: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Error::ServerError { message, .. } => message.clone(),
            _ => "Unknown error".to_string(),
        }
    }
}
