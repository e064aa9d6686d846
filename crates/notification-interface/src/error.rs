#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("missing field: {0}")]
    MissingField(&'static str),
}
