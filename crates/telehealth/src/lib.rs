mod book;
mod error;
mod store;
mod types;

pub use book::*;
pub use error::*;
pub use store::*;
pub use types::*;
