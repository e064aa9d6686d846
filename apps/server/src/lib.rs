pub mod auth;
mod error;
mod misc;
pub mod routes;
mod server;
pub mod state;

pub use error::*;
pub use server::*;
pub use state::AppState;
pub use misc::*;
