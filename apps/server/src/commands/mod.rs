mod config;
mod serve;

pub use config::*;
pub use serve::*;
