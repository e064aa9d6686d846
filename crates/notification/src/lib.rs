mod error;
mod handler;
mod hub;
mod inbox;
mod producer;
mod store;

pub use error::*;
pub use handler::*;
pub use hub::*;
pub use inbox::*;
pub use producer::*;
pub use store::*;

pub use healthhub_notification_interface::{
    parse_date, Action, Notification, NotificationBuilder, NotificationKind, Priority,
};
