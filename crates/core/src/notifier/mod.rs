//! User notifications (Slack).

mod slack;
mod types;

pub use slack::{NotificationLinks, SlackNotifier};
pub use types::*;
