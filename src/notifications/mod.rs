//! Live notifications pushed by the gateway over WebSocket.
//!
//! `NotificationListener` owns the socket task; `NotificationLog` is the
//! append-only list it writes to and the shell reads from.

pub mod listener;
pub mod log;

pub use listener::{CLOSED_MESSAGE, ListenerState, NotificationListener};
pub use log::{Notification, NotificationLog};
