use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

/// A push notification about work the gateway finished in the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub success: bool,
    pub message: String,
}

impl Notification {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Decode one inbound frame.
    ///
    /// `{success, message}` is taken as is. The notifications service answers
    /// a rejected subscription with `{error}`, which becomes a failure record;
    /// anything else is recorded as an invalid notification rather than
    /// dropped.
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => return Self::failure(format!("Invalid notification: {e}")),
        };

        let success = value.get("success").and_then(Value::as_bool);
        let message = value.get("message").and_then(Value::as_str);
        if let (Some(success), Some(message)) = (success, message) {
            return Self {
                success,
                message: message.to_string(),
            };
        }

        match value.get("error").and_then(Value::as_str) {
            Some(error) => Self::failure(error),
            None => Self::failure(format!("Invalid notification format: {raw}")),
        }
    }
}

/// Append-only list of notifications shared between the listener task and
/// readers. There is no way to remove or edit an entry.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<RwLock<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, notification: Notification) {
        self.entries.write().await.push(notification);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of every entry, oldest first.
    pub async fn snapshot(&self) -> Vec<Notification> {
        self.entries.read().await.clone()
    }
}
