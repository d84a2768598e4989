//! Typed notification events.

use serde::{Deserialize, Serialize};

/// A change to the current user's notifications.
///
/// Push payloads use the `{"type": "NEW" | "READ" | "READ_ALL", ...}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    New {
        #[serde(default, alias = "notificationId")]
        notification_id: Option<String>,
    },
    Read {
        #[serde(default, alias = "notificationId")]
        notification_id: Option<String>,
    },
    ReadAll,
}

impl NotificationEvent {
    /// Parse a loosely typed push payload.
    ///
    /// Unknown `type` values and malformed payloads yield `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(event) => Some(event),
            Err(error) => {
                tracing::debug!("Ignoring malformed notification event: {}", error);
                None
            }
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::New { .. } => "NEW",
            Self::Read { .. } => "READ",
            Self::ReadAll => "READ_ALL",
        }
    }
}
