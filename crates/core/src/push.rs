//! Push messages and the notifications they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::config::NotificationConfig;

/// Vibration pattern for every notification, in milliseconds.
pub const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

/// Payload delivered by the push service.
///
/// Fields follow JavaScript truthiness: an empty string, `0`, `false` or
/// `null` counts as absent, and so does any field of a payload that is valid
/// JSON but not an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub primary_key: Option<serde_json::Value>,
}

impl PushPayload {
    /// Parse a raw push body.
    ///
    /// Returns `Ok(None)` for an empty body: nothing is shown.
    pub fn parse(raw: &[u8]) -> Result<Option<Self>, Error> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_slice(raw)
            .map_err(|e| Error::InvalidInput(format!("push payload is not valid JSON: {e}")))?;

        let Some(fields) = value.as_object() else {
            return Ok(Some(Self::default()));
        };

        Ok(Some(Self {
            title: fields.get("title").and_then(truthy).map(display_text),
            body: fields.get("body").and_then(truthy).map(display_text),
            primary_key: fields.get("primaryKey").and_then(truthy).cloned(),
        }))
    }
}

fn truthy(value: &serde_json::Value) -> Option<&serde_json::Value> {
    use serde_json::Value;

    let keep = match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    keep.then_some(value)
}

fn display_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Buttons attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationActionKind {
    #[serde(rename = "explore")]
    View,
    #[serde(rename = "close")]
    Close,
}

impl NotificationActionKind {
    /// Parse the action id reported by a click. Unknown ids map to `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "explore" => Some(Self::View),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: NotificationActionKind,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_of_arrival: DateTime<Utc>,
    pub primary_key: serde_json::Value,
}

/// A notification ready to be displayed by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Build the notification for a payload, filling gaps from configuration.
    pub fn from_payload(payload: PushPayload, config: &NotificationConfig) -> Self {
        let action = |action: NotificationActionKind, title: &str| NotificationAction {
            action,
            title: title.into(),
            icon: config.action_icon.clone(),
        };

        Self {
            title: payload.title.unwrap_or_else(|| config.default_title.clone()),
            body: payload.body.unwrap_or_else(|| config.default_body.clone()),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: VIBRATE_PATTERN.to_vec(),
            data: NotificationData {
                date_of_arrival: Utc::now(),
                primary_key: payload.primary_key.unwrap_or_else(|| serde_json::Value::from(1)),
            },
            actions: vec![action(NotificationActionKind::View, "View"), action(NotificationActionKind::Close, "Close")],
        }
    }
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    OpenWindow { url: String },
    Dismiss,
}
