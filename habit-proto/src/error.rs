//! Error body returned by the task API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured error payload.
///
/// Every field is optional: the client only relies on `message`, which it
/// surfaces verbatim when present. Validation failures additionally carry
/// per-field messages in `field_errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerErrorBody {
    /// HTTP status echoed by the server.
    pub status: Option<u16>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Server-side timestamp, kept as text.
    pub timestamp: Option<String>,
    /// Field name -> validation message.
    pub field_errors: Option<BTreeMap<String, String>>,
}

impl ServerErrorBody {
    /// Parses an error body, returning `None` for non-JSON or non-object text.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// The message, if present and not blank.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}
