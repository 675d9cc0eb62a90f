//! Inbox message types.
//!
//! Messages arrive from webhooks and polling jobs, so the parent reference is
//! kept in whatever shape the upstream payload used and normalized on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parent reference as delivered by the upstream source.
///
/// Platforms send integers, floats or strings (sometimes empty). Anything that
/// does not normalize to a positive integer means "no parent", including
/// booleans, objects and arrays, which land in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawParentId {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawParentId {
    /// Returns the parent id if it is a positive integer.
    ///
    /// Strings are trimmed and parsed as integers. Floats are truncated
    /// toward zero; NaN and infinities are rejected.
    pub fn normalize(&self) -> Option<i64> {
        let id = match self {
            RawParentId::Integer(n) => *n,
            RawParentId::Float(f) => {
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
            RawParentId::Text(s) => s.trim().parse::<i64>().ok()?,
            RawParentId::Other(_) => return None,
        };
        (id > 0).then_some(id)
    }
}

impl From<i64> for RawParentId {
    fn from(id: i64) -> Self {
        RawParentId::Integer(id)
    }
}

/// A single direct message in an inbox thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub parent_message_id: Option<RawParentId>,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: i64,
        sender_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            parent_message_id: None,
            sender_id: sender_id.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Builder-style setter for the parent reference.
    pub fn with_parent(mut self, parent: impl Into<RawParentId>) -> Self {
        self.parent_message_id = Some(parent.into());
        self
    }

    /// The normalized parent id, if any.
    pub fn parent_id(&self) -> Option<i64> {
        self.parent_message_id
            .as_ref()
            .and_then(RawParentId::normalize)
    }
}
