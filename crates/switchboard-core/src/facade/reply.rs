//! Reply envelopes returned to tool callers
//!
//! Every reply carries `ok` next to the operation's own fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::FacadeError;
use crate::types::{PendingSummary, StreamEntry, StreamId};

pub const GROUP_EXISTS_NOTE: &str = "Group already exists";

/// Successful reply: `{"ok": true, ...body}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self { ok: true, body }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    pub pong: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Published {
    /// Listeners that received the message
    pub subscribers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appended {
    pub stream: String,
    pub id: StreamId,
}

/// One delivered entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: StreamId,
    pub message: BTreeMap<String, String>,
}

impl From<StreamEntry> for Message {
    fn from(entry: StreamEntry) -> Self {
        Self {
            id: entry.id,
            message: entry.fields.into_iter().collect(),
        }
    }
}

/// Entries delivered from one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMessages {
    pub name: String,
    pub messages: Vec<Message>,
}

/// Reply body for reads; `data` is empty when nothing arrived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadData {
    pub data: Vec<StreamMessages>,
}

impl ReadData {
    pub fn from_entries(stream: &str, entries: Vec<StreamEntry>) -> Self {
        if entries.is_empty() {
            return Self { data: Vec::new() };
        }
        Self {
            data: vec![StreamMessages {
                name: stream.to_string(),
                messages: entries.into_iter().map(Message::from).collect(),
            }],
        }
    }

    /// All delivered messages, across streams
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.data.iter().flat_map(|s| s.messages.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreated {
    pub stream: String,
    pub group: String,
    /// Start position the group was created at
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledged {
    pub acknowledged: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pending {
    pub pending: PendingSummary,
}

/// Error detail inside a failed reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// Failed reply: `{"ok": false, "error": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub ok: bool,
    pub error: ErrorBody,
}

impl From<&FacadeError> for ErrorReply {
    fn from(err: &FacadeError) -> Self {
        Self {
            ok: false,
            error: ErrorBody {
                kind: err.kind().to_string(),
                code: err.code().map(str::to_string),
                message: err.to_string(),
            },
        }
    }
}
