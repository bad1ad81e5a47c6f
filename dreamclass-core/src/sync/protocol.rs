//! Wire types for the hosted remote store.
//!
//! Rows travel as `{code, data, updated_at}` over the REST endpoint. Change
//! notifications arrive as Phoenix channel frames over a WebSocket.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::ClassData;
use crate::share::ShareCode;

/// Name of the table holding one row per class.
pub const TABLE: &str = "class_rooms";

const SCHEMA: &str = "public";

/// A row as written by upsert.
#[derive(Debug, Serialize)]
pub struct ClassRoomRow<'a> {
    pub code: &'a str,
    pub data: &'a ClassData,
    pub updated_at: String,
}

/// A row as returned by `select=data`.
#[derive(Debug, Deserialize)]
pub struct DataColumn {
    pub data: ClassData,
}

/// Channel topic carrying changes for one share code.
pub fn topic_for(code: &ShareCode) -> String {
    format!("realtime:{}:{}", TABLE, code)
}

/// One Phoenix channel frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    /// Joins `topic`, asking for inserts and updates of the row for `code`.
    pub fn join(topic: &str, code: &ShareCode, reference: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [{
                        "event": "*",
                        "schema": SCHEMA,
                        "table": TABLE,
                        "filter": format!("code=eq.{}", code),
                    }],
                },
            }),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: &str) -> Self {
        Self {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn leave(topic: &str, reference: &str) -> Self {
        Self {
            topic: topic.to_string(),
            event: "phx_leave".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Status of a `phx_reply` frame, e.g. `"ok"` or `"error"`.
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != "phx_reply" {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }

    /// The new class snapshot carried by an insert or update notification.
    ///
    /// Other frames, and deletes, yield `Ok(None)`.
    pub fn changed_snapshot(&self) -> Result<Option<ClassData>, serde_json::Error> {
        if self.event != "postgres_changes" {
            return Ok(None);
        }
        let change = &self.payload["data"];
        match change.get("type").and_then(Value::as_str) {
            Some("INSERT") | Some("UPDATE") => {
                let row: DataColumn = serde_json::from_value(change["record"].clone())?;
                Ok(Some(row.data))
            }
            _ => Ok(None),
        }
    }
}
