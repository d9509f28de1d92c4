use serde::Deserialize;
use serde_json::{Value, json};

use super::DecodeError;

/// One server-to-client response. The id must match the originating
/// [`Query`](super::Query) for the response to be accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    id: i64,
    succeeded: bool,
    metadata: Value,
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(default = "missing_id")]
    id: i64,
    #[serde(default)]
    s: bool,
    #[serde(default)]
    m: Value,
}

fn missing_id() -> i64 {
    -1
}

impl QueryResult {
    pub fn new(id: i64, succeeded: bool, metadata: Value) -> Self {
        Self {
            id,
            succeeded,
            metadata,
        }
    }

    /// The terminal outcome for a query whose attempts were exhausted.
    pub fn failed(id: i64) -> Self {
        Self::new(id, false, Value::Null)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    pub fn into_metadata(self) -> Value {
        self.metadata
    }

    pub fn encode(&self) -> String {
        json!({
            "id": self.id,
            "s": self.succeeded,
            "m": self.metadata,
        })
        .to_string()
    }

    pub fn parse(line: &str) -> Result<QueryResult, DecodeError> {
        let wire: WireResult = serde_json::from_str(line)?;
        if wire.id < 0 {
            return Err(DecodeError::InvalidId);
        }
        Ok(QueryResult {
            id: wire.id,
            succeeded: wire.s,
            metadata: wire.m,
        })
    }
}
