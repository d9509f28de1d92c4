use std::fmt;

use serde::Deserialize;
use serde_json::{Value, json};

use super::DecodeError;

/// Operations understood by a MilliDB server, with their 1-4 character
/// wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Function {
    CheckUser,
    ListFiles,
    GetCollection,
    GetDocument,
    Get,
    Set,
    Delete,
    Close,
    #[default]
    None,
}

impl Function {
    /// The canonical wire code for this function.
    pub fn code(&self) -> &'static str {
        match self {
            Function::CheckUser => "hu",
            Function::ListFiles => "gfs",
            Function::GetCollection => "gcll",
            Function::GetDocument => "gdoc",
            Function::Get => "g",
            Function::Set => "s",
            Function::Delete => "d",
            Function::Close => "c",
            Function::None => "n",
        }
    }

    /// Codes are matched case-insensitively; anything unrecognized maps
    /// to [`Function::None`].
    pub fn from_code(code: &str) -> Function {
        match code.to_ascii_lowercase().as_str() {
            "hu" => Function::CheckUser,
            "gfs" => Function::ListFiles,
            "gcll" => Function::GetCollection,
            "gdoc" => Function::GetDocument,
            "g" => Function::Get,
            "s" => Function::Set,
            "d" => Function::Delete,
            "c" => Function::Close,
            _ => Function::None,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Function::CheckUser => "check-user",
            Function::ListFiles => "list-files",
            Function::GetCollection => "get-collection",
            Function::GetDocument => "get-document",
            Function::Get => "get-value",
            Function::Set => "set-value",
            Function::Delete => "delete",
            Function::Close => "close",
            Function::None => "none",
        };
        write!(f, "{name}")
    }
}

/// One client-to-server request, correlated to its reply by id.
///
/// The path addresses a file by its slash-joined name chain from the
/// root; the empty string addresses the root itself. The metadata value
/// carries function-specific input.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    id: i64,
    path: String,
    function: Function,
    metadata: Value,
}

#[derive(Deserialize)]
struct WireQuery {
    #[serde(default = "missing_id")]
    id: i64,
    #[serde(default)]
    p: String,
    #[serde(default)]
    f: String,
    #[serde(default)]
    m: Value,
}

fn missing_id() -> i64 {
    -1
}

impl Query {
    pub fn new(id: i64, path: impl Into<String>, function: Function, metadata: Value) -> Self {
        Self {
            id,
            path: path.into(),
            function,
            metadata,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Encode as a single line of text. The compact form never contains
    /// a newline, so one query always occupies exactly one wire line.
    pub fn encode(&self) -> String {
        json!({
            "id": self.id,
            "p": self.path,
            "f": self.function.code(),
            "m": self.metadata,
        })
        .to_string()
    }

    pub fn parse(line: &str) -> Result<Query, DecodeError> {
        let wire: WireQuery = serde_json::from_str(line)?;
        if wire.id < 0 {
            return Err(DecodeError::InvalidId);
        }
        Ok(Query {
            id: wire.id,
            path: wire.p,
            function: Function::from_code(&wire.f),
            metadata: wire.m,
        })
    }
}
