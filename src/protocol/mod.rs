//! Client-server communication protocol.
//!
//! This module defines the communication protocol spoken between a MilliDB
//! client and server: the query/result envelopes, their text encoding, the
//! line-oriented transport abstraction, and the executor that pumps one
//! query at a time over a connection.
//!
//! # Overview
//!
//! Every interaction with the server is one [`Query`] answered by one
//! [`QueryResult`], correlated by an id the client assigns. The
//! [`QueryExecutor`] owns the connection and is the single entry point for
//! everything above it: the file model expresses each navigation, read,
//! write, and delete operation as one [`QueryExecutor::execute`] call.
//!
//! # Wire Format
//!
//! Messages are newline-delimited: each query and each result is the
//! compact JSON encoding of a small map, written as exactly one line.
//!
//! - Query lines carry `id` (integer), `p` (path), `f` (function code),
//!   and `m` (metadata).
//! - Result lines carry `id` (integer), `s` (success boolean), and `m`
//!   (metadata).
//!
//! Missing fields decode to defaults; a missing or negative `id` makes the
//! line undecodable, since it can no longer be correlated.
//!
//! # Recovery
//!
//! The transport is treated as unreliable. A write failure, a read failure
//! or timeout, a malformed reply line, and a reply correlated to some other
//! query are indistinguishable to the caller: each consumes one attempt and
//! the executor resends the same query, up to a configurable bound. Only
//! the terminal outcome is observable.
//!
//! # Key Components
//!
//! - [`Query`] / [`QueryResult`]: the request and response envelopes.
//! - [`Transport`]: abstraction over a bidirectional line channel, with
//!   [`LineTransport`] as the implementation over any byte stream.
//! - [`QueryExecutor`]: the send/await-correlated-reply/retry loop.
mod executor;
mod query;
mod result;
mod transport;

use thiserror::Error;

pub use executor::{DEFAULT_MAX_FAILURES, QueryExecutor};
pub use query::{Function, Query};
pub use result::QueryResult;
pub use transport::{LineTransport, Transport, TransportError};

/// A wire line that cannot be interpreted as an envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("missing or negative id")]
    InvalidId,
}
