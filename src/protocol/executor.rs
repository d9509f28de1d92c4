use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use log::{debug, warn};

use super::{Query, QueryResult, Transport};

pub const DEFAULT_MAX_FAILURES: u32 = 5;

/// Owns one connection to the server and pumps queries over it, one at
/// a time.
///
/// The transport mutex serializes concurrent callers: a single
/// connection carries a single outstanding request, so a second thread
/// calling [`QueryExecutor::execute`] waits for the first to finish
/// rather than interleaving writes or stealing the other's reply.
pub struct QueryExecutor {
    transport: Mutex<Box<dyn Transport>>,
    next_id: AtomicI64,
    max_failures: u32,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("transport", &"<dyn Transport>")
            .field("next_id", &self.next_id)
            .field("max_failures", &self.max_failures)
            .finish()
    }
}

impl QueryExecutor {
    pub fn new(transport: Box<dyn Transport>, max_failures: u32) -> Self {
        Self {
            transport: Mutex::new(transport),
            next_id: AtomicI64::new(0),
            max_failures,
        }
    }

    /// Next value of this connection's id sequence, starting at 0.
    pub fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send the query and await the reply carrying its id.
    ///
    /// Protocol-level trouble never surfaces as an error: a write
    /// failure, a read failure or timeout, a malformed reply line, and a
    /// reply correlated to some other id all consume one attempt and
    /// trigger a resend of the same query. After `max_failures` attempts
    /// the terminal outcome is a failed result carrying the query's id.
    /// Stray replies are discarded, never returned.
    pub fn execute(&self, query: &Query) -> QueryResult {
        let mut transport = self.transport.lock().unwrap();
        let line = query.encode();

        for attempt in 1..=self.max_failures {
            if attempt > 1 {
                warn!(
                    "query {} has failed to execute {} time{}",
                    query.id(),
                    attempt - 1,
                    if attempt > 2 { "s" } else { "" }
                );
            }
            if let Err(e) = transport.send_line(&line) {
                debug!("query {}: write failed: {e}", query.id());
                continue;
            }
            let reply = match transport.recv_line() {
                Ok(reply) => reply,
                Err(e) => {
                    debug!("query {}: read failed: {e}", query.id());
                    continue;
                }
            };
            match QueryResult::parse(&reply) {
                Ok(result) if result.id() == query.id() => return result,
                Ok(result) => {
                    debug!(
                        "query {}: discarding reply correlated to query {}",
                        query.id(),
                        result.id()
                    );
                }
                Err(e) => debug!("query {}: malformed reply: {e}", query.id()),
            }
        }

        QueryResult::failed(query.id())
    }
}
