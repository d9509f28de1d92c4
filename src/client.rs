//! Session bootstrap for a MilliDB connection.
//!
//! [`Client::connect`] opens the TCP stream, builds the query executor,
//! and verifies the user before handing out the root collection. The
//! failure causes stay distinct: an unreachable server, a verification
//! exchange that never succeeded, and rejected credentials are separate
//! [`ConnectError`] variants.
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use serde_json::{Value, json};
use thiserror::Error;

use crate::file::{Collection, Document, FileError, FileNode};
use crate::filter::Filter;
use crate::protocol::{
    DEFAULT_MAX_FAILURES, Function, LineTransport, Query, QueryExecutor,
};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// List of possible errors raised while connecting.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to open a connection: {0}")]
    Io(#[from] io::Error),

    /// The verification exchange failed at the protocol level.
    #[error("user verification query failed")]
    Verification,

    /// The server answered the verification but rejected the account.
    #[error("unknown user or incorrect password")]
    BadCredentials,
}

/// Connection settings; everything is supplied programmatically.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_failures: u32,
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }
}

/// A verified session with a MilliDB server.
///
/// The client wraps the root collection of the remote tree; navigation
/// methods delegate to it.
#[derive(Debug)]
pub struct Client {
    executor: Arc<QueryExecutor>,
    root: Collection,
}

impl Client {
    /// Connect to the server and verify the configured user.
    pub fn connect(config: &ClientConfig) -> Result<Client, ConnectError> {
        info!("connecting to a MilliDB server...");
        info!("- host: {}", config.host);
        info!("- port: {}", config.port);
        let start = Instant::now();

        let stream = open_stream(config)?;
        stream.set_read_timeout(Some(config.read_timeout))?;
        let executor = Arc::new(QueryExecutor::new(
            Box::new(LineTransport::new(stream)),
            config.max_failures,
        ));

        let query = Query::new(
            executor.next_id(),
            "",
            Function::CheckUser,
            json!({"user_name": config.user, "user_password": config.password}),
        );
        let result = executor.execute(&query);
        if !result.succeeded() {
            warn!("failed to verify user");
            return Err(ConnectError::Verification);
        }
        if !result.metadata().as_bool().unwrap_or(false) {
            warn!("the user does not exist or the password is incorrect");
            return Err(ConnectError::BadCredentials);
        }

        info!("the server has connected in {:?}", start.elapsed());
        Ok(Client {
            root: Collection::root(Arc::clone(&executor)),
            executor,
        })
    }

    /// The root collection of the remote tree.
    pub fn root(&self) -> &Collection {
        &self.root
    }

    pub fn files(&self) -> Result<Vec<FileNode>, FileError> {
        self.root.files()
    }

    pub fn files_matching(&self, filter: &Filter) -> Result<Vec<FileNode>, FileError> {
        self.root.files_matching(filter)
    }

    pub fn document(&self, name: &str) -> Result<Document, FileError> {
        self.root.document(name)
    }

    pub fn collection(&self, name: &str) -> Result<Collection, FileError> {
        self.root.collection(name)
    }

    /// Say goodbye to the server and drop the connection.
    ///
    /// The close is best effort: the server may drop the socket without
    /// replying, so an unacknowledged close is only logged.
    pub fn close(self) {
        let query = Query::new(self.executor.next_id(), "", Function::Close, Value::Null);
        let result = self.executor.execute(&query);
        if !result.succeeded() {
            warn!("the server did not acknowledge the close");
        }
    }
}

fn open_stream(config: &ClientConfig) -> io::Result<TcpStream> {
    let mut last_error = None;
    for address in (config.host.as_str(), config.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&address, config.connect_timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}
