pub mod client;
pub mod command;
pub mod file;
pub mod filter;
pub mod protocol;

pub use client::{Client, ClientConfig, ConnectError};
pub use command::{Command, CommandError, prompt};
pub use file::{Collection, DOCUMENT_SUFFIX, Document, FileError, FileNode, Segment, segments};
pub use filter::Filter;
pub use protocol::{Function, Query, QueryExecutor, QueryResult};
