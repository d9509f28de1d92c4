//! The hierarchical file model: collections and documents.
//!
//! A file is a named node in the remote tree, either a [`Collection`]
//! (container) or a [`Document`] (leaf holding one structured value).
//! Nodes never work with data locally: every operation is one query to the
//! server, and nodes cache no content, so repeated navigation always
//! reflects the server's current state.
//!
//! A node's path is derived from its parent chain, never stored: the root
//! is the empty name, and each child appends `/<name>` to a non-empty
//! parent path. Names decide the variant everywhere: a name ending in
//! [`DOCUMENT_SUFFIX`] is a document, any other name is a collection, and
//! the convention is checked client-side before a request is sent.
use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;

use crate::filter::Filter;
use crate::protocol::{Function, Query, QueryExecutor};

/// Name suffix separating documents from collections.
pub const DOCUMENT_SUFFIX: &str = ".mll";

/// List of possible errors raised by file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The server reported failure, or retries were exhausted.
    #[error("{function} query on '{path}' failed")]
    OperationFailed { path: String, function: Function },

    /// The server denied access to or creation of the file.
    #[error("permission denied for '{path}'")]
    PermissionDenied { path: String },

    #[error("invalid document name '{0}', must end with '.mll'")]
    InvalidDocumentName(String),

    #[error("invalid collection name '{0}', must not end with '.mll'")]
    InvalidCollectionName(String),

    #[error("'{0}' is not a document")]
    NotADocument(String),

    #[error("'{0}' is not a collection")]
    NotACollection(String),
}

/// One segment of a sub-path inside a document.
///
/// A segment is a list index when it is a plain base-10 integer without a
/// leading zero; `"0"` and `"12"` are indices, while `"00"`, `"01"`, and
/// `"+5"` are map keys. The server descends its structured values by this
/// rule; the client never evaluates sub-paths itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Split a document sub-path into its segments. The empty sub-path
/// addresses the whole content and has no segments.
pub fn segments(sub_path: &str) -> Vec<Segment<'_>> {
    if sub_path.is_empty() {
        return Vec::new();
    }
    sub_path
        .split('/')
        .map(|s| match parse_index(s) {
            Some(index) => Segment::Index(index),
            None => Segment::Key(s),
        })
        .collect()
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

/// Shared plumbing of both file variants: the executor, the parent chain,
/// and the node's own name.
#[derive(Debug, Clone)]
struct Node {
    client: Arc<QueryExecutor>,
    parent: Option<Arc<Node>>,
    name: String,
}

impl Node {
    fn path(&self) -> String {
        match &self.parent {
            None => self.name.clone(),
            Some(parent) => {
                let base = parent.path();
                if base.is_empty() {
                    self.name.clone()
                } else {
                    format!("{base}/{}", self.name)
                }
            }
        }
    }

    fn child(&self, name: String) -> Node {
        Node {
            client: Arc::clone(&self.client),
            parent: Some(Arc::new(self.clone())),
            name,
        }
    }

    /// Run one query against this node's path and require success.
    fn run(&self, function: Function, metadata: Value) -> Result<Value, FileError> {
        let path = self.path();
        let query = Query::new(self.client.next_id(), path.clone(), function, metadata);
        let result = self.client.execute(&query);
        if !result.succeeded() {
            return Err(FileError::OperationFailed { path, function });
        }
        Ok(result.into_metadata())
    }

    /// The metadata boolean permission flag; anything but an explicit
    /// `true` means denied.
    fn require_permission(&self, metadata: &Value) -> Result<(), FileError> {
        if metadata.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(FileError::PermissionDenied { path: self.path() })
        }
    }

    fn delete(&self) -> Result<(), FileError> {
        self.run(Function::Delete, json!(self.name)).map(|_| ())
    }
}

/// A file listed from or navigated to in the remote tree; the variant is
/// decided purely by the name suffix.
#[derive(Clone)]
pub enum FileNode {
    Document(Document),
    Collection(Collection),
}

impl FileNode {
    fn from_listing(parent: &Node, name: String) -> FileNode {
        let node = parent.child(name);
        if node.name.ends_with(DOCUMENT_SUFFIX) {
            FileNode::Document(Document { node })
        } else {
            FileNode::Collection(Collection { node })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileNode::Document(document) => document.name(),
            FileNode::Collection(collection) => collection.name(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            FileNode::Document(document) => document.path(),
            FileNode::Collection(collection) => collection.path(),
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, FileNode::Document(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, FileNode::Collection(_))
    }

    /// Checked conversion into the document variant.
    pub fn into_document(self) -> Result<Document, FileError> {
        match self {
            FileNode::Document(document) => Ok(document),
            FileNode::Collection(collection) => {
                Err(FileError::NotADocument(collection.node.name))
            }
        }
    }

    /// Checked conversion into the collection variant.
    pub fn into_collection(self) -> Result<Collection, FileError> {
        match self {
            FileNode::Collection(collection) => Ok(collection),
            FileNode::Document(document) => Err(FileError::NotACollection(document.node.name)),
        }
    }

    /// Delete this file from the server.
    pub fn delete(&self) -> Result<(), FileError> {
        match self {
            FileNode::Document(document) => document.delete(),
            FileNode::Collection(collection) => collection.delete(),
        }
    }
}

/// A container file holding child files.
#[derive(Debug, Clone)]
pub struct Collection {
    node: Node,
}

impl Collection {
    /// The root of the remote tree: empty name, no parent.
    pub(crate) fn root(client: Arc<QueryExecutor>) -> Collection {
        Collection {
            node: Node {
                client,
                parent: None,
                name: String::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn path(&self) -> String {
        self.node.path()
    }

    /// The containing collection; absent only on the root.
    pub fn parent(&self) -> Option<Collection> {
        self.node.parent.as_deref().map(|node| Collection {
            node: node.clone(),
        })
    }

    /// List the permitted child files of this collection.
    pub fn files(&self) -> Result<Vec<FileNode>, FileError> {
        self.list(Value::Null)
    }

    /// List the permitted child documents matching the filter.
    pub fn files_matching(&self, filter: &Filter) -> Result<Vec<FileNode>, FileError> {
        self.list(filter.to_wire())
    }

    fn list(&self, filter: Value) -> Result<Vec<FileNode>, FileError> {
        let metadata = self.node.run(Function::ListFiles, filter)?;
        let names = metadata.as_array().map(Vec::as_slice).unwrap_or_default();
        Ok(names
            .iter()
            .filter_map(Value::as_str)
            .map(|name| FileNode::from_listing(&self.node, name.to_string()))
            .collect())
    }

    /// Navigate to a permitted child document, creating it server-side if
    /// it does not exist.
    ///
    /// The name must end with [`DOCUMENT_SUFFIX`]; a violation is raised
    /// before any query is sent.
    pub fn document(&self, name: &str) -> Result<Document, FileError> {
        if !name.ends_with(DOCUMENT_SUFFIX) {
            return Err(FileError::InvalidDocumentName(name.to_string()));
        }
        let metadata = self.node.run(Function::GetDocument, json!(name))?;
        self.node.require_permission(&metadata)?;
        Ok(Document {
            node: self.node.child(name.to_string()),
        })
    }

    /// Navigate to a permitted child collection, creating it server-side
    /// if it does not exist.
    ///
    /// The name must NOT end with [`DOCUMENT_SUFFIX`]; a violation is
    /// raised before any query is sent.
    pub fn collection(&self, name: &str) -> Result<Collection, FileError> {
        if name.ends_with(DOCUMENT_SUFFIX) {
            return Err(FileError::InvalidCollectionName(name.to_string()));
        }
        let metadata = self.node.run(Function::GetCollection, json!(name))?;
        self.node.require_permission(&metadata)?;
        Ok(Collection {
            node: self.node.child(name.to_string()),
        })
    }

    pub fn delete(&self) -> Result<(), FileError> {
        self.node.delete()
    }
}

/// A leaf file holding one structured value as content.
#[derive(Debug, Clone)]
pub struct Document {
    node: Node,
}

impl Document {
    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn path(&self) -> String {
        self.node.path()
    }

    pub fn parent(&self) -> Option<Collection> {
        self.node.parent.as_deref().map(|node| Collection {
            node: node.clone(),
        })
    }

    /// Read the value at `sub_path` inside this document; the empty
    /// sub-path reads the whole content.
    ///
    /// Segments that are plain integers without a leading zero descend
    /// lists, all others descend maps (see [`segments`]).
    pub fn get(&self, sub_path: &str) -> Result<Value, FileError> {
        self.node.run(Function::Get, json!(sub_path))
    }

    /// Write the value at `sub_path` inside this document; the empty
    /// sub-path replaces the whole content.
    ///
    /// Intermediate maps along the sub-path are created by the server if
    /// they do not exist, but lists are not: writing through a missing
    /// list index fails rather than conjuring a list.
    pub fn set(&self, sub_path: &str, value: Value) -> Result<(), FileError> {
        self.node
            .run(Function::Set, json!({"p": sub_path, "v": value}))
            .map(|_| ())
    }

    /// The whole content of this document.
    pub fn content(&self) -> Result<Value, FileError> {
        self.get("")
    }

    /// Replace the whole content of this document.
    pub fn set_content(&self, value: Value) -> Result<(), FileError> {
        self.set("", value)
    }

    pub fn delete(&self) -> Result<(), FileError> {
        self.node.delete()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::protocol::{
        DEFAULT_MAX_FAILURES, QueryResult, Transport, TransportError,
    };

    /// Replies with scripted (success, metadata) pairs, echoing the id of
    /// whatever query was last sent.
    struct ReplayTransport {
        replies: VecDeque<(bool, Value)>,
        sent: Arc<Mutex<Vec<Query>>>,
        last_id: i64,
    }

    impl Transport for ReplayTransport {
        fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
            let query = Query::parse(line).expect("client sent a malformed line");
            self.last_id = query.id();
            self.sent.lock().unwrap().push(query);
            Ok(())
        }

        fn recv_line(&mut self) -> Result<String, TransportError> {
            match self.replies.pop_front() {
                Some((succeeded, metadata)) => {
                    Ok(QueryResult::new(self.last_id, succeeded, metadata).encode())
                }
                None => Err(TransportError::Closed),
            }
        }
    }

    fn root_with(replies: Vec<(bool, Value)>) -> (Collection, Arc<Mutex<Vec<Query>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = ReplayTransport {
            replies: replies.into(),
            sent: Arc::clone(&sent),
            last_id: -1,
        };
        let executor = QueryExecutor::new(Box::new(transport), DEFAULT_MAX_FAILURES);
        (Collection::root(Arc::new(executor)), sent)
    }

    #[test]
    fn listing_decides_variant_by_suffix() {
        let (root, sent) = root_with(vec![(true, json!(["report.mll", "logs"]))]);

        let files = root.files().unwrap();

        assert_eq!(2, files.len());
        assert!(files[0].is_document());
        assert_eq!("report.mll", files[0].name());
        assert!(files[1].is_collection());
        assert_eq!("logs", files[1].name());

        let sent = sent.lock().unwrap();
        assert_eq!(Function::ListFiles, sent[0].function());
        assert_eq!("", sent[0].path());
        assert_eq!(&Value::Null, sent[0].metadata());
    }

    #[test]
    fn files_matching_sends_the_filter_wire_map() {
        let (root, sent) = root_with(vec![(true, json!([]))]);
        let filter = Filter::super_of(json!({"status": "open"}), 1);

        root.files_matching(&filter).unwrap();

        assert_eq!(&filter.to_wire(), sent.lock().unwrap()[0].metadata());
    }

    #[test]
    fn paths_derive_from_the_parent_chain() {
        let (root, sent) = root_with(vec![(true, json!(true)), (true, json!(true))]);

        let logs = root.collection("logs").unwrap();
        let report = logs.document("2024.mll").unwrap();

        assert_eq!("", root.path());
        assert_eq!("logs", logs.path());
        assert_eq!("logs/2024.mll", report.path());
        assert_eq!("logs", report.parent().unwrap().path());

        let sent = sent.lock().unwrap();
        assert_eq!("", sent[0].path());
        assert_eq!(&json!("logs"), sent[0].metadata());
        assert_eq!("logs", sent[1].path());
        assert_eq!(&json!("2024.mll"), sent[1].metadata());
    }

    #[test]
    fn document_name_requires_the_suffix() {
        let (root, sent) = root_with(vec![]);

        let err = root.document("report").unwrap_err();

        assert!(matches!(err, FileError::InvalidDocumentName(_)));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn collection_name_rejects_the_suffix() {
        let (root, sent) = root_with(vec![]);

        let err = root.collection("logs.mll").unwrap_err();

        assert!(matches!(err, FileError::InvalidCollectionName(_)));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn absent_permission_flag_is_denied() {
        let (root, _) = root_with(vec![(true, Value::Null)]);

        let err = root.document("report.mll").unwrap_err();

        assert!(matches!(err, FileError::PermissionDenied { .. }));
    }

    #[test]
    fn failed_result_is_operation_failed_not_permission() {
        let (root, _) = root_with(vec![(false, Value::Null)]);

        let err = root.collection("logs").unwrap_err();

        assert!(matches!(
            err,
            FileError::OperationFailed {
                function: Function::GetCollection,
                ..
            }
        ));
    }

    #[test]
    fn get_and_set_address_the_document_path() {
        let (root, sent) = root_with(vec![
            (true, json!(true)),
            (true, Value::Null),
            (true, json!({"views": 3})),
        ]);

        let report = root.document("report.mll").unwrap();
        report.set("stats/views", json!(3)).unwrap();
        let stats = report.get("stats").unwrap();

        assert_eq!(json!({"views": 3}), stats);
        let sent = sent.lock().unwrap();
        assert_eq!(Function::Set, sent[1].function());
        assert_eq!("report.mll", sent[1].path());
        assert_eq!(&json!({"p": "stats/views", "v": 3}), sent[1].metadata());
        assert_eq!(Function::Get, sent[2].function());
        assert_eq!(&json!("stats"), sent[2].metadata());
    }

    #[test]
    fn content_round_trip_uses_the_empty_sub_path() {
        let content = json!({"title": "yearly", "rows": [1, 2]});
        let (root, sent) = root_with(vec![
            (true, json!(true)),
            (true, Value::Null),
            (true, content.clone()),
        ]);

        let report = root.document("report.mll").unwrap();
        report.set_content(content.clone()).unwrap();

        assert_eq!(content, report.content().unwrap());
        let sent = sent.lock().unwrap();
        assert_eq!(&json!({"p": "", "v": content}), sent[1].metadata());
        assert_eq!(&json!(""), sent[2].metadata());
    }

    #[test]
    fn delete_sends_the_node_path_and_name() {
        let (root, sent) = root_with(vec![(true, json!(true)), (true, Value::Null)]);

        let logs = root.collection("logs").unwrap();
        logs.delete().unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(Function::Delete, sent[1].function());
        assert_eq!("logs", sent[1].path());
        assert_eq!(&json!("logs"), sent[1].metadata());
    }

    #[test]
    fn conversions_are_checked() {
        let (root, _) = root_with(vec![(true, json!(["report.mll", "logs"]))]);

        let files = root.files().unwrap();

        assert!(files[0].clone().into_document().is_ok());
        assert!(matches!(
            files[0].clone().into_collection(),
            Err(FileError::NotACollection(_))
        ));
        assert!(files[1].clone().into_collection().is_ok());
        assert!(matches!(
            files[1].clone().into_document(),
            Err(FileError::NotADocument(_))
        ));
    }

    #[test]
    fn non_list_metadata_lists_nothing() {
        let (root, _) = root_with(vec![(true, json!("oops"))]);
        assert!(root.files().unwrap().is_empty());
    }

    #[test]
    fn integer_segments_without_leading_zeros_are_indices() {
        assert_eq!(
            vec![Segment::Key("a"), Segment::Index(0), Segment::Key("b")],
            segments("a/0/b")
        );
        assert_eq!(vec![Segment::Index(12)], segments("12"));
        assert_eq!(
            vec![Segment::Key("00"), Segment::Key("01"), Segment::Key("+5")],
            segments("00/01/+5")
        );
        assert!(segments("").is_empty());
    }
}
