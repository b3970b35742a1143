//! Connection capabilities.
//!
//! A [`Connection`] is a closed enum over exactly two backend
//! capabilities: command-oriented SQL execution and native
//! document-store execution. Dispatch selects a path with a single
//! match per request; there is no open-ended type inspection anywhere.

use std::sync::Arc;

use async_trait::async_trait;
use duetdb_model::{Error, Map, Sort, Value};
use duetdb_sql::DialectKind;

/// A relational backend able to execute parameterized command text.
///
/// Implementations wrap their native failures with
/// [`Error::backend`]; this layer passes them through unchanged.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// The dialect this connection speaks, or `None` when the backend
    /// cannot run command-oriented queries at all.
    fn dialect(&self) -> Option<DialectKind>;

    /// Execute a command and fetch the resulting rows as field maps.
    async fn query(&self, command: &str, binds: &[Value]) -> Result<Vec<Map>, Error>;

    /// Execute a command and return the number of affected rows.
    async fn execute(&self, command: &str, binds: &[Value]) -> Result<u64, Error>;
}

/// Options accompanying a native document find.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindOptions {
    /// Documents to skip.
    pub skip: Option<u64>,
    /// Maximum documents to return.
    pub limit: Option<u64>,
    /// Sort terms, applied in order.
    pub sort: Vec<Sort>,
    /// Field-inclusion projection; empty means all fields.
    pub projection: Vec<String>,
}

/// A document-store backend executing native filter/update documents.
#[async_trait]
pub trait DocumentConnection: Send + Sync {
    /// Find documents matching a filter document.
    async fn find(
        &self,
        collection: &str,
        filter: Map,
        options: FindOptions,
    ) -> Result<Vec<Map>, Error>;

    /// Insert a document and return it as stored.
    async fn insert(&self, collection: &str, document: Map) -> Result<Map, Error>;

    /// Apply an update document to every match, returning the count.
    async fn update(&self, collection: &str, filter: Map, update: Map) -> Result<u64, Error>;

    /// Delete every match, returning the count.
    async fn delete(&self, collection: &str, filter: Map) -> Result<u64, Error>;
}

/// The closed set of backend capabilities a request can dispatch to.
#[derive(Clone)]
pub enum Connection {
    /// A relational connection executing compiled SQL.
    Sql(Arc<dyn SqlConnection>),
    /// A document-store connection executing native documents.
    Document(Arc<dyn DocumentConnection>),
}

impl Connection {
    /// Wrap a SQL backend.
    pub fn sql(connection: impl SqlConnection + 'static) -> Self {
        Connection::Sql(Arc::new(connection))
    }

    /// Wrap a document-store backend.
    pub fn document(connection: impl DocumentConnection + 'static) -> Self {
        Connection::Document(Arc::new(connection))
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connection::Sql(conn) => match conn.dialect() {
                Some(kind) => write!(f, "Connection::Sql({})", kind.name()),
                None => write!(f, "Connection::Sql(no dialect)"),
            },
            Connection::Document(_) => write!(f, "Connection::Document"),
        }
    }
}
