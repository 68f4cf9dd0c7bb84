//! Storage collaborator traits
//!
//! The notification pipeline only sees these two seams. The SQLite
//! [`Database`](super::Database) implements both; tests may swap in fakes.

use crate::error::Result;
use crate::models::{Document, DocumentReference};
use crate::storage::query::{ObjectQuery, Row};

/// Document store operations
pub trait DocumentStore {
    /// Load a document; a document that does not exist loads as a blank one
    fn get_document(&self, reference: &DocumentReference) -> Result<Document>;
}

/// Typed query execution
pub trait QueryExecutor {
    /// Run an object query, returning fixed-width rows in storage order
    fn execute(&self, query: &ObjectQuery) -> Result<Vec<Row>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn get_document(&self, reference: &DocumentReference) -> Result<Document> {
        (**self).get_document(reference)
    }
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute(&self, query: &ObjectQuery) -> Result<Vec<Row>> {
        (**self).execute(query)
    }
}
