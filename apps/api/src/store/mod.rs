//! Row-store seam for the hosted database service.
//!
//! Persistence is delegated entirely to an external table/row service; this
//! module defines the narrow interface the rest of the app is allowed to
//! use: insert, select, update, and delete over equality and upper-bound
//! predicates. `AppState` repos hold an `Arc<dyn RowStore>` so the hosted
//! REST client and the in-memory test backend are interchangeable.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store insert returned no rows")]
    EmptyInsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lte,
}

#[derive(Debug, Clone)]
pub struct Predicate {
    pub column: String,
    pub op: Op,
    pub value: Value,
}

/// Filter for select/update/delete calls. Predicates are ANDed.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub predicates: Vec<Predicate>,
    pub limit: Option<usize>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            column: column.to_string(),
            op: Op::Eq,
            value: value.into(),
        });
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            column: column.to_string(),
            op: Op::Lte,
            value: value.into(),
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Inserts one record and returns the stored row (with service-side
    /// defaults such as id and timestamps filled in).
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError>;

    async fn select(&self, table: &str, filter: &RowFilter) -> Result<Vec<Value>, StoreError>;

    /// Applies `patch` to every matching row; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        filter: &RowFilter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Deletes matching rows; returns how many were removed.
    async fn delete(&self, table: &str, filter: &RowFilter) -> Result<u64, StoreError>;
}

/// Parses an untyped row into a typed record at the store boundary.
pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(StoreError::Decode)
}
