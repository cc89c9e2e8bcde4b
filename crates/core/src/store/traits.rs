use async_trait::async_trait;

use super::{Query, Result, Row};

/// CRUD access to the hosted relational backend.
///
/// Implementations perform exactly one remote call per method; caching and
/// retrying are layered on top by decorators.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Reads the rows of `table` that satisfy `query`.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>>;

    /// Inserts a row and returns it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Merges `changes` into the row with primary key `id` and returns the
    /// updated row.
    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row>;

    /// Deletes the row with primary key `id`.
    async fn delete(&self, table: &str, id: &str) -> Result<()>;
}
