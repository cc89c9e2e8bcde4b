//! In-memory backend implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};

use storecache_core::store::{row_id, Backend, BackendError, Query, Result, Row, ID_COLUMN};

/// In-memory backend for tests and the demo binary.
///
/// Tables are vectors of JSON rows wrapped in `Arc<RwLock<_>>`. Failures can
/// be queued with [`fail_next`](Self::fail_next); each call to any backend
/// method consumes one queued failure before touching the data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
    failures: Arc<Mutex<VecDeque<BackendError>>>,
    select_calls: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with a small product catalog.
    pub async fn with_demo_data() -> Self {
        let backend = Self::new();
        let products = [
            ("p-1", "Trail Runner", "shoes", 12_900),
            ("p-2", "Road Racer", "shoes", 15_400),
            ("p-3", "Wool Socks", "accessories", 1_800),
            ("p-4", "Rain Shell", "outerwear", 21_000),
            ("p-5", "Water Bottle", "accessories", 2_400),
        ];

        let rows = products
            .into_iter()
            .filter_map(|(id, name, category, price_cents)| {
                json!({
                    "id": id,
                    "name": name,
                    "category": category,
                    "price_cents": price_cents,
                })
                .as_object()
                .cloned()
            })
            .collect();

        backend.seed("products", rows).await;
        backend
    }

    /// Replaces the contents of `table`.
    pub async fn seed(&self, table: &str, rows: Vec<Row>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }

    /// Queues `error` to be returned by the next backend call.
    pub async fn fail_next(&self, error: BackendError) {
        self.failures.lock().await.push_back(error);
    }

    /// Returns how many times `select` was called, failed calls included.
    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    async fn injected_failure(&self) -> Result<()> {
        match self.failures.lock().await.pop_front() {
            Some(error) => {
                tracing::debug!(error = %error, "Injected backend failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn generate_id(&self, table: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{table}-{n}")
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;

        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        self.injected_failure().await?;

        let id = match row_id(&row) {
            Some(id) => id,
            None => {
                let id = self.generate_id(table);
                row.insert(ID_COLUMN.to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|existing| row_id(existing).as_deref() == Some(id.as_str())) {
            return Err(BackendError::status(
                409,
                format!("duplicate key value violates unique constraint: {id}"),
            ));
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<Row> {
        self.injected_failure().await?;

        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row_id(row).as_deref() == Some(id))
            })
            .ok_or_else(|| BackendError::not_found(table, id))?;

        for (column, value) in changes {
            if column != ID_COLUMN {
                row.insert(column, value);
            }
        }

        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        self.injected_failure().await?;

        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::not_found(table, id))?;

        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(id));
        if rows.len() == before {
            return Err(BackendError::not_found(table, id));
        }

        Ok(())
    }
}
