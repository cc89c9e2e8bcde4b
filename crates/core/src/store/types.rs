use std::borrow::Cow;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// A single table row as returned by the backend.
pub type Row = Map<String, Value>;

/// Name of the primary key column every table carries.
pub const ID_COLUMN: &str = "id";

/// Serialized name of the page number.
const PAGE_FIELD: &str = "page";

/// Serialized name of the page size.
const LIMIT_FIELD: &str = "limit";

/// Prefix for filter columns whose names clash with the pagination fields.
const ESCAPED_FILTER_PREFIX: &str = "filter.";

/// A read query against one table: equality filters plus pagination.
///
/// Serializes to a flat object (`{"status":"paid","page":1,"limit":20}`),
/// which is what cache keys are derived from. A filter on a column named
/// `page` or `limit` (or starting with `filter.`) is written as
/// `filter.<column>` so it never shadows the pagination fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Map<String, Value>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Serialize for Query {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.filters.len()
            + usize::from(self.page.is_some())
            + usize::from(self.limit.is_some());
        let mut map = serializer.serialize_map(Some(len))?;

        for (column, value) in &self.filters {
            map.serialize_entry(&filter_field(column), value)?;
        }
        if let Some(page) = self.page {
            map.serialize_entry(PAGE_FIELD, &page)?;
        }
        if let Some(limit) = self.limit {
            map.serialize_entry(LIMIT_FIELD, &limit)?;
        }

        map.end()
    }
}

fn filter_field(column: &str) -> Cow<'_, str> {
    if column == PAGE_FIELD || column == LIMIT_FIELD || column.starts_with(ESCAPED_FILTER_PREFIX) {
        Cow::Owned(format!("{ESCAPED_FILTER_PREFIX}{column}"))
    } else {
        Cow::Borrowed(column)
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter on `column`.
    #[must_use]
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    /// Selects a 1-based page of `limit` rows.
    #[must_use]
    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Returns true if `row` satisfies every filter.
    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }

    /// Applies the filters and pagination to `rows`.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let matching = rows.into_iter().filter(|row| self.matches(row));

        match (self.page, self.limit) {
            (page, Some(limit)) => {
                let page = page.unwrap_or(1).max(1);
                let skip = (page as usize - 1).saturating_mul(limit as usize);
                matching.skip(skip).take(limit as usize).cloned().collect()
            }
            _ => matching.cloned().collect(),
        }
    }
}

/// Reads the primary key of a row, if it is a string or number.
pub fn row_id(row: &Row) -> Option<String> {
    match row.get(ID_COLUMN)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
