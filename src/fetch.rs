//! Bounded point lookups of the first rows of an index.

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use comfy_table::Table;

use crate::{
    index::RowIndex,
    key::RowKey,
    option::CollectionRef,
    store::{KeyTuple, Record, StoreClient, StoreError, UserKey},
};

const NOT_FOUND_CELL: &str = "<not found>";

/// One requested row and what the server returned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<K> {
    /// Index key of the row.
    pub key: K,
    /// The record, `None` when the server has no such row.
    pub record: Option<Record>,
}

/// Rows returned by `head`, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rows<K> {
    rows: Vec<Row<K>>,
}

impl<K> Default for Rows<K> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<K: RowKey> Rows<K> {
    /// Number of requested rows, found or not.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were requested.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Row<K>> {
        self.rows.iter()
    }

    /// Record for `key`; `Some(None)` when it was requested but not found.
    pub fn get(&self, key: &K) -> Option<Option<&Record>> {
        self.rows
            .iter()
            .find(|row| &row.key == key)
            .map(|row| row.record.as_ref())
    }

    /// Keys requested but absent on the server.
    pub fn missing(&self) -> impl Iterator<Item = &K> {
        self.rows
            .iter()
            .filter(|row| row.record.is_none())
            .map(|row| &row.key)
    }

    /// Number of rows the server returned.
    pub fn found(&self) -> usize {
        self.rows.iter().filter(|row| row.record.is_some()).count()
    }

    /// Bin names across all found rows, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for record in self.rows.iter().filter_map(|row| row.record.as_ref()) {
            for (name, _) in &record.bins {
                if !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
        }
        columns
    }

    /// Keyed view of the rows.
    pub fn into_map(self) -> HashMap<K, Option<Record>> {
        self.rows
            .into_iter()
            .map(|row| (row.key, row.record))
            .collect()
    }

    /// Take the rows out.
    pub fn into_vec(self) -> Vec<Row<K>> {
        self.rows
    }

    /// Render the rows as a table with one column per bin.
    pub fn to_table(&self) -> Table
    where
        K: Display,
    {
        let columns = self.columns();
        let mut table = Table::new();
        let mut header = vec!["key".to_string()];
        header.extend(columns.iter().map(|name| name.to_string()));
        table.set_header(header);

        for row in &self.rows {
            let mut cells = vec![row.key.to_string()];
            match &row.record {
                Some(record) => cells.extend(columns.iter().map(|name| {
                    record
                        .get(name)
                        .map(|value| value.to_string())
                        .unwrap_or_default()
                })),
                None => cells.push(NOT_FOUND_CELL.to_string()),
            }
            table.add_row(cells);
        }
        table
    }
}

impl<K: RowKey + Display> Display for Rows<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

impl<K> IntoIterator for Rows<K> {
    type Item = Row<K>;
    type IntoIter = std::vec::IntoIter<Row<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Fetch the records of the first `n` keys of `index` in one batched get.
///
/// Asking for more rows than the index holds returns every indexed row.
/// Each requested key yields exactly one [`Row`]; keys the server does not
/// know come back with `record: None`.
pub fn head<K, C>(
    client: &mut C,
    collection: &CollectionRef,
    index: &RowIndex<K>,
    n: usize,
) -> Result<Rows<K>, StoreError>
where
    K: RowKey,
    C: StoreClient + ?Sized,
{
    let keys = index.first(n);
    if keys.is_empty() {
        return Ok(Rows::default());
    }
    let tuples: Vec<KeyTuple> = keys
        .iter()
        .map(|key| KeyTuple {
            namespace: collection.namespace.clone(),
            set_name: collection.set_name.clone(),
            key: key.to_user_key(),
        })
        .collect();

    let found: HashMap<UserKey, Option<Record>> = client
        .get_many(&tuples)?
        .into_iter()
        .map(|(tuple, record)| (tuple.key, record))
        .collect();

    let rows = keys
        .iter()
        .zip(tuples)
        .map(|(key, tuple)| Row {
            key: key.clone(),
            record: found.get(&tuple.key).cloned().flatten(),
        })
        .collect();
    Ok(Rows { rows })
}
