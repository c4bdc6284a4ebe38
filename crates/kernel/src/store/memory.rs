//! In-process record storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::ContentStore;
use crate::content::{ContentRecord, table_name};

/// Record storage kept in memory, keyed by table name.
///
/// Inserting into a table that was never ensured fails, as it would in
/// PostgreSQL.
#[derive(Default)]
pub struct MemoryContentStore {
    tables: RwLock<BTreeMap<String, Vec<ContentRecord>>>,
    failing: AtomicBool,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records stored for a content type, in insertion order.
    pub fn records(&self, type_slug: &str) -> Vec<ContentRecord> {
        self.tables
            .read()
            .get(&table_name(type_slug))
            .cloned()
            .unwrap_or_default()
    }

    /// Names of all tables created so far.
    pub fn tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Make every subsequent insert fail, to exercise error paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn ensure_table(&self, type_slug: &str) -> Result<()> {
        self.tables
            .write()
            .entry(table_name(type_slug))
            .or_default();
        Ok(())
    }

    async fn insert(&self, type_slug: &str, record: &ContentRecord) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("memory store is failing inserts");
        }

        let table = table_name(type_slug);
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&table) else {
            bail!("relation \"{table}\" does not exist");
        };
        if rows.iter().any(|r| r.id == record.id) {
            bail!("duplicate key value violates unique constraint on {table}");
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn health(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
