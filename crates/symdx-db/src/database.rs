//! Database connection and table management.

use crate::error::Result;
use crate::schema;
use crate::schema_arrow;
use arrow_array::RecordBatchIterator;
use lancedb::connection::Connection;
use std::path::Path;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    path: String,
}

impl Database {
    /// Open or create a database at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if !path.as_ref().exists() {
            std::fs::create_dir_all(path.as_ref())?;
        }

        let conn = lancedb::connect(&path_str).execute().await?;

        Ok(Self { conn, path: path_str })
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Initialize all tables with schemas.
    ///
    /// Creates missing tables; LanceDB requires a schema-bearing (empty)
    /// batch iterator to create a table.
    pub async fn initialize(&self) -> Result<()> {
        if !self.table_exists(schema::TABLE_DISEASES).await? {
            let s = schema_arrow::disease_schema();
            let empty = RecordBatchIterator::new(vec![], s);
            self.conn.create_table(schema::TABLE_DISEASES, empty).execute().await?;
        }

        if !self.table_exists(schema::TABLE_SYMPTOMS).await? {
            let s = schema_arrow::symptom_schema();
            let empty = RecordBatchIterator::new(vec![], s);
            self.conn.create_table(schema::TABLE_SYMPTOMS, empty).execute().await?;
        }

        if !self.table_exists(schema::TABLE_KG_FACTS).await? {
            let s = schema_arrow::kg_fact_schema();
            let empty = RecordBatchIterator::new(vec![], s);
            self.conn.create_table(schema::TABLE_KG_FACTS, empty).execute().await?;
        }

        if !self.table_exists(schema::TABLE_DOCS).await? {
            let s = schema_arrow::doc_schema();
            let empty = RecordBatchIterator::new(vec![], s);
            self.conn.create_table(schema::TABLE_DOCS, empty).execute().await?;
        }

        Ok(())
    }

    /// Check if a table exists.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let tables = self.conn.table_names().execute().await?;
        Ok(tables.contains(&name.to_string()))
    }

    /// Get table statistics.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let mut stats = DatabaseStats::default();
        for (name, slot) in [
            (schema::TABLE_DISEASES, &mut stats.diseases),
            (schema::TABLE_SYMPTOMS, &mut stats.symptoms),
            (schema::TABLE_KG_FACTS, &mut stats.kg_facts),
            (schema::TABLE_DOCS, &mut stats.docs),
        ] {
            if self.table_exists(name).await? {
                let table = self.conn.open_table(name).execute().await?;
                *slot = table.count_rows(None).await? as u64;
            }
        }
        Ok(stats)
    }
}

/// Database statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub diseases: u64,
    pub symptoms: u64,
    pub kg_facts: u64,
    pub docs: u64,
}
