//! Explanation document repository.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{Doc, TABLE_DOCS};
use crate::schema_arrow::{doc_to_record, record_to_doc};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use symdx_common::DiseaseId;

#[derive(Clone)]
pub struct DocRepository {
    db: Arc<Database>,
}

impl DocRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert_batch(&self, docs: &[Doc]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let table = self.db.connection().open_table(TABLE_DOCS).execute().await?;

        let records: Vec<arrow_array::RecordBatch> =
            docs.iter().map(doc_to_record).collect::<Result<_>>()?;

        let schema = records[0].schema();
        let iter = arrow_array::RecordBatchIterator::new(records.into_iter().map(Ok), schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn find_by_disease(&self, disease_id: DiseaseId) -> Result<Vec<Doc>> {
        let table = self.db.connection().open_table(TABLE_DOCS).execute().await?;

        let mut stream = table
            .query()
            .only_if(format!("disease_id = '{}'", disease_id))
            .execute()
            .await?;

        let mut docs = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                docs.push(record_to_doc(&batch, i)?);
            }
        }

        Ok(docs)
    }

    /// Replace all docs for a disease (re-ingestion regenerates them).
    pub async fn replace_for_disease(&self, disease_id: DiseaseId, docs: &[Doc]) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_DOCS).execute().await?;
        table.delete(&format!("disease_id = '{}'", disease_id)).await?;
        drop(table);
        self.insert_batch(docs).await
    }

    /// All docs, for building the in-memory retrieval index.
    pub async fn all(&self) -> Result<Vec<Doc>> {
        let table = self.db.connection().open_table(TABLE_DOCS).execute().await?;

        let mut stream = table.query().execute().await?;

        let mut docs = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                docs.push(record_to_doc(&batch, i)?);
            }
        }

        Ok(docs)
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_DOCS).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
