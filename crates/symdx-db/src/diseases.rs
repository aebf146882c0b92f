//! Disease repository.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{Disease, TABLE_DISEASES};
use crate::schema_arrow::{disease_to_record, record_to_disease};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use symdx_common::DiseaseId;

#[derive(Clone)]
pub struct DiseaseRepository {
    db: Arc<Database>,
}

impl DiseaseRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, disease: &Disease) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;

        let record = disease_to_record(disease)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn insert_batch(&self, diseases: &[Disease]) -> Result<()> {
        if diseases.is_empty() {
            return Ok(());
        }

        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;

        let records: Vec<arrow_array::RecordBatch> =
            diseases.iter().map(disease_to_record).collect::<Result<_>>()?;

        let schema = records[0].schema();
        let iter = arrow_array::RecordBatchIterator::new(records.into_iter().map(Ok), schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    /// Replace a disease record (delete + insert). Used by enrichment to
    /// fill in wikidata_id, description, and summary.
    pub async fn upsert(&self, disease: &Disease) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;
        table.delete(&format!("id = '{}'", disease.id)).await?;

        let record = disease_to_record(disease)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);
        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: DiseaseId) -> Result<Option<Disease>> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;

        let mut stream = table
            .query()
            .only_if(format!("id = '{}'", id))
            .execute()
            .await?;

        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_disease(&batch, 0)?));
            }
        }

        Ok(None)
    }

    pub async fn find_by_canonical_name(&self, canonical_name: &str) -> Result<Option<Disease>> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;

        let escaped = canonical_name.replace('\'', "''");
        let mut stream = table
            .query()
            .only_if(format!("canonical_name = '{}'", escaped))
            .execute()
            .await?;

        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_disease(&batch, 0)?));
            }
        }

        Ok(None)
    }

    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Disease>> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;

        let mut stream = table.query().limit(limit).offset(offset).execute().await?;

        let mut diseases = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                diseases.push(record_to_disease(&batch, i)?);
            }
        }

        Ok(diseases)
    }

    /// All diseases, unordered. The KG cache and evaluation both need the
    /// full set; disease counts stay small (tens, not millions).
    pub async fn all(&self) -> Result<Vec<Disease>> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;

        let mut stream = table.query().execute().await?;

        let mut diseases = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                diseases.push(record_to_disease(&batch, i)?);
            }
        }

        Ok(diseases)
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_DISEASES).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
