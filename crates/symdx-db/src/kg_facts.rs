//! Knowledge graph facts repository.
//!
//! CRUD for disease–symptom triples.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{KgFact, TABLE_KG_FACTS};
use crate::schema_arrow::{kg_fact_to_record, record_to_kg_fact};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use symdx_common::{DiseaseId, SymptomId};

#[derive(Clone)]
pub struct KgFactRepository {
    db: Arc<Database>,
}

impl KgFactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert(&self, fact: &KgFact) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;

        let record = kg_fact_to_record(fact)?;
        let schema = record.schema();
        let iter = arrow_array::RecordBatchIterator::new(vec![Ok(record)], schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn insert_batch(&self, facts: &[KgFact]) -> Result<()> {
        if facts.is_empty() {
            return Ok(());
        }

        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;

        let records: Vec<arrow_array::RecordBatch> =
            facts.iter().map(kg_fact_to_record).collect::<Result<_>>()?;

        let schema = records[0].schema();
        let iter = arrow_array::RecordBatchIterator::new(records.into_iter().map(Ok), schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn find_by_disease(&self, disease_id: DiseaseId) -> Result<Vec<KgFact>> {
        self.query_filter(format!("disease_id = '{}'", disease_id)).await
    }

    pub async fn find_by_symptom(&self, symptom_id: SymptomId) -> Result<Vec<KgFact>> {
        self.query_filter(format!("symptom_id = '{}'", symptom_id)).await
    }

    pub async fn find_by_predicate(&self, predicate: &str) -> Result<Vec<KgFact>> {
        let escaped = predicate.replace('\'', "''");
        self.query_filter(format!("predicate = '{}'", escaped)).await
    }

    /// Delete all facts for a disease (re-ingestion replaces them).
    pub async fn delete_by_disease(&self, disease_id: DiseaseId) -> Result<()> {
        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;
        table.delete(&format!("disease_id = '{}'", disease_id)).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }

    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<KgFact>> {
        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;

        let mut stream = table.query().limit(limit).offset(offset).execute().await?;

        let mut facts = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                facts.push(record_to_kg_fact(&batch, i)?);
            }
        }

        Ok(facts)
    }

    /// All facts, for the in-memory scoring cache.
    pub async fn all(&self) -> Result<Vec<KgFact>> {
        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;

        let mut stream = table.query().execute().await?;

        let mut facts = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                facts.push(record_to_kg_fact(&batch, i)?);
            }
        }

        Ok(facts)
    }

    async fn query_filter(&self, filter: String) -> Result<Vec<KgFact>> {
        let table = self.db.connection().open_table(TABLE_KG_FACTS).execute().await?;

        let mut stream = table.query().only_if(filter).execute().await?;

        let mut facts = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                facts.push(record_to_kg_fact(&batch, i)?);
            }
        }

        Ok(facts)
    }
}
