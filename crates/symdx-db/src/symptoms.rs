//! Symptom repository.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{Symptom, TABLE_SYMPTOMS};
use crate::schema_arrow::{record_to_symptom, symptom_to_record};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;
use symdx_common::SymptomId;

#[derive(Clone)]
pub struct SymptomRepository {
    db: Arc<Database>,
}

impl SymptomRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert_batch(&self, symptoms: &[Symptom]) -> Result<()> {
        if symptoms.is_empty() {
            return Ok(());
        }

        let table = self.db.connection().open_table(TABLE_SYMPTOMS).execute().await?;

        let records: Vec<arrow_array::RecordBatch> =
            symptoms.iter().map(symptom_to_record).collect::<Result<_>>()?;

        let schema = records[0].schema();
        let iter = arrow_array::RecordBatchIterator::new(records.into_iter().map(Ok), schema);

        table.add(iter).execute().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: SymptomId) -> Result<Option<Symptom>> {
        let table = self.db.connection().open_table(TABLE_SYMPTOMS).execute().await?;

        let mut stream = table
            .query()
            .only_if(format!("id = '{}'", id))
            .execute()
            .await?;

        if let Some(batch) = stream.next().await {
            let batch = batch?;
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_symptom(&batch, 0)?));
            }
        }

        Ok(None)
    }

    /// The full symptom vocabulary, sorted by canonical name. Feeds the
    /// extractor and canonicalizer at startup.
    pub async fn all(&self) -> Result<Vec<Symptom>> {
        let table = self.db.connection().open_table(TABLE_SYMPTOMS).execute().await?;

        let mut stream = table.query().execute().await?;

        let mut symptoms = Vec::new();
        while let Some(batch) = stream.next().await {
            let batch = batch?;
            for i in 0..batch.num_rows() {
                symptoms.push(record_to_symptom(&batch, i)?);
            }
        }

        symptoms.sort_by(|a, b| a.canonical_name.cmp(&b.canonical_name));
        Ok(symptoms)
    }

    pub async fn count(&self) -> Result<u64> {
        let table = self.db.connection().open_table(TABLE_SYMPTOMS).execute().await?;
        Ok(table.count_rows(None).await? as u64)
    }
}
