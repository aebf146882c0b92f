//! Arrow schema and conversion utilities for LanceDB.

use crate::error::{DbError, Result};
use crate::schema::*;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use symdx_common::{DiseaseId, SymptomId};

fn parse_uuid(s: &str) -> Result<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|e| DbError::InvalidQuery(e.to_string()))
}

fn parse_timestamp(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

fn get_string(batch: &RecordBatch, col: usize, row: usize) -> String {
    batch
        .column(col)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .value(row)
        .to_string()
}

fn get_opt_string(batch: &RecordBatch, col: usize, row: usize) -> Option<String> {
    let arr = batch.column(col).as_any().downcast_ref::<StringArray>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row).to_string()) }
}

fn get_i64(batch: &RecordBatch, col: usize, row: usize) -> i64 {
    batch
        .column(col)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .value(row)
}

fn get_opt_f32(batch: &RecordBatch, col: usize, row: usize) -> Option<f32> {
    let arr = batch.column(col).as_any().downcast_ref::<Float32Array>().unwrap();
    if arr.is_null(row) { None } else { Some(arr.value(row)) }
}

fn get_embedding(batch: &RecordBatch, col: usize, row: usize) -> Option<Vec<f32>> {
    let arr = batch.column(col);
    if arr.is_null(row) {
        return None;
    }
    let list_arr = arr.as_any().downcast_ref::<FixedSizeListArray>().unwrap();
    if list_arr.is_null(row) {
        return None;
    }
    let values = list_arr.value(row);
    let float_arr = values.as_any().downcast_ref::<Float32Array>().unwrap();
    Some(float_arr.values().to_vec())
}

// =============================================================================
// Disease
// =============================================================================

pub fn disease_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("canonical_name", DataType::Utf8, false),
        Field::new("wikidata_id", DataType::Utf8, true),
        Field::new("description", DataType::Utf8, true),
        Field::new("medline_url", DataType::Utf8, true),
        Field::new("summary", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("updated_at", DataType::Utf8, false),
    ]))
}

pub fn disease_to_record(disease: &Disease) -> Result<RecordBatch> {
    let schema = disease_schema();

    let id = StringArray::from(vec![disease.id.to_string()]);
    let name = StringArray::from(vec![disease.name.as_str()]);
    let canonical_name = StringArray::from(vec![disease.canonical_name.as_str()]);
    let wikidata_id = StringArray::from(vec![disease.wikidata_id.as_deref()]);
    let description = StringArray::from(vec![disease.description.as_deref()]);
    let medline_url = StringArray::from(vec![disease.medline_url.as_deref()]);
    let summary = StringArray::from(vec![disease.summary.as_deref()]);
    let created_at = StringArray::from(vec![disease.created_at.to_rfc3339()]);
    let updated_at = StringArray::from(vec![disease.updated_at.to_rfc3339()]);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(name),
            Arc::new(canonical_name),
            Arc::new(wikidata_id),
            Arc::new(description),
            Arc::new(medline_url),
            Arc::new(summary),
            Arc::new(created_at),
            Arc::new(updated_at),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_disease(batch: &RecordBatch, row: usize) -> Result<Disease> {
    Ok(Disease {
        id: DiseaseId(parse_uuid(&get_string(batch, 0, row))?),
        name: get_string(batch, 1, row),
        canonical_name: get_string(batch, 2, row),
        wikidata_id: get_opt_string(batch, 3, row),
        description: get_opt_string(batch, 4, row),
        medline_url: get_opt_string(batch, 5, row),
        summary: get_opt_string(batch, 6, row),
        created_at: parse_timestamp(&get_string(batch, 7, row)),
        updated_at: parse_timestamp(&get_string(batch, 8, row)),
    })
}

// =============================================================================
// Symptom
// =============================================================================

pub fn symptom_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("canonical_name", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

pub fn symptom_to_record(symptom: &Symptom) -> Result<RecordBatch> {
    let schema = symptom_schema();

    let id = StringArray::from(vec![symptom.id.to_string()]);
    let name = StringArray::from(vec![symptom.name.as_str()]);
    let canonical_name = StringArray::from(vec![symptom.canonical_name.as_str()]);
    let category = StringArray::from(vec![symptom.category.as_deref()]);
    let created_at = StringArray::from(vec![symptom.created_at.to_rfc3339()]);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(name),
            Arc::new(canonical_name),
            Arc::new(category),
            Arc::new(created_at),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_symptom(batch: &RecordBatch, row: usize) -> Result<Symptom> {
    Ok(Symptom {
        id: SymptomId(parse_uuid(&get_string(batch, 0, row))?),
        name: get_string(batch, 1, row),
        canonical_name: get_string(batch, 2, row),
        category: get_opt_string(batch, 3, row),
        created_at: parse_timestamp(&get_string(batch, 4, row)),
    })
}

// =============================================================================
// KgFact
// =============================================================================

pub fn kg_fact_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("disease_id", DataType::Utf8, false),
        Field::new("disease_name", DataType::Utf8, false),
        Field::new("predicate", DataType::Utf8, false),
        Field::new("symptom_id", DataType::Utf8, false),
        Field::new("symptom_name", DataType::Utf8, false),
        Field::new("confidence", DataType::Float32, true),
        Field::new("evidence_count", DataType::Int64, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

pub fn kg_fact_to_record(fact: &KgFact) -> Result<RecordBatch> {
    let schema = kg_fact_schema();

    let id = StringArray::from(vec![fact.id.to_string()]);
    let disease_id = StringArray::from(vec![fact.disease_id.to_string()]);
    let disease_name = StringArray::from(vec![fact.disease_name.as_str()]);
    let predicate = StringArray::from(vec![fact.predicate.as_str()]);
    let symptom_id = StringArray::from(vec![fact.symptom_id.to_string()]);
    let symptom_name = StringArray::from(vec![fact.symptom_name.as_str()]);
    let confidence = Float32Array::from(vec![fact.confidence]);
    let evidence_count = Int64Array::from(vec![fact.evidence_count]);
    let created_at = StringArray::from(vec![fact.created_at.to_rfc3339()]);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(disease_id),
            Arc::new(disease_name),
            Arc::new(predicate),
            Arc::new(symptom_id),
            Arc::new(symptom_name),
            Arc::new(confidence),
            Arc::new(evidence_count),
            Arc::new(created_at),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_kg_fact(batch: &RecordBatch, row: usize) -> Result<KgFact> {
    Ok(KgFact {
        id: parse_uuid(&get_string(batch, 0, row))?,
        disease_id: DiseaseId(parse_uuid(&get_string(batch, 1, row))?),
        disease_name: get_string(batch, 2, row),
        predicate: get_string(batch, 3, row),
        symptom_id: SymptomId(parse_uuid(&get_string(batch, 4, row))?),
        symptom_name: get_string(batch, 5, row),
        confidence: get_opt_f32(batch, 6, row),
        evidence_count: get_i64(batch, 7, row),
        created_at: parse_timestamp(&get_string(batch, 8, row)),
    })
}

// =============================================================================
// Doc
// =============================================================================

pub fn doc_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("disease_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                EMBEDDING_DIM as i32,
            ),
            true,
        ),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

pub fn doc_to_record(doc: &Doc) -> Result<RecordBatch> {
    let schema = doc_schema();

    if let Some(ref emb) = doc.embedding {
        if emb.len() != EMBEDDING_DIM {
            return Err(DbError::InvalidEmbeddingDimension {
                expected: EMBEDDING_DIM,
                actual: emb.len(),
            });
        }
    }

    let id = StringArray::from(vec![doc.id.to_string()]);
    let disease_id = StringArray::from(vec![doc.disease_id.to_string()]);
    let title = StringArray::from(vec![doc.title.as_str()]);
    let content = StringArray::from(vec![doc.content.as_str()]);
    let created_at = StringArray::from(vec![doc.created_at.to_rfc3339()]);

    let embedding: Arc<dyn Array> = if let Some(ref emb) = doc.embedding {
        let values = Float32Array::from(emb.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        Arc::new(
            FixedSizeListArray::try_new(field, EMBEDDING_DIM as i32, Arc::new(values), None)
                .map_err(|e| DbError::Arrow(e.to_string()))?,
        )
    } else {
        Arc::new(FixedSizeListArray::new_null(
            Arc::new(Field::new("item", DataType::Float32, false)),
            EMBEDDING_DIM as i32,
            1,
        ))
    };

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(id) as Arc<dyn Array>,
            Arc::new(disease_id),
            Arc::new(title),
            Arc::new(content),
            embedding,
            Arc::new(created_at),
        ],
    )
    .map_err(|e| DbError::Arrow(e.to_string()))
}

pub fn record_to_doc(batch: &RecordBatch, row: usize) -> Result<Doc> {
    Ok(Doc {
        id: parse_uuid(&get_string(batch, 0, row))?,
        disease_id: DiseaseId(parse_uuid(&get_string(batch, 1, row))?),
        title: get_string(batch, 2, row),
        content: get_string(batch, 3, row),
        embedding: get_embedding(batch, 4, row),
        created_at: parse_timestamp(&get_string(batch, 5, row)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disease_record_round_trip() {
        let mut d = Disease::new("Dengue".to_string());
        d.wikidata_id = Some("Q30953".to_string());
        let batch = disease_to_record(&d).unwrap();
        let back = record_to_disease(&batch, 0).unwrap();
        assert_eq!(back.id, d.id);
        assert_eq!(back.name, "Dengue");
        assert_eq!(back.wikidata_id.as_deref(), Some("Q30953"));
        assert_eq!(back.summary, None);
    }

    #[test]
    fn test_doc_rejects_wrong_embedding_dimension() {
        let mut doc = Doc::new(
            DiseaseId::from_label("dengue"),
            "Dengue".to_string(),
            "content".to_string(),
        );
        doc.embedding = Some(vec![0.0; 7]);
        let err = doc_to_record(&doc).unwrap_err();
        assert!(matches!(err, DbError::InvalidEmbeddingDimension { expected: 384, actual: 7 }));
    }

    #[test]
    fn test_doc_embedding_round_trip() {
        let mut doc = Doc::new(
            DiseaseId::from_label("dengue"),
            "Dengue".to_string(),
            "content".to_string(),
        );
        doc.embedding = Some(vec![0.25; EMBEDDING_DIM]);
        let batch = doc_to_record(&doc).unwrap();
        let back = record_to_doc(&batch, 0).unwrap();
        assert_eq!(back.embedding.unwrap().len(), EMBEDDING_DIM);
    }
}
