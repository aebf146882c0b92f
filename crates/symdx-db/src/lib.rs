//! symdx-db — LanceDB storage for the diagnosis knowledge base.
//!
//! Tables: diseases, symptoms, kg_facts, docs. One repository type per
//! table; Arrow conversion lives in `schema_arrow`.

pub mod error;
pub mod database;
pub mod schema;
pub mod schema_arrow;
pub mod diseases;
pub mod symptoms;
pub mod kg_facts;
pub mod docs;

pub use database::{Database, DatabaseStats};
pub use error::{DbError, Result};
pub use schema::{Disease, Doc, KgFact, Symptom, SymptomRole, EMBEDDING_DIM};
