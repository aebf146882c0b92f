//! Reference-material clients used by enrichment.

pub mod medlineplus;
pub mod wikidata;

pub use medlineplus::{MedlinePlusClient, MedlineTopic};
pub use wikidata::{WikidataClient, WikidataInfo};
