//! Wikidata SPARQL client.
//!
//! Fetches live description, image, and Wikipedia link for a disease
//! entity. Wikidata requires a descriptive User-Agent header. Failures
//! degrade to None so enrichment never takes the pipeline down.

use serde_json::Value;
use tracing::{instrument, warn};

use crate::Result;

const WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";
const DEFAULT_USER_AGENT: &str = "symdx/0.1 (https://github.com/symdx/symdx)";

#[derive(Debug, Clone, PartialEq)]
pub struct WikidataInfo {
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub wikipedia_url: Option<String>,
}

pub struct WikidataClient {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for WikidataClient {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl WikidataClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            user_agent: user_agent.into(),
        }
    }

    /// Fetch description, image, and Wikipedia URL for an entity ID
    /// (e.g. Q30953). Invalid IDs and query failures return None.
    #[instrument(skip(self))]
    pub async fn fetch_disease_info(&self, wikidata_id: &str) -> Result<Option<WikidataInfo>> {
        if !is_valid_qid(wikidata_id) {
            return Ok(None);
        }

        let query = build_entity_query(wikidata_id);

        let response = self
            .client
            .get(WIKIDATA_ENDPOINT)
            .query(&[("query", query.as_str()), ("format", "json")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await;

        let json: Value = match response {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => match resp.json().await {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Wikidata response parse failed: {}", e);
                        return Ok(None);
                    }
                },
                Err(e) => {
                    warn!("Wikidata query failed: {}", e);
                    return Ok(None);
                }
            },
            Err(e) => {
                warn!("Wikidata query failed: {}", e);
                return Ok(None);
            }
        };

        Ok(parse_bindings(&json))
    }
}

/// Entity IDs look like Q30953.
pub fn is_valid_qid(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next() == Some('Q') && {
        let rest: Vec<char> = chars.collect();
        !rest.is_empty() && rest.iter().all(|c| c.is_ascii_digit())
    }
}

fn build_entity_query(wikidata_id: &str) -> String {
    format!(
        "SELECT ?description ?image ?article WHERE {{\n\
           wd:{id} schema:description ?description .\n\
           OPTIONAL {{ wd:{id} wdt:P18 ?image . }}\n\
           OPTIONAL {{\n\
             ?article schema:about wd:{id} .\n\
             ?article schema:isPartOf <https://en.wikipedia.org/> .\n\
           }}\n\
           FILTER(LANG(?description) = \"en\")\n\
         }}\n\
         LIMIT 1",
        id = wikidata_id
    )
}

/// Extract the first result binding.
pub fn parse_bindings(json: &Value) -> Option<WikidataInfo> {
    let bindings = json["results"]["bindings"].as_array()?;
    let first = bindings.first()?;

    let get = |field: &str| {
        first[field]["value"].as_str().map(String::from)
    };

    Some(WikidataInfo {
        description: get("description"),
        image_url: get("image"),
        wikipedia_url: get("article"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qid_validation() {
        assert!(is_valid_qid("Q30953"));
        assert!(is_valid_qid("Q1"));
        assert!(!is_valid_qid("30953"));
        assert!(!is_valid_qid("Q"));
        assert!(!is_valid_qid("q30953"));
        assert!(!is_valid_qid("Q30a53"));
        assert!(!is_valid_qid(""));
    }

    #[test]
    fn test_parse_bindings() {
        let json: Value = serde_json::json!({
            "results": {
                "bindings": [{
                    "description": {"type": "literal", "value": "viral disease", "xml:lang": "en"},
                    "image": {"type": "uri", "value": "http://commons.wikimedia.org/x.jpg"},
                    "article": {"type": "uri", "value": "https://en.wikipedia.org/wiki/Dengue_fever"}
                }]
            }
        });
        let info = parse_bindings(&json).unwrap();
        assert_eq!(info.description.as_deref(), Some("viral disease"));
        assert_eq!(info.image_url.as_deref(), Some("http://commons.wikimedia.org/x.jpg"));
        assert_eq!(info.wikipedia_url.as_deref(), Some("https://en.wikipedia.org/wiki/Dengue_fever"));
    }

    #[test]
    fn test_parse_bindings_optional_fields() {
        let json: Value = serde_json::json!({
            "results": {"bindings": [{"description": {"value": "viral disease"}}]}
        });
        let info = parse_bindings(&json).unwrap();
        assert!(info.description.is_some());
        assert!(info.image_url.is_none());
        assert!(info.wikipedia_url.is_none());
    }

    #[test]
    fn test_parse_bindings_empty() {
        let json: Value = serde_json::json!({"results": {"bindings": []}});
        assert!(parse_bindings(&json).is_none());
    }

    #[test]
    fn test_query_mentions_entity() {
        let q = build_entity_query("Q30953");
        assert!(q.contains("wd:Q30953 schema:description"));
        assert!(q.contains("LIMIT 1"));
    }
}
