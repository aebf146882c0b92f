//! MedlinePlus web-service client.
//!
//! Endpoint: https://wsearch.nlm.nih.gov/ws/query (XML responses).
//! Content fields embed escaped HTML; cleanup strips the tags and
//! collapses whitespace.

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, instrument};

use crate::{IngestError, Result};

const MEDLINEPLUS_BASE_URL: &str = "https://wsearch.nlm.nih.gov/ws/query";

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn ws_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Strip embedded HTML tags and collapse whitespace.
pub fn clean_medline_text(s: &str) -> String {
    let stripped = tag_regex().replace_all(s, " ");
    ws_regex().replace_all(stripped.trim(), " ").to_string()
}

/// One health topic from a MedlinePlus search.
#[derive(Debug, Clone, PartialEq)]
pub struct MedlineTopic {
    pub query: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub full_summary: String,
}

pub struct MedlinePlusClient {
    client: reqwest::Client,
}

impl Default for MedlinePlusClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MedlinePlusClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Search health topics for a term and return the first document.
    #[instrument(skip(self))]
    pub async fn fetch_topic(&self, term: &str) -> Result<Option<MedlineTopic>> {
        let params = [
            ("db", "healthTopics"),
            ("term", term),
            ("rettype", "brief"),
            ("retmax", "5"),
        ];

        let xml = self
            .client
            .get(MEDLINEPLUS_BASE_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        debug!(term, bytes = xml.len(), "MedlinePlus response received");
        parse_medline_response(term, &xml)
    }
}

/// Parse the wsearch XML: first `<document>` under `<list>`, pulling the
/// `url` attribute and the `title` / `FullSummary` content fields.
pub fn parse_medline_response(term: &str, xml: &str) -> Result<Option<MedlineTopic>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_document = false;
    let mut document_done = false;
    let mut content_name: Option<String> = None;
    let mut content_text = String::new();

    let mut url: Option<String> = None;
    let mut title: Option<String> = None;
    let mut full_summary: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"document" if !document_done => {
                    in_document = true;
                    url = e
                        .try_get_attribute("url")
                        .map_err(|err| IngestError::Xml(err.to_string()))?
                        .map(|a| {
                            a.unescape_value()
                                .map(|v| v.to_string())
                                .map_err(|err| IngestError::Xml(err.to_string()))
                        })
                        .transpose()?;
                }
                b"content" if in_document => {
                    content_name = e
                        .try_get_attribute("name")
                        .map_err(|err| IngestError::Xml(err.to_string()))?
                        .map(|a| {
                            a.unescape_value()
                                .map(|v| v.to_string())
                                .map_err(|err| IngestError::Xml(err.to_string()))
                        })
                        .transpose()?;
                    content_text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_document && content_name.is_some() {
                    let text = t.unescape().map_err(|err| IngestError::Xml(err.to_string()))?;
                    content_text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"content" => {
                    if let Some(name) = content_name.take() {
                        let cleaned = clean_medline_text(&content_text);
                        match name.as_str() {
                            "title" => title = Some(cleaned),
                            "FullSummary" | "fullSummary" => full_summary = Some(cleaned),
                            _ => {}
                        }
                    }
                }
                b"document" if in_document => {
                    in_document = false;
                    document_done = true;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Xml(e.to_string())),
            _ => {}
        }
    }

    if !document_done {
        return Ok(None);
    }

    Ok(Some(MedlineTopic {
        query: term.to_string(),
        title,
        url,
        full_summary: full_summary.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nlmSearchResult>
  <count>2</count>
  <list>
    <document rank="0" url="https://medlineplus.gov/dengue.html">
      <content name="title">&lt;span class="qt0"&gt;Dengue&lt;/span&gt;</content>
      <content name="FullSummary">&lt;p&gt;Dengue is a viral infection spread by mosquitoes.&lt;/p&gt;
        &lt;p&gt;Symptoms include   high fever and headache.&lt;/p&gt;</content>
    </document>
    <document rank="1" url="https://medlineplus.gov/other.html">
      <content name="title">Other</content>
    </document>
  </list>
</nlmSearchResult>"#;

    #[test]
    fn test_parses_first_document() {
        let topic = parse_medline_response("dengue", SAMPLE).unwrap().unwrap();
        assert_eq!(topic.query, "dengue");
        assert_eq!(topic.title.as_deref(), Some("Dengue"));
        assert_eq!(topic.url.as_deref(), Some("https://medlineplus.gov/dengue.html"));
        assert_eq!(
            topic.full_summary,
            "Dengue is a viral infection spread by mosquitoes. Symptoms include high fever and headache."
        );
    }

    #[test]
    fn test_no_documents_returns_none() {
        let xml = r#"<nlmSearchResult><count>0</count><list/></nlmSearchResult>"#;
        assert_eq!(parse_medline_response("x", xml).unwrap(), None);
    }

    #[test]
    fn test_clean_strips_tags_and_whitespace() {
        let cleaned = clean_medline_text("<p>Fever  and\n<b>chills</b></p>");
        assert_eq!(cleaned, "Fever and chills");
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(parse_medline_response("x", "<list><document").is_err() ||
                parse_medline_response("x", "<list><document").unwrap().is_none());
    }
}
