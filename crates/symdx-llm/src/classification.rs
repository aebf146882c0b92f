//! Data classification for LLM routing.
//!
//! Patient-entered symptom text is CONFIDENTIAL and never leaves local
//! backends. Callers that know what a prompt contains should classify it
//! explicitly; the content scanner is the backstop for untagged calls.

/// Data classification levels for prompt content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataClass {
    /// Public reference material (MedlinePlus summaries, Wikidata text).
    Public,
    /// symdx-generated scores, rankings, KG facts.
    Internal,
    /// Patient-entered text or anything quoting it.
    Confidential,
}

impl DataClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataClass::Public => "PUBLIC",
            DataClass::Internal => "INTERNAL",
            DataClass::Confidential => "CONFIDENTIAL",
        }
    }
}

/// Scans prompt content and returns the highest data class detected.
pub struct DataClassifier {
    internal_patterns: Vec<String>,
    confidential_patterns: Vec<String>,
}

impl Default for DataClassifier {
    fn default() -> Self {
        Self {
            internal_patterns: vec![
                "similarity_score".to_string(),
                "classifier_score".to_string(),
                "fused_score".to_string(),
                "kg_fact".to_string(),
            ],
            confidential_patterns: vec![
                "CONFIDENTIAL".to_string(),
                // The explainer prompt labels the quoted patient input.
                "user symptoms".to_string(),
                "patient text".to_string(),
            ],
        }
    }
}

impl DataClassifier {
    pub fn classify(&self, prompt: &str) -> DataClass {
        let lower = prompt.to_lowercase();

        // Confidential outranks everything
        for pattern in &self.confidential_patterns {
            if lower.contains(&pattern.to_lowercase()) {
                return DataClass::Confidential;
            }
        }

        for pattern in &self.internal_patterns {
            if prompt.contains(pattern.as_str()) {
                return DataClass::Internal;
            }
        }

        DataClass::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_classification() {
        let clf = DataClassifier::default();
        let prompt = "Summarise this MedlinePlus article about dengue fever.";
        assert_eq!(clf.classify(prompt), DataClass::Public);
    }

    #[test]
    fn test_confidential_on_patient_text_marker() {
        let clf = DataClassifier::default();
        let prompt = "User symptoms:\ni have a fever and a headache";
        assert_eq!(clf.classify(prompt), DataClass::Confidential);
    }

    #[test]
    fn test_internal_on_score_fields() {
        let clf = DataClassifier::default();
        let prompt = r#"{"disease": "Dengue", "classifier_score": 0.81}"#;
        assert_eq!(clf.classify(prompt), DataClass::Internal);
    }
}
