//! Explanation document generation.
//!
//! One document per disease, fed to the RAG explainer. The wording stays
//! factual and carries the non-diagnosis disclaimer.

use symdx_common::normalize::sentence_join;

/// Render the explanation document for a disease and its (sorted) symptom
/// list.
pub fn explanation_doc(disease: &str, symptoms: &[String]) -> String {
    let symptom_sentence = sentence_join(symptoms);
    let bullet_list = symptoms
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "DISEASE: {}\n\
         \n\
         KNOWN SYMPTOMS:\n\
         {}\n\
         \n\
         EXPLANATION:\n\
         {} is commonly associated with {}.\n\
         These symptoms are frequently reported together in clinical descriptions.\n\
         This explanation is based on observed symptom patterns and does not constitute a medical diagnosis.\n",
        disease, bullet_list, disease, symptom_sentence
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_structure() {
        let symptoms = vec!["chills".to_string(), "fever".to_string(), "sweating".to_string()];
        let doc = explanation_doc("Malaria", &symptoms);

        assert!(doc.starts_with("DISEASE: Malaria\n"));
        assert!(doc.contains("- chills\n- fever\n- sweating"));
        assert!(doc.contains("Malaria is commonly associated with chills, fever and sweating."));
        assert!(doc.contains("does not constitute a medical diagnosis"));
    }

    #[test]
    fn test_single_symptom_sentence() {
        let doc = explanation_doc("Dengue", &["fever".to_string()]);
        assert!(doc.contains("Dengue is commonly associated with fever."));
    }
}
