//! Curated seed vocabulary.
//!
//! Mined candidates are noisy; this list anchors the vocabulary with
//! phrases that are unambiguous symptom names. Ingestion merges the two.

/// Seed symptom phrases. Multi-word phrases are matched longest-first, so
/// "skin rash" wins over "rash" when both are present.
pub const SEED_SYMPTOMS: &[&str] = &[
    "fever",
    "high fever",
    "headache",
    "nausea",
    "vomiting",
    "cough",
    "dry cough",
    "fatigue",
    "diarrhea",
    "pain",
    "sore throat",
    "chills",
    "skin rash",
    "rash",
    "itching",
    "joint pain",
    "muscle pain",
    "chest pain",
    "abdominal pain",
    "back pain",
    "neck pain",
    "stomach pain",
    "shortness of breath",
    "breathlessness",
    "dizziness",
    "loss of appetite",
    "weight loss",
    "weight gain",
    "swollen lymph nodes",
    "runny nose",
    "sneezing",
    "congestion",
    "watery eyes",
    "blurred vision",
    "burning sensation",
    "frequent urination",
    "excessive thirst",
    "night sweats",
    "sweating",
    "constipation",
    "bloating",
    "heartburn",
    "indigestion",
    "yellowing of the skin",
    "yellow eyes",
    "dark urine",
    "swelling",
    "numbness",
    "tingling",
    "stiffness",
    "cramps",
    "palpitations",
    "insomnia",
    "anxiety",
    "weakness",
    "red spots",
    "blisters",
    "peeling skin",
    "dry skin",
    "hair loss",
];

/// Seed vocabulary as owned strings, ready to merge with mined candidates.
pub fn seed_vocabulary() -> Vec<String> {
    SEED_SYMPTOMS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_normalized_already() {
        for s in SEED_SYMPTOMS {
            assert_eq!(*s, symdx_common::normalize::normalize_text(s), "seed not normalized: {}", s);
        }
    }

    #[test]
    fn test_seed_has_no_duplicates() {
        let mut v: Vec<&str> = SEED_SYMPTOMS.to_vec();
        v.sort();
        v.dedup();
        assert_eq!(v.len(), SEED_SYMPTOMS.len());
    }
}
