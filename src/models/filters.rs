use serde::{Deserialize, Serialize};

/// Conjunctive filter set for structured candidate search.
///
/// Each set field is ANDed against the catalog; `symptoms` is ORed within
/// itself against the free-text fields, then ANDed with the rest. Unset
/// fields are pass-through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    pub business_tag: Option<String>,
    pub department: Option<String>,
    pub size_band: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

impl CandidateFilter {
    pub fn is_empty(&self) -> bool {
        self.business_tag.is_none()
            && self.department.is_none()
            && self.size_band.is_none()
            && self.symptoms.is_empty()
    }
}
