use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A solution provider (or persona pattern) in the catalog store.
///
/// Read-only from the matching pipeline's perspective — the pipeline ranks
/// candidates but never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: Uuid,
    pub name: String,
    /// Categorical dimensions used by the structured filter search.
    pub business_tag: String,
    pub department: String,
    pub size_band: String,
    pub industry: String,
    pub region: String,
    /// Free-text fields matched by symptom keywords.
    pub description: String,
    pub challenges_solved: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CandidateRecord {
    /// Concatenated free text used for keyword matching and scoring.
    pub fn free_text(&self) -> String {
        let mut text = String::with_capacity(
            self.description.len() + self.challenges_solved.len() + 32,
        );
        text.push_str(&self.description);
        text.push(' ');
        text.push_str(&self.challenges_solved);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_includes_tags() {
        let candidate = CandidateRecord {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            business_tag: "IT".into(),
            department: "Sales".into(),
            size_band: "small".into(),
            industry: "software".into(),
            region: "Kanto".into(),
            description: "CRM rollout specialists".into(),
            challenges_solved: "lead tracking".into(),
            tags: vec!["crm".into(), "automation".into()],
        };

        let text = candidate.free_text();
        assert!(text.contains("CRM rollout"));
        assert!(text.contains("lead tracking"));
        assert!(text.contains("automation"));
    }
}
