use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Urgency assigned to an extracted challenge by the extraction oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Medium
    }
}

/// Structured analysis of a single extracted challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeAnalysis {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Outcome of parsing the extraction oracle's structured output.
///
/// Decided once at the parse boundary: either the oracle returned valid
/// structured output, or the record carries an explicit degraded marker with
/// the raw generated text. Downstream code matches on this tag and never
/// re-inspects the raw response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AnalysisOutcome {
    #[serde(rename_all = "camelCase")]
    Structured { items: Vec<ChallengeAnalysis> },
    #[serde(rename_all = "camelCase")]
    Degraded { raw: String },
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }

    /// Structured analyses, empty when degraded.
    pub fn items(&self) -> &[ChallengeAnalysis] {
        match self {
            AnalysisOutcome::Structured { items } => items,
            AnalysisOutcome::Degraded { .. } => &[],
        }
    }
}

/// One extraction call's result: the company's challenges plus best-effort
/// structured analysis.
///
/// Invariant: `extracted_challenges` always holds at least one non-empty
/// entry, even when the oracle's output could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    pub id: Uuid,
    pub company_name: String,
    pub source_url: String,
    pub extracted_challenges: Vec<String>,
    pub analysis: AnalysisOutcome,
    pub created_at: DateTime<Utc>,
}

impl ChallengeRecord {
    /// All challenge texts joined for use as a retrieval query or prompt input.
    pub fn joined_challenges(&self) -> String {
        self.extracted_challenges.join("; ")
    }
}
