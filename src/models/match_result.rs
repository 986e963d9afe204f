use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ranked candidate produced by a matching strategy.
///
/// Created once after the ranking step and never mutated. Scores lie in
/// [0, 1]; display order is score descending with ties broken by the
/// stable order the candidates were ranked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: Uuid,
    pub challenge_id: Uuid,
    /// Resolved catalog id; None when the generation oracle named a
    /// candidate that could not be found in the catalog snapshot.
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    pub score: f32,
    pub reason: String,
    pub solution_details: String,
}

impl MatchResult {
    pub fn new(
        challenge_id: Uuid,
        candidate_id: Option<Uuid>,
        candidate_name: &str,
        score: f32,
        reason: &str,
        solution_details: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            challenge_id,
            candidate_id,
            candidate_name: candidate_name.to_string(),
            score: score.clamp(0.0, 1.0),
            reason: reason.to_string(),
            solution_details: solution_details.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_score_into_unit_interval() {
        let challenge_id = Uuid::new_v4();
        let high = MatchResult::new(challenge_id, None, "A", 1.7, "r", "d");
        let low = MatchResult::new(challenge_id, None, "B", -0.3, "r", "d");
        assert_eq!(high.score, 1.0);
        assert_eq!(low.score, 0.0);
    }
}
