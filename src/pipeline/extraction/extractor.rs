use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::parser::parse_extraction;
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::ExtractionError;
use crate::models::ChallengeRecord;
use crate::oracle::llm::LlmClient;

/// Conversations shorter than this carry no extractable signal.
const MIN_INPUT_LENGTH: usize = 10;

/// Run one extraction call against the generation oracle and build a
/// challenge record from its output. Oracle unavailability is an error;
/// unparseable output is not — the record degrades instead.
pub fn extract_challenges(
    llm: &dyn LlmClient,
    company_name: &str,
    conversation: &str,
    source_url: &str,
) -> Result<ChallengeRecord, ExtractionError> {
    if company_name.trim().is_empty() {
        return Err(ExtractionError::Validation(
            "Company name is required".into(),
        ));
    }
    if conversation.trim().len() < MIN_INPUT_LENGTH {
        return Err(ExtractionError::Validation(format!(
            "Conversation data is too short (minimum {MIN_INPUT_LENGTH} characters)"
        )));
    }

    let prompt = build_extraction_prompt(company_name, conversation);
    debug!(company = company_name, "Requesting challenge extraction");
    let raw = llm.generate(&prompt, EXTRACTION_SYSTEM_PROMPT)?;

    let (extracted_challenges, analysis) = parse_extraction(&raw);
    info!(
        company = company_name,
        challenges = extracted_challenges.len(),
        degraded = analysis.is_degraded(),
        "Extraction complete"
    );

    Ok(ChallengeRecord {
        id: Uuid::new_v4(),
        company_name: company_name.trim().to_string(),
        source_url: source_url.trim().to_string(),
        extracted_challenges,
        analysis,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::llm::MockLlmClient;

    #[test]
    fn structured_extraction_builds_record() {
        let llm = MockLlmClient::new(
            r#"[{"challenge": "No CRM in place", "categories": ["sales"], "urgency": "high", "keywords": ["crm"]}]"#,
        );
        let record = extract_challenges(
            &llm,
            "Acme",
            "We have no CRM and leads fall through the cracks.",
            "https://example.com/acme",
        )
        .unwrap();

        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.extracted_challenges, vec!["No CRM in place"]);
        assert!(!record.analysis.is_degraded());
    }

    #[test]
    fn unparseable_output_degrades_without_error() {
        let llm = MockLlmClient::new("Their biggest issue is manual data entry.");
        let record = extract_challenges(
            &llm,
            "Acme",
            "Lots of manual data entry is slowing us down.",
            "https://example.com/acme",
        )
        .unwrap();

        assert!(record.analysis.is_degraded());
        assert_eq!(record.extracted_challenges.len(), 1);
        assert!(!record.extracted_challenges[0].is_empty());
    }

    #[test]
    fn missing_company_name_is_validation_error() {
        let llm = MockLlmClient::new("[]");
        let result = extract_challenges(&llm, "  ", "A long enough conversation.", "url");
        assert!(matches!(result, Err(ExtractionError::Validation(_))));
    }

    #[test]
    fn too_short_conversation_is_validation_error() {
        let llm = MockLlmClient::new("[]");
        let result = extract_challenges(&llm, "Acme", "short", "url");
        assert!(matches!(result, Err(ExtractionError::Validation(_))));
    }

    #[test]
    fn unreachable_oracle_is_fatal() {
        let llm = MockLlmClient::unreachable();
        let result = extract_challenges(&llm, "Acme", "A long enough conversation.", "url");
        assert!(matches!(result, Err(ExtractionError::Oracle(_))));
    }
}
