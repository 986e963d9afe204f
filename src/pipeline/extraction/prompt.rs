/// System prompt for the challenge-extraction call. Keeps the oracle on
/// a strict JSON-array contract so the parser has a fighting chance.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a business analyst. \
You read sales conversations and extract the concrete business challenges \
the company is facing. Respond ONLY with a JSON array. Each element must \
have the shape: {\"challenge\": string, \"categories\": [string], \
\"urgency\": \"high\"|\"medium\"|\"low\", \"keywords\": [string]}. \
Do not add commentary outside the JSON.";

/// User prompt for one extraction call.
pub fn build_extraction_prompt(company_name: &str, conversation: &str) -> String {
    format!(
        "Company: {company_name}\n\n\
         Conversation transcript:\n{conversation}\n\n\
         Extract every distinct business challenge mentioned above as a JSON array."
    )
}
