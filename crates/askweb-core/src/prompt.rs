//! Prompt text shared by every LLM backend.

/// System instruction for query rewriting.
pub const QUERY_SYSTEM_PROMPT: &str = "You are generating a query to pass to a search engine. \
Return only the query, do not generate extraneous information. Try not to include dates unless \
in the query itself; your knowledge base it cutoff and you may get it wrong.";

/// Output ceiling for query rewriting.
pub const QUERY_MAX_TOKENS: u32 = 50;

/// Low temperature so the same prompt keeps producing the same query.
pub const QUERY_TEMPERATURE: f32 = 0.3;

/// Literal cue that closes every summary prompt.
pub const SUMMARY_CUE: &str = "Summary:";

/// System-style instruction stating the output token ceiling.
pub fn token_budget_instruction(max_tokens: u32) -> String {
    format!("Fit the response within {max_tokens} tokens")
}

/// User message for query rewriting.
pub fn query_prompt(instruction: &str, prompt: &str) -> String {
    format!("{instruction}: '{prompt}'")
}

/// Grounding prompt: the summary instruction embedding the query, every
/// content string on its own line, then the [`SUMMARY_CUE`].
pub fn summary_prompt(instruction: &str, query: &str, contents: &[String]) -> String {
    let body_len: usize = contents.iter().map(|c| c.len() + 1).sum();
    let mut prompt = String::with_capacity(instruction.len() + query.len() + body_len + 16);
    prompt.push_str(&format!("{instruction} '{query}'. "));
    for content in contents {
        prompt.push('\n');
        prompt.push_str(content);
    }
    prompt.push('\n');
    prompt.push_str(SUMMARY_CUE);
    prompt
}

/// Single-turn form for backends without a separate system role.
pub fn combined_prompt(system: &str, prompt: &str) -> String {
    format!("{system}\n\n{prompt}")
}
