pub const SYSTEM_PROMPT: &str = "\
You are an intelligent reasoning agent within a Second Brain system.

Your primary goals are:
- Retrieve and synthesize information from the ingested knowledge base.
- Use past memory to understand user intent and provide contextual responses.
- Be concise, professional, and accurate.
- Never fabricate information; say \"insufficient data\" if unsure.
- Avoid decorative formatting unless explicitly asked.
";

/// Single user message carrying memory, retrieved notes and the question.
pub fn build_combined_input(memory_context: &str, rag_context: &str, user_query: &str) -> String {
    format!(
        "Memory Context:\n{memory_context}\n\n\
         Knowledge Context (RAG):\n{rag_context}\n\n\
         User Query:\n{user_query}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_input_sections() {
        let input = build_combined_input(
            "No previous memory yet.",
            "No relevant information found in your knowledge base.",
            "What are my learning goals?",
        );
        insta::assert_snapshot!(input, @r"
        Memory Context:
        No previous memory yet.

        Knowledge Context (RAG):
        No relevant information found in your knowledge base.

        User Query:
        What are my learning goals?
        ");
    }

    #[test]
    fn system_prompt_asks_for_honesty() {
        assert!(SYSTEM_PROMPT.contains("insufficient data"));
        assert!(SYSTEM_PROMPT.starts_with("You are an intelligent reasoning agent"));
    }
}
