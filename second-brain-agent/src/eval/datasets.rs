//! Built-in evaluation datasets over the sample notes.

use super::{Case, Dataset};

const RUBRIC_MODEL: Option<&str> = Some("google-gla:gemini-2.5-pro");

pub fn agent_dataset() -> Dataset {
    let cases = vec![
        Case::new(
            "learning_goals_query",
            "What are my learning goals?",
            "knowledge_retrieval",
            "easy",
        )
        .with_rubric(
            "The response should mention learning goals from the knowledge base, such as \
             LangChain, vector databases, RAG pipeline, OpenTelemetry, or hackathons.",
            RUBRIC_MODEL,
        ),
        Case::new(
            "travel_ideas_query",
            "Suggest me some travel ideas",
            "knowledge_retrieval",
            "easy",
        )
        .with_rubric(
            "The response should mention travel destinations like Japan, Italy, Iceland, \
             Vietnam, or Himachal from the knowledge base.",
            RUBRIC_MODEL,
        ),
        Case::new(
            "project_ideas_query",
            "What project ideas do I have?",
            "knowledge_retrieval",
            "easy",
        )
        .with_rubric(
            "The response should mention project ideas such as AI-powered Second Brain, \
             DevOps dashboard, Chess tutor app, Recipe recommendation system, or Daily \
             journal summarizer.",
            RUBRIC_MODEL,
        ),
        Case::new(
            "finance_tips_query",
            "What are some finance tips?",
            "knowledge_retrieval",
            "medium",
        )
        .with_rubric(
            "The response should provide finance tips or mention financial information \
             from the knowledge base.",
            RUBRIC_MODEL,
        ),
        Case::new(
            "conversational_memory",
            "What did we discuss about travel earlier?",
            "memory_recall",
            "hard",
        )
        .with_rubric(
            "The response should demonstrate memory of previous conversations about travel \
             if any exist, or acknowledge lack of prior conversation.",
            RUBRIC_MODEL,
        ),
        Case::new(
            "synthesis_query",
            "Based on my notes, what should I focus on this quarter?",
            "synthesis",
            "hard",
        )
        .with_rubric(
            "The response should synthesize information from multiple notes (learning goals, \
             career goals, project ideas) to provide a coherent recommendation.",
            RUBRIC_MODEL,
        ),
        Case::new("unclear_query", "tell me something interesting", "general", "medium")
            .with_rubric(
                "The response should attempt to retrieve relevant information from the \
                 knowledge base or acknowledge the vague nature of the query appropriately.",
                RUBRIC_MODEL,
            ),
    ];
    Dataset::new("agent", cases)
}

pub fn retrieval_dataset() -> Dataset {
    let cases = vec![
        Case::new("exact_match_query", "learning goals", "exact_match", "easy").with_rubric(
            "The retrieved context should contain information about learning goals, including \
             topics like LangChain, vector databases, or RAG pipeline.",
            RUBRIC_MODEL,
        ),
        Case::new(
            "semantic_query",
            "places to visit for vacation",
            "semantic_search",
            "medium",
        )
        .with_rubric(
            "The retrieved context should contain travel-related information such as \
             destinations, travel plans, or travel ideas.",
            RUBRIC_MODEL,
        ),
        Case::new("project_ideas_query", "AI projects and ideas", "topical", "easy").with_rubric(
            "The retrieved context should mention project ideas, especially AI-related ones \
             like Second Brain or other tech projects.",
            RUBRIC_MODEL,
        ),
        Case::new("finance_query", "money management tips", "topical", "medium").with_rubric(
            "The retrieved context should contain financial information, tips, or records \
             related to finance.",
            RUBRIC_MODEL,
        ),
        Case::new("vague_query", "stuff", "vague", "hard").with_rubric(
            "The retrieval should handle vague queries gracefully, either returning relevant \
             general content or acknowledging limited context.",
            RUBRIC_MODEL,
        ),
    ];
    Dataset::new("retrieval", cases)
}
