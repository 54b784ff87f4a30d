//! Prompt templates for query generation and search digestion.

pub const QUERY_GENERATION_SYSTEM: &str = "You're a research assistant that generates focused \
search queries. Consider previous learnings and create distinct queries that will uncover new \
information.";

pub const DIGEST_SYSTEM: &str = "You're a research analyst. Extract insights and identify \
knowledge gaps from search results.";

/// Prompt asking for `n` queries about `topic`, given what is already known.
pub fn query_generation(topic: &str, prior_learnings: &[String], n: usize) -> String {
    let findings = if prior_learnings.is_empty() {
        "No previous findings".to_string()
    } else {
        prior_learnings.join("\n")
    };

    format!(
        "Topic: {topic}\n\n\
         Previous findings:\n{findings}\n\n\
         Generate {n} focused search queries that will help deepen understanding of the topic. \
         Each query should have a clear research goal. Respond with a JSON object of the form \
         {{\"queries\": [{{\"query\": \"...\", \"research_goal\": \"...\"}}]}} and nothing else."
    )
}

/// Prompt asking for learnings and follow-up questions from search snippets.
pub fn digest(query: &str, snippets: &[String], max_learnings: usize, max_follow_ups: usize) -> String {
    let content = snippets
        .iter()
        .map(|s| format!("<content>{}</content>", s))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze search results for: {query}\n\
         Produce {max_learnings} key learnings and {max_follow_ups} follow-up questions. \
         Respond with a JSON object of the form \
         {{\"learnings\": [\"...\"], \"follow_up_questions\": [\"...\"]}} and nothing else.\n\
         Content:\n{content}"
    )
}
