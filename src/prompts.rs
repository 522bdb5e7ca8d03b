//! Prompt construction for every LLM call in the pipeline.
//!
//! Kept in one place so the exact wording is easy to audit and tune.
//! Each builder is a pure function of its inputs.

/// Prompt for the planner: produce a plan summary and search tasks in a
/// delimited format the parser can extract reliably.
#[must_use]
pub fn build_planner_prompt(query: &str, max_tasks: usize) -> String {
    format!(
        "You are a research planner. Break the following research query into \
         at most {max_tasks} concrete web search tasks.\n\n\
         Query: {query}\n\n\
         Respond in exactly this format:\n\
         [SUMMARY]\n\
         One paragraph restating the research goal.\n\
         [/SUMMARY]\n\
         [TASKS]\n\
         One search query per line, no numbering.\n\
         [/TASKS]"
    )
}

/// Prompt for summarizing one source's content for a research task.
#[must_use]
pub fn build_summarize_prompt(task: &str, content: &str) -> String {
    format!(
        "Summarize the following source content as it relates to the \
         research task. Be factual and concise; keep concrete figures and \
         named entities.\n\n\
         Research task: {task}\n\n\
         Source content:\n{content}\n\n\
         Summary:"
    )
}

/// Prompt for reviewing a summarized source. The response must be a JSON
/// object so the reviewer can parse a structured verdict.
#[must_use]
pub fn build_review_prompt(summary: &str, url: &str) -> String {
    format!(
        "You are a fact-checking reviewer. Assess whether the following \
         summarized source is reliable enough to cite in a research report.\n\n\
         Source URL: {url}\n\
         Summary:\n{summary}\n\n\
         Respond with ONLY a JSON object, no other text:\n\
         {{\"is_reliable\": true or false, \"critique\": \"one sentence assessment\"}}"
    )
}

/// Prompt for the writer: compose the final report from the assembled
/// research material.
#[must_use]
pub fn build_writer_prompt(query: &str, research_material: &str) -> String {
    format!(
        "You are a research report writer. Using ONLY the research material \
         below, write a well-structured report answering the query. Cite \
         sources by URL. If the material is insufficient, say so rather than \
         inventing facts.\n\n\
         Query: {query}\n\n\
         Research material:\n{research_material}\n\n\
         Report:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_prompt_carries_query_and_limit() {
        let prompt = build_planner_prompt("solar efficiency", 5);
        assert!(prompt.contains("solar efficiency"));
        assert!(prompt.contains("at most 5"));
        assert!(prompt.contains("[TASKS]"));
    }

    #[test]
    fn test_review_prompt_requests_json() {
        let prompt = build_review_prompt("a summary", "https://example.com");
        assert!(prompt.contains("https://example.com"));
        assert!(prompt.contains("is_reliable"));
    }
}
