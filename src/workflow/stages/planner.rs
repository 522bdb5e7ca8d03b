//! Planner stage: turns the user's query into a research plan.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::llm::MultiProviderClient;
use crate::prompts::build_planner_prompt;
use crate::workflow::stages::PipelineStage;
use crate::workflow::state::{ResearchPlan, StatePatch, WorkflowState};

/// Token budget for the planning call.
const PLANNER_MAX_TOKENS: u32 = 1_000;

/// Produces a [`ResearchPlan`] from the query.
///
/// The LLM is asked for a delimited-marker format; if the response cannot
/// be parsed into any tasks, the stage degrades to a single-task plan
/// that searches the raw query, so planning never fails the pipeline on
/// a malformed response.
#[derive(Debug, Clone)]
pub struct PlannerStage {
    client: Arc<MultiProviderClient>,
    max_tasks: usize,
}

impl PlannerStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(client: Arc<MultiProviderClient>, max_tasks: usize) -> Self {
        Self { client, max_tasks }
    }
}

#[async_trait]
impl PipelineStage for PlannerStage {
    fn name(&self) -> &'static str {
        "planner"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch, PipelineError> {
        let prompt = build_planner_prompt(&state.query, self.max_tasks);
        let response = self
            .client
            .generate_with_fallback(&prompt, PLANNER_MAX_TOKENS)
            .await?;

        let plan = parse_plan(&response, &state.query, self.max_tasks);
        info!(tasks = plan.tasks.len(), "research plan ready");
        debug!(summary = %plan.summary, "plan summary");

        Ok(StatePatch {
            plan: Some(plan),
            current_task_index: Some(0),
            ..StatePatch::default()
        })
    }
}

/// Parses the delimited planner response, falling back to a one-task plan
/// when no tasks can be extracted.
fn parse_plan(response: &str, query: &str, max_tasks: usize) -> ResearchPlan {
    let summary = extract_section(response, "[SUMMARY]", "[/SUMMARY]")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| format!("Research goal: {query}"), String::from);

    let tasks: Vec<String> = extract_section(response, "[TASKS]", "[/TASKS]")
        .map(|block| {
            block
                .lines()
                .map(strip_list_prefix)
                .filter(|line| !line.is_empty())
                .take(max_tasks)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    if tasks.is_empty() {
        warn!("planner response had no usable tasks, falling back to a single-task plan");
        return ResearchPlan {
            summary,
            tasks: vec![query.to_string()],
        };
    }

    ResearchPlan { summary, tasks }
}

fn extract_section<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

/// Strips list decoration the model adds despite instructions: numbering
/// like `1.` or `2)`, and bullet markers.
fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    let without_bullet = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .unwrap_or(trimmed);

    let digits_end = without_bullet
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(0);
    if digits_end > 0 {
        let rest = &without_bullet[digits_end..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim();
        }
    }
    without_bullet
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1. first task", "first task" ; "numbered with dot")]
    #[test_case("2) second task", "second task" ; "numbered with paren")]
    #[test_case("- bulleted task", "bulleted task" ; "dash bullet")]
    #[test_case("* starred task", "starred task" ; "star bullet")]
    #[test_case("plain task", "plain task" ; "no decoration")]
    #[test_case("  10. indented task", "indented task" ; "two digit indented")]
    fn test_strip_list_prefix(input: &str, expected: &str) {
        assert_eq!(strip_list_prefix(input), expected);
    }

    #[test]
    fn test_parses_delimited_response() {
        let response = "[SUMMARY]\nSolar panel efficiency trends.\n[/SUMMARY]\n\
                        [TASKS]\nlatest solar cell efficiency records\n\
                        perovskite tandem cell progress\n[/TASKS]";
        let plan = parse_plan(response, "solar", 5);
        assert_eq!(plan.summary, "Solar panel efficiency trends.");
        assert_eq!(
            plan.tasks,
            vec![
                "latest solar cell efficiency records",
                "perovskite tandem cell progress"
            ]
        );
    }

    #[test]
    fn test_strips_numbering_and_bullets() {
        let response = "[TASKS]\n1. first task\n2) second task\n- third task\n* fourth task\n[/TASKS]";
        let plan = parse_plan(response, "q", 5);
        assert_eq!(
            plan.tasks,
            vec!["first task", "second task", "third task", "fourth task"]
        );
    }

    #[test]
    fn test_caps_task_count() {
        let response = "[TASKS]\na\nb\nc\nd\ne\nf\ng\n[/TASKS]";
        let plan = parse_plan(response, "q", 5);
        assert_eq!(plan.tasks.len(), 5);
    }

    #[test]
    fn test_malformed_response_falls_back_to_query() {
        let plan = parse_plan("no markers here at all", "rust async runtimes", 5);
        assert_eq!(plan.tasks, vec!["rust async runtimes"]);
        assert!(plan.summary.contains("rust async runtimes"));
    }

    #[test]
    fn test_empty_tasks_block_falls_back() {
        let response = "[SUMMARY]\ngoal\n[/SUMMARY]\n[TASKS]\n\n[/TASKS]";
        let plan = parse_plan(response, "the query", 5);
        assert_eq!(plan.tasks, vec!["the query"]);
        assert_eq!(plan.summary, "goal");
    }
}
