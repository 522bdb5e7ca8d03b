//! CLI command implementation.
//!
//! Wires configuration, the provider client, search, and the workflow
//! engine together and runs the pipeline for the given query.

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use crate::cli::parser::Cli;
use crate::config::PipelineConfig;
use crate::llm::MultiProviderClient;
use crate::review::LlmReviewer;
use crate::search::TavilyClient;
use crate::workflow::progress::{ProgressEvent, StageStatus};
use crate::workflow::{WorkflowEngine, WorkflowState};

/// Runs the research pipeline for the CLI invocation and returns the
/// text to print.
///
/// # Errors
///
/// Returns an error for configuration problems (no provider or search
/// credentials) and output-file write failures. Pipeline-stage failures
/// are reported through the `ERROR:`-prefixed report instead.
pub async fn execute(cli: &Cli) -> anyhow::Result<String> {
    let mut builder = PipelineConfig::builder().from_env();
    if let Some(max_results) = cli.max_results {
        builder = builder.max_search_results(max_results);
    }
    if let Some(max_tasks) = cli.max_tasks {
        builder = builder.max_plan_tasks(max_tasks);
    }
    let config = builder.build();

    let Some(tavily_key) = config.tavily_api_key.clone() else {
        bail!("TAVILY_API_KEY is not set; web search is required");
    };

    let client = Arc::new(MultiProviderClient::from_config(&config)?);
    let search = Arc::new(TavilyClient::new(tavily_key));
    let reviewer = Arc::new(LlmReviewer::new(client.clone()));
    let engine = WorkflowEngine::new(&config, client.clone(), search, reviewer);

    let state = if cli.no_progress {
        engine.run(&cli.query).await
    } else {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
        let listener = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event.status {
                    StageStatus::Running | StageStatus::Completed => {
                        info!(
                            stage = event.stage,
                            percent = event.percent,
                            "{}",
                            event.message
                        );
                    }
                    StageStatus::Failed => {
                        tracing::error!(stage = event.stage, "{}", event.message);
                    }
                }
            }
        });
        let state = engine.run_with_progress(&cli.query, Some(tx)).await;
        let _ = listener.await;
        state
    };

    let report = state
        .final_report
        .clone()
        .unwrap_or_else(|| "ERROR: pipeline produced no report".to_string());

    let mut output = String::new();
    if let Some(path) = &cli.output {
        std::fs::write(path, &report)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        let _ = writeln!(output, "Report written to {}", path.display());
    } else {
        output.push_str(&report);
        if !output.ends_with('\n') {
            output.push('\n');
        }
    }

    if cli.stats {
        output.push_str(&format_stats(&client, &state));
    }

    Ok(output)
}

/// Renders the post-run statistics block.
fn format_stats(client: &MultiProviderClient, state: &WorkflowState) -> String {
    let mut out = String::new();
    out.push_str("\n--- Run statistics ---\n");
    let _ = writeln!(out, "Sources used: {}", state.research_data.len());

    let mut entries: Vec<_> = client.stats().into_iter().collect();
    entries.sort_by_key(|(name, _)| *name);
    for (name, stats) in entries {
        let _ = writeln!(
            out,
            "{name}: {} ok, {} failed{}",
            stats.success_count,
            stats.error_count,
            stats
                .last_error
                .as_deref()
                .map(|e| format!(" (last error: {e})"))
                .unwrap_or_default()
        );
    }
    if let Some(best) = client.best_provider() {
        let _ = writeln!(out, "Best provider: {best}");
    }

    let limiter = client.limiter().stats();
    let _ = writeln!(
        out,
        "Rate limiter: {:.2} effective rps, {} recent rate-limit hits",
        limiter.effective_rps, limiter.rate_limit_count
    );
    out
}
