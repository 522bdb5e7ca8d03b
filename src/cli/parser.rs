//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Multi-agent research report pipeline.
///
/// Plans a research query into search tasks, gathers and summarizes web
/// sources with reliability review, and writes a cited report.
#[derive(Parser, Debug)]
#[command(name = "orchestrate-rs")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"Examples:
  orchestrate-rs "state of perovskite solar cells"
  orchestrate-rs "rust async runtimes compared" --output report.md
  orchestrate-rs "CRDT adoption in databases" --max-results 5 --stats
  GROQ_API_KEY=gsk-... TAVILY_API_KEY=tvly-... orchestrate-rs "query"

Credentials are read from the environment (or a .env file):
  GROQ_API_KEY, OPENAI_API_KEY, GEMINI_API_KEY   at least one required
  TAVILY_API_KEY                                 required for web search
"#)]
pub struct Cli {
    /// The research query.
    pub query: String,

    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum search results per research task.
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Maximum research tasks in the plan.
    #[arg(long)]
    pub max_tasks: Option<usize>,

    /// Print per-provider statistics after the run.
    #[arg(long)]
    pub stats: bool,

    /// Suppress progress output.
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_is_positional() {
        let cli = Cli::try_parse_from(["orchestrate-rs", "solar panels"])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.query, "solar panels");
        assert!(cli.output.is_none());
        assert!(!cli.stats);
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "orchestrate-rs",
            "q",
            "--max-results",
            "5",
            "--stats",
            "--no-progress",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.max_results, Some(5));
        assert!(cli.stats);
        assert!(cli.no_progress);
    }
}
