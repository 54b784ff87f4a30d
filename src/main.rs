//! # Deep Research Agent
//!
//! Command-line entry point: recursively researches a topic with web search
//! and LLM digests, prints the learnings and sources, saves a JSON report and
//! prints a summary of every tool call made.
//!
//! ## Quick Start
//! ```bash
//! OPENAI_KEY=... FIRECRAWL_KEY=... cargo run -- "state of ai agents" --breadth 3 --depth 2
//! ```

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use deep_research_agent::{Config, ResearchAgent, ResearchError};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "deep-research-agent",
    version,
    about = "Recursively researches a topic with web search and LLM digests",
    long_about = r#"
Deep Research Agent

Expands a topic into a tree of search queries. Every query is searched with
Firecrawl and digested by an LLM into learnings and follow-up questions; the
follow-ups seed the next level. Breadth halves at each level and depth bounds
the tree.

REQUIRED ENVIRONMENT:
  OPENAI_KEY      OpenAI API key (not needed with LLM_PROVIDER=ollama)
  FIRECRAWL_KEY   Firecrawl API key (not needed with a self-hosted FIRECRAWL_BASE_URL)

EXAMPLES:
  deep-research-agent "make a report on the state of ai agents"
  deep-research-agent --breadth 4 --depth 3 --concurrency 3 "rust async runtimes"
  deep-research-agent --no-save -v "quantum error correction"
"#
)]
struct Args {
    /// The research topic
    #[arg(value_name = "TOPIC", default_value = "make a report on the state of ai agents")]
    topic: String,

    /// Queries generated at the top level (overrides RESEARCH_BREADTH)
    #[arg(short = 'b', long = "breadth")]
    breadth: Option<usize>,

    /// Recursion levels (overrides RESEARCH_DEPTH)
    #[arg(short = 'd', long = "depth")]
    depth: Option<usize>,

    /// Branches allowed in flight at once (overrides RESEARCH_CONCURRENCY)
    #[arg(short = 'c', long = "concurrency")]
    concurrency: Option<usize>,

    /// LLM model to use
    #[arg(short = 'm', long = "model", env = "LLM_MODEL")]
    model: Option<String>,

    /// Where to write the JSON report (overrides REPORTS_DIR)
    #[arg(long = "reports-dir", value_name = "DIR")]
    reports_dir: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long = "no-save", default_value = "false")]
    no_save: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

impl Args {
    /// Command-line values win over the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(breadth) = self.breadth {
            config.breadth = breadth;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(dir) = &self.reports_dir {
            config.reports_dir = dir.clone();
        }
    }
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    args.apply(&mut config);

    init_logging(args.verbose, &config.log_level)?;
    info!("Deep Research Agent starting up...");

    config.validate()?;
    info!(
        model = %config.model,
        breadth = config.breadth,
        depth = config.depth,
        concurrency = config.concurrency,
        "Configuration loaded"
    );

    let agent = match ResearchAgent::new(config) {
        Ok(agent) => agent,
        Err(e @ ResearchError::MissingCredential { .. }) => {
            error!(error = %e, "Cannot start without credentials");
            eprintln!("\n❌ {}", e);
            eprintln!("\n💡 Tip: set it in your environment or in a .env file");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let outcome = agent.research(&args.topic).await;

    match &outcome {
        Ok(state) => {
            println!("\n{}", "=".repeat(60));
            println!("RESEARCH RESULTS");
            println!("{}\n", "=".repeat(60));
            println!("Learnings:");
            for learning in &state.learnings {
                println!("  - {}", learning);
            }
            println!("\nSources:");
            for url in &state.visited {
                println!("  - {}", url);
            }
            println!("\n{}", "=".repeat(60));

            if !args.no_save {
                let path = agent
                    .save_report(&args.topic, state)
                    .context("Failed to save research report")?;
                println!("Report saved to {}", path.display());
            }
        }
        Err(e) => {
            error!(error = %e, "Research failed");
            eprintln!("\n❌ Research failed: {}", e);
        }
    }

    println!("\n{}", agent.usage().summary());

    outcome?;
    info!("Research completed successfully");
    Ok(())
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Initialize the tracing subscriber for structured logging.
///
/// `--verbose` forces debug output; otherwise `RUST_LOG` (or the configured
/// level) decides.
fn init_logging(verbose: bool, log_level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

// =============================================================================
// CLI TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["test"]);
        assert_eq!(args.topic, "make a report on the state of ai agents");
        assert!(args.breadth.is_none());
        assert!(!args.no_save);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_with_flags() {
        let args = Args::parse_from([
            "test",
            "--breadth", "4",
            "-d", "3",
            "--concurrency", "1",
            "--no-save",
            "--verbose",
            "Rust async",
        ]);

        assert_eq!(args.topic, "Rust async");
        assert_eq!(args.breadth, Some(4));
        assert_eq!(args.depth, Some(3));
        assert_eq!(args.concurrency, Some(1));
        assert!(args.no_save);
        assert!(args.verbose);
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "test",
            "--breadth", "5",
            "--reports-dir", "/tmp/out",
            "topic",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.breadth, 5);
        assert_eq!(config.depth, 2);
        assert_eq!(config.reports_dir, PathBuf::from("/tmp/out"));
    }
}
