use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "issue-analyzer")]
#[command(author, version, long_about = None)]
#[command(
    about = "Caches GitHub issues and answers questions about them with an LLM",
    long_about = "issue-analyzer fetches the open issues of a GitHub repository, caches them \
                  locally, and answers natural-language questions about the cached issues \
                  using an OpenAI chat model. Run without a subcommand to start the HTTP API."
)]
pub struct Cli {
    /// Path to config file (default: ~/.config/issue-analyzer/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API (default)
    Serve {
        /// Address to bind, overriding the config file
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Fetch and cache the open issues of a repository
    Scan {
        /// Repository full name (e.g. "octocat/Hello-World") or GitHub URL
        repo: String,
    },

    /// Ask a question about a repository's cached issues
    Analyze {
        /// Repository full name (e.g. "octocat/Hello-World") or GitHub URL
        repo: String,

        /// Question to answer about the issues
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// List cached repositories
    Status,
}

impl Cli {
    /// Default tracing filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "issue_analyzer=info,tower_http=info",
            1 => "issue_analyzer=debug,tower_http=debug",
            _ => "trace",
        }
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Analyze { prompt, .. }) = &self.command {
            if prompt.iter().all(|word| word.trim().is_empty()) {
                return Err("Prompt must not be empty".to_string());
            }
        }

        Ok(())
    }
}
