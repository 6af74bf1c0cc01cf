mod ai;
mod cli;
mod config;
mod error;
mod github;
mod orchestrator;
mod server;
mod store;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use github::GitHubRepo;
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::Orchestrator;
use store::{IssueStore, ScanOutcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_tracing(&cli);

    match &cli.command {
        None => serve(&cli, None).await,
        Some(Commands::Serve { bind }) => serve(&cli, bind.as_deref()).await,
        Some(Commands::Scan { repo }) => scan(&cli, repo).await,
        Some(Commands::Analyze { repo, prompt }) => analyze(&cli, repo, &prompt.join(" ")).await,
        Some(Commands::Init { force }) => init(*force),
        Some(Commands::Config) => show_config(&cli),
        Some(Commands::Status) => show_status(&cli),
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    if let Some(config_path) = &cli.config {
        Config::load_from(config_path)
    } else {
        Config::load_or_create_default()
    }
}

/// Exit with a hint when no OpenAI API key is available
fn require_api_key(config: &Config) -> Result<()> {
    if let Err(e) = config.get_api_key() {
        eprintln!("Error: {}", e);
        eprintln!("\nPlease either:");
        eprintln!("  1. Set the {} environment variable", config::API_KEY_ENV);
        eprintln!(
            "  2. Add openai_api_key to your config file at: {}",
            Config::default_config_path()?.display()
        );
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(cli: &Cli, bind: Option<&str>) -> Result<()> {
    let mut config = load_config(cli)?;
    if let Some(addr) = bind {
        config.bind_address = addr.to_string();
        config.validate()?;
    }

    server::run_server(&config).await
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

async fn scan(cli: &Cli, repo: &str) -> Result<()> {
    let config = load_config(cli)?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let progress = spinner(format!("Fetching issues for {}...", repo));
    let result = orchestrator.scan(repo).await;
    progress.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => {
            let outcome = ScanOutcome::failed(&GitHubRepo::normalize(repo));
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn analyze(cli: &Cli, repo: &str, prompt: &str) -> Result<()> {
    let config = load_config(cli)?;
    require_api_key(&config)?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let progress = spinner(format!("Analyzing cached issues for {}...", repo));
    let result = orchestrator.analyze(repo, prompt).await;
    progress.finish_and_clear();

    match result {
        Ok(analysis) => {
            println!("{}", analysis.to_markdown());
            if !analysis.is_available() {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init(force: bool) -> Result<()> {
    let config_path = Config::default_config_path()?;

    if config_path.exists() && !force {
        eprintln!("Config file already exists at: {}", config_path.display());
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    Config::create_default()?;
    println!("✓ Created config file at: {}", config_path.display());
    println!("\nTo authenticate with OpenAI, either:");
    println!("  1. Set the {} environment variable", config::API_KEY_ENV);
    println!("  2. Add openai_api_key to the config file:");
    println!("     openai_api_key = \"sk-YOUR_KEY_HERE\"");
    println!("\nChange the default username/password before exposing the API.");
    Ok(())
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("Current configuration:\n");
    println!("{}", toml_str);
    Ok(())
}

fn show_status(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let store = IssueStore::open(&config.data_dir()?)?;
    let stats = store.stats();

    println!("Issue store: {}", store.path().display());
    println!("Database size: {}", stats.format_size());
    println!("Cached repositories: {}\n", stats.total_repos);

    for record in store.list_repos()? {
        println!(
            "  {:<40} {:>5} issues  (tracked since {})",
            record.repo,
            record.issues_fetched,
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
