// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use code_summarize::config::DEFAULT_CONFIG_FILE;
use code_summarize::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning, init_logger,
};
use code_summarize::{
    Config, ConfigStore, ConfigUpdate, DetailLevel, LanguageTag, PipelineOrchestrator,
    find_files, models::relative_display,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "code_summarize")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Summarize source files with Gemini, from the shell or as an MCP server", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize every code file under a directory
    Summarize {
        /// Directory to scan for code files
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Where to save the summaries (`.json` selects the JSON report)
        #[arg(default_value = "summaries.txt")]
        output: PathBuf,

        /// Level of detail for summaries
        #[arg(short, long, value_enum)]
        detail: Option<DetailLevel>,

        /// Maximum summary length in characters
        #[arg(short = 'l', long, value_name = "CHARS")]
        max_length: Option<u32>,

        /// Files summarized concurrently per batch
        #[arg(short, long, value_name = "NUM")]
        batch_size: Option<usize>,
    },

    /// List the code files that would be summarized
    Files {
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Start MCP (Model Context Protocol) server on stdio for agentic tool integration
    Mcp,

    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings with the API key masked
    Show,

    /// Persist one setting: api_key, port, detail_level, max_length or batch_size
    Set { key: String, value: String },

    /// Remove the persisted settings file
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());
    let store = ConfigStore::new(cli.config.clone());

    match cli.command {
        Commands::Summarize {
            root,
            output,
            detail,
            max_length,
            batch_size,
        } => {
            let config = store.load().context("Failed to load configuration")?;
            cmd_summarize(config, root, output, detail, max_length, batch_size).await?;
        }
        Commands::Files { root } => {
            cmd_files(&root).await?;
        }
        Commands::Mcp => {
            let config = store.load().context("Failed to load configuration")?;
            let workdir = std::env::current_dir().context("Failed to resolve working directory")?;
            code_summarize::mcp::serve_stdio(store, config, workdir).await?;
        }
        Commands::Config { action } => {
            cmd_config(&store, action).await?;
        }
    }

    Ok(())
}

async fn cmd_summarize(
    mut config: Config,
    root: PathBuf,
    output: PathBuf,
    detail: Option<DetailLevel>,
    max_length: Option<u32>,
    batch_size: Option<usize>,
) -> Result<()> {
    if !config.has_api_key() {
        eprintln!(
            "{}",
            format_error(
                "API key not set. Use `code_summarize config set api_key <key>` or set GOOGLE_API_KEY."
            )
        );
        std::process::exit(1);
    }

    let overrides = ConfigUpdate {
        detail_level: detail,
        max_length,
        batch_size,
        ..ConfigUpdate::default()
    };
    config
        .apply_overrides(&overrides)
        .context("Invalid summarize options")?;
    let options = config.summary;

    eprintln!("{}", format_step(1, 2, &format!("Scanning {}", root.display())));
    let orchestrator = PipelineOrchestrator::new(config)
        .context("Failed to initialize summarizer")?
        .with_progress(true);

    eprintln!(
        "{}",
        format_step(
            2,
            2,
            &format!(
                "Summarizing with detail={} max_length={}",
                options.detail_level, options.max_length
            )
        )
    );
    let report = orchestrator
        .summarize_directory(&root, Some(&output), options)
        .await
        .context("Summarization failed")?;

    if report.results.is_empty() {
        eprintln!("{}", format_warning("No code files found."));
        return Ok(());
    }

    let degraded = report.stats.files_degraded;
    if degraded > 0 {
        warn!("{} file(s) could not be summarized", degraded);
        eprintln!(
            "{}",
            format_warning(&format!(
                "{} of {} file(s) fell back to a placeholder",
                degraded,
                report.results.len()
            ))
        );
    }

    println!(
        "{}",
        format_success(&format!(
            "Summarized {} file(s) to {}",
            report.results.len(),
            output.display()
        ))
    );
    Ok(())
}

async fn cmd_files(root: &Path) -> Result<()> {
    let files = find_files(root)
        .await
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    let root = std::path::absolute(root)?;

    if files.is_empty() {
        println!("{}", format_warning("No code files found."));
        return Ok(());
    }

    let mut listing: Vec<(String, LanguageTag)> = files
        .iter()
        .map(|path| (relative_display(path, &root), LanguageTag::from_path(path)))
        .collect();
    listing.sort_by(|a, b| a.0.cmp(&b.0));

    println!(
        "{}",
        format_info(&format!("Found {} code files in {}", listing.len(), root.display()))
    );
    for (path, language) in listing {
        println!("  {} ({})", path, language);
    }
    Ok(())
}

async fn cmd_config(store: &ConfigStore, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = store.load().context("Failed to load configuration")?;
            print_config(store, &config);
        }
        ConfigAction::Set { key, value } => {
            let update = ConfigUpdate::from_key_value(&key, &value)?;
            let config = store
                .update(&update)
                .await
                .context("Failed to update configuration")?;
            println!("{}", format_success(&format!("Updated {}", key)));
            print_config(store, &config);
        }
        ConfigAction::Reset => {
            let config = store
                .reset()
                .await
                .context("Failed to reset configuration")?;
            println!("{}", format_success("Configuration reset to defaults"));
            print_config(store, &config);
        }
    }
    Ok(())
}

fn print_config(store: &ConfigStore, config: &Config) {
    println!("{}", format_info(&format!("Settings file: {}", store.path().display())));
    println!("  api_key: {}", config.masked_api_key());
    println!("  port: {}", config.port);
    println!("  detail_level: {}", config.summary.detail_level);
    println!("  max_length: {}", config.summary.max_length);
    println!("  batch_size: {}", config.pipeline.batch_size);
    println!("  model: {}", config.model.model);
}
