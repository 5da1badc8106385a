//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use vox_core::config;
use vox_core::markup::NormalizeStrategy;

mod commands;

#[derive(Parser)]
#[command(name = "vox")]
#[command(version = "0.1")]
#[command(about = "Voice agent live transcript renderer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Renders a transcript from JSON-lines events
    Render {
        /// Events file, one JSON object per line ("-" for stdin)
        #[arg(value_name = "EVENTS", default_value = "-")]
        events: PathBuf,

        /// Page URL; a non-empty `latency-measurement` parameter shows latency
        #[arg(long)]
        url: Option<String>,

        /// Show latency measurements regardless of config and URL
        #[arg(long)]
        show_latency: bool,

        /// Override the markup strategy from config
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Html)]
        format: FormatArg,

        /// Viewport height in lines; text output shows the newest lines only
        #[arg(long, value_name = "LINES")]
        height: Option<usize>,
    },

    /// Normalizes speech-synthesis markup in agent text
    Normalize {
        /// Text to normalize (reads stdin if omitted)
        #[arg(value_name = "TEXT")]
        text: Option<String>,

        /// Override the markup strategy from config
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Fetches the agent prompt, falling back to the built-in prompt
    Prompt {
        /// Prompt location (overrides `prompt_url` from config)
        #[arg(long)]
        url: Option<String>,

        /// Print the full session settings message instead of the prompt
        #[arg(long)]
        settings: bool,
    },

    /// Lists the available agent voices
    Voices,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    Strip,
    Glyph,
}

impl From<StrategyArg> for NormalizeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Strip => NormalizeStrategy::Strip,
            StrategyArg::Glyph => NormalizeStrategy::Glyph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FormatArg {
    Html,
    Text,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to stderr so stdout stays clean for rendered output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Render {
            events,
            url,
            show_latency,
            strategy,
            format,
            height,
        } => commands::render::run(&commands::render::RenderOptions {
            events: &events,
            config: &config,
            url: url.as_deref(),
            show_latency,
            strategy: strategy.map(Into::into),
            text: format == FormatArg::Text,
            height,
        }),

        Commands::Normalize { text, strategy } => {
            let strategy = strategy.map_or(config.normalize_strategy, Into::into);
            commands::normalize::run(text, strategy)
        }

        Commands::Prompt { url, settings } => {
            commands::prompt::run(&config, url.as_deref(), settings).await
        }

        Commands::Voices => {
            commands::voices::list();
            Ok(())
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
