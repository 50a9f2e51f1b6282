use clap::{Parser, Subcommand};
use codementor::ai::ProviderKind;
use codementor::config::{Config, ConfigLoader};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse provider kind from string
fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse::<ProviderKind>().map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "codementor")]
#[command(version, about = "AI code review engine for editors and the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        short,
        global = true,
        help = "Config file used in place of .codementor/config.toml"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_parser = parse_provider, help = "Review provider: backend, openrouter")]
    provider: Option<ProviderKind>,

    #[arg(long, global = true, help = "Model to use")]
    model: Option<String>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Review files or directories
    Review {
        #[arg(required = true, help = "Files or directories to review")]
        paths: Vec<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(short = 'j', long, help = "Concurrent reviews (default from config)")]
        concurrency: Option<usize>,
    },

    /// Serve an editor over JSON lines on stdin/stdout
    Bridge,

    /// Show provider status
    Status {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Create .codementor/config.toml with defaults
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcodementor encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Global CLI overrides applied on top of the loaded configuration
struct Overrides {
    config: Option<PathBuf>,
    provider: Option<ProviderKind>,
    model: Option<String>,
}

fn load_config(overrides: &Overrides) -> anyhow::Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => {
            ConfigLoader::load_layers(ConfigLoader::global_config_path().as_deref(), path)?
        }
        None => ConfigLoader::load()?,
    };

    // CLI arguments take precedence over every file and env layer
    if let Some(kind) = overrides.provider {
        config.provider.kind = kind;
    }
    if let Some(model) = &overrides.model {
        config.provider.model = Some(model.clone());
    }

    config.validate()?;
    Ok(config)
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // stdout belongs to command output and the bridge protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let overrides = Overrides {
        config: cli.config,
        provider: cli.provider,
        model: cli.model,
    };

    match cli.command {
        Commands::Review {
            paths,
            format,
            concurrency,
        } => {
            let config = load_config(&overrides)?;
            let rt = Runtime::new()?;
            let failed = rt.block_on(codementor::cli::commands::review::run(
                &config,
                paths,
                &format,
                concurrency,
            ))?;
            if failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Bridge => {
            let config = load_config(&overrides)?;
            let rt = Runtime::new()?;
            rt.block_on(codementor::cli::commands::bridge::run(&config))?;
        }
        Commands::Status { format } => {
            let config = load_config(&overrides)?;
            let rt = Runtime::new()?;
            rt.block_on(codementor::cli::commands::status::run(&config, &format))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                let config = load_config(&overrides)?;
                codementor::cli::commands::config::show(&config, &format)?;
            }
            ConfigAction::Path => {
                codementor::cli::commands::config::path()?;
            }
            ConfigAction::Init { force } => {
                codementor::cli::commands::config::init(force)?;
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
