use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repo_artist::cli::ConfigOverrides;
use repo_artist::cli::commands::check::CheckVerdict;
use repo_artist::cli::commands::generate::GenerateOptions;
use repo_artist::cli::commands::preview::PreviewOptions;
use repo_artist::config::{HeroStyle, ShowFormat};
use repo_artist::types::Tier;

/// Exit status of `check` when regeneration is recommended
const EXIT_REGENERATE: u8 = 2;

#[derive(Parser)]
#[command(name = "repo-artist")]
#[command(
    version,
    about = "Infer a repository's architecture and render it as a README hero image"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Args, Debug, Default)]
struct OverrideArgs {
    #[arg(long, help = "Hero style: auto, minimalist, cyberpunk, corporate, sketch, glassmorphism")]
    style: Option<HeroStyle>,
    #[arg(long, help = "Run only this image tier: premium, free, structural")]
    pin: Option<Tier>,
    #[arg(long, help = "LLM provider (gemini, openai, ollama)")]
    provider: Option<String>,
    #[arg(long, help = "Model used for architecture analysis")]
    model: Option<String>,
    #[arg(long, env = "REPO_ARTIST_API_KEY", hide_env_values = true, help = "LLM API key")]
    api_key: Option<String>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            style: args.style,
            pin: args.pin,
            provider: args.provider,
            model: args.model,
            api_key: args.api_key,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the hero image and update the README
    Generate {
        #[arg(help = "Repository path (default: current directory)")]
        path: Option<PathBuf>,
        #[command(flatten)]
        overrides: OverrideArgs,
        #[arg(long, help = "Re-analyze even if a cached architecture matches")]
        refresh_architecture: bool,
        #[arg(long, help = "Regenerate even if a cached image matches")]
        refresh_image: bool,
        #[arg(long, help = "Write the image only")]
        skip_readme: bool,
    },

    /// Render a hero image for a remote repository without modifying it
    Preview {
        #[arg(help = "Git URL to clone")]
        url: String,
        #[arg(long, short, help = "Branch (default: main, then master)")]
        branch: Option<String>,
        #[arg(long, short, default_value = "repo-artist-preview", help = "Output directory")]
        output: PathBuf,
        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Report whether changes since the upstream warrant a new image
    Check {
        #[arg(help = "Repository path (default: current directory)")]
        path: Option<PathBuf>,
        #[arg(long, help = "Revision to compare HEAD against (default: changes.base)")]
        base: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration (merged from all sources)
    Show {
        #[arg(long, help = "Repository path (default: current directory)")]
        path: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: ShowFormat,
    },
    /// Show configuration file paths
    Path {
        #[arg(long, help = "Repository path (default: current directory)")]
        path: Option<PathBuf>,
    },
    /// Write a starter configuration file
    Init {
        #[arg(long, help = "Repository path (default: current directory)")]
        path: Option<PathBuf>,
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
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
        eprintln!("\x1b[31mrepo-artist encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        eprintln!("\n\x1b[33mRe-run with RUST_BACKTRACE=1 and --verbose and include the output when reporting this.\x1b[0m");
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            repo_artist::cli::Output::new().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
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

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let rt = Runtime::new()?;

    match cli.command {
        Commands::Generate {
            path,
            overrides,
            refresh_architecture,
            refresh_image,
            skip_readme,
        } => {
            rt.block_on(repo_artist::cli::commands::generate::run(GenerateOptions {
                path,
                overrides: overrides.into(),
                refresh_architecture,
                refresh_image,
                skip_readme,
                quiet: cli.quiet,
            }))?;
        }
        Commands::Preview {
            url,
            branch,
            output,
            overrides,
        } => {
            rt.block_on(repo_artist::cli::commands::preview::run(PreviewOptions {
                url,
                branch,
                output,
                overrides: overrides.into(),
                quiet: cli.quiet,
            }))?;
        }
        Commands::Check { path, base } => {
            let verdict = rt.block_on(repo_artist::cli::commands::check::run(path, base, cli.quiet))?;
            if verdict == CheckVerdict::RegenerationRecommended {
                return Ok(ExitCode::from(EXIT_REGENERATE));
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { path, format } => {
                repo_artist::cli::commands::config::show(path.as_deref(), format)?;
            }
            ConfigAction::Path { path } => {
                repo_artist::cli::commands::config::path(path.as_deref())?;
            }
            ConfigAction::Init {
                path,
                global,
                force,
            } => {
                repo_artist::cli::commands::config::init(path.as_deref(), global, force)?;
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
