//! scaffold CLI - create projects and components from versioned templates

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use scaffolder_core::tui::InitArgs;
use scaffolder_core::{ProductConfig, TemplateKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Env var selecting the log level when `--debug` is not given
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// scaffold product configuration
#[derive(Clone)]
pub struct ScaffoldConfig;

impl ProductConfig for ScaffoldConfig {
    fn name(&self) -> &'static str {
        "scaffold"
    }

    fn display_name(&self) -> &'static str {
        "scaffold"
    }

    fn package_name(&self) -> &'static str {
        "scaffold-cli"
    }

    fn default_home_dir(&self) -> &'static str {
        ".scaffold"
    }

    fn home_env(&self) -> &'static str {
        "SCAFFOLD_CLI_HOME"
    }

    fn registry_url_env(&self) -> &'static str {
        "SCAFFOLD_REGISTRY_URL"
    }

    fn default_catalog_url(&self) -> &'static str {
        "https://raw.githubusercontent.com/scaffold-dev/templates/main/catalog.yaml"
    }

    fn catalog_url_env(&self) -> &'static str {
        "SCAFFOLD_CATALOG_URL"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install scaffold-cli --force"
    }
}

#[derive(Parser, Debug)]
#[command(name = "scaffold")]
#[command(about = "CLI for scaffolding projects and components from versioned templates")]
#[command(version)]
pub struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project or component in the current directory
    Init(CliInitArgs),
    /// Publish a template package directory to a local registry (for development use)
    Pack(PackArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Project,
    Component,
}

impl From<KindArg> for TemplateKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Project => TemplateKind::Project,
            KindArg::Component => TemplateKind::Component,
        }
    }
}

#[derive(Parser, Debug, Default)]
pub struct CliInitArgs {
    /// Project or component name
    pub project_name: Option<String>,

    /// Do not ask before using a non-empty directory
    #[arg(short, long)]
    pub force: bool,

    /// Template package name to use
    #[arg(short, long)]
    pub template: Option<String>,

    /// What to create
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Project version (semver)
    #[arg(long = "project-version")]
    pub version: Option<String>,

    /// Component description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Use this template package directory as-is instead of the cache (for development use)
    #[arg(long = "template-path")]
    pub template_path: Option<PathBuf>,

    /// Fetch templates from a local registry directory (for development use)
    #[arg(long = "registry-dir")]
    pub registry_dir: Option<PathBuf>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliInitArgs> for InitArgs {
    fn from(args: CliInitArgs) -> Self {
        InitArgs {
            project_name: args.project_name,
            force: args.force,
            template: args.template,
            kind: args.kind.map(Into::into),
            version: args.version,
            description: args.description,
            template_path: args.template_path,
            registry_dir: args.registry_dir,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Template package directory (must contain package.json)
    pub dir: PathBuf,

    /// Local registry directory to publish into
    #[arg(long = "registry-dir")]
    pub registry_dir: PathBuf,
}

/// Log filter directive: `--debug` wins, then `LOG_LEVEL` ("verbose" means debug), else warn
fn log_filter(debug: bool, log_level: Option<&str>) -> String {
    if debug {
        return "debug".to_string();
    }
    match log_level.map(str::trim) {
        Some("verbose") => "debug".to_string(),
        Some(level) if !level.is_empty() => level.to_string(),
        _ => "warn".to_string(),
    }
}

fn init_tracing(debug: bool) {
    let directive = log_filter(debug, std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = ScaffoldConfig;

    match args.command {
        Some(Command::Init(init_args)) => {
            let result = scaffolder_core::run(&config, init_args.into(), CLI_VERSION).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
        Some(Command::Pack(pack_args)) => {
            let path = scaffolder_core::tui::pack(&pack_args.dir, &pack_args.registry_dir).await?;
            println!("{} {}", "Packed".green().bold(), path.display());
            Ok(())
        }
        None => {
            // No subcommand provided, default to init behavior (interactive mode)
            let result = scaffolder_core::run(&config, InitArgs::default(), CLI_VERSION).await;

            let _ = console::Term::stderr().show_cursor();

            result
        }
    }
}

#[tokio::main]
async fn main() {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();

    // ~/.env may set LOG_LEVEL
    if let Err(e) = scaffolder_core::config::load_user_env_file() {
        exit_with(e);
    }
    init_tracing(args.debug);

    if let Err(e) = run(args).await {
        exit_with(e);
    }
}

fn exit_with(error: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "error:".red().bold(), error);
    std::process::exit(1);
}
