//! Charm-style CLI prompts using cliclack

use crate::cache::{ArtifactCache, StoreLocation};
use crate::catalog::{Catalog, CatalogEntry, TemplateKind};
use crate::config::Settings;
use crate::context::{is_valid_name, ProjectInfo, RenderContext};
use crate::exec::SystemRunner;
use crate::install::{InstallOutcome, Installer};
use crate::materialize::{empty_dir, is_dir_empty};
use crate::product::ProductConfig;
use crate::registry::{HttpRegistry, LocalRegistry, Registry};
use crate::version::{check_for_update, parse_version};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// CLI arguments for the init command
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    /// Project or component name
    pub project_name: Option<String>,

    /// Skip the "directory is not empty" confirmation
    pub force: bool,

    /// Template package name to use
    pub template: Option<String>,

    pub kind: Option<TemplateKind>,

    /// Project version (semver)
    pub version: Option<String>,

    /// Component description
    pub description: Option<String>,

    /// Use this package directory as-is instead of the versioned cache
    pub template_path: Option<PathBuf>,

    /// Fetch templates from a local registry directory
    pub registry_dir: Option<PathBuf>,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the init flow with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: InitArgs, cli_version: &str) -> Result<()> {
    cliclack::intro(config.display_name())?;

    let settings = Settings::load(config)?;
    debug!(?settings, "resolved settings");

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent())
        .build()
        .context("Failed to create HTTP client")?;

    // Step 1: Warn about a newer CLI release
    warn_if_outdated(config, &settings, cli_version).await?;

    // Step 2: Load the template catalog
    let catalog = load_catalog(&settings, &client).await?;

    // Step 3: Make sure the target directory may be used
    let target_dir = std::env::current_dir().context("Failed to read current directory")?;
    if !prepare_target(&target_dir, &args).await? {
        cliclack::outro_cancel("Setup cancelled.")?;
        return Ok(());
    }

    // Step 4: Collect project info
    let kind = select_kind(&args)?;
    let name = input_name(kind, &args)?;
    let version = input_version(&args)?;
    let entry = select_template(&catalog, kind, &args)?;
    let description = match kind {
        TemplateKind::Component => Some(input_description(&args)?),
        TemplateKind::Project => None,
    };

    let context = ProjectInfo {
        kind,
        name: name.clone(),
        version,
        description,
        template: entry.name.clone(),
    }
    .into_render_context()?;

    // Step 5: Download and install
    let installer = build_installer(&settings, &args, config);
    let outcome = install(&installer, entry, &context, &target_dir).await?;

    // Step 6: Show next steps
    print_next_steps(entry, &outcome, &name)?;

    Ok(())
}

async fn warn_if_outdated<C: ProductConfig>(
    config: &C,
    settings: &Settings,
    cli_version: &str,
) -> Result<()> {
    let registry = HttpRegistry::new(settings.registry_url.clone(), config.user_agent());
    match registry.latest_version(config.package_name()).await {
        Ok(latest) => {
            if let Some(warning) =
                check_for_update(cli_version, &latest.to_string(), config.upgrade_command())
            {
                cliclack::log::warning(warning)?;
            }
        }
        Err(e) => debug!(error = %e, "update check skipped"),
    }
    Ok(())
}

async fn load_catalog(settings: &Settings, client: &reqwest::Client) -> Result<Catalog> {
    let spinner = cliclack::spinner();
    spinner.start("Loading templates...");

    let catalog = match settings.catalog.load(client).await {
        Ok(catalog) => catalog,
        Err(e) => {
            spinner.stop("Failed to load templates");
            return Err(e);
        }
    };

    if catalog.is_empty() {
        spinner.stop("Failed to load templates");
        anyhow::bail!("No templates available.");
    }

    spinner.stop(format!("Loaded {} templates", catalog.len()));
    Ok(catalog)
}

/// Returns false when the user declines to use a non-empty directory
async fn prepare_target(target_dir: &Path, args: &InitArgs) -> Result<bool> {
    if is_dir_empty(target_dir).await? {
        return Ok(true);
    }

    if !args.force {
        cliclack::log::warning(format!("{} is not empty", target_dir.display()))?;
        let proceed = if args.yes {
            true
        } else {
            cliclack::confirm("Continue creating the project here?")
                .initial_value(false)
                .interact()?
        };
        if !proceed {
            return Ok(false);
        }
    }

    // Clearing is only automatic when both --yes and --force are given
    let clear = if args.yes {
        args.force
    } else {
        cliclack::confirm("Remove every file in this directory first?")
            .initial_value(false)
            .interact()?
    };

    if clear {
        empty_dir(target_dir).await?;
        cliclack::log::info(format!("Cleared {}", target_dir.display()))?;
    }

    Ok(true)
}

fn select_kind(args: &InitArgs) -> Result<TemplateKind> {
    if let Some(kind) = args.kind {
        return Ok(kind);
    }
    if args.yes {
        return Ok(TemplateKind::Project);
    }

    let kind = cliclack::select("What do you want to create?")
        .item(TemplateKind::Project, TemplateKind::Project.display_name(), "")
        .item(TemplateKind::Component, TemplateKind::Component.display_name(), "")
        .interact()?;
    Ok(kind)
}

fn input_name(kind: TemplateKind, args: &InitArgs) -> Result<String> {
    if let Some(name) = args.project_name.as_deref().filter(|n| is_valid_name(n)) {
        cliclack::log::info(format!("{} name: {}", kind, name))?;
        return Ok(name.to_string());
    }
    if let Some(name) = &args.project_name {
        cliclack::log::warning(format!("'{}' is not a valid {} name", name, kind.as_str()))?;
    }
    if args.yes {
        anyhow::bail!("A valid {} name is required", kind.as_str());
    }

    let name: String = cliclack::input(format!("{} name", kind))
        .placeholder("my-app")
        .validate(|input: &String| {
            if is_valid_name(input) {
                Ok(())
            } else {
                Err("Use letters and digits, separated by single '-' or '_'")
            }
        })
        .interact()?;
    Ok(name)
}

fn input_version(args: &InitArgs) -> Result<String> {
    if let Some(version) = &args.version {
        parse_version(version)?;
        return Ok(version.clone());
    }
    if args.yes {
        return Ok("1.0.0".to_string());
    }

    let version: String = cliclack::input("Version")
        .placeholder("1.0.0")
        .default_input("1.0.0")
        .validate(|input: &String| match parse_version(input) {
            Ok(_) => Ok(()),
            Err(_) => Err("Enter a semver version such as 1.0.0"),
        })
        .interact()?;
    Ok(version)
}

fn select_template<'a>(
    catalog: &'a Catalog,
    kind: TemplateKind,
    args: &InitArgs,
) -> Result<&'a CatalogEntry> {
    let candidates = catalog.for_kind(kind);

    if let Some(name) = &args.template {
        // Asking for a rejected record by name surfaces its error
        let entry = catalog
            .select(name)?
            .filter(|entry| entry.supports(kind))
            .with_context(|| {
                let available: Vec<&str> = candidates.iter().map(|e| e.name.as_str()).collect();
                format!(
                    "Template '{}' not found. Available templates: {}",
                    name,
                    available.join(", ")
                )
            })?;
        cliclack::log::info(format!("Using template: {}", entry.display_name))?;
        return Ok(entry);
    }

    if candidates.is_empty() {
        anyhow::bail!("No {} templates available.", kind.as_str());
    }
    if candidates.len() == 1 || args.yes {
        let entry = candidates[0];
        cliclack::log::info(format!("Using template: {}", entry.display_name))?;
        return Ok(entry);
    }

    let mut select = cliclack::select("Select a template");
    for (idx, entry) in candidates.iter().enumerate() {
        select = select.item(idx, &entry.display_name, &entry.name);
    }
    let selected_idx: usize = select.interact()?;

    candidates
        .get(selected_idx)
        .copied()
        .context("Selected template is out of range")
}

fn input_description(args: &InitArgs) -> Result<String> {
    if let Some(description) = args.description.as_deref().filter(|d| !d.trim().is_empty()) {
        return Ok(description.to_string());
    }
    if args.yes {
        anyhow::bail!("A component needs a description (--description)");
    }

    let description: String = cliclack::input("Component description")
        .validate(|input: &String| {
            if input.trim().is_empty() {
                Err("Description is required")
            } else {
                Ok(())
            }
        })
        .interact()?;
    Ok(description)
}

fn build_installer<C: ProductConfig>(settings: &Settings, args: &InitArgs, config: &C) -> Installer {
    let registry: Arc<dyn Registry> = match &args.registry_dir {
        Some(dir) => Arc::new(LocalRegistry::new(dir.clone())),
        None => Arc::new(HttpRegistry::new(
            settings.registry_url.clone(),
            config.user_agent(),
        )),
    };

    let location = match &args.template_path {
        Some(path) => StoreLocation::Direct {
            target_path: path.clone(),
        },
        None => StoreLocation::Cached {
            store_root: settings.store_root.clone(),
        },
    };

    Installer::new(ArtifactCache::new(registry, location), Arc::new(SystemRunner))
}

async fn install(
    installer: &Installer,
    entry: &CatalogEntry,
    context: &RenderContext,
    target_dir: &Path,
) -> Result<InstallOutcome> {
    let spinner = cliclack::spinner();
    spinner.start(format!("Downloading {}...", entry.display_name));

    let artifact = match installer.acquire(entry).await {
        Ok(artifact) => artifact,
        Err(e) => {
            spinner.stop("Download failed");
            return Err(e.into());
        }
    };
    spinner.stop(format!("Template ready: {}@{}", artifact.name, artifact.version));

    // Template commands write to the terminal, so no spinner from here on
    cliclack::log::step(format!("Installing with the {} strategy", entry.strategy))?;
    let outcome = installer
        .materialize(entry, artifact, context, target_dir)
        .await?;

    cliclack::log::success(format!(
        "Installed {} ({} files rendered)",
        entry.display_name, outcome.rendered_files
    ))?;
    Ok(outcome)
}

fn print_next_steps(entry: &CatalogEntry, outcome: &InstallOutcome, name: &str) -> Result<()> {
    println!();
    println!("  Next steps");
    println!();

    let mut steps = Vec::new();
    if entry.install_command.is_none() {
        steps.push("npm install".to_string());
    }
    if entry.start_command.is_none() {
        steps.push("npm run dev".to_string());
    }
    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro(format!(
        "{} created from {}@{}",
        name, outcome.artifact.name, outcome.artifact.version
    ))?;

    Ok(())
}

/// Publish a template package directory to a local registry
pub async fn pack(package_dir: &Path, registry_dir: &Path) -> Result<PathBuf> {
    let spinner = cliclack::spinner();
    spinner.start(format!("Packing {}...", package_dir.display()));

    let registry = LocalRegistry::new(registry_dir);
    match registry.publish(package_dir).await {
        Ok(path) => {
            spinner.stop(format!("Published {}", path.display()));
            Ok(path)
        }
        Err(e) => {
            spinner.stop("Pack failed");
            Err(e)
        }
    }
}
