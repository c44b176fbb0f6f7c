//! recipe-bump CLI
//!
//! Usage:
//!   recipe-bump run                    Manage open PRs, then bump recipes
//!   recipe-bump prs                    Only manage open PRs
//!   recipe-bump check <recipe-dir>     Look for a newer version, change nothing
//!   recipe-bump candidates <version>   Print the versions that would be probed

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use recipe_bump::batch::{self, BatchOptions, BatchReport};
use recipe_bump::config::{ConfigFile, Overrides, Settings};
use recipe_bump::forge::{GhCli, Identity};
use recipe_bump::http::HttpProbe;
use recipe_bump::{bump, output, recipe, version};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "recipe-bump")]
#[command(about = "Bump recipe versions and shepherd the resulting pull requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the recipes directory
    #[arg(short = 'r', long, global = true)]
    recipes_path: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/recipe-bump/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of recipes to bump in one run
    #[arg(short, long, global = true, conflicts_with = "unbounded")]
    limit: Option<usize>,

    /// Bump every outdated recipe
    #[arg(long, global = true)]
    unbounded: bool,

    /// Run gh and git as the current user instead of the bot
    #[arg(long, global = true)]
    no_bot: bool,

    /// Token for the bot account
    #[arg(long, env = "RECIPE_BUMP_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge or flag open bot PRs, then open PRs for outdated recipes
    Run,

    /// Merge or flag open bot PRs only
    Prs,

    /// Look for a newer version of one recipe without changing anything
    Check {
        /// Recipe directory
        recipe_dir: PathBuf,
    },

    /// Print the candidate versions probed for a version
    Candidates {
        version: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Candidates { version } = &cli.command {
        print_candidates(version);
        return Ok(());
    }

    let file = ConfigFile::load(cli.config.as_deref()).context("Failed to load config")?;
    let settings = Settings::resolve(
        file,
        Overrides {
            recipes_path: cli.recipes_path.clone(),
            bump_limit: cli.limit,
            unbounded: cli.unbounded,
        },
    );
    tracing::debug!(?settings, "resolved settings");
    let probe = HttpProbe::new(settings.http_timeout);

    match &cli.command {
        Commands::Check { recipe_dir } => check(recipe_dir, &probe),
        Commands::Prs => {
            let forge = build_forge(&cli, &settings)?;
            let options = batch_options(&settings, forge.identity());
            let mut report = BatchReport::default();
            batch::manage_open_prs(&forge, &options, &mut report)
                .context("Failed to list open PRs")?;
            report.print_summary();
            Ok(())
        }
        Commands::Run => {
            let forge = build_forge(&cli, &settings)?;
            let options = batch_options(&settings, forge.identity());
            let report = batch::run_batch(&forge, &probe, &options)
                .with_context(|| format!("Batch over {} failed", settings.recipes_path.display()))?;
            report.print_summary();
            Ok(())
        }
        Commands::Candidates { .. } => Ok(()),
    }
}

fn build_forge(cli: &Cli, settings: &Settings) -> Result<GhCli> {
    let recipes_path = std::fs::canonicalize(&settings.recipes_path).with_context(|| {
        format!("Recipes directory not found: {}", settings.recipes_path.display())
    })?;

    let identity = if cli.no_bot {
        Identity::invoking_user(&settings.bot_login)
    } else {
        let token = cli
            .token
            .clone()
            .context("RECIPE_BUMP_TOKEN is not set (use --no-bot to run as the current gh user)")?;
        Identity::bot(
            &settings.bot_login,
            Some(token),
            settings.git_name.clone(),
            settings.git_email.clone(),
        )
    };
    tracing::debug!(?identity, "forge identity");

    Ok(GhCli::new(identity, recipes_path)
        .with_remote(&settings.remote)
        .with_base_branch(&settings.base_branch)
        .with_automerge_label(&settings.automerge_label))
}

fn batch_options(settings: &Settings, identity: &Identity) -> BatchOptions {
    BatchOptions {
        recipes_path: settings.recipes_path.clone(),
        bot_login: identity.login.clone(),
        bump_limit: settings.bump_limit,
        skip: settings.skip.clone(),
        review_label: settings.review_label.clone(),
    }
}

fn check(recipe_dir: &Path, probe: &HttpProbe) -> Result<()> {
    let (recipe_file, dialect) = recipe::find_recipe_file(recipe_dir).with_context(|| {
        format!("No recipe.yaml or rattler_recipe.yaml in {}", recipe_dir.display())
    })?;

    match bump::find_new_version(&recipe_file, dialect, probe)
        .with_context(|| format!("Failed to check {}", recipe_file.display()))?
    {
        Some(found) => {
            println!(
                "{} {} {} {}",
                found.old_version,
                "→".dimmed(),
                found.new_version.green().bold(),
                found.sha256.dimmed()
            );
        }
        None => output::info("No newer version found"),
    }
    Ok(())
}

fn print_candidates(current: &str) {
    let mut any = false;
    for candidate in version::candidates(current) {
        println!("{candidate}");
        any = true;
    }
    if !any {
        output::warning(&format!("'{current}' is not a dotted numeric version"));
    }
}
