//! Graft - workspace orchestrator
//!
//! Usage:
//!   graft pull [--clone-children]      # Pull a repository and its linked projects
//!   graft push -t fix -m "message"     # Commit and push recursively
//!   graft build [--watch]              # Build libraries in dependency order
//!   graft order                        # Show the library build order
//!   graft linked list|detect|clone     # Inspect linked projects
//!   graft index list|prune             # Inspect the local project index

mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graft_core::build::{BuildOptions, LibraryBuilder};
use graft_core::context::AppContext;
use graft_core::error::is_exit_requested;
use graft_core::fs::LinkMode;
use graft_core::linked::{LinkedProject, SyncAction};
use graft_core::prompt::{AssumeDefaults, Prompter};
use graft_core::sync::{CommitType, PullOptions, PushOptions, SyncOrchestrator};
use graft_core::workspace::{NearestOptions, Project, ProjectKind, WorkspaceRegistry};

use crate::interactive::DialoguerPrompter;

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Multi-repository workspace orchestrator", long_about = None)]
struct Cli {
    /// Answer every prompt with its default (for CI)
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull the enclosing repository, then its linked children
    Pull {
        /// Clone missing linked projects without asking and recurse into children
        #[arg(long)]
        clone_children: bool,

        /// Start location (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Commit and push the enclosing repository, then its linked children
    Push(PushArgs),

    /// Build workspace libraries in dependency order and install them
    Build(BuildArgs),

    /// Print the library build order
    Order {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        path: Option<PathBuf>,
    },

    /// Manage linked projects
    Linked(LinkedArgs),

    /// Inspect the local project index
    Index(IndexArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct PushArgs {
    /// Commit type (feature, fix, chore, refactor, docs, test, perf, ci, build, release, action)
    #[arg(short = 't', long = "type")]
    commit_type: Option<String>,

    /// Commit description
    #[arg(short, long)]
    message: Option<String>,

    /// Issue keys to reference (repeatable)
    #[arg(short, long = "issue")]
    issues: Vec<String>,

    /// Do not recurse into linked children
    #[arg(long)]
    no_recursive: bool,

    path: Option<PathBuf>,
}

#[derive(Args)]
struct BuildArgs {
    /// Install strategy (overrides build.strategy)
    #[arg(long, value_parser = ["link", "copy"])]
    strategy: Option<String>,

    /// Build even when output already exists
    #[arg(long)]
    rebuild: bool,

    /// Keep watch processes running and reinstall on every rebuild
    #[arg(short, long)]
    watch: bool,

    /// Watch every library without asking
    #[arg(long)]
    all: bool,

    path: Option<PathBuf>,
}

#[derive(Args)]
struct LinkedArgs {
    #[command(subcommand)]
    command: LinkedSubcommand,
}

#[derive(Subcommand)]
enum LinkedSubcommand {
    /// Show declared linked projects
    List {
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
        path: Option<PathBuf>,
    },
    /// Show linked projects found on disk
    Detect {
        /// Search below immediate children
        #[arg(short, long)]
        recursive: bool,
        /// Include projects that are not git repositories
        #[arg(long)]
        include_unversioned: bool,
        path: Option<PathBuf>,
    },
    /// Clone declared linked projects that are missing
    Clone { path: Option<PathBuf> },
    /// Declare a linked project
    Add {
        /// Clone path relative to the project
        clone_path: String,
        /// Remote URL (derived from origin when omitted)
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        purpose: Option<String>,
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Remove a linked project declaration
    Remove {
        clone_path: String,
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Args)]
struct IndexArgs {
    #[command(subcommand)]
    command: IndexSubcommand,
}

#[derive(Subcommand)]
enum IndexSubcommand {
    /// List indexed project locations
    List { path: Option<PathBuf> },
    /// Drop locations that no longer exist
    Prune { path: Option<PathBuf> },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graft=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run_cli(cli) {
        if is_exit_requested(&err) {
            eprintln!("{}", style("Aborted.").yellow());
        } else {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    let ctx = AppContext::from_env()?;
    let prompter: Box<dyn Prompter> = if cli.yes {
        Box::new(AssumeDefaults)
    } else {
        Box::new(DialoguerPrompter::new())
    };

    match cli.command {
        Commands::Pull {
            clone_children,
            path,
        } => run_pull(&ctx, prompter.as_ref(), clone_children, path),
        Commands::Push(args) => run_push(&ctx, prompter.as_ref(), args),
        Commands::Build(args) => run_build(&ctx, prompter.as_ref(), args),
        Commands::Order { format, path } => run_order(&ctx, format, path),
        Commands::Linked(args) => run_linked(&ctx, prompter.as_ref(), args),
        Commands::Index(args) => run_index(&ctx, args),
    }
}

fn start_location(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Nearest project accepted by `options`, or the start location itself.
fn locate(
    registry: &Arc<WorkspaceRegistry>,
    start: &Path,
    options: &NearestOptions,
) -> Result<Arc<Project>> {
    registry
        .nearest_to(start, options)
        .or_else(|| registry.resolve(start))
        .ok_or_else(|| anyhow::anyhow!("No project found at {}", start.display()))
}

fn repository_root(registry: &Arc<WorkspaceRegistry>, start: &Path) -> Result<Arc<Project>> {
    locate(
        registry,
        start,
        &NearestOptions {
            find_git_root: true,
            ..Default::default()
        },
    )
}

fn workspace_root(registry: &Arc<WorkspaceRegistry>, start: &Path) -> Result<Arc<Project>> {
    locate(
        registry,
        start,
        &NearestOptions {
            kind: Some(ProjectKind::Manifest),
            only_outside_dependency_folders: true,
            ..Default::default()
        },
    )
}

fn run_pull(
    ctx: &AppContext,
    prompter: &dyn Prompter,
    clone_children: bool,
    path: Option<PathBuf>,
) -> Result<()> {
    let registry = ctx.registry()?;
    let project = repository_root(&registry, &start_location(path)?)?;
    let sync = SyncOrchestrator::new(prompter, ctx.local_index_for(&project));

    let outcome = sync.pull(&project, &PullOptions { clone_children })?;
    println!("{} {} ({:?})", style("✓").green(), project.name(), outcome);
    Ok(())
}

fn run_push(ctx: &AppContext, prompter: &dyn Prompter, args: PushArgs) -> Result<()> {
    let commit_type = args
        .commit_type
        .as_deref()
        .map(str::parse::<CommitType>)
        .transpose()?;
    let registry = ctx.registry()?;
    let project = repository_root(&registry, &start_location(args.path)?)?;
    let sync = SyncOrchestrator::new(prompter, ctx.local_index_for(&project));

    let options = PushOptions {
        commit_type,
        message: args.message,
        issues: args.issues,
        no_recursive: args.no_recursive,
    };
    let outcome = sync.push(&project, &options)?;
    println!("{} {} ({:?})", style("✓").green(), project.name(), outcome);
    Ok(())
}

fn run_build(ctx: &AppContext, prompter: &dyn Prompter, args: BuildArgs) -> Result<()> {
    let strategy = match args.strategy.as_deref() {
        Some("copy") => Some(LinkMode::Copy),
        Some(_) => Some(LinkMode::Symlink),
        None => None,
    };
    let registry = ctx.registry()?;
    let workspace = workspace_root(&registry, &start_location(args.path)?)?;
    let builder =
        LibraryBuilder::new(workspace, prompter).with_selection_store(ctx.selection_store());

    let report = builder.run(&BuildOptions {
        strategy,
        rebuild: args.rebuild,
        watch: args.watch,
        all: args.all,
    })?;

    for name in &report.order {
        let marker = if report.built.contains(name) {
            style("built").green()
        } else {
            style("up to date").dim()
        };
        println!("  {:<40} {}", name, marker);
    }
    println!("Installed into {} location(s)", report.installed.len());
    if let Some(watch) = report.watch {
        for (name, rebuilds) in watch.rebuilds {
            println!("  {:<40} {} rebuild(s)", name, rebuilds);
        }
    }
    Ok(())
}

fn run_order(ctx: &AppContext, format: OutputFormat, path: Option<PathBuf>) -> Result<()> {
    let registry = ctx.registry()?;
    let workspace = workspace_root(&registry, &start_location(path)?)?;
    let builder = LibraryBuilder::new(workspace, &AssumeDefaults);
    let names: Vec<String> = builder.ordered()?.iter().map(|lib| lib.name()).collect();

    match format {
        OutputFormat::Table => {
            if names.is_empty() {
                println!("No libraries found.");
            }
            for (i, name) in names.iter().enumerate() {
                println!("{:>3}. {}", i + 1, name);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
    }
    Ok(())
}

fn run_linked(ctx: &AppContext, prompter: &dyn Prompter, args: LinkedArgs) -> Result<()> {
    let registry = ctx.registry()?;
    match args.command {
        LinkedSubcommand::List { format, path } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            let config = project.linked().get_config()?;
            match format {
                OutputFormat::Table => {
                    if config.projects.is_empty() {
                        println!("No linked projects declared.");
                        return Ok(());
                    }
                    println!("{:<30} {:<10} Remote", "Clone path", "Branch");
                    println!("{}", "-".repeat(70));
                    for entry in &config.projects {
                        let present = entry.clone_location(project.location()).exists();
                        let path = if present {
                            style(entry.relative_clone_path.clone()).green()
                        } else {
                            style(entry.relative_clone_path.clone()).red()
                        };
                        println!(
                            "{:<30} {:<10} {}",
                            path,
                            entry.default_branch.as_deref().unwrap_or("-"),
                            entry.remote_url.as_deref().unwrap_or("-")
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config.projects)?),
            }
        }
        LinkedSubcommand::Detect {
            recursive,
            include_unversioned,
            path,
        } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            for entry in project.linked().detect(recursive, include_unversioned) {
                println!(
                    "{:<30} {}",
                    entry.relative_clone_path,
                    entry.remote_url.as_deref().unwrap_or("(unversioned)")
                );
            }
        }
        LinkedSubcommand::Clone { path } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            let index = ctx.local_index_for(&project);
            let report = project
                .linked()
                .clone_missing(SyncAction::Pull, false, prompter, &index)?;
            for cloned in &report.cloned {
                println!("{} cloned {}", style("✓").green(), cloned.display());
            }
            for skipped in &report.skipped {
                println!("{} skipped {}", style("•").dim(), skipped);
            }
        }
        LinkedSubcommand::Add {
            clone_path,
            url,
            branch,
            purpose,
            path,
        } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            let mut entry = LinkedProject::new(clone_path);
            entry.remote_url = url;
            entry.default_branch = branch;
            entry.purpose = purpose;
            let config = project.linked().add(entry)?;
            println!("{} {} linked project(s) declared", style("✓").green(), config.projects.len());
        }
        LinkedSubcommand::Remove { clone_path, path } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            let config = project.linked().remove(&clone_path)?;
            println!("{} {} linked project(s) declared", style("✓").green(), config.projects.len());
        }
    }
    Ok(())
}

fn run_index(ctx: &AppContext, args: IndexArgs) -> Result<()> {
    let registry = ctx.registry()?;
    match args.command {
        IndexSubcommand::List { path } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            let index = ctx.local_index_for(&project);
            println!("Index: {}", index.path().display());
            for location in index.locations()? {
                println!("  {}", location.display());
            }
        }
        IndexSubcommand::Prune { path } => {
            let project = repository_root(&registry, &start_location(path)?)?;
            let index = ctx.local_index_for(&project);
            let removed = index.prune_missing()?;
            for location in &removed {
                println!("{} removed {}", style("•").dim(), location.display());
            }
            println!("{} entries pruned", removed.len());
        }
    }
    Ok(())
}
