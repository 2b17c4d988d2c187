use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sitekit_common::{FileSystem, PageId, RealFileSystem};
use sitekit_editor::{Catalog, EditSession, EditorConfig, FlushPolicy};
use sitekit_workspace::{run_script, EditCommand, WorkspaceState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitekit - section editing for the site builder
#[derive(Parser, Debug)]
#[command(name = "sitekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the section order, visibility and addable sections
    Sections {
        /// Project file
        project: PathBuf,
    },

    /// Replay an edit script against a project and save it
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Project file
    project: PathBuf,

    /// JSON array of edit commands
    script: PathBuf,

    /// Page to edit (defaults to the project's active page)
    #[arg(long)]
    page: Option<String>,

    /// Directory holding sitekit.config.json (defaults to the project's directory)
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match cli.command {
        Command::Sections { project } => sections(fs, &project),
        Command::Apply(args) => apply(fs, args),
    }
}

fn sections(fs: Arc<dyn FileSystem>, path: &Path) -> Result<()> {
    let state = WorkspaceState::load(fs, path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let project = state.project();
    let order = project.effective_order();

    println!("{} {}", "Project:".bright_blue().bold(), project.name);
    if let Some(page) = project.active_page() {
        println!("{} {} ({})", "Page:".bright_blue().bold(), page.title, page.id);
    }

    println!();
    for id in order {
        if project.visibility.is_visible(id.as_str()) {
            println!("  {} {}", "●".green(), id);
        } else {
            println!("  {} {} {}", "○".yellow(), id, "(hidden)".dimmed());
        }
    }

    let catalog = Catalog::standard();
    let addable: Vec<&str> = catalog.addable(order).map(|e| e.id.as_str()).collect();
    println!();
    println!("{} {}", "Addable:".bright_blue().bold(), addable.join(", "));
    Ok(())
}

fn apply(fs: Arc<dyn FileSystem>, args: ApplyArgs) -> Result<()> {
    let config_dir = args
        .config_dir
        .clone()
        .or_else(|| args.project.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let config = EditorConfig::load_from(fs.as_ref(), &config_dir)?;

    let script = fs
        .read_to_string(&args.script)
        .with_context(|| format!("Failed to read {}", args.script.display()))?;
    let commands: Vec<EditCommand> =
        serde_json::from_str(&script).context("Edit script must be a JSON array of commands")?;

    let state = Arc::new(
        WorkspaceState::load(fs, &args.project)
            .with_context(|| format!("Failed to load {}", args.project.display()))?,
    );

    let mut session = EditSession::new(
        "cli",
        config,
        Arc::new(Catalog::standard()),
        state.clone(),
        state.clone(),
        state.structure(),
    );
    session.add_mirror(state.clone());

    if let Some(page) = &args.page {
        session.switch_page(&PageId::from(page.as_str()), FlushPolicy::Discard)?;
    }

    let report = run_script(&mut session, &commands)?;
    session.close(FlushPolicy::Flush);
    let saved = state.save()?;

    println!(
        "{} {} applied, {} skipped",
        "✓".green(),
        report.applied,
        report.skipped.len()
    );
    for (index, reason) in &report.skipped {
        println!("  {} #{}: {}", "⚠".yellow(), index, reason);
    }
    if saved {
        println!("{} {}", "Saved".green().bold(), state.path().display());
    }
    Ok(())
}
