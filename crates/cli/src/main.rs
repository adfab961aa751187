mod check;
mod declare;
mod manifest;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cmdtree::AppRunner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use crate::declare::class_decl;
use crate::manifest::{DEFAULT_MANIFEST_NAME, Manifest};

#[derive(Parser)]
#[command(name = "cmdtree")]
#[command(version, about = "Validate, inspect and try out declarative command trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example cmdtree.json manifest
    Init(InitArgs),

    /// Build the command tree of a manifest and report problems
    Check(CheckArgs),

    /// Print the command tree of a manifest
    Tree(TreeArgs),

    /// Run a token sequence against the manifest's command tree
    Run(RunArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Application name (default: directory name)
    #[arg(short, long)]
    name: Option<String>,

    /// Replace an existing manifest
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,

    /// Output JSON report path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct TreeArgs {
    /// Path to the manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_NAME, value_name = "FILE")]
    manifest: PathBuf,

    /// Tokens passed to the command tree (put them after `--`)
    #[arg(last = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Check(args) => check_command(args),
        Commands::Tree(args) => tree(args),
        Commands::Run(args) => run(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let manifest_path =
        manifest::write_default_manifest(&dir, args.name.as_deref(), args.force)?;

    eprintln!("Created: {}", manifest_path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {DEFAULT_MANIFEST_NAME} to declare your commands");
    eprintln!("  2. Run: cmdtree check");
    eprintln!("  3. Run: cmdtree run -- --help");

    Ok(())
}

fn load(path: &Path) -> Result<Manifest> {
    manifest::load_manifest(Some(path))
}

fn runner(manifest: &Manifest) -> Result<AppRunner> {
    AppRunner::new(class_decl(&manifest.app), manifest.settings.clone())
        .context("invalid command declarations")
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let manifest = load(&args.manifest)?;
    let report = check::check_manifest(&args.manifest, &manifest);

    if let Some(output_path) = &args.output {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(output_path, &json)
            .with_context(|| format!("failed to write report: {}", output_path.display()))?;
        if !args.json {
            eprintln!("Report: {}", output_path.display());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    eprintln!("Manifest: {}", report.manifest);
    match &report.error {
        Some(error) => bail!("{error}"),
        None => {
            eprintln!(
                "OK: '{}' declares {} command(s)",
                report.app,
                report.commands.len()
            );
            Ok(())
        }
    }
}

fn tree(args: TreeArgs) -> Result<()> {
    tracing::debug!("executing tree command");

    let manifest = load(&args.manifest)?;
    let runner = runner(&manifest)?;
    print!("{}", check::render_tree(runner.tree()));
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    tracing::debug!(tokens = args.tokens.len(), "executing run command");

    let manifest = load(&args.manifest)?;
    let runner = runner(&manifest)?;
    let code = runner.run(args.tokens);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
