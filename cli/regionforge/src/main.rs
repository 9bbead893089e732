//! regionforge — expand multi-region image templates, validate, and build.

mod commands;
mod logging;
mod manifest;
mod project;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use regionforge_pipeline::PipelineError;

use project::Project;

#[derive(Parser)]
#[command(
    name = "regionforge",
    version,
    about = "Expand, merge, validate and build multi-region machine-image templates"
)]
struct Cli {
    /// Log per-file detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Log warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Project directory (default: nearest directory with regionforge.toml, else cwd)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand, merge and validate; build when requested
    Run {
        /// Build even if the build flag variable (default DO_BUILD) is unset
        #[arg(long)]
        build: bool,
        /// Fail on unset variables instead of expanding them to nothing
        #[arg(long)]
        strict: bool,
        /// Report format (human, json)
        #[arg(long)]
        report: Option<String>,
    },
    /// Expand and merge into the final artifact without invoking the tool
    Render {
        /// Fail on unset variables instead of expanding them to nothing
        #[arg(long)]
        strict: bool,
    },
    /// Show the region list
    Regions,
    /// Check tool availability and project status
    Doctor,
    /// Remove the final artifact and leftover staging files
    Clean,
    /// Create a new project
    Init {
        /// Project directory name
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init { name } = cli.command {
        return commands::init::run(&name);
    }

    let cwd = std::env::current_dir()?;
    let project = Project::discover(&cwd, cli.project.as_deref())?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Run {
            build,
            strict,
            report,
        } => commands::run::run(
            &project,
            &commands::run::RunOptions {
                build,
                strict,
                report: report.as_deref(),
            },
        ),
        Commands::Render { strict } => commands::render::run(&project, strict),
        Commands::Regions => commands::regions::run(&project),
        Commands::Doctor => commands::doctor::run(&project),
        Commands::Clean => commands::clean::run(&project),
    }
}

/// The external tool's exit status when it caused the failure, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map_or(1, PipelineError::exit_code)
}
