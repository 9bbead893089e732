//! `regionforge run` — expand, merge, validate and optionally build.

use anyhow::{bail, Context, Result};
use regionforge_pipeline::{ImageTool, Pipeline, RunReport};
use regionforge_template::Environment;
use tracing::debug;

use crate::project::Project;

/// Options for a full run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions<'a> {
    /// `--build`: build even if the build flag variable is unset.
    pub build: bool,
    /// `--strict`: fail on unset variables.
    pub strict: bool,
    /// `--report`: output format (human, json).
    pub report: Option<&'a str>,
}

/// Run the pipeline with the configured external tool.
pub fn run(project: &Project, options: &RunOptions<'_>) -> Result<()> {
    check_report_format(options.report)?;
    let mut tool = project.tool();
    let report = execute(project, options, Environment::from_process(), &mut tool)?;
    print_report(&report, options.report)
}

/// Run the pipeline against an explicit environment and tool.
pub(crate) fn execute(
    project: &Project,
    options: &RunOptions<'_>,
    env: Environment,
    tool: &mut dyn ImageTool,
) -> Result<RunReport> {
    let build = project.build_requested(options.build, &env);
    let config = project.pipeline_config(build)?;
    let substituter = project.substituter(env, options.strict);
    debug!(
        project = %project.dir.display(),
        regions = config.regions.len(),
        build,
        "configuration resolved"
    );

    let mut pipeline = Pipeline::new(&config, &substituter);
    let result = pipeline.run(tool);
    result.with_context(|| failure_context(&pipeline))
}

pub(crate) fn failure_context(pipeline: &Pipeline<'_>) -> String {
    match pipeline.failed_in() {
        Some(phase) => format!("run failed while {phase}"),
        None => "run failed".to_string(),
    }
}

fn check_report_format(format: Option<&str>) -> Result<()> {
    match format {
        None | Some("human") | Some("json") => Ok(()),
        Some(other) => bail!("unknown report format: '{other}'. Choose: human, json"),
    }
}

fn print_report(report: &RunReport, format: Option<&str>) -> Result<()> {
    match format {
        Some("json") => println!("{}", serde_json::to_string_pretty(report)?),
        _ => print!("{report}"),
    }
    Ok(())
}
