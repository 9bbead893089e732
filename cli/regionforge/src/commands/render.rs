//! `regionforge render` — expand and merge without invoking the tool.

use anyhow::{Context, Result};
use regionforge_pipeline::Pipeline;
use regionforge_template::Environment;

use crate::commands::run::failure_context;
use crate::project::Project;

/// Write the final artifact and print where it went.
pub fn run(project: &Project, strict: bool) -> Result<()> {
    render_with(project, strict, Environment::from_process())
}

pub(crate) fn render_with(project: &Project, strict: bool, env: Environment) -> Result<()> {
    let config = project.pipeline_config(false)?;
    let substituter = project.substituter(env, strict);

    let mut pipeline = Pipeline::new(&config, &substituter);
    let result = pipeline.render();
    let output = result.with_context(|| failure_context(&pipeline))?;

    println!(
        "Wrote {} ({} region file(s), sha256 {})",
        output.artifact.display(),
        output.staged.len(),
        output.digest
    );
    Ok(())
}
