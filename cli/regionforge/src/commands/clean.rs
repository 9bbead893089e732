//! `regionforge clean` — remove the artifact and leftover staging.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use regionforge_pipeline::RegionList;

use crate::project::Project;

/// Remove the final artifact and any staging directory an interrupted run
/// left behind. Inputs are never touched.
pub fn run(project: &Project) -> Result<()> {
    // Refuse to delete anything when the staging directory overlaps inputs.
    project
        .config_for(RegionList::default(), false)
        .check()
        .context("checking project layout")?;

    remove(&project.artifact_path(), false)?;
    remove(&project.staging_path(), true)
}

fn remove(path: &Path, is_dir: bool) -> Result<()> {
    if !path.exists() {
        println!("Already clean: {} does not exist", path.display());
        return Ok(());
    }
    let removed = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.with_context(|| format!("removing {}", path.display()))?;
    println!("Removed {}", path.display());
    Ok(())
}
