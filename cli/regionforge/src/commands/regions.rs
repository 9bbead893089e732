//! `regionforge regions` — show the parsed region list.

use anyhow::Result;

use crate::project::Project;

pub fn run(project: &Project) -> Result<()> {
    let regions = project.load_regions()?;
    if regions.is_empty() {
        println!(
            "No regions in {} (only the base template will be rendered)",
            project.regions_path().display()
        );
        return Ok(());
    }

    let networks: Vec<_> = project
        .manifest
        .inputs
        .networks
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    println!(
        "{} region(s) x {} network(s) from {}:",
        regions.len(),
        networks.len(),
        project.regions_path().display()
    );
    for (idx, region) in regions.iter().enumerate() {
        println!("  {:>3}. {region}", idx + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn lists_regions_and_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::discover(Path::new("/"), Some(dir.path())).unwrap();

        // Missing file is an error with the path in context.
        let err = run(&project).unwrap_err();
        assert!(format!("{err:#}").contains("regions.txt"));

        std::fs::write(dir.path().join("regions.txt"), "us-east-1\nus-west-2\n").unwrap();
        run(&project).unwrap();

        std::fs::write(dir.path().join("regions.txt"), "").unwrap();
        run(&project).unwrap();

        std::fs::write(dir.path().join("regions.txt"), "us east\n").unwrap();
        assert!(run(&project).is_err());
    }
}
