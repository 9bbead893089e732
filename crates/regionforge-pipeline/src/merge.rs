//! Joining staged templates into one configuration.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::staging::StagingArea;

/// Name of the base template once copied into staging.
pub const STAGED_BASE_NAME: &str = "base.pkr.hcl";

/// Name of the intermediate concatenation inside staging.
pub const COMBINED_NAME: &str = "combined.pkr.hcl.tmp";

/// Order in which staged files are joined: per-region files by file name,
/// then the base template.
pub fn merge_order(staging: &StagingArea) -> Result<Vec<PathBuf>> {
    let (mut base, mut files): (Vec<_>, Vec<_>) = staging
        .entries()?
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|n| n != COMBINED_NAME))
        .partition(|p| p.file_name().is_some_and(|n| n == STAGED_BASE_NAME));
    files.append(&mut base);
    Ok(files)
}

/// Read and join `files`, ending every non-empty part with a newline.
pub fn concatenate(files: &[PathBuf]) -> Result<String> {
    let mut joined = String::new();
    for path in files {
        let part = read_text(path)?;
        push_part(&mut joined, &part);
    }
    Ok(joined)
}

fn push_part(joined: &mut String, part: &str) {
    if part.is_empty() {
        return;
    }
    joined.push_str(part);
    if !part.ends_with('\n') {
        joined.push('\n');
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_newline_terminated() {
        let mut joined = String::new();
        push_part(&mut joined, "a {}");
        push_part(&mut joined, "");
        push_part(&mut joined, "b {}\n");
        push_part(&mut joined, "c {}\n\n");
        assert_eq!(joined, "a {}\nb {}\nc {}\n\n");
    }

    #[test]
    fn base_sorts_last_and_combined_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::acquire(dir.path().join("s")).unwrap();
        staging.write("testnet-us-east-1.pkr.hcl", "t").unwrap();
        staging.write(STAGED_BASE_NAME, "base").unwrap();
        staging.write("mainnet-us-east-1.pkr.hcl", "m").unwrap();
        staging.write(COMBINED_NAME, "leftover").unwrap();

        let order = merge_order(&staging).unwrap();
        let names: Vec<_> = order
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "mainnet-us-east-1.pkr.hcl",
                "testnet-us-east-1.pkr.hcl",
                STAGED_BASE_NAME
            ]
        );
        assert_eq!(concatenate(&order).unwrap(), "m\nt\nbase\n");
    }
}
