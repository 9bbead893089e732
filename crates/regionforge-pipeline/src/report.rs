//! Run summary.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the final artifact, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactDigest(pub String);

impl ArtifactDigest {
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ArtifactDigest(
            hasher
                .finalize()
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened after validation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildOutcome {
    Built,
    Skipped,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub regions: Vec<String>,
    pub networks: Vec<String>,
    /// Per-region files written to staging (excluding the base copy).
    pub staged_files: usize,
    pub artifact: PathBuf,
    pub sha256: ArtifactDigest,
    pub build: BuildOutcome,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Artifact: {}", self.artifact.display())?;
        writeln!(f, "  SHA-256:  {}", self.sha256)?;
        writeln!(f, "  Regions:  {}", self.regions.len())?;
        writeln!(f, "  Networks: {}", self.networks.join(", "))?;
        writeln!(f, "  Staged:   {} file(s)", self.staged_files)?;
        let build = match self.build {
            BuildOutcome::Built => "built",
            BuildOutcome::Skipped => "skipped",
        };
        writeln!(f, "  Build:    {build}")
    }
}
