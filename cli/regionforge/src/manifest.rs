//! `regionforge.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name searched for when locating a project.
pub const MANIFEST_FILE: &str = "regionforge.toml";

/// The top-level manifest structure. Every section is optional; an absent
/// manifest behaves like an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionforgeManifest {
    /// Project metadata.
    #[serde(default)]
    pub project: Option<ProjectConfig>,
    /// Input file locations.
    #[serde(default)]
    pub inputs: InputsConfig,
    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
    /// External tool invocation.
    #[serde(default)]
    pub tool: ToolConfig,
    /// Environment variable handling.
    #[serde(default)]
    pub env: EnvConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

/// Input locations, relative to the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Region list file, one identifier per line.
    pub regions: PathBuf,
    /// Base template appended after every per-region template.
    pub base: PathBuf,
    /// Per-network templates, expanded once per region.
    pub networks: Vec<NetworkConfig>,
}

impl Default for InputsConfig {
    fn default() -> Self {
        InputsConfig {
            regions: PathBuf::from("regions.txt"),
            base: PathBuf::from("templates/base.pkr.hcl"),
            networks: vec![
                NetworkConfig::new("mainnet", "templates/mainnet.pkr.hcl"),
                NetworkConfig::new("testnet", "templates/testnet.pkr.hcl"),
            ],
        }
    }
}

/// One `[[inputs.networks]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub template: PathBuf,
}

impl NetworkConfig {
    fn new(name: &str, template: &str) -> Self {
        NetworkConfig {
            name: name.to_string(),
            template: PathBuf::from(template),
        }
    }
}

/// Output locations, relative to the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// The final, validated configuration. Kept after the run.
    pub artifact: PathBuf,
    /// Scratch directory for expanded templates. Purged at the start of a
    /// run and removed at the end.
    pub staging: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            artifact: PathBuf::from("build.pkr.hcl"),
            staging: PathBuf::from(".regionforge-staging"),
        }
    }
}

/// External tool section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub program: String,
    /// Arguments before the artifact path when validating.
    pub validate_args: Vec<String>,
    /// Arguments before the artifact path when building.
    pub build_args: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            program: "packer".to_string(),
            validate_args: vec!["validate".to_string()],
            build_args: vec!["build".to_string()],
        }
    }
}

/// Environment handling section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Variable bound to each region while its templates are expanded.
    pub region_var: String,
    /// Variable whose non-empty value requests the build step.
    pub build_flag_var: String,
    /// Fail on unset variables instead of expanding them to nothing.
    pub strict: bool,
    /// Restrict substitution to these variable names.
    pub only: Option<Vec<String>>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            region_var: "AWS_REGION".to_string(),
            build_flag_var: "DO_BUILD".to_string(),
            strict: false,
            only: None,
        }
    }
}

impl RegionforgeManifest {
    /// Search upward from `start_dir` for a `regionforge.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            if let Some(manifest) = Self::load_in(&dir)? {
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Load `regionforge.toml` from exactly `dir`, if present.
    pub fn load_in(dir: &Path) -> Result<Option<Self>> {
        let candidate = dir.join(MANIFEST_FILE);
        if !candidate.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&candidate)
            .with_context(|| format!("reading {}", candidate.display()))?;
        let manifest = toml::from_str(&content)
            .with_context(|| format!("parsing {}", candidate.display()))?;
        Ok(Some(manifest))
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing regionforge.toml")
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Generate the default manifest for `regionforge init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"

[inputs]
regions = "regions.txt"
base = "templates/base.pkr.hcl"

[[inputs.networks]]
name = "mainnet"
template = "templates/mainnet.pkr.hcl"

[[inputs.networks]]
name = "testnet"
template = "templates/testnet.pkr.hcl"

[output]
artifact = "build.pkr.hcl"

[env]
region_var = "AWS_REGION"
build_flag_var = "DO_BUILD"
"#
        )
    }
}
