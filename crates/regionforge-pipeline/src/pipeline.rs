//! Pipeline orchestrator.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use regionforge_template::Substituter;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::expand::{expand_region, staged_name, Network, StagedFile};
use crate::merge::{concatenate, merge_order, read_text, COMBINED_NAME, STAGED_BASE_NAME};
use crate::region::{Region, RegionList};
use crate::report::{ArtifactDigest, BuildOutcome, RunReport};
use crate::staging::StagingArea;
use crate::tool::ImageTool;

/// Everything a run needs. Paths are used as given; callers resolve them
/// against the project directory.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub regions: RegionList,
    pub networks: Vec<Network>,
    pub base_template: PathBuf,
    pub staging_dir: PathBuf,
    pub artifact: PathBuf,
    /// Variable bound to the region identifier during expansion.
    pub region_var: String,
    /// Run the build step after validation.
    pub build: bool,
}

impl PipelineConfig {
    /// Reject layouts that would make a run unsafe or ambiguous.
    pub fn check(&self) -> Result<()> {
        let invalid = |detail: String| Err(PipelineError::Config { detail });

        if self.networks.is_empty() {
            return invalid("at least one network template is required".into());
        }
        let mut seen = HashSet::new();
        for network in &self.networks {
            if Region::new(&network.name).is_none() {
                return invalid(format!("invalid network name '{}'", network.name));
            }
            if !seen.insert(network.name.as_str()) {
                return invalid(format!("network '{}' is declared twice", network.name));
            }
        }
        if !is_identifier(&self.region_var) {
            return invalid(format!(
                "region variable '{}' is not a valid variable name",
                self.region_var
            ));
        }

        // Compared lexically so `..` cannot hide an overlap.
        let staging = normalize(&self.staging_dir);
        if staging.as_os_str().is_empty() {
            return invalid("staging directory must not be the current directory".into());
        }
        if staging.components().any(|c| c == Component::ParentDir) {
            return invalid(format!(
                "staging directory {} must not climb above its base with '..'",
                self.staging_dir.display()
            ));
        }
        let inputs = self
            .networks
            .iter()
            .map(|n| n.template.as_path())
            .chain([self.base_template.as_path(), self.artifact.as_path()]);
        for path in inputs {
            if normalize(path).starts_with(&staging) {
                return invalid(format!(
                    "{} lies inside the staging directory {}",
                    path.display(),
                    self.staging_dir.display()
                ));
            }
        }

        let artifact = normalize(&self.artifact);
        let overwrites_input = artifact == normalize(&self.base_template)
            || self.networks.iter().any(|n| normalize(&n.template) == artifact);
        if overwrites_input {
            return invalid(format!(
                "artifact {} would overwrite an input template",
                self.artifact.display()
            ));
        }

        // Distinct (network, region) pairs must not share a staged file.
        let mut names: HashMap<String, (&str, &Region)> = HashMap::new();
        for region in &self.regions {
            for network in &self.networks {
                let name = staged_name(&network.name, region);
                match names.get(&name) {
                    Some(&(other, other_region)) if other != network.name => {
                        return invalid(format!(
                            "network '{}' in region '{region}' and network '{other}' in \
                             region '{other_region}' both expand to {name}",
                            network.name
                        ));
                    }
                    Some(_) => {}
                    None => {
                        names.insert(name, (network.name.as_str(), region));
                    }
                }
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Start,
    Expanding { region: Region },
    Merging,
    Validating,
    Building,
    Skipped,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => f.write_str("start"),
            Phase::Expanding { region } => write!(f, "expanding({region})"),
            Phase::Merging => f.write_str("merging"),
            Phase::Validating => f.write_str("validating"),
            Phase::Building => f.write_str("building"),
            Phase::Skipped => f.write_str("skipped"),
            Phase::Done => f.write_str("done"),
            Phase::Failed => f.write_str("failed"),
        }
    }
}

/// Output of the expand-and-merge half of a run.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub artifact: PathBuf,
    pub staged: Vec<StagedFile>,
    pub digest: ArtifactDigest,
}

/// A single run over one configuration.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    substituter: &'a Substituter,
    phase: Phase,
    failed_in: Option<Phase>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, substituter: &'a Substituter) -> Self {
        Pipeline {
            config,
            substituter,
            phase: Phase::Start,
            failed_in: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The phase that was active when the run failed.
    pub fn failed_in(&self) -> Option<&Phase> {
        self.failed_in.as_ref()
    }

    /// Expand, merge and write the final artifact without invoking the tool.
    pub fn render(&mut self) -> Result<RenderOutput> {
        let result = self.expand_and_merge();
        let output = self.settle(result)?;
        self.enter(Phase::Done);
        Ok(output)
    }

    /// The full run: expand, merge, validate, then build if requested.
    pub fn run(&mut self, tool: &mut dyn ImageTool) -> Result<RunReport> {
        let result = self.run_inner(tool);
        self.settle(result)
    }

    fn run_inner(&mut self, tool: &mut dyn ImageTool) -> Result<RunReport> {
        let output = self.expand_and_merge()?;

        self.enter(Phase::Validating);
        tool.validate(&output.artifact)?;

        let build = if self.config.build {
            self.enter(Phase::Building);
            tool.build(&output.artifact)?;
            BuildOutcome::Built
        } else {
            self.enter(Phase::Skipped);
            BuildOutcome::Skipped
        };
        self.enter(Phase::Done);

        Ok(RunReport {
            regions: self.config.regions.iter().map(|r| r.to_string()).collect(),
            networks: self.config.networks.iter().map(|n| n.name.clone()).collect(),
            staged_files: output.staged.len(),
            artifact: output.artifact,
            sha256: output.digest,
            build,
        })
    }

    fn expand_and_merge(&mut self) -> Result<RenderOutput> {
        let config = self.config;
        config.check()?;

        let staging = StagingArea::acquire(&config.staging_dir)?;

        let mut staged = Vec::new();
        for region in &config.regions {
            self.enter(Phase::Expanding {
                region: region.clone(),
            });
            staged.extend(expand_region(
                region,
                &config.networks,
                &config.region_var,
                self.substituter,
                &staging,
            )?);
        }

        self.enter(Phase::Merging);
        staging.copy_in(&config.base_template, STAGED_BASE_NAME)?;
        let order = merge_order(&staging)?;
        debug!(files = order.len(), "merge order resolved");
        let combined_path = staging.write(COMBINED_NAME, &concatenate(&order)?)?;

        let combined = read_text(&combined_path)?;
        let rendered = self
            .substituter
            .substitute(&combined)
            .map_err(|source| PipelineError::Template {
                path: config.artifact.clone(),
                source,
            })?;
        for name in &rendered.unresolved {
            warn!(variable = %name, "unset variable expanded to empty string in merged template");
        }
        write_artifact(&config.artifact, &rendered.text)?;

        staging.close()?;

        Ok(RenderOutput {
            artifact: config.artifact.clone(),
            staged,
            digest: ArtifactDigest::compute(rendered.text.as_bytes()),
        })
    }

    fn enter(&mut self, phase: Phase) {
        match &phase {
            Phase::Expanding { region } => info!(%region, "expanding templates"),
            Phase::Merging => info!("joining staged templates"),
            Phase::Validating => {
                info!(artifact = %self.config.artifact.display(), "validating")
            }
            Phase::Building => info!(artifact = %self.config.artifact.display(), "building"),
            Phase::Skipped => info!("build not requested; skipping build step"),
            Phase::Done => debug!("run complete"),
            Phase::Start | Phase::Failed => {}
        }
        self.phase = phase;
    }

    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            error!(phase = %self.phase, "run failed");
            let phase = std::mem::replace(&mut self.phase, Phase::Failed);
            self.failed_in = Some(phase);
        }
        result
    }
}

fn write_artifact(path: &Path, text: &str) -> Result<()> {
    let write_err = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, text).map_err(write_err)
}
