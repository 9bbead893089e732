//! A located project: its directory plus the (possibly default) manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regionforge_pipeline::{Network, PackerTool, PipelineConfig, RegionList};
use regionforge_template::{Environment, SubstOptions, Substituter};

use crate::manifest::RegionforgeManifest;

/// Project directory and configuration. Relative manifest paths resolve
/// against `dir`.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub manifest: RegionforgeManifest,
    /// Whether `manifest` came from a file rather than defaults.
    pub has_manifest: bool,
}

impl Project {
    /// Use `explicit` as the project directory when given, otherwise the
    /// nearest ancestor of `cwd` holding a manifest, otherwise `cwd`.
    pub fn discover(cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(dir) = explicit {
            let dir = cwd.join(dir);
            let manifest = RegionforgeManifest::load_in(&dir)?;
            return Ok(Project {
                has_manifest: manifest.is_some(),
                manifest: manifest.unwrap_or_default(),
                dir,
            });
        }
        Ok(match RegionforgeManifest::find_and_load(cwd)? {
            Some((manifest, dir)) => Project {
                dir,
                manifest,
                has_manifest: true,
            },
            None => Project {
                dir: cwd.to_path_buf(),
                manifest: RegionforgeManifest::default(),
                has_manifest: false,
            },
        })
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.dir.join(path)
    }

    pub fn regions_path(&self) -> PathBuf {
        self.resolve(&self.manifest.inputs.regions)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.resolve(&self.manifest.output.artifact)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.resolve(&self.manifest.output.staging)
    }

    pub fn load_regions(&self) -> Result<RegionList> {
        let path = self.regions_path();
        RegionList::load(&path).with_context(|| format!("loading regions from {}", path.display()))
    }

    pub fn networks(&self) -> Vec<Network> {
        self.manifest
            .inputs
            .networks
            .iter()
            .map(|n| Network::new(n.name.clone(), self.resolve(&n.template)))
            .collect()
    }

    pub fn pipeline_config(&self, build: bool) -> Result<PipelineConfig> {
        Ok(self.config_for(self.load_regions()?, build))
    }

    /// The pipeline configuration for an already loaded region list.
    pub fn config_for(&self, regions: RegionList, build: bool) -> PipelineConfig {
        PipelineConfig {
            regions,
            networks: self.networks(),
            base_template: self.resolve(&self.manifest.inputs.base),
            staging_dir: self.staging_path(),
            artifact: self.artifact_path(),
            region_var: self.manifest.env.region_var.clone(),
            build,
        }
    }

    /// Substitution over `env`; `strict` on the command line overrides the
    /// manifest only to turn strict mode on.
    pub fn substituter(&self, env: Environment, strict: bool) -> Substituter {
        let cfg = &self.manifest.env;
        let mut options = SubstOptions::default().strict(strict || cfg.strict);
        if let Some(only) = &cfg.only {
            // The region variable is always substitutable.
            options = options.only(only.iter().cloned().chain([cfg.region_var.clone()]));
        }
        Substituter::new(env, options)
    }

    /// Build when `--build` was passed or the build flag variable is non-empty.
    pub fn build_requested(&self, flag: bool, env: &Environment) -> bool {
        flag || env.is_set_non_empty(&self.manifest.env.build_flag_var)
    }

    pub fn tool(&self) -> PackerTool {
        let cfg = &self.manifest.tool;
        PackerTool::new(cfg.program.clone())
            .with_validate_args(cfg.validate_args.clone())
            .with_build_args(cfg.build_args.clone())
            .with_working_dir(&self.dir)
    }
}
