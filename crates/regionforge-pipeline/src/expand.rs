//! Per-region template expansion.

use std::path::{Path, PathBuf};

use regionforge_template::Substituter;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::region::Region;
use crate::staging::StagingArea;

/// A named template variant, expanded once per region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub template: PathBuf,
}

impl Network {
    pub fn new(name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Network {
            name: name.into(),
            template: template.into(),
        }
    }

    /// The two variants every project starts with.
    pub fn defaults(template_dir: &Path) -> Vec<Network> {
        ["mainnet", "testnet"]
            .into_iter()
            .map(|name| Network::new(name, template_dir.join(format!("{name}.pkr.hcl"))))
            .collect()
    }
}

/// One expanded (network, region) template in the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub network: String,
    pub region: Region,
    pub path: PathBuf,
}

/// File name of the expansion of `network` for `region`.
pub fn staged_name(network: &str, region: &Region) -> String {
    format!("{network}-{region}.pkr.hcl")
}

/// Expand every network template for one region.
///
/// `region_var` is bound to the region identifier on top of the substituter's
/// environment for these expansions only.
pub fn expand_region(
    region: &Region,
    networks: &[Network],
    region_var: &str,
    substituter: &Substituter,
    staging: &StagingArea,
) -> Result<Vec<StagedFile>> {
    let bound = substituter.bind(region_var, region.as_str());
    let mut staged = Vec::with_capacity(networks.len());

    for network in networks {
        let path = &network.template;
        let source = std::fs::read(path).map_err(|source| PipelineError::Read {
            path: path.clone(),
            source,
        })?;
        let rendered =
            bound
                .substitute_bytes(&source)
                .map_err(|source| PipelineError::Template {
                    path: path.clone(),
                    source,
                })?;
        for name in &rendered.unresolved {
            warn!(variable = %name, template = %path.display(), "unset variable expanded to empty string");
        }

        let output = staging.write(&staged_name(&network.name, region), &rendered.text)?;
        debug!(network = %network.name, %region, file = %output.display(), "staged");
        staged.push(StagedFile {
            network: network.name.clone(),
            region: region.clone(),
            path: output,
        });
    }

    Ok(staged)
}
