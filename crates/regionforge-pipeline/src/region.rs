//! Region identifiers and the region list file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// A cloud region identifier such as `us-east-1`.
///
/// Identifiers are opaque to the pipeline but end up in staged file names, so
/// only ASCII letters, digits, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region(String);

impl Region {
    /// Validate and wrap an identifier. Returns `None` if it contains
    /// anything outside `[A-Za-z0-9_-]` or is empty.
    pub fn new(id: &str) -> Option<Self> {
        let valid = !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Region(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of regions to expand, in file order.
///
/// Duplicates are kept; they cause redundant work that rewrites the same
/// staged files with identical content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionList {
    regions: Vec<Region>,
}

impl RegionList {
    pub fn new(regions: Vec<Region>) -> Self {
        RegionList { regions }
    }

    /// Read a region list file: one identifier per line, blank lines and
    /// `#` comments ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl FromStr for RegionList {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let mut regions = Vec::new();
        for (idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let region = Region::new(line).ok_or_else(|| PipelineError::InvalidRegion {
                line: idx + 1,
                region: line.to_string(),
            })?;
            regions.push(region);
        }
        Ok(RegionList { regions })
    }
}

impl<'a> IntoIterator for &'a RegionList {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
