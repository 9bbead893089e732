//! Multi-region image template pipeline.
//!
//! The pipeline runs strictly in sequence:
//!
//! ```text
//! Start → Expanding(region_0) → … → Expanding(region_n)
//!       → Merging → Validating → Building | Skipped → Done
//! ```
//!
//! Any failure moves to `Failed` and ends the run. Staged files live in a
//! [`StagingArea`] that is purged when acquired and removed on every exit path;
//! only the final artifact survives.

pub mod error;
pub mod expand;
pub mod merge;
pub mod pipeline;
pub mod region;
pub mod report;
pub mod staging;
pub mod tool;

pub use error::{PipelineError, Result};
pub use expand::{expand_region, staged_name, Network, StagedFile};
pub use pipeline::{Phase, Pipeline, PipelineConfig, RenderOutput};
pub use region::{Region, RegionList};
pub use report::{ArtifactDigest, BuildOutcome, RunReport};
pub use staging::StagingArea;
pub use tool::{ImageTool, PackerTool, ToolStep};
