//! The external image-building tool.

use std::fmt;
use std::path::{Path, PathBuf};
use std::io;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{PipelineError, Result};

/// The two tool invocations the pipeline makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStep {
    Validate,
    Build,
}

impl fmt::Display for ToolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStep::Validate => f.write_str("validate"),
            ToolStep::Build => f.write_str("build"),
        }
    }
}

/// Validates and builds a final artifact. Both calls block until the tool
/// exits; a non-success exit is an error.
pub trait ImageTool {
    fn validate(&mut self, artifact: &Path) -> Result<()>;
    fn build(&mut self, artifact: &Path) -> Result<()>;
}

/// Runs Packer (or a compatible program) as a child process.
///
/// The child inherits stdin and stderr. Its stdout is sent to our stderr so
/// that stdout carries only the run report.
#[derive(Debug, Clone)]
pub struct PackerTool {
    program: String,
    validate_args: Vec<String>,
    build_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl Default for PackerTool {
    fn default() -> Self {
        PackerTool::new("packer")
    }
}

impl PackerTool {
    /// A tool invoked as `<program> validate <artifact>` and
    /// `<program> build <artifact>`.
    pub fn new(program: impl Into<String>) -> Self {
        PackerTool {
            program: program.into(),
            validate_args: vec!["validate".to_string()],
            build_args: vec!["build".to_string()],
            working_dir: None,
        }
    }

    /// Replace the arguments placed before the artifact path for validation.
    pub fn with_validate_args(mut self, args: Vec<String>) -> Self {
        self.validate_args = args;
        self
    }

    /// Replace the arguments placed before the artifact path for building.
    pub fn with_build_args(mut self, args: Vec<String>) -> Self {
        self.build_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn invoke(&self, step: ToolStep, artifact: &Path) -> Result<()> {
        let args = match step {
            ToolStep::Validate => &self.validate_args,
            ToolStep::Build => &self.build_args,
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(args).arg(artifact).stdout(Stdio::from(io::stderr()));
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        debug!(program = %self.program, ?args, artifact = %artifact.display(), "invoking tool");

        let status = cmd.status().map_err(|source| PipelineError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(PipelineError::ToolFailed {
                program: self.program.clone(),
                step,
                code: status.code(),
            })
        }
    }
}

impl ImageTool for PackerTool {
    fn validate(&mut self, artifact: &Path) -> Result<()> {
        self.invoke(ToolStep::Validate, artifact)
    }

    fn build(&mut self, artifact: &Path) -> Result<()> {
        self.invoke(ToolStep::Build, artifact)
    }
}
