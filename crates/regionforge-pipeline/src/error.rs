//! Pipeline errors.

use std::path::PathBuf;

use regionforge_template::TemplateError;
use thiserror::Error;

use crate::tool::ToolStep;

/// Errors that end a pipeline run. None of them is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("staging directory {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: invalid region identifier '{region}'")]
    InvalidRegion { line: usize, region: String },

    #[error("substituting {}: {source}", path.display())]
    Template {
        path: PathBuf,
        source: TemplateError,
    },

    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program} {step}` failed ({})", describe_exit(*code))]
    ToolFailed {
        program: String,
        step: ToolStep,
        code: Option<i32>,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl PipelineError {
    /// Process exit status for this failure: the external tool's own status
    /// when it produced one, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ToolFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
