//! Error types for template substitution.

/// Errors that can occur while substituting a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A referenced variable is unset and strict mode is on.
    #[error("variable `{name}` is not set")]
    Undefined {
        /// The variable name as written in the template.
        name: String,
    },

    /// The template is not valid UTF-8.
    #[error("template is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Result type for substitution operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
