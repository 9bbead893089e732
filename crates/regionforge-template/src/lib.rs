//! Environment-variable substitution for regionforge templates.
//!
//! Templates are plain text with `$NAME` and `${NAME}` references, where
//! `NAME` matches `[A-Za-z_][A-Za-z0-9_]*`. This is the `envsubst` dialect:
//!
//! - a reference to an unset variable expands to the empty string
//!   (or fails, in strict mode);
//! - anything that is not a well-formed reference passes through untouched,
//!   so HCL interpolations such as `${var.region}` survive substitution;
//! - there is no escape syntax.
//!
//! ```
//! use regionforge_template::{Environment, SubstOptions, Substituter};
//!
//! let env: Environment = [("AWS_REGION", "eu-west-1")].into_iter().collect();
//! let sub = Substituter::new(env, SubstOptions::default());
//! let out = sub.substitute("region = \"$AWS_REGION\" # ${var.name}").unwrap();
//! assert_eq!(out.text, "region = \"eu-west-1\" # ${var.name}");
//! ```

mod env;
mod error;
mod subst;

pub use env::Environment;
pub use error::{Result, TemplateError};
pub use subst::{Rendered, Segment, SubstOptions, Substituter, Template};
