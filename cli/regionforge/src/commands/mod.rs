//! CLI command implementations.

pub mod clean;
pub mod doctor;
pub mod init;
pub mod regions;
pub mod render;
pub mod run;
