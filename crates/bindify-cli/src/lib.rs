//! glbindify command line: configuration and the generation pipeline
pub mod cli;
pub mod config;
pub mod pipeline;

pub use config::{resolve, BindifyConfig, DEFAULT_NAMESPACE, SRCDIR_ENV};
pub use pipeline::{generate, probe, ProbeRequest, Target};
