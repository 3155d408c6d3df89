//! glbindify core: data model, error model, generation context and runner
//!
//! Shared by every stage of the binding generator: the registry builder
//! fills the data model, the composer and loader read it, and emission
//! reports back through [`GenerationReport`].

pub mod api;
pub mod context;
pub mod data_model;
pub mod error;
pub mod runner;

pub use api::{format_version, parse_version, ApiKind, ApiProfile, SymbolKind};
pub use context::{ExtensionSelection, GenerationContext, LookupPreference, ProfilePolicy};
pub use data_model::{
    ArtifactProof, BuildWarning, Command, EnumGroup, EnumValue, Enumerant, ExtensionOverlay,
    FeatureOverlay, GenerationReport, InterfaceStats, OpaqueType, Overlay, Parameter,
    RegistryStats, ResolvedInterface, StepProof,
};
pub use error::BindifyError;
pub use runner::{fingerprint, PipelineRunner};

/// Generator version, echoed into emitted files
pub const BINDIFY_VERSION: &str = env!("CARGO_PKG_VERSION");
