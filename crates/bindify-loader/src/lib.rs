//! Loader contract: what the generated `init` checks, and an in-process
//! evaluator for it.
pub mod contract;
pub mod eval;
pub mod resolver;

pub use contract::{ExtensionFlag, FeatureGate, LoaderContract, Predicate};
pub use eval::{
    ExtensionQuery, LoadFailure, LoadOutcome, LoadState, StaticExtensions, SymbolResolver,
};
pub use resolver::{
    default_library, platform_resolver, proc_address_entry, FallbackResolver, LibraryResolver,
    ProcAddressResolver,
};

use bindify_core::BindifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("LOADER/cannot open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("LOADER/{entry} not found in {path}: {reason}")]
    EntryPoint {
        entry: String,
        path: String,
        reason: String,
    },
}

impl From<LoaderError> for BindifyError {
    fn from(err: LoaderError) -> Self {
        let detail = err.to_string();
        let detail = detail.strip_prefix("LOADER/").unwrap_or(&detail);
        BindifyError::Loader(detail.to_string())
    }
}
