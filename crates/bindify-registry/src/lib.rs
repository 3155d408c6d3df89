//! Registry resolution engine
//!
//! Builds a [`Registry`] from a parsed schema document, composes
//! [`ResolvedInterface`](bindify_core::ResolvedInterface) views out of its
//! overlays and closes them over the types their commands reference.
pub mod builder;
pub mod compat;
pub mod compose;
pub mod namespace;
pub mod registry;
pub mod types;

pub use builder::RegistryBuilder;
pub use compat::CompatRules;
pub use compose::{compose, selected_extensions};
pub use namespace::NamespaceFilter;
pub use registry::Registry;
pub use types::{is_builtin, resolve_types, type_declarations, BUILTIN_TYPEDEFS};

use bindify_core::BindifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("REGISTRY/expected a <registry> root, found <{0}>")]
    UnexpectedRoot(String),
}

impl From<RegistryError> for BindifyError {
    fn from(err: RegistryError) -> Self {
        BindifyError::Schema {
            path: String::from("<document>"),
            reason: err.to_string(),
        }
    }
}
