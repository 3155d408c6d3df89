//! Compatibility rules per target API
//!
//! Two fixed lists live here: extension families skipped at ingestion
//! because they need types the target does not declare, and extensions that
//! may list commands owned by another overlay.
use bindify_core::ApiKind;
use std::collections::BTreeSet;

/// Extensions that may borrow commands from other overlays
const DEFAULT_EXEMPT: &[(ApiKind, &str)] = &[(ApiKind::Gl, "EXT_direct_state_access")];

#[derive(Debug, Clone)]
pub struct CompatRules {
    api: ApiKind,
    exempt: BTreeSet<String>,
}

impl CompatRules {
    pub fn for_api(api: ApiKind) -> Self {
        let exempt = DEFAULT_EXEMPT
            .iter()
            .filter(|(kind, _)| *kind == api)
            .map(|(_, name)| name.to_string())
            .collect();
        Self { api, exempt }
    }

    pub fn with_exempt<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether an extension (bare name) is skipped for this API
    pub fn is_excluded(&self, extension: &str) -> bool {
        match self.api {
            // SGI families reference GLX types that are never declared
            ApiKind::Glx => extension.starts_with("SGI") && !extension.contains("swap_control"),
            ApiKind::Gl | ApiKind::Wgl => false,
        }
    }

    pub fn is_exempt(&self, extension: &str) -> bool {
        self.exempt.contains(extension)
    }

    pub fn exempt_extensions(&self) -> impl Iterator<Item = &str> {
        self.exempt.iter().map(String::as_str)
    }
}
