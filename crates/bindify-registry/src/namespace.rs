//! Namespace membership of raw schema names
use bindify_core::{ApiKind, SymbolKind};

/// Decides whether a raw name belongs to one API namespace and strips the
/// prefix off the ones that do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceFilter {
    api: ApiKind,
    kind: SymbolKind,
}

impl NamespaceFilter {
    pub fn new(api: ApiKind, kind: SymbolKind) -> Self {
        Self { api, kind }
    }

    pub fn commands(api: ApiKind) -> Self {
        Self::new(api, SymbolKind::Command)
    }

    pub fn enumerants(api: ApiKind) -> Self {
        Self::new(api, SymbolKind::Enumerant)
    }

    pub fn prefix(&self) -> &'static str {
        self.api.prefix(self.kind)
    }

    /// Storage key for `raw`, or `None` when it is not in this namespace.
    /// A name that is nothing but the prefix is rejected.
    pub fn strip<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.trim()
            .strip_prefix(self.prefix())
            .filter(|key| !key.is_empty())
    }

    pub fn qualify(&self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }
}
