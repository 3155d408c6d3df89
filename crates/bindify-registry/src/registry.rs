//! Registry: the tables and overlays of one target API
use bindify_core::{
    ApiKind, BuildWarning, Command, EnumGroup, Enumerant, ExtensionOverlay, FeatureOverlay,
    OpaqueType, RegistryStats,
};
use std::collections::BTreeMap;

use crate::compat::CompatRules;

/// Built once by [`RegistryBuilder`](crate::RegistryBuilder), read-only afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    pub(crate) api: ApiKind,
    pub(crate) compat: CompatRules,
    pub(crate) enumerants: BTreeMap<String, Enumerant>,
    pub(crate) enum_groups: Vec<EnumGroup>,
    pub(crate) commands: BTreeMap<String, Command>,
    pub(crate) types: BTreeMap<String, OpaqueType>,
    pub(crate) features: BTreeMap<u32, FeatureOverlay>,
    pub(crate) extensions: BTreeMap<String, ExtensionOverlay>,
    pub(crate) warnings: Vec<BuildWarning>,
}

impl Registry {
    pub(crate) fn empty(api: ApiKind, compat: CompatRules) -> Self {
        Self {
            api,
            compat,
            enumerants: BTreeMap::new(),
            enum_groups: Vec::new(),
            commands: BTreeMap::new(),
            types: BTreeMap::new(),
            features: BTreeMap::new(),
            extensions: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn api(&self) -> ApiKind {
        self.api
    }

    pub fn compat(&self) -> &CompatRules {
        &self.compat
    }

    pub fn enumerant(&self, key: &str) -> Option<&Enumerant> {
        self.enumerants.get(key)
    }

    pub fn enumerants(&self) -> impl Iterator<Item = &Enumerant> {
        self.enumerants.values()
    }

    pub fn enum_groups(&self) -> &[EnumGroup] {
        &self.enum_groups
    }

    pub fn command(&self, key: &str) -> Option<&Command> {
        self.commands.get(key)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn opaque_type(&self, key: &str) -> Option<&OpaqueType> {
        self.types.get(key)
    }

    /// Feature overlays in ascending rank order
    pub fn features(&self) -> impl Iterator<Item = &FeatureOverlay> {
        self.features.values()
    }

    pub fn feature(&self, rank: u32) -> Option<&FeatureOverlay> {
        self.features.get(&rank)
    }

    /// Highest known feature rank, if any feature applies to this API
    pub fn max_rank(&self) -> Option<u32> {
        self.features.keys().next_back().copied()
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionOverlay> {
        self.extensions.get(name)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &ExtensionOverlay> {
        self.extensions.values()
    }

    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Whether `command`, listed by `extension`, is also added by some other
    /// feature or extension overlay.
    pub fn is_owned_elsewhere(&self, extension: &str, command: &str) -> bool {
        self.features
            .values()
            .any(|feature| feature.overlay.added_command_keys.contains(command))
            || self.extensions.values().any(|other| {
                other.name != extension && other.overlay.added_command_keys.contains(command)
            })
    }

    /// Members of `extension` that are exempt from the all-resolved check
    pub fn is_exempt_member(&self, extension: &str, command: &str) -> bool {
        self.compat.is_exempt(extension) && self.is_owned_elsewhere(extension, command)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            enumerants: self.enumerants.len(),
            enum_groups: self.enum_groups().len(),
            commands: self.commands.len(),
            types: self.types.len(),
            features: self.features.keys().copied().collect(),
            extensions: self.extensions.len(),
        }
    }
}
