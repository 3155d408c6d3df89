//! Generation Context: settings shared by every step of one run
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::api::{format_version, ApiKind};
use crate::error::BindifyError;

/// Which `profile` attributes on `require`/`remove` groups are honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfilePolicy {
    /// Only unprofiled and `core` groups
    #[default]
    Core,
    /// Every `require` group, but only unprofiled and `compatibility`
    /// removals
    Compatibility,
}

impl ProfilePolicy {
    /// Whether a group with this `profile` applies. `removal` is true for
    /// `<remove>` groups.
    pub fn accepts(self, profile: Option<&str>, removal: bool) -> bool {
        let profile = profile.map(str::trim).filter(|p| !p.is_empty());
        match (self, profile) {
            (_, None) => true,
            (ProfilePolicy::Core, Some(p)) => p == "core",
            (ProfilePolicy::Compatibility, Some(p)) => !removal || p == "compatibility",
        }
    }
}

/// How the generated loader matches advertised extension strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupPreference {
    /// Perfect hash when the generator is available, linear chain otherwise
    #[default]
    Auto,
    Gperf,
    Linear,
}

/// Extensions bound by a target
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtensionSelection {
    /// Every extension the registry accepted for the target variant
    #[default]
    All,
    /// Only these bare names (ex: "ARB_debug_output")
    Named(BTreeSet<String>),
}

impl ExtensionSelection {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            ExtensionSelection::All
        } else {
            ExtensionSelection::Named(names)
        }
    }

    pub fn includes(&self, name: &str) -> bool {
        match self {
            ExtensionSelection::All => true,
            ExtensionSelection::Named(names) => names.contains(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub api: ApiKind,
    /// First part of every emitted symbol and file name (ex: "glb")
    pub namespace: String,
    pub schema_path: PathBuf,
    pub out_dir: PathBuf,
    pub profile: ProfilePolicy,
    pub extensions: ExtensionSelection,
    pub lookup: LookupPreference,
    /// Extensions allowed to list commands owned by another overlay
    pub exempt_extensions: BTreeSet<String>,
    pub templates_path: Option<PathBuf>,
    /// Highest version rank to bind, `None` for every feature in the schema
    pub version_ceiling: Option<u32>,
    pub run_id: String,
}

impl GenerationContext {
    pub fn new(api: ApiKind, namespace: impl Into<String>) -> Self {
        Self {
            api,
            namespace: namespace.into(),
            schema_path: PathBuf::from(format!("{}.xml", api.name())),
            out_dir: PathBuf::from("."),
            profile: ProfilePolicy::default(),
            extensions: ExtensionSelection::default(),
            lookup: LookupPreference::default(),
            exempt_extensions: BTreeSet::new(),
            templates_path: None,
            version_ceiling: None,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Upper-cased namespace used for macros (ex: "GLB")
    pub fn macro_prefix(&self) -> String {
        self.namespace.to_ascii_uppercase()
    }

    /// Variant token of the target under the chosen profile (ex: "glcore")
    pub fn variant(&self) -> &'static str {
        self.api.variant_for(self.profile)
    }

    pub fn header_name(&self) -> String {
        format!("{}-{}.h", self.namespace, self.variant())
    }

    pub fn source_name(&self) -> String {
        format!("{}-{}.c", self.namespace, self.variant())
    }

    /// Rank the target is composed up to, given the highest feature rank
    /// the schema defines. Fails when it falls below the API minimum.
    pub fn resolve_ceiling(&self, max_rank: u32) -> Result<u32, BindifyError> {
        let ceiling = self
            .version_ceiling
            .map_or(max_rank, |wanted| wanted.min(max_rank));
        let minimum = self.api.min_version();
        if ceiling < minimum {
            return Err(BindifyError::VersionBelowMinimum {
                api: self.api.to_string(),
                requested: format_version(self.version_ceiling.unwrap_or(max_rank)),
                minimum: format_version(minimum),
            });
        }
        Ok(ceiling)
    }
}
