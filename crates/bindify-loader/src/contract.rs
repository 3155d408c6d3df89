//! Loader Contract Generator
//!
//! Turns a registry and the interfaces of one target into the boolean
//! contract the generated `init(major, minor)` implements. The same
//! [`Predicate`] trees are evaluated in-process by [`crate::eval`] and
//! rendered to C by the emitter.

use bindify_core::{ApiKind, ResolvedInterface};
use bindify_registry::{compose, NamespaceFilter, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// PREDICATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum Predicate {
    True,
    /// The command (storage key) resolved to a non-null address
    CommandResolved(String),
    /// The runtime advertised the extension (bare name)
    ExtensionAdvertised(String),
    /// The requested version rank is below this rank
    RequestedBelow(u32),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// `True` when there is nothing to resolve
    pub fn all_resolved<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let parts: Vec<Predicate> = keys
            .into_iter()
            .map(|key| Predicate::CommandResolved(key.clone()))
            .collect();
        if parts.is_empty() {
            Predicate::True
        } else {
            Predicate::All(parts)
        }
    }

    /// Command keys this predicate can depend on
    pub fn commands(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_commands(&mut out);
        out
    }

    fn collect_commands<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Predicate::CommandResolved(key) => {
                out.insert(key.as_str());
            }
            Predicate::All(parts) | Predicate::Any(parts) => {
                for part in parts {
                    part.collect_commands(out);
                }
            }
            Predicate::True | Predicate::ExtensionAdvertised(_) | Predicate::RequestedBelow(_) => {}
        }
    }
}

// ============================================================================
// CONTRACT
// ============================================================================

/// A feature beyond the minimum: required only when the caller asks for
/// its version or a later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGate {
    pub name: String,
    pub rank: u32,
    pub commands: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionFlag {
    /// Bare name (ex: "ARB_debug_output")
    pub name: String,
    /// Member commands that must resolve for the flag to hold
    pub required: BTreeSet<String>,
    /// Members owned by another overlay and left out of the check
    pub exempt: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderContract {
    pub api: ApiKind,
    pub min_version: u32,
    pub max_version: u32,
    /// Every command `init` attempts to resolve
    pub load_set: BTreeSet<String>,
    /// Commands of the features up to the minimum version
    pub base_commands: BTreeSet<String>,
    pub gates: Vec<FeatureGate>,
    pub extensions: Vec<ExtensionFlag>,
}

impl LoaderContract {
    /// Build the contract for the `full` interface, which must have been
    /// composed from `extensions`.
    pub fn generate<I, S>(registry: &Registry, full: &ResolvedInterface, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let api = registry.api();
        let min_version = api.min_version();
        let max_version = registry.max_rank().unwrap_or(min_version);
        let load_set = full.command_keys.clone();

        let base = compose(registry, min_version, None::<&str>);
        let base_commands: BTreeSet<String> = base
            .command_keys
            .intersection(&load_set)
            .cloned()
            .collect();

        let gates: Vec<FeatureGate> = registry
            .features()
            .filter(|feature| feature.rank > min_version)
            .map(|feature| FeatureGate {
                name: feature.name.clone(),
                rank: feature.rank,
                commands: feature
                    .overlay
                    .added_command_keys
                    .intersection(&load_set)
                    .cloned()
                    .collect(),
            })
            .filter(|gate| !gate.commands.is_empty())
            .collect();

        let mut flags = Vec::new();
        for name in extensions {
            let Some(extension) = registry.extension(name.as_ref()) else {
                continue;
            };
            let (exempt, required): (BTreeSet<String>, BTreeSet<String>) = extension
                .overlay
                .added_command_keys
                .iter()
                .filter(|key| load_set.contains(*key))
                .cloned()
                .partition(|key| registry.is_exempt_member(&extension.name, key));
            flags.push(ExtensionFlag {
                name: extension.name.clone(),
                required,
                exempt,
            });
        }
        flags.sort_by(|a, b| a.name.cmp(&b.name));
        flags.dedup_by(|a, b| a.name == b.name);

        tracing::debug!(
            api = %api,
            load = load_set.len(),
            gates = ?gates.iter().map(|g| g.rank).collect::<Vec<_>>(),
            extensions = flags.len(),
            "loader contract generated"
        );

        Self {
            api,
            min_version,
            max_version,
            load_set,
            base_commands,
            gates,
            extensions: flags,
        }
    }

    /// Bind nothing above `ceiling`. The full interface must have been
    /// composed up to the same rank.
    pub fn with_ceiling(mut self, ceiling: u32) -> Self {
        let max_version = self.max_version.min(ceiling);
        self.max_version = max_version;
        self.gates.retain(|gate| gate.rank <= max_version);
        self
    }

    pub fn accepts_version(&self, requested: u32) -> bool {
        (self.min_version..=self.max_version).contains(&requested)
    }

    /// Whether `init` reads the advertised extension list, and so also the
    /// context's actual version
    pub fn enumerates_extensions(&self) -> bool {
        self.api.has_enumerable_extensions()
    }

    /// Name passed to the symbol-resolution facility
    pub fn symbol(&self, key: &str) -> String {
        NamespaceFilter::commands(self.api).qualify(key)
    }

    pub fn extension_predicate(&self, flag: &ExtensionFlag) -> Predicate {
        let mut parts = Vec::with_capacity(flag.required.len() + 1);
        if self.enumerates_extensions() {
            parts.push(Predicate::ExtensionAdvertised(flag.name.clone()));
        }
        parts.extend(
            flag.required
                .iter()
                .map(|key| Predicate::CommandResolved(key.clone())),
        );
        Predicate::All(parts)
    }

    /// Value `init` returns once the version gate has passed
    pub fn result(&self) -> Predicate {
        let mut parts = vec![Predicate::all_resolved(&self.base_commands)];
        parts.extend(self.gates.iter().map(|gate| {
            Predicate::Any(vec![
                Predicate::RequestedBelow(gate.rank),
                Predicate::all_resolved(&gate.commands),
            ])
        }));
        Predicate::All(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_resolved_of_nothing_is_true() {
        assert_eq!(Predicate::all_resolved(&BTreeSet::new()), Predicate::True);
        let keys: BTreeSet<String> = ["Clear".to_string()].into();
        assert_eq!(
            Predicate::all_resolved(&keys),
            Predicate::All(vec![Predicate::CommandResolved("Clear".into())])
        );
    }

    #[test]
    fn test_predicate_commands() {
        let predicate = Predicate::All(vec![
            Predicate::CommandResolved("Clear".into()),
            Predicate::Any(vec![
                Predicate::RequestedBelow(33),
                Predicate::CommandResolved("BindSampler".into()),
            ]),
            Predicate::ExtensionAdvertised("ARB_sync".into()),
        ]);
        assert_eq!(
            predicate.commands().into_iter().collect::<Vec<_>>(),
            vec!["BindSampler", "Clear"]
        );
    }
}
