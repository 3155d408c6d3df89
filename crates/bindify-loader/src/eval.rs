//! In-process evaluation of a [`LoaderContract`]
//!
//! Mirrors what the generated `init(major, minor)` does, against any
//! [`SymbolResolver`] and, for the API that enumerates its extensions, an
//! [`ExtensionQuery`].

use bindify_core::ApiKind;
use bindify_registry::NamespaceFilter;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::c_void;
use std::ptr::NonNull;
use thiserror::Error;

use crate::contract::{LoaderContract, Predicate};

/// Platform facility turning a full symbol name into an address
pub trait SymbolResolver {
    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>>;
}

impl<F> SymbolResolver for F
where
    F: Fn(&str) -> Option<NonNull<c_void>>,
{
    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>> {
        self(symbol)
    }
}

/// Advertised extension strings of a current context
pub trait ExtensionQuery {
    fn count(&self) -> usize;

    fn name_at(&self, index: usize) -> Option<String>;

    /// Actual `(major, minor)` of the context, when it can be asked
    fn context_version(&self) -> Option<(u32, u32)> {
        None
    }
}

/// A fixed list of advertised extensions, full names (ex: "GL_ARB_sync")
#[derive(Debug, Clone, Default)]
pub struct StaticExtensions {
    names: Vec<String>,
    version: Option<(u32, u32)>,
}

impl StaticExtensions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            version: None,
        }
    }

    pub fn with_version(mut self, major: u32, minor: u32) -> Self {
        self.version = Some((major, minor));
        self
    }
}

impl ExtensionQuery for StaticExtensions {
    fn count(&self) -> usize {
        self.names.len()
    }

    fn name_at(&self, index: usize) -> Option<String> {
        self.names.get(index).cloned()
    }

    fn context_version(&self) -> Option<(u32, u32)> {
        self.version
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadFailure {
    #[error("requested version {requested} outside supported range {min}..={max}")]
    VersionOutOfRange { requested: u32, min: u32, max: u32 },

    #[error("context reports version {actual}, below requested {requested}")]
    ContextTooOld { actual: u32, requested: u32 },

    #[error("no extension query available for this api")]
    ExtensionQueryUnavailable,

    #[error("{} required command(s) unresolved", .missing.len())]
    Unresolved { missing: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub requested: u32,
    pub supported: bool,
    pub resolved: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    /// Final flag per bound extension
    pub extensions: BTreeMap<String, bool>,
    pub failure: Option<LoadFailure>,
}

impl LoadOutcome {
    fn rejected(requested: u32, contract: &LoaderContract, failure: LoadFailure) -> Self {
        Self {
            requested,
            supported: false,
            resolved: BTreeSet::new(),
            missing: BTreeSet::new(),
            extensions: contract
                .extensions
                .iter()
                .map(|flag| (flag.name.clone(), false))
                .collect(),
            failure: Some(failure),
        }
    }
}

/// Facts a predicate is evaluated against
#[derive(Debug, Default)]
pub struct LoadState {
    pub requested: u32,
    pub resolved: BTreeSet<String>,
    pub advertised: BTreeSet<String>,
}

impl Predicate {
    pub fn evaluate(&self, state: &LoadState) -> bool {
        match self {
            Predicate::True => true,
            Predicate::CommandResolved(key) => state.resolved.contains(key),
            Predicate::ExtensionAdvertised(name) => state.advertised.contains(name),
            Predicate::RequestedBelow(rank) => state.requested < *rank,
            Predicate::All(parts) => parts.iter().all(|p| p.evaluate(state)),
            Predicate::Any(parts) => parts.iter().any(|p| p.evaluate(state)),
        }
    }
}

fn version_rank((major, minor): (u32, u32)) -> u32 {
    major.saturating_mul(10).saturating_add(minor)
}

// ============================================================================
// INIT
// ============================================================================

impl LoaderContract {
    pub fn init(
        &self,
        major: u32,
        minor: u32,
        resolver: &dyn SymbolResolver,
        query: Option<&dyn ExtensionQuery>,
    ) -> LoadOutcome {
        let requested = version_rank((major, minor));
        if !self.accepts_version(requested) {
            return LoadOutcome::rejected(
                requested,
                self,
                LoadFailure::VersionOutOfRange {
                    requested,
                    min: self.min_version,
                    max: self.max_version,
                },
            );
        }

        let mut state = LoadState {
            requested,
            ..LoadState::default()
        };
        let mut missing = BTreeSet::new();
        for key in &self.load_set {
            if resolver.resolve(&self.symbol(key)).is_some() {
                state.resolved.insert(key.clone());
            } else {
                missing.insert(key.clone());
            }
        }
        tracing::debug!(
            resolved = state.resolved.len(),
            missing = missing.len(),
            "commands resolved"
        );

        if self.enumerates_extensions() {
            let early = match query {
                None => Some(LoadFailure::ExtensionQueryUnavailable),
                Some(query) => match query.context_version().map(version_rank) {
                    Some(actual) if actual < requested => {
                        Some(LoadFailure::ContextTooOld { actual, requested })
                    }
                    _ => {
                        state.advertised = advertised(query, self.api);
                        None
                    }
                },
            };
            if let Some(failure) = early {
                let mut outcome = LoadOutcome::rejected(requested, self, failure);
                outcome.resolved = state.resolved;
                outcome.missing = missing;
                return outcome;
            }
        }

        let extensions = self
            .extensions
            .iter()
            .map(|flag| {
                let value = self.extension_predicate(flag).evaluate(&state);
                (flag.name.clone(), value)
            })
            .collect();

        let result = self.result();
        let supported = result.evaluate(&state);
        let failure = (!supported).then(|| {
            let needed = self
                .gates
                .iter()
                .filter(|gate| gate.rank <= requested)
                .flat_map(|gate| gate.commands.iter())
                .chain(self.base_commands.iter());
            LoadFailure::Unresolved {
                missing: needed
                    .filter(|key| missing.contains(*key))
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
            }
        });

        LoadOutcome {
            requested,
            supported,
            resolved: state.resolved,
            missing,
            extensions,
            failure,
        }
    }
}

/// Bare names of the advertised extensions in this API's namespace
fn advertised(query: &dyn ExtensionQuery, api: ApiKind) -> BTreeSet<String> {
    let filter = NamespaceFilter::enumerants(api);
    (0..query.count())
        .filter_map(|index| query.name_at(index))
        .filter_map(|name| filter.strip(&name).map(str::to_string))
        .collect()
}
