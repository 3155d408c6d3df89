//! Interface Composer: folds overlays into the key set one target sees
use bindify_core::{ExtensionSelection, ResolvedInterface};

use crate::registry::Registry;

/// Fold every feature up to `ceiling` in ascending rank order, then add the
/// named extensions. Removals only come from features, so the extension
/// order never matters. Names the registry does not know are ignored.
pub fn compose<I, S>(registry: &Registry, ceiling: u32, extensions: I) -> ResolvedInterface
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut interface = ResolvedInterface::default();
    for feature in registry.features().take_while(|f| f.rank <= ceiling) {
        interface.fold_feature(&feature.overlay);
    }
    for name in extensions {
        let name = name.as_ref();
        match registry.extension(name) {
            Some(extension) => interface.union_extension(&extension.overlay),
            None => tracing::debug!(extension = name, "unknown extension ignored"),
        }
    }
    interface
}

/// Bare names of the extensions a selection binds, in registry order
pub fn selected_extensions<'r>(
    registry: &'r Registry,
    selection: &ExtensionSelection,
) -> Vec<&'r str> {
    if let ExtensionSelection::Named(names) = selection {
        for name in names {
            if registry.extension(name).is_none() {
                tracing::warn!(extension = %name, "requested extension not in registry");
            }
        }
    }
    registry
        .extension_names()
        .filter(|name| selection.includes(name))
        .collect()
}
