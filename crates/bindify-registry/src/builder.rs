//! Registry Builder: fills a [`Registry`] from walker events.
//!
//! The top-level walk over `<registry>` only routes. Each block it cares
//! about is handed to one variant of the closed [`Handler`] enum, which
//! walks that block's subtree and then commits what it collected.
//!
//! ```text
//! registry ─┬─ enums ─────────────── Handler::Enums
//!           ├─ commands ─ command ── Handler::Command
//!           ├─ types ──── type ───── Handler::Type
//!           ├─ feature ───────────── Handler::Overlay (feature)
//!           └─ extensions ─ extension Handler::Overlay (extension)
//! ```

use bindify_core::{
    parse_version, ApiKind, BuildWarning, Command, EnumGroup, EnumValue, Enumerant,
    ExtensionOverlay, FeatureOverlay, OpaqueType, Overlay, Parameter, ProfilePolicy,
};
use bindify_schema::{walk, Ancestry, SchemaNode, Visitor};
use std::collections::{BTreeMap, BTreeSet};

use crate::compat::CompatRules;
use crate::namespace::NamespaceFilter;
use crate::registry::Registry;
use crate::RegistryError;

pub struct RegistryBuilder {
    scope: Scope,
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new(api: ApiKind, policy: ProfilePolicy) -> Self {
        Self::with_compat(api, policy, CompatRules::for_api(api))
    }

    pub fn with_compat(api: ApiKind, policy: ProfilePolicy, compat: CompatRules) -> Self {
        Self {
            scope: Scope::new(api, policy),
            registry: Registry::empty(api, compat),
        }
    }

    /// Walk one parsed document into the registry.
    pub fn ingest(&mut self, root: &SchemaNode) -> Result<&mut Self, RegistryError> {
        if !root.is("registry") {
            return Err(RegistryError::UnexpectedRoot(root.tag.clone()));
        }
        let mut router = Router {
            scope: self.scope,
            registry: &mut self.registry,
        };
        walk(root, &mut router);
        Ok(self)
    }

    /// Cross-check overlay commands against the command table and hand
    /// over the finished registry.
    pub fn finish(mut self) -> Registry {
        let mut missing = Vec::new();
        let overlays = self
            .registry
            .features
            .values()
            .map(|f| (f.name.as_str(), &f.overlay))
            .chain(
                self.registry
                    .extensions
                    .values()
                    .map(|e| (e.name.as_str(), &e.overlay)),
            );
        for (name, overlay) in overlays {
            for key in overlay.command_keys() {
                if !self.registry.commands.contains_key(key) {
                    missing.push(BuildWarning::UnknownOverlayCommand {
                        overlay: name.to_string(),
                        command: key.clone(),
                    });
                }
            }
        }
        for warning in missing {
            tracing::warn!("{}", warning);
            self.registry.warnings.push(warning);
        }

        tracing::info!(
            api = %self.registry.api,
            enumerants = self.registry.enumerants.len(),
            commands = self.registry.commands.len(),
            types = self.registry.types.len(),
            features = self.registry.features.len(),
            extensions = self.registry.extensions.len(),
            "registry built"
        );
        self.registry
    }
}

/// Settings every handler needs, cheap to copy
#[derive(Debug, Clone, Copy)]
struct Scope {
    api: ApiKind,
    policy: ProfilePolicy,
    enums: NamespaceFilter,
    commands: NamespaceFilter,
}

impl Scope {
    fn new(api: ApiKind, policy: ProfilePolicy) -> Self {
        Self {
            api,
            policy,
            enums: NamespaceFilter::enumerants(api),
            commands: NamespaceFilter::commands(api),
        }
    }

    /// An optional `api` attribute either is absent or names the target
    fn api_matches(&self, node: &SchemaNode) -> bool {
        node.non_empty_attr("api")
            .map_or(true, |api| api.trim() == self.api.name())
    }
}

fn warn(warnings: &mut Vec<BuildWarning>, warning: BuildWarning) {
    tracing::warn!("{}", warning);
    warnings.push(warning);
}

// ============================================================================
// ROUTER
// ============================================================================

struct Router<'r> {
    scope: Scope,
    registry: &'r mut Registry,
}

impl Visitor for Router<'_> {
    fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool {
        let parent = ancestry.parent().map(|p| p.tag.as_str()).unwrap_or("");
        let mut handler = match (node.tag.as_str(), parent) {
            ("commands" | "types" | "extensions", "registry") => return true,
            ("enums", "registry") => Handler::Enums(EnumsHandler::new(self.scope)),
            ("command", "commands") => Handler::Command(CommandHandler::new(self.scope)),
            ("type", "types") => Handler::Type(TypeHandler::new(self.scope)),
            ("feature", "registry") => Handler::Overlay(OverlayHandler::new(
                self.scope,
                OverlayKind::Feature,
                &self.registry.compat,
            )),
            ("extension", "extensions") => Handler::Overlay(OverlayHandler::new(
                self.scope,
                OverlayKind::Extension,
                &self.registry.compat,
            )),
            _ => return false,
        };
        walk(node, &mut handler);
        handler.into_collected().commit(self.registry);
        false
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// One variant per schema block kind
enum Handler<'c> {
    Enums(EnumsHandler),
    Command(CommandHandler),
    Type(TypeHandler),
    Overlay(OverlayHandler<'c>),
}

impl Handler<'_> {
    /// Drop any borrow of the registry before committing to it
    fn into_collected(self) -> Collected {
        match self {
            Handler::Enums(h) => Collected::Enums(h),
            Handler::Command(h) => Collected::Command(h),
            Handler::Type(h) => Collected::Type(h),
            Handler::Overlay(h) => Collected::Overlay(h.into_block()),
        }
    }
}

impl Visitor for Handler<'_> {
    fn enter_root(&mut self, node: &SchemaNode) -> bool {
        match self {
            Handler::Enums(h) => h.enter_root(node),
            Handler::Command(_) => true,
            Handler::Type(h) => h.enter_root(node),
            Handler::Overlay(h) => h.enter_root(node),
        }
    }

    fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool {
        match self {
            Handler::Enums(h) => h.enter(node),
            Handler::Command(h) => h.enter(node, ancestry),
            Handler::Type(h) => h.enter(node, ancestry),
            Handler::Overlay(h) => h.enter(node, ancestry),
        }
    }

    fn text(&mut self, text: &str, ancestry: Ancestry<'_>) {
        match self {
            Handler::Command(h) => h.text(text, ancestry),
            Handler::Type(h) => h.text(text, ancestry),
            Handler::Enums(_) | Handler::Overlay(_) => {}
        }
    }
}

enum Collected {
    Enums(EnumsHandler),
    Command(CommandHandler),
    Type(TypeHandler),
    Overlay(Option<OverlayBlock>),
}

impl Collected {
    fn commit(self, registry: &mut Registry) {
        match self {
            Collected::Enums(h) => h.commit(registry),
            Collected::Command(h) => h.commit(registry),
            Collected::Type(h) => h.commit(registry),
            Collected::Overlay(Some(block)) => block.commit(registry),
            Collected::Overlay(None) => {}
        }
    }
}

// ----------------------------------------------------------------------------
// <enums>
// ----------------------------------------------------------------------------

struct EnumsHandler {
    scope: Scope,
    group: EnumGroup,
    enumerants: Vec<Enumerant>,
    warnings: Vec<BuildWarning>,
}

impl EnumsHandler {
    fn new(scope: Scope) -> Self {
        Self {
            scope,
            group: EnumGroup::default(),
            enumerants: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn enter_root(&mut self, node: &SchemaNode) -> bool {
        self.group.name = node.non_empty_attr("group").map(str::to_string);
        true
    }

    fn enter(&mut self, node: &SchemaNode) -> bool {
        if !node.is("enum") || !self.scope.api_matches(node) {
            return false;
        }
        let Some(raw) = node.attr("name") else {
            return false;
        };
        // Names from other namespaces are dropped without a word
        let Some(key) = self.scope.enums.strip(raw) else {
            return false;
        };

        match node.attr("value") {
            Some(text) => {
                let value = EnumValue::parse(text);
                if !value.is_resolved() {
                    warn(
                        &mut self.warnings,
                        BuildWarning::SymbolicEnumValue {
                            name: raw.to_string(),
                            value: text.to_string(),
                        },
                    );
                }
                self.group.keys.push(key.to_string());
                self.enumerants.push(Enumerant {
                    key: key.to_string(),
                    value,
                });
            }
            None => warn(
                &mut self.warnings,
                BuildWarning::MissingEnumValue {
                    name: raw.to_string(),
                },
            ),
        }
        false
    }

    fn commit(self, registry: &mut Registry) {
        for enumerant in self.enumerants {
            registry
                .enumerants
                .entry(enumerant.key.clone())
                .or_insert(enumerant);
        }
        if !self.group.keys.is_empty() {
            registry.enum_groups.push(self.group);
        }
        registry.warnings.extend(self.warnings);
    }
}

// ----------------------------------------------------------------------------
// <command>
// ----------------------------------------------------------------------------

struct CommandHandler {
    scope: Scope,
    key: Option<String>,
    return_type: String,
    return_declaration: String,
    parameters: Vec<Parameter>,
    /// Set once the proto name turns out to be in another namespace
    discarded: bool,
}

impl CommandHandler {
    fn new(scope: Scope) -> Self {
        Self {
            scope,
            key: None,
            return_type: String::new(),
            return_declaration: String::new(),
            parameters: Vec::new(),
            discarded: false,
        }
    }

    fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool {
        if self.discarded {
            return false;
        }
        let top_level = ancestry.depth() == 1;
        match node.tag.as_str() {
            "proto" => top_level,
            "param" if top_level => {
                self.parameters.push(Parameter::default());
                true
            }
            "ptype" | "name" => ancestry.parent_is("proto") || ancestry.parent_is("param"),
            _ => false,
        }
    }

    fn text(&mut self, text: &str, ancestry: Ancestry<'_>) {
        if self.discarded {
            return;
        }
        let Some(parent) = ancestry.parent() else {
            return;
        };
        match parent.tag.as_str() {
            "proto" => self.return_declaration.push_str(text),
            "param" => {
                if let Some(param) = self.parameters.last_mut() {
                    param.raw_declaration_text.push_str(text);
                }
            }
            "ptype" if ancestry.stack_is("ptype", "proto") => {
                self.return_type.push_str(text);
                self.return_declaration.push_str(text);
            }
            "ptype" if ancestry.stack_is("ptype", "param") => {
                if let Some(param) = self.parameters.last_mut() {
                    param.declared_type.push_str(text);
                    param.raw_declaration_text.push_str(text);
                }
            }
            "name" if ancestry.stack_is("name", "proto") => {
                match self.scope.commands.strip(text) {
                    Some(key) => self.key = Some(key.to_string()),
                    None => {
                        tracing::debug!(command = text.trim(), "command outside namespace, discarded");
                        self.discarded = true;
                    }
                }
            }
            "name" if ancestry.stack_is("name", "param") => {
                if let Some(param) = self.parameters.last_mut() {
                    param.name.push_str(text.trim());
                }
            }
            _ => {}
        }
    }

    fn commit(self, registry: &mut Registry) {
        if self.discarded {
            return;
        }
        let Some(key) = self.key else {
            return;
        };
        let command = Command::new(
            key.clone(),
            self.return_type,
            &self.return_declaration,
            self.parameters,
        );
        registry.commands.entry(key).or_insert(command);
    }
}

// ----------------------------------------------------------------------------
// <type>
// ----------------------------------------------------------------------------

struct TypeHandler {
    scope: Scope,
    accepted: bool,
    api: Option<String>,
    name: Option<String>,
    declaration: String,
}

impl TypeHandler {
    fn new(scope: Scope) -> Self {
        Self {
            scope,
            accepted: false,
            api: None,
            name: None,
            declaration: String::new(),
        }
    }

    fn enter_root(&mut self, node: &SchemaNode) -> bool {
        if !self.scope.api_matches(node) {
            return false;
        }
        self.accepted = true;
        self.api = node.non_empty_attr("api").map(str::to_string);
        // Some blocks name themselves through an attribute only
        self.name = node.non_empty_attr("name").map(str::to_string);
        true
    }

    fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool {
        node.is("name") && ancestry.depth() == 1
    }

    fn text(&mut self, text: &str, ancestry: Ancestry<'_>) {
        if ancestry.depth() == 1 {
            self.declaration.push_str(text);
        } else if ancestry.parent_is("name") {
            self.declaration.push_str(text);
            self.name = Some(text.trim().to_string());
        }
    }

    fn commit(self, registry: &mut Registry) {
        if !self.accepted {
            return;
        }
        let Some(key) = self.name.filter(|name| !name.is_empty()) else {
            return;
        };
        let ordinal = registry.types.len();
        registry.types.entry(key.clone()).or_insert(OpaqueType {
            key,
            declaration_text: self.declaration,
            api: self.api,
            ordinal,
        });
    }
}

// ----------------------------------------------------------------------------
// <feature> and <extension>
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayKind {
    Feature,
    Extension,
}

struct OverlayHandler<'c> {
    scope: Scope,
    kind: OverlayKind,
    compat: &'c CompatRules,
    applicable: bool,
    name: String,
    rank: u32,
    overlay: Overlay,
    warnings: Vec<BuildWarning>,
}

impl<'c> OverlayHandler<'c> {
    fn new(scope: Scope, kind: OverlayKind, compat: &'c CompatRules) -> Self {
        Self {
            scope,
            kind,
            compat,
            applicable: false,
            name: String::new(),
            rank: 0,
            overlay: Overlay::default(),
            warnings: Vec::new(),
        }
    }

    fn enter_root(&mut self, node: &SchemaNode) -> bool {
        self.applicable = match self.kind {
            OverlayKind::Feature => self.accept_feature(node),
            OverlayKind::Extension => self.accept_extension(node),
        };
        self.applicable
    }

    fn accept_feature(&mut self, node: &SchemaNode) -> bool {
        let name = node.attr("name").unwrap_or_default().to_string();
        match node.non_empty_attr("api") {
            Some(api) if api.trim() == self.scope.api.name() => {}
            _ => {
                tracing::debug!(feature = %name, "feature not for this api, skipped");
                return false;
            }
        }
        let number = node.attr("number").unwrap_or_default();
        let rank = match parse_version(number) {
            Some(rank) => rank,
            None => {
                warn(
                    &mut self.warnings,
                    BuildWarning::BadFeatureNumber {
                        name,
                        number: number.to_string(),
                    },
                );
                return false;
            }
        };
        self.name = name;
        self.rank = rank;
        true
    }

    fn accept_extension(&mut self, node: &SchemaNode) -> bool {
        let Some(declared) = node.non_empty_attr("name") else {
            return false;
        };
        let Some(bare) = strip_api_name(declared.trim(), self.scope.api) else {
            tracing::debug!(extension = declared, "extension name lacks the api prefix, skipped");
            return false;
        };
        let Some(supported) = node.non_empty_attr("supported") else {
            return false;
        };
        let tokens: BTreeSet<String> = supported
            .split('|')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        if !tokens.contains(self.scope.api.variant_for(self.scope.policy)) {
            return false;
        }
        if self.compat.is_excluded(bare) {
            tracing::debug!(extension = bare, "extension family excluded for this api");
            return false;
        }
        self.name = bare.to_string();
        true
    }

    fn enter(&mut self, node: &SchemaNode, ancestry: Ancestry<'_>) -> bool {
        match (node.tag.as_str(), ancestry.depth()) {
            ("remove", 1) if self.kind == OverlayKind::Extension => {
                tracing::debug!(extension = %self.name, "remove group in an extension, ignored");
                false
            }
            ("require" | "remove", 1) => {
                self.scope.api_matches(node)
                    && self.scope.policy.accepts(node.attr("profile"), node.is("remove"))
            }
            ("enum" | "command", 2) => {
                let removing = ancestry.parent_is("remove");
                let Some(raw) = node.attr("name") else {
                    return false;
                };
                if node.is("enum") {
                    if let Some(key) = self.scope.enums.strip(raw) {
                        let set = if removing {
                            &mut self.overlay.removed_enum_keys
                        } else {
                            &mut self.overlay.added_enum_keys
                        };
                        set.insert(key.to_string());
                    }
                } else if let Some(key) = self.scope.commands.strip(raw) {
                    let set = if removing {
                        &mut self.overlay.removed_command_keys
                    } else {
                        &mut self.overlay.added_command_keys
                    };
                    set.insert(key.to_string());
                }
                false
            }
            _ => false,
        }
    }

    fn into_block(self) -> Option<OverlayBlock> {
        if !self.applicable {
            return (!self.warnings.is_empty()).then_some(OverlayBlock::Rejected(self.warnings));
        }
        Some(match self.kind {
            OverlayKind::Feature => OverlayBlock::Feature(
                FeatureOverlay {
                    name: self.name,
                    rank: self.rank,
                    overlay: self.overlay,
                },
                self.warnings,
            ),
            OverlayKind::Extension => OverlayBlock::Extension(
                ExtensionOverlay {
                    name: self.name,
                    overlay: self.overlay,
                },
                self.warnings,
            ),
        })
    }
}

enum OverlayBlock {
    Feature(FeatureOverlay, Vec<BuildWarning>),
    Extension(ExtensionOverlay, Vec<BuildWarning>),
    Rejected(Vec<BuildWarning>),
}

impl OverlayBlock {
    fn commit(self, registry: &mut Registry) {
        match self {
            OverlayBlock::Feature(feature, warnings) => {
                registry.warnings.extend(warnings);
                insert_feature(&mut registry.features, &mut registry.warnings, feature);
            }
            OverlayBlock::Extension(extension, warnings) => {
                registry.warnings.extend(warnings);
                match registry.extensions.get_mut(&extension.name) {
                    Some(existing) => existing.overlay.merge(extension.overlay),
                    None => {
                        registry.extensions.insert(extension.name.clone(), extension);
                    }
                }
            }
            OverlayBlock::Rejected(warnings) => registry.warnings.extend(warnings),
        }
    }
}

fn insert_feature(
    features: &mut BTreeMap<u32, FeatureOverlay>,
    warnings: &mut Vec<BuildWarning>,
    feature: FeatureOverlay,
) {
    match features.get_mut(&feature.rank) {
        Some(existing) => {
            warn(
                warnings,
                BuildWarning::DuplicateFeatureRank {
                    rank: feature.rank,
                    name: feature.name,
                },
            );
            existing.overlay.merge(feature.overlay);
        }
        None => {
            features.insert(feature.rank, feature);
        }
    }
}

/// "GL_ARB_sync" -> "ARB_sync" for api `gl`: the API name, matched without
/// regard to case, followed by one non-alphanumeric delimiter.
fn strip_api_name(declared: &str, api: ApiKind) -> Option<&str> {
    let name = api.name();
    let head = declared.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let bare = declared[name.len()..].strip_prefix(|c: char| !c.is_ascii_alphanumeric())?;
    (!bare.is_empty()).then_some(bare)
}
