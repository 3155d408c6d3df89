//! Render models for the header and source templates
//!
//! Everything the templates print is computed here: mangled names, C
//! parameter lists, enum literals and the `init` predicates rendered to C
//! expressions. The templates only lay the pieces out.

use bindify_core::{
    ApiKind, Command, EnumValue, GenerationContext, Overlay, ResolvedInterface, SymbolKind,
    BINDIFY_VERSION,
};
use bindify_loader::{LoaderContract, Predicate};
use bindify_registry::{resolve_types, type_declarations, Registry, BUILTIN_TYPEDEFS};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::lookup::{LookupCode, LookupEntry};
use crate::renderer::c_identifier;
use crate::EmitError;

/// Headers every generated header includes after the API's own
const COMMON_INCLUDES: &[&str] = &["stdint.h", "stddef.h", "string.h", "stdbool.h"];

// ============================================================================
// NAMING
// ============================================================================

/// Emitted C names for one target
#[derive(Debug, Clone)]
pub struct Naming {
    api: ApiKind,
    namespace: String,
    variant: &'static str,
    macro_prefix: String,
    header_name: String,
}

impl Naming {
    pub fn new(ctx: &GenerationContext) -> Self {
        Self {
            api: ctx.api,
            namespace: ctx.namespace.clone(),
            variant: ctx.variant(),
            macro_prefix: ctx.macro_prefix(),
            header_name: ctx.header_name(),
        }
    }

    fn enum_prefix(&self) -> &'static str {
        self.api.prefix(SymbolKind::Enumerant)
    }

    /// `GL_TEXTURE_2D`
    pub fn enumerant(&self, key: &str) -> String {
        format!("{}{}", self.enum_prefix(), key)
    }

    /// `glClear`
    pub fn command(&self, key: &str) -> String {
        format!("{}{}", self.api.prefix(SymbolKind::Command), key)
    }

    /// Storage of the function pointer: `_glb_glClear`
    pub fn symbol(&self, key: &str) -> String {
        format!("_{}_{}", self.namespace, self.command(key))
    }

    /// `GLB_GL_VERSION`
    pub fn version_macro(&self) -> String {
        format!("{}_{}VERSION", self.macro_prefix, self.enum_prefix())
    }

    /// Advertised name of an extension: `GL_ARB_sync`
    pub fn extension_string(&self, name: &str) -> String {
        format!("{}{}", self.enum_prefix(), name)
    }

    /// `GLB_GL_ARB_sync`
    pub fn flag(&self, name: &str) -> String {
        format!("{}_{}", self.macro_prefix, self.extension_string(name))
    }

    /// `GLB_ENABLE_GL_ARB_sync`
    pub fn enable_macro(&self, name: &str) -> String {
        format!("{}_ENABLE_{}", self.macro_prefix, self.extension_string(name))
    }

    pub fn type_guard_prefix(&self) -> String {
        format!("{}_TYPE_", self.macro_prefix)
    }

    /// `GLB_GLCORE_H`
    pub fn include_guard(&self) -> String {
        c_identifier(&self.header_name).to_ascii_uppercase()
    }

    /// `glb_glcore_init`
    pub fn init_name(&self) -> String {
        format!("{}_{}_init", self.namespace, self.variant)
    }
}

// ============================================================================
// C RENDERING
// ============================================================================

/// Literal for an enumerant value. Values wider than 32 bits get a `ull`
/// suffix; symbolic values are printed as written.
pub fn c_enum_value(value: &EnumValue) -> String {
    match value {
        EnumValue::Hex(v) if *v > u64::from(u32::MAX) => format!("0x{:x}ull", v),
        EnumValue::Hex(v) => format!("0x{:x}", v),
        EnumValue::Decimal(v) if *v < 0 => format!("({})", v),
        EnumValue::Decimal(v) if *v > i64::from(u32::MAX) => format!("{}ull", v),
        EnumValue::Decimal(v) => v.to_string(),
        EnumValue::Symbolic(text) => text.trim().to_string(),
    }
}

/// C parameter list of a command, `void` when it takes none
pub fn c_parameters(command: &Command) -> Vec<String> {
    if command.parameters.is_empty() {
        return vec!["void".to_string()];
    }
    command
        .parameters
        .iter()
        .map(|param| {
            let decl = param.declaration();
            if param.name.is_empty() {
                decl.to_string()
            } else if decl.ends_with('*') {
                format!("{}{}", decl, param.name)
            } else {
                format!("{} {}", decl, param.name)
            }
        })
        .collect()
}

pub fn c_return_type(command: &Command) -> String {
    let text = command.return_declaration_text.trim();
    if text.is_empty() {
        "void".to_string()
    } else {
        text.to_string()
    }
}

/// C expression for a predicate, as evaluated inside the generated `init`
pub fn c_expression(predicate: &Predicate, naming: &Naming) -> String {
    match predicate {
        Predicate::True => "true".to_string(),
        Predicate::CommandResolved(key) => naming.symbol(key),
        Predicate::ExtensionAdvertised(name) => naming.flag(name),
        Predicate::RequestedBelow(rank) => format!("req_version < {}", rank),
        Predicate::All(parts) => join_operands(parts, " && ", "true", naming),
        Predicate::Any(parts) => join_operands(parts, " || ", "false", naming),
    }
}

fn join_operands(parts: &[Predicate], op: &str, empty: &str, naming: &Naming) -> String {
    match parts {
        [] => empty.to_string(),
        [only] => c_expression(only, naming),
        _ => parts
            .iter()
            .map(|part| {
                let text = c_expression(part, naming);
                let compound = match part {
                    Predicate::All(inner) | Predicate::Any(inner) => inner.len() > 1,
                    Predicate::RequestedBelow(_) => true,
                    _ => false,
                };
                if compound {
                    format!("({})", text)
                } else {
                    text
                }
            })
            .collect::<Vec<_>>()
            .join(op),
    }
}

// ============================================================================
// DECLARATION BLOCKS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl {
    pub guard_prefix: String,
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandDecl {
    pub name: String,
    pub symbol: String,
    pub return_type: String,
    pub parameters: Vec<String>,
}

impl CommandDecl {
    fn new(naming: &Naming, command: &Command) -> Self {
        Self {
            name: naming.command(&command.key),
            symbol: naming.symbol(&command.key),
            return_type: c_return_type(command),
            parameters: c_parameters(command),
        }
    }
}

/// Declarations contributed by one interface or overlay
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeclarationBlock {
    pub types: Vec<TypeDecl>,
    pub undef_enums: Vec<String>,
    pub enums: Vec<EnumDecl>,
    pub undef_commands: Vec<String>,
    pub commands: Vec<CommandDecl>,
}

impl DeclarationBlock {
    /// Everything in `interface`, which must already be type-closed
    pub fn for_interface(naming: &Naming, registry: &Registry, interface: &ResolvedInterface) -> Self {
        let guard_prefix = naming.type_guard_prefix();
        Self {
            types: type_declarations(interface, registry)
                .into_iter()
                .map(|ty| TypeDecl {
                    guard_prefix: guard_prefix.clone(),
                    key: ty.key.clone(),
                    text: ty.declaration_text.clone(),
                })
                .collect(),
            undef_enums: Vec::new(),
            enums: interface
                .enum_keys
                .iter()
                .filter_map(|key| registry.enumerant(key))
                .map(|e| EnumDecl {
                    name: naming.enumerant(&e.key),
                    value: c_enum_value(&e.value),
                })
                .collect(),
            undef_commands: Vec::new(),
            commands: interface
                .command_keys
                .iter()
                .filter_map(|key| registry.command(key))
                .map(|command| CommandDecl::new(naming, command))
                .collect(),
        }
    }

    /// Additions of `overlay` with their types, then its removals
    pub fn for_overlay(naming: &Naming, registry: &Registry, overlay: &Overlay) -> Self {
        let mut interface = ResolvedInterface::from_additions(overlay);
        resolve_types(&mut interface, registry);
        let mut block = Self::for_interface(naming, registry, &interface);
        block.undef_enums = names(&overlay.removed_enum_keys, |k| naming.enumerant(k));
        block.undef_commands = names(&overlay.removed_command_keys, |k| naming.command(k));
        block
    }
}

fn names(keys: &BTreeSet<String>, qualify: impl Fn(&str) -> String) -> Vec<String> {
    keys.iter().map(|key| qualify(key)).collect()
}

// ============================================================================
// HEADER
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FeatureBlock {
    pub name: String,
    pub rank: u32,
    pub declarations: DeclarationBlock,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionBlock {
    pub name: String,
    pub enable_macro: String,
    pub flag: String,
    pub declarations: DeclarationBlock,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderModel {
    pub generator: String,
    pub include_guard: String,
    pub system_includes: Vec<String>,
    pub builtin_typedefs: Vec<String>,
    pub version_macro: String,
    pub min_version: u32,
    pub base: DeclarationBlock,
    pub features: Vec<FeatureBlock>,
    pub extensions: Vec<ExtensionBlock>,
    pub init_name: String,
}

impl HeaderModel {
    /// `base` is the type-closed interface at the minimum version; features
    /// above `ceiling` are left out.
    pub fn build(
        naming: &Naming,
        registry: &Registry,
        base: &ResolvedInterface,
        extensions: &[&str],
        ceiling: u32,
    ) -> Self {
        let api = registry.api();
        let min_version = api.min_version();

        let features = registry
            .features()
            .filter(|feature| feature.rank > min_version && feature.rank <= ceiling)
            .map(|feature| FeatureBlock {
                name: feature.name.clone(),
                rank: feature.rank,
                declarations: DeclarationBlock::for_overlay(naming, registry, &feature.overlay),
            })
            .collect();

        let extensions = extensions
            .iter()
            .filter_map(|name| registry.extension(name))
            .map(|extension| ExtensionBlock {
                name: extension.name.clone(),
                enable_macro: naming.enable_macro(&extension.name),
                flag: naming.flag(&extension.name),
                declarations: DeclarationBlock::for_overlay(naming, registry, &extension.overlay),
            })
            .collect();

        Self {
            generator: generator(),
            include_guard: naming.include_guard(),
            system_includes: api
                .profile()
                .system_includes
                .iter()
                .chain(COMMON_INCLUDES)
                .map(|s| s.to_string())
                .collect(),
            builtin_typedefs: BUILTIN_TYPEDEFS
                .iter()
                .map(|(_, decl)| decl.to_string())
                .collect(),
            version_macro: naming.version_macro(),
            min_version,
            base: DeclarationBlock::for_interface(naming, registry, base),
            features,
            extensions,
            init_name: naming.init_name(),
        }
    }
}

// ============================================================================
// SOURCE
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FlagDef {
    pub name: String,
    pub initial: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionCheck {
    pub flag: String,
    pub expression: String,
}

/// Extension enumeration inside `init`
#[derive(Debug, Clone, Serialize)]
pub struct QueryModel {
    pub get_integer: String,
    pub get_string: String,
    pub matcher: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceModel {
    pub generator: String,
    pub version_macro: String,
    pub min_version: u32,
    pub max_version: u32,
    pub enable_macros: Vec<String>,
    pub header_name: String,
    pub definitions: Vec<CommandDecl>,
    pub flags: Vec<FlagDef>,
    pub lookup_preamble: String,
    pub init_name: String,
    pub query: Option<QueryModel>,
    pub extension_checks: Vec<ExtensionCheck>,
    pub result: String,
}

/// Commands the extension enumeration calls
const QUERY_COMMANDS: [&str; 2] = ["GetIntegerv", "GetStringi"];

impl SourceModel {
    pub fn build(
        naming: &Naming,
        header_name: &str,
        registry: &Registry,
        contract: &LoaderContract,
        lookup: LookupCode,
    ) -> Result<Self, EmitError> {
        let enumerates = contract.enumerates_extensions();

        let query = if enumerates {
            if let Some(missing) = QUERY_COMMANDS
                .iter()
                .find(|key| !contract.load_set.contains(**key))
            {
                return Err(EmitError::MissingQueryCommand(naming.command(missing)));
            }
            Some(QueryModel {
                get_integer: naming.symbol(QUERY_COMMANDS[0]),
                get_string: naming.symbol(QUERY_COMMANDS[1]),
                matcher: lookup.matcher,
            })
        } else {
            None
        };

        let initial = if enumerates { "false" } else { "true" };

        Ok(Self {
            generator: generator(),
            version_macro: naming.version_macro(),
            min_version: contract.min_version,
            max_version: contract.max_version,
            enable_macros: contract
                .extensions
                .iter()
                .map(|flag| naming.enable_macro(&flag.name))
                .collect(),
            header_name: header_name.to_string(),
            definitions: contract
                .load_set
                .iter()
                .filter_map(|key| registry.command(key))
                .map(|command| CommandDecl::new(naming, command))
                .collect(),
            flags: contract
                .extensions
                .iter()
                .map(|flag| FlagDef {
                    name: naming.flag(&flag.name),
                    initial,
                })
                .collect(),
            lookup_preamble: lookup.preamble,
            init_name: naming.init_name(),
            query,
            extension_checks: contract
                .extensions
                .iter()
                .filter(|flag| !flag.required.is_empty())
                .map(|flag| ExtensionCheck {
                    flag: naming.flag(&flag.name),
                    expression: c_expression(&contract.extension_predicate(flag), naming),
                })
                .collect(),
            result: c_expression(&contract.result(), naming),
        })
    }
}

/// Extension strings `init` recognises, one per bound extension
pub fn lookup_entries(naming: &Naming, contract: &LoaderContract) -> Vec<LookupEntry> {
    contract
        .extensions
        .iter()
        .map(|flag| LookupEntry {
            extension_string: naming.extension_string(&flag.name),
            flag: naming.flag(&flag.name),
        })
        .collect()
}

fn generator() -> String {
    format!("glbindify {}", BINDIFY_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindify_core::Parameter;

    fn naming(api: ApiKind) -> Naming {
        Naming::new(&GenerationContext::new(api, "glb"))
    }

    fn param(declared_type: &str, name: &str, raw: &str) -> Parameter {
        Parameter {
            declared_type: declared_type.into(),
            name: name.into(),
            raw_declaration_text: raw.into(),
        }
    }

    #[test]
    fn test_naming_gl() {
        let n = naming(ApiKind::Gl);
        assert_eq!(n.enumerant("TEXTURE_2D"), "GL_TEXTURE_2D");
        assert_eq!(n.command("Clear"), "glClear");
        assert_eq!(n.symbol("Clear"), "_glb_glClear");
        assert_eq!(n.version_macro(), "GLB_GL_VERSION");
        assert_eq!(n.flag("ARB_sync"), "GLB_GL_ARB_sync");
        assert_eq!(n.enable_macro("ARB_sync"), "GLB_ENABLE_GL_ARB_sync");
        assert_eq!(n.include_guard(), "GLB_GLCORE_H");
        assert_eq!(n.init_name(), "glb_glcore_init");
    }

    #[test]
    fn test_naming_glx() {
        let n = naming(ApiKind::Glx);
        assert_eq!(n.symbol("SwapIntervalEXT"), "_glb_glXSwapIntervalEXT");
        assert_eq!(n.version_macro(), "GLB_GLX_VERSION");
        assert_eq!(n.extension_string("EXT_swap_control"), "GLX_EXT_swap_control");
        assert_eq!(n.init_name(), "glb_glx_init");
    }

    #[test]
    fn test_enum_literals() {
        assert_eq!(c_enum_value(&EnumValue::Hex(0x0DE1)), "0xde1");
        assert_eq!(c_enum_value(&EnumValue::Hex(u64::MAX)), "0xffffffffffffffffull");
        assert_eq!(c_enum_value(&EnumValue::Hex(0xFFFF_FFFF)), "0xffffffff");
        assert_eq!(c_enum_value(&EnumValue::Decimal(-1)), "(-1)");
        assert_eq!(c_enum_value(&EnumValue::Decimal(16)), "16");
        assert_eq!(
            c_enum_value(&EnumValue::Symbolic("GL_DEBUG_OUTPUT".into())),
            "GL_DEBUG_OUTPUT"
        );
    }

    #[test]
    fn test_parameters() {
        let command = Command::new(
            "BufferData",
            "",
            "void ",
            vec![
                param("GLenum", "target", "GLenum "),
                param("", "data", "const void *"),
            ],
        );
        assert_eq!(c_parameters(&command), vec!["GLenum target", "const void *data"]);
        assert_eq!(c_return_type(&command), "void");

        let finish = Command::new("Finish", "", "", vec![]);
        assert_eq!(c_parameters(&finish), vec!["void"]);
        assert_eq!(c_return_type(&finish), "void");
    }

    #[test]
    fn test_expressions() {
        let n = naming(ApiKind::Gl);
        let result = Predicate::All(vec![
            Predicate::All(vec![
                Predicate::CommandResolved("Clear".into()),
                Predicate::CommandResolved("Flush".into()),
            ]),
            Predicate::Any(vec![
                Predicate::RequestedBelow(33),
                Predicate::All(vec![Predicate::CommandResolved("BindSampler".into())]),
            ]),
        ]);
        assert_eq!(
            c_expression(&result, &n),
            "(_glb_glClear && _glb_glFlush) && ((req_version < 33) || _glb_glBindSampler)"
        );
        assert_eq!(c_expression(&Predicate::True, &n), "true");
        assert_eq!(c_expression(&Predicate::All(vec![]), &n), "true");
        assert_eq!(c_expression(&Predicate::Any(vec![]), &n), "false");
        assert_eq!(
            c_expression(&Predicate::ExtensionAdvertised("KHR_debug".into()), &n),
            "GLB_GL_KHR_debug"
        );
    }
}
