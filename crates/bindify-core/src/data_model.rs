//! Data Model: registry tables, overlays, resolved interfaces and run reports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// REGISTRY TABLES
// ============================================================================

/// Value of an enumerant as written in the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumValue {
    Hex(u64),
    Decimal(i64),
    /// Text that is neither a hex nor a decimal literal, kept verbatim
    Symbolic(String),
}

impl EnumValue {
    /// Hex first, then decimal, otherwise symbolic.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"));
        if let Some(digits) = hex {
            if let Ok(value) = u64::from_str_radix(digits, 16) {
                return EnumValue::Hex(value);
            }
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return EnumValue::Decimal(value);
        }
        EnumValue::Symbolic(text.to_string())
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, EnumValue::Symbolic(_))
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Hex(v) => write!(f, "{:#x}", v),
            EnumValue::Decimal(v) => write!(f, "{}", v),
            EnumValue::Symbolic(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerant {
    /// Name without the namespace prefix (ex: "TEXTURE_2D")
    pub key: String,
    pub value: EnumValue,
}

/// One `<enums>` block of the schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumGroup {
    pub name: Option<String>,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Content of the `ptype` element, empty for plain C types
    pub declared_type: String,
    pub name: String,
    /// Declaration text without the parameter name (ex: "const GLfloat *")
    pub raw_declaration_text: String,
}

impl Parameter {
    pub fn declaration(&self) -> &str {
        self.raw_declaration_text.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Name without the namespace prefix (ex: "DrawArrays")
    pub key: String,
    pub return_type: String,
    pub return_declaration_text: String,
    pub parameters: Vec<Parameter>,
}

impl Command {
    pub fn new(
        key: impl Into<String>,
        return_type: impl Into<String>,
        return_declaration_text: &str,
        parameters: Vec<Parameter>,
    ) -> Self {
        Self {
            key: key.into(),
            return_type: return_type.into(),
            return_declaration_text: return_declaration_text.trim_end().to_string(),
            parameters,
        }
    }

    /// Every non-empty type name this command mentions, return type first
    pub fn referenced_types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.return_type.as_str())
            .chain(self.parameters.iter().map(|p| p.declared_type.as_str()))
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueType {
    pub key: String,
    pub declaration_text: String,
    /// API restriction from the schema, if any
    pub api: Option<String>,
    /// Position in the schema, used to emit declarations in dependency order
    pub ordinal: usize,
}

// ============================================================================
// OVERLAYS
// ============================================================================

/// Additions and removals contributed by one feature or extension block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub added_enum_keys: BTreeSet<String>,
    pub added_command_keys: BTreeSet<String>,
    pub removed_enum_keys: BTreeSet<String>,
    pub removed_command_keys: BTreeSet<String>,
}

impl Overlay {
    pub fn merge(&mut self, other: Overlay) {
        self.added_enum_keys.extend(other.added_enum_keys);
        self.added_command_keys.extend(other.added_command_keys);
        self.removed_enum_keys.extend(other.removed_enum_keys);
        self.removed_command_keys.extend(other.removed_command_keys);
    }

    pub fn command_keys(&self) -> impl Iterator<Item = &String> {
        self.added_command_keys
            .iter()
            .chain(self.removed_command_keys.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOverlay {
    /// Block name (ex: "GL_VERSION_3_2")
    pub name: String,
    /// major * 10 + minor
    pub rank: u32,
    pub overlay: Overlay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOverlay {
    /// Name without the API prefix (ex: "ARB_debug_output")
    pub name: String,
    pub overlay: Overlay,
}

// ============================================================================
// RESOLVED INTERFACE
// ============================================================================

/// Enum, command and type keys visible to one emission target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterface {
    pub enum_keys: BTreeSet<String>,
    pub command_keys: BTreeSet<String>,
    pub type_keys: BTreeSet<String>,
}

impl ResolvedInterface {
    /// Merge a feature block: its additions first, then its removals.
    pub fn fold_feature(&mut self, overlay: &Overlay) {
        self.enum_keys.extend(overlay.added_enum_keys.iter().cloned());
        self.command_keys
            .extend(overlay.added_command_keys.iter().cloned());
        for key in &overlay.removed_enum_keys {
            self.enum_keys.remove(key);
        }
        for key in &overlay.removed_command_keys {
            self.command_keys.remove(key);
        }
    }

    /// Merge an extension block. Extensions only add.
    pub fn union_extension(&mut self, overlay: &Overlay) {
        self.enum_keys.extend(overlay.added_enum_keys.iter().cloned());
        self.command_keys
            .extend(overlay.added_command_keys.iter().cloned());
    }

    /// An interface made of exactly the additions of one overlay
    pub fn from_additions(overlay: &Overlay) -> Self {
        let mut interface = Self::default();
        interface.union_extension(overlay);
        interface
    }
}

// ============================================================================
// WARNINGS AND REPORTS
// ============================================================================

/// Recoverable condition met while building the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildWarning {
    SymbolicEnumValue { name: String, value: String },
    MissingEnumValue { name: String },
    DuplicateFeatureRank { rank: u32, name: String },
    BadFeatureNumber { name: String, number: String },
    UnknownOverlayCommand { overlay: String, command: String },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SymbolicEnumValue { name, value } => {
                write!(f, "can't parse value of enum {}: \"{}\"", name, value)
            }
            Self::MissingEnumValue { name } => write!(f, "enum {} has no value", name),
            Self::DuplicateFeatureRank { rank, name } => {
                write!(f, "feature {} repeats version rank {}, merged", name, rank)
            }
            Self::BadFeatureNumber { name, number } => {
                write!(f, "feature {} has unusable number \"{}\"", name, number)
            }
            Self::UnknownOverlayCommand { overlay, command } => {
                write!(f, "{} requires unknown command {}", overlay, command)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepProof {
    pub id: String,
    pub latency_ms: u64,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactProof {
    pub path: String,
    /// "blake3:<hex>"
    pub hash: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub enumerants: usize,
    pub enum_groups: usize,
    pub commands: usize,
    pub types: usize,
    pub features: Vec<u32>,
    pub extensions: usize,
}

/// Summary of one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub api: String,
    pub namespace: String,
    pub schema: String,
    pub generated_at: DateTime<Utc>,
    pub registry: RegistryStats,
    pub interface: InterfaceStats,
    pub lookup: String,
    pub warnings: Vec<String>,
    pub steps: Vec<StepProof>,
    pub artifacts: Vec<ArtifactProof>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceStats {
    pub min_version: u32,
    pub max_version: u32,
    pub base_commands: usize,
    pub full_commands: usize,
    pub full_enums: usize,
    pub extensions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_value_parse() {
        assert_eq!(EnumValue::parse("0x10"), EnumValue::Hex(16));
        assert_eq!(EnumValue::parse("0xFFFFFFFFFFFFFFFF"), EnumValue::Hex(u64::MAX));
        assert_eq!(EnumValue::parse("-1"), EnumValue::Decimal(-1));
        assert_eq!(
            EnumValue::parse("SOME_OTHER_ENUM"),
            EnumValue::Symbolic("SOME_OTHER_ENUM".to_string())
        );
        assert_eq!(EnumValue::parse("0x"), EnumValue::Symbolic("0x".to_string()));
    }

    #[test]
    fn test_enum_value_display() {
        assert_eq!(EnumValue::Hex(0x8b8d).to_string(), "0x8b8d");
        assert_eq!(EnumValue::Decimal(-1).to_string(), "-1");
        assert_eq!(EnumValue::Symbolic("(~0u)".into()).to_string(), "(~0u)");
    }

    #[test]
    fn test_command_trims_return_declaration() {
        let cmd = Command::new("GetError", "GLenum", "GLenum  \t", vec![]);
        assert_eq!(cmd.return_declaration_text, "GLenum");
    }

    #[test]
    fn test_referenced_types_skip_empty() {
        let cmd = Command::new(
            "Foo",
            "",
            "void ",
            vec![
                Parameter {
                    declared_type: "GLsync".into(),
                    name: "sync".into(),
                    raw_declaration_text: "GLsync ".into(),
                },
                Parameter {
                    declared_type: String::new(),
                    name: "data".into(),
                    raw_declaration_text: "void *".into(),
                },
            ],
        );
        assert_eq!(cmd.referenced_types().collect::<Vec<_>>(), vec!["GLsync"]);
    }

    #[test]
    fn test_fold_feature_removes_after_adding() {
        let mut overlay = Overlay::default();
        overlay.added_command_keys.insert("Begin".into());
        overlay.added_command_keys.insert("Clear".into());
        overlay.removed_command_keys.insert("Begin".into());

        let mut interface = ResolvedInterface::default();
        interface.fold_feature(&overlay);
        assert!(interface.command_keys.contains("Clear"));
        assert!(!interface.command_keys.contains("Begin"));
    }
}
