//! Template loading for emission.
//!
//! A templates file is YAML with named Handlebars templates. The built-in
//! set (`templates/c-loader.yaml`) provides `header`, `source` and the
//! `block` partial both of them use; a user file may override any of them
//! but must define all three.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::EmitError;

/// Templates every emission renders
pub const REQUIRED_TEMPLATES: &[&str] = &["header", "source", "block"];

const BUILTIN: &str = include_str!("../templates/c-loader.yaml");

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: BTreeMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    /// The templates shipped with the generator
    pub fn builtin() -> Result<Self, EmitError> {
        Self::from_yaml(BUILTIN)
    }

    /// Load templates from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmitError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EmitError::Templates(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, EmitError> {
        let file: TemplatesFile = serde_yaml::from_str(yaml)
            .map_err(|e| EmitError::Templates(format!("invalid templates YAML: {}", e)))?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), EmitError> {
        let missing: Vec<&str> = REQUIRED_TEMPLATES
            .iter()
            .copied()
            .filter(|name| !self.templates.contains_key(*name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EmitError::Templates(format!(
                "missing template(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}
