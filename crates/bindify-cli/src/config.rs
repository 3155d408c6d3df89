//! Run configuration: YAML file, command line flags and environment
//!
//! Precedence is flag, then file, then `BINDIFY_SRCDIR` (schema directory
//! only), then the built-in default.

use bindify_core::{
    parse_version, ApiKind, BindifyError, ExtensionSelection, GenerationContext, LookupPreference,
    ProfilePolicy,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::TargetArgs;

pub const DEFAULT_NAMESPACE: &str = "glb";
pub const SRCDIR_ENV: &str = "BINDIFY_SRCDIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindifyConfig {
    pub api: Option<String>,
    pub namespace: Option<String>,
    pub srcdir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub profile: Option<ProfilePolicy>,
    /// Bare extension names; empty binds every supported extension
    pub extensions: Vec<String>,
    pub lookup: Option<LookupPreference>,
    pub exempt_extensions: Vec<String>,
    pub max_version: Option<String>,
    pub templates: Option<PathBuf>,
}

impl BindifyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BindifyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BindifyError::io(path, e))?;
        Self::from_yaml(&content)
            .map_err(|reason| BindifyError::Config(format!("{}: {}", path.display(), reason)))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        // An empty file is an empty configuration
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| e.to_string())
    }

    /// Overlay the values given on the command line
    pub fn merge_args(&mut self, args: &TargetArgs) {
        if args.api.is_some() {
            self.api = args.api.clone();
        }
        if args.namespace.is_some() {
            self.namespace = args.namespace.clone();
        }
        if args.srcdir.is_some() {
            self.srcdir = args.srcdir.clone();
        }
        if let Some(profile) = args.profile {
            self.profile = Some(profile.into());
        }
        if !args.extensions.is_empty() {
            self.extensions = args.extensions.clone();
        }
        if let Some(lookup) = args.lookup {
            self.lookup = Some(lookup.into());
        }
        self.exempt_extensions
            .extend(args.exempt_extensions.iter().cloned());
        if args.max_version.is_some() {
            self.max_version = args.max_version.clone();
        }
        if args.templates.is_some() {
            self.templates = args.templates.clone();
        }
    }

    /// Resolve into a context; `env_srcdir` is the value of `BINDIFY_SRCDIR`
    pub fn into_context(self, env_srcdir: Option<PathBuf>) -> Result<GenerationContext, BindifyError> {
        let api: ApiKind = self.api.as_deref().unwrap_or("gl").parse()?;

        let namespace = self
            .namespace
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        if !is_c_identifier(&namespace) {
            return Err(BindifyError::Config(format!(
                "namespace '{}' is not a valid C identifier",
                namespace
            )));
        }

        let version_ceiling = match self.max_version.as_deref() {
            None => None,
            Some(text) => Some(parse_version(text).ok_or_else(|| {
                BindifyError::Config(format!("max_version '{}' is not a version number", text))
            })?),
        };

        let srcdir = self
            .srcdir
            .or(env_srcdir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut ctx = GenerationContext::new(api, namespace);
        ctx.schema_path = srcdir.join(format!("{}.xml", api.name()));
        ctx.out_dir = self.out_dir.unwrap_or_else(|| PathBuf::from("."));
        ctx.profile = self.profile.unwrap_or_default();
        ctx.extensions = ExtensionSelection::from_names(self.extensions);
        ctx.lookup = self.lookup.unwrap_or_default();
        ctx.exempt_extensions = self.exempt_extensions.into_iter().collect();
        ctx.templates_path = self.templates;
        ctx.version_ceiling = version_ceiling;
        Ok(ctx)
    }
}

fn is_c_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Configuration for one invocation: the file, if any, under the flags
pub fn resolve(
    config_path: Option<&Path>,
    args: &TargetArgs,
    out_dir: Option<&Path>,
) -> Result<GenerationContext, BindifyError> {
    let mut config = match config_path {
        Some(path) => BindifyConfig::load(path)?,
        None => BindifyConfig::default(),
    };
    config.merge_args(args);
    if let Some(dir) = out_dir {
        config.out_dir = Some(dir.to_path_buf());
    }
    let env_srcdir = std::env::var_os(SRCDIR_ENV).map(PathBuf::from);
    config.into_context(env_srcdir)
}
