//! Target API strategy table
//!
//! Every per-API convention (name prefixes, the variant token used by
//! `supported` attributes, the documented minimum version) lives in one
//! static table keyed by [`ApiKind`]. Nothing else in the workspace compares
//! API names by hand.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::context::ProfilePolicy;
use crate::error::BindifyError;

/// The registries glbindify knows how to bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    Gl,
    Glx,
    Wgl,
}

/// Which namespace a raw schema name is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Command,
    Enumerant,
}

/// Static description of one target API
#[derive(Debug)]
pub struct ApiProfile {
    pub kind: ApiKind,
    /// Value of the `api` attribute on `feature` blocks (ex: "gl")
    pub name: &'static str,
    /// Token searched for in an extension's `supported` list (ex: "glcore")
    pub variant: &'static str,
    /// Same token under the compatibility profile (ex: "gl")
    pub compat_variant: &'static str,
    pub command_prefix: &'static str,
    pub enum_prefix: &'static str,
    /// Lowest version rank a generated loader accepts (major * 10 + minor)
    pub min_version: u32,
    /// Whether the runtime exposes an indexed extension-string list
    pub enumerable_extensions: bool,
    /// Headers the generated declarations depend on
    pub system_includes: &'static [&'static str],
}

static API_PROFILES: [ApiProfile; 3] = [
    ApiProfile {
        kind: ApiKind::Gl,
        name: "gl",
        variant: "glcore",
        compat_variant: "gl",
        command_prefix: "gl",
        enum_prefix: "GL_",
        min_version: 32,
        enumerable_extensions: true,
        system_includes: &[],
    },
    ApiProfile {
        kind: ApiKind::Glx,
        name: "glx",
        variant: "glx",
        compat_variant: "glx",
        command_prefix: "glX",
        enum_prefix: "GLX_",
        min_version: 14,
        enumerable_extensions: false,
        system_includes: &["X11/Xlib.h", "X11/Xutil.h"],
    },
    ApiProfile {
        kind: ApiKind::Wgl,
        name: "wgl",
        variant: "wgl",
        compat_variant: "wgl",
        command_prefix: "wgl",
        enum_prefix: "WGL_",
        min_version: 10,
        enumerable_extensions: false,
        system_includes: &["windows.h"],
    },
];

impl ApiKind {
    pub const ALL: [ApiKind; 3] = [ApiKind::Gl, ApiKind::Glx, ApiKind::Wgl];

    pub fn profile(self) -> &'static ApiProfile {
        &API_PROFILES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }

    pub fn variant(self) -> &'static str {
        self.profile().variant
    }

    /// Variant token a profile policy binds against; also names the output
    pub fn variant_for(self, policy: ProfilePolicy) -> &'static str {
        match policy {
            ProfilePolicy::Core => self.profile().variant,
            ProfilePolicy::Compatibility => self.profile().compat_variant,
        }
    }

    /// Prefix that raw names of the given kind carry in the schema
    pub fn prefix(self, kind: SymbolKind) -> &'static str {
        match kind {
            SymbolKind::Command => self.profile().command_prefix,
            SymbolKind::Enumerant => self.profile().enum_prefix,
        }
    }

    pub fn min_version(self) -> u32 {
        self.profile().min_version
    }

    pub fn has_enumerable_extensions(self) -> bool {
        self.profile().enumerable_extensions
    }
}

impl FromStr for ApiKind {
    type Err = BindifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiKind::ALL
            .into_iter()
            .find(|api| api.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BindifyError::UnknownApi(s.to_string()))
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank of a "major.minor" version number: `round(number * 10)`
pub fn parse_version(text: &str) -> Option<u32> {
    match text.trim().parse::<f32>() {
        Ok(version) if version.is_finite() && version >= 0.0 => {
            Some((version * 10.0).round() as u32)
        }
        _ => None,
    }
}

/// Version rank (major * 10 + minor) as "major.minor"
pub fn format_version(rank: u32) -> String {
    format!("{}.{}", rank / 10, rank % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_indexed_by_kind() {
        for api in ApiKind::ALL {
            assert_eq!(api.profile().kind, api);
        }
    }

    #[test]
    fn test_parse_api_names() {
        assert_eq!("gl".parse::<ApiKind>().unwrap(), ApiKind::Gl);
        assert_eq!("GLX".parse::<ApiKind>().unwrap(), ApiKind::Glx);
        assert!(matches!(
            "egl".parse::<ApiKind>(),
            Err(BindifyError::UnknownApi(name)) if name == "egl"
        ));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(ApiKind::Glx.prefix(SymbolKind::Command), "glX");
        assert_eq!(ApiKind::Wgl.prefix(SymbolKind::Enumerant), "WGL_");
        assert_eq!(ApiKind::Gl.variant(), "glcore");
    }

    #[test]
    fn test_variant_follows_profile() {
        assert_eq!(ApiKind::Gl.variant_for(ProfilePolicy::Core), "glcore");
        assert_eq!(ApiKind::Gl.variant_for(ProfilePolicy::Compatibility), "gl");
        assert_eq!(ApiKind::Glx.variant_for(ProfilePolicy::Compatibility), "glx");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("3.2"), Some(32));
        assert_eq!(parse_version(" 1.0 "), Some(10));
        assert_eq!(parse_version("4"), Some(40));
        assert_eq!(parse_version("-1.0"), None);
        assert_eq!(parse_version("three"), None);
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(32), "3.2");
        assert_eq!(format_version(10), "1.0");
    }
}
