//! Extension-string lookup emitted into the `init` loop
//!
//! The loop walks the advertised extension strings and sets the flag of
//! each one it recognises. `GperfLookup` builds a perfect hash with an
//! external `gperf`; `LinearLookup` emits a `strcmp` chain and is always
//! available.

use bindify_core::LookupPreference;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("LOOKUP/cannot run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("LOOKUP/{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// One recognised extension string and the flag it sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    /// Full advertised name (ex: "GL_ARB_sync")
    pub extension_string: String,
    /// Flag variable (ex: "GLB_GL_ARB_sync")
    pub flag: String,
}

/// C fragments of a lookup strategy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupCode {
    /// File-scope code placed after the flag definitions
    pub preamble: String,
    /// Loop body statements; `extname` holds the current string
    pub matcher: String,
}

pub trait ExtensionLookup {
    fn name(&self) -> &'static str;

    fn generate(&self, entries: &[LookupEntry]) -> Result<LookupCode, LookupError>;
}

// ============================================================================
// LINEAR
// ============================================================================

pub struct LinearLookup;

impl ExtensionLookup for LinearLookup {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn generate(&self, entries: &[LookupEntry]) -> Result<LookupCode, LookupError> {
        let matcher = entries
            .iter()
            .map(|entry| {
                format!(
                    "\t\tif (!strcmp(extname, \"{}\")) {{\n\t\t\t{} = true;\n\t\t\tcontinue;\n\t\t}}",
                    entry.extension_string, entry.flag
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(LookupCode {
            preamble: String::new(),
            matcher,
        })
    }
}

// ============================================================================
// GPERF
// ============================================================================

#[cfg(feature = "gperf")]
pub struct GperfLookup {
    program: String,
}

#[cfg(feature = "gperf")]
impl Default for GperfLookup {
    fn default() -> Self {
        Self {
            program: "gperf".to_string(),
        }
    }
}

#[cfg(feature = "gperf")]
impl GperfLookup {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Keyword file: each extension string maps to its flag's address
    pub fn keywords(entries: &[LookupEntry]) -> String {
        let mut input =
            String::from("struct extension_match { const char *name; bool *support_flag; };\n%%\n");
        for entry in entries {
            input.push_str(&format!("{}, &{}\n", entry.extension_string, entry.flag));
        }
        input
    }
}

#[cfg(feature = "gperf")]
impl ExtensionLookup for GperfLookup {
    fn name(&self) -> &'static str {
        "gperf"
    }

    fn generate(&self, entries: &[LookupEntry]) -> Result<LookupCode, LookupError> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let spawn_error = |source| LookupError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(["-D", "-t", "-F", ",NULL"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(Self::keywords(entries).as_bytes())
                .map_err(spawn_error)?;
        }
        let output = child.wait_with_output().map_err(spawn_error)?;

        if !output.status.success() {
            return Err(LookupError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(LookupCode {
            preamble: String::from_utf8_lossy(&output.stdout).into_owned(),
            matcher: "\t\tstruct extension_match *match = in_word_set(extname, strlen(extname));\n\
                      \t\tif (match)\n\
                      \t\t\t*match->support_flag = true;"
                .to_string(),
        })
    }
}

/// Lookup code for `entries` following `preference`, and the name of the
/// strategy that produced it. A failed or unavailable perfect hash falls
/// back to the linear chain with a warning.
pub fn generate_lookup(
    preference: LookupPreference,
    entries: &[LookupEntry],
) -> (LookupCode, &'static str) {
    let linear = || {
        let code = LinearLookup.generate(entries).unwrap_or_default();
        (code, LinearLookup.name())
    };

    if preference == LookupPreference::Linear || entries.is_empty() {
        return linear();
    }
    perfect_hash(preference, entries).unwrap_or_else(linear)
}

#[cfg(feature = "gperf")]
fn perfect_hash(
    _preference: LookupPreference,
    entries: &[LookupEntry],
) -> Option<(LookupCode, &'static str)> {
    let gperf = GperfLookup::default();
    match gperf.generate(entries) {
        Ok(code) => Some((code, gperf.name())),
        Err(e) => {
            tracing::warn!(error = %e, "perfect hash unavailable, using linear lookup");
            None
        }
    }
}

#[cfg(not(feature = "gperf"))]
fn perfect_hash(
    preference: LookupPreference,
    _entries: &[LookupEntry],
) -> Option<(LookupCode, &'static str)> {
    if preference == LookupPreference::Gperf {
        tracing::warn!("built without gperf support, using linear lookup");
    }
    None
}
