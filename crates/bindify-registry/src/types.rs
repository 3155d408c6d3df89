//! Type Closure Resolver
use bindify_core::{OpaqueType, ResolvedInterface};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

use crate::registry::Registry;

/// Primitive types every generated header declares itself, with their
/// C definitions.
pub const BUILTIN_TYPEDEFS: &[(&str, &str)] = &[
    ("GLenum", "typedef unsigned int GLenum;"),
    ("GLboolean", "typedef unsigned char GLboolean;"),
    ("GLbitfield", "typedef unsigned int GLbitfield;"),
    ("GLbyte", "typedef signed char GLbyte;"),
    ("GLshort", "typedef short GLshort;"),
    ("GLint", "typedef int GLint;"),
    ("GLubyte", "typedef unsigned char GLubyte;"),
    ("GLushort", "typedef unsigned short GLushort;"),
    ("GLuint", "typedef unsigned int GLuint;"),
    ("GLsizei", "typedef int GLsizei;"),
    ("GLfloat", "typedef float GLfloat;"),
    ("GLdouble", "typedef double GLdouble;"),
    ("GLintptr", "typedef ptrdiff_t GLintptr;"),
    ("GLsizeiptr", "typedef ptrdiff_t GLsizeiptr;"),
];

static BUILTIN_NAMES: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| BUILTIN_TYPEDEFS.iter().map(|(name, _)| *name).collect());

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(name)
}

/// Add every non-builtin type named by a return value or parameter of the
/// interface's commands. One level only: declarations are not scanned.
pub fn resolve_types(interface: &mut ResolvedInterface, registry: &Registry) {
    let referenced: Vec<String> = interface
        .command_keys
        .iter()
        .filter_map(|key| registry.command(key))
        .flat_map(|command| command.referenced_types())
        .filter(|name| !is_builtin(name) && !interface.type_keys.contains(*name))
        .map(str::to_string)
        .collect();
    interface.type_keys.extend(referenced);
}

/// Declarations for the interface's types in schema order, so a type is
/// declared after the ones its text mentions. Names the registry has no
/// declaration for are skipped with a warning.
pub fn type_declarations<'r>(
    interface: &ResolvedInterface,
    registry: &'r Registry,
) -> Vec<&'r OpaqueType> {
    let mut declared: Vec<&OpaqueType> = interface
        .type_keys
        .iter()
        .filter_map(|key| {
            let found = registry.opaque_type(key);
            if found.is_none() {
                tracing::warn!(type_name = %key, "no declaration for referenced type");
            }
            found
        })
        .collect();
    declared.sort_by_key(|t| t.ordinal);
    declared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistryBuilder;
    use bindify_core::{ApiKind, ProfilePolicy};
    use bindify_schema::parse_document;

    fn registry() -> Registry {
        let root = parse_document(
            r#"<registry>
                <types>
                    <type>typedef struct __GLsync *<name>GLsync</name>;</type>
                    <type>typedef khronos_uint64_t <name>GLuint64</name>;</type>
                </types>
                <commands>
                    <command>
                        <proto><ptype>GLsync</ptype> <name>glFenceSync</name></proto>
                        <param><ptype>GLenum</ptype> <name>condition</name></param>
                    </command>
                    <command>
                        <proto>void <name>glGetInteger64v</name></proto>
                        <param><ptype>GLenum</ptype> <name>pname</name></param>
                        <param><ptype>GLint64</ptype> *<name>data</name></param>
                    </command>
                </commands>
            </registry>"#,
        )
        .unwrap();
        let mut builder = RegistryBuilder::new(ApiKind::Gl, ProfilePolicy::Core);
        builder.ingest(&root).unwrap();
        builder.finish()
    }

    #[test]
    fn test_builtin_names() {
        assert!(is_builtin("GLenum"));
        assert!(is_builtin("GLsizeiptr"));
        assert!(!is_builtin("GLsync"));
    }

    #[test]
    fn test_resolve_types_skips_builtins() {
        let registry = registry();
        let mut interface = ResolvedInterface::default();
        interface.command_keys.insert("FenceSync".into());
        interface.command_keys.insert("GetInteger64v".into());

        resolve_types(&mut interface, &registry);
        let keys: Vec<&str> = interface.type_keys.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["GLint64", "GLsync"]);

        let snapshot = interface.type_keys.clone();
        resolve_types(&mut interface, &registry);
        assert_eq!(interface.type_keys, snapshot);
    }

    #[test]
    fn test_declarations_in_schema_order() {
        let registry = registry();
        let mut interface = ResolvedInterface::default();
        interface.type_keys.insert("GLuint64".into());
        interface.type_keys.insert("GLsync".into());
        interface.type_keys.insert("GLint64".into());

        let names: Vec<&str> = type_declarations(&interface, &registry)
            .into_iter()
            .map(|t| t.key.as_str())
            .collect();
        assert_eq!(names, vec!["GLsync", "GLuint64"]);
    }
}
