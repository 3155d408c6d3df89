//! Integration tests for bindify-out: header and source emitted from the
//! fixture registries.

use bindify_core::{
    ApiKind, ExtensionSelection, GenerationContext, LookupPreference, ProfilePolicy,
};
use bindify_loader::LoaderContract;
use bindify_out::{EmitError, EmitRequest, EmittedFiles, Emitter};
use bindify_registry::{compose, resolve_types, selected_extensions, Registry, RegistryBuilder};
use bindify_schema::{load_document, parse_document, SchemaNode};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    PathBuf::from(manifest_dir).join("../../testing/fixtures/registry").join(name)
}

fn build(api: ApiKind, root: &SchemaNode) -> Registry {
    let mut builder = RegistryBuilder::new(api, ProfilePolicy::Core);
    builder.ingest(root).unwrap();
    builder.finish()
}

fn emit(ctx: &GenerationContext, registry: &Registry) -> Result<EmittedFiles, EmitError> {
    let names = selected_extensions(registry, &ctx.extensions);
    let max = registry.max_rank().unwrap_or(ctx.api.min_version());
    let full = compose(registry, max, names.iter().copied());
    let mut base = compose(registry, ctx.api.min_version(), None::<&str>);
    resolve_types(&mut base, registry);
    let contract = LoaderContract::generate(registry, &full, names.iter().copied());

    let emitter = Emitter::for_context(ctx)?;
    emitter.emit(
        ctx,
        &EmitRequest {
            registry,
            base: &base,
            extensions: &names,
            contract: &contract,
        },
    )
}

fn gl_files(lookup: LookupPreference) -> EmittedFiles {
    let registry = build(ApiKind::Gl, &load_document(fixture("gl.xml")).unwrap());
    let mut ctx = GenerationContext::new(ApiKind::Gl, "glb");
    ctx.lookup = lookup;
    emit(&ctx, &registry).unwrap()
}

// =============================================================================
// GL header
// =============================================================================

#[test]
fn test_gl_header_layout() {
    let files = gl_files(LookupPreference::Linear);
    assert_eq!(files.header_name, "glb-glcore.h");
    assert_eq!(files.source_name, "glb-glcore.c");

    let header = &files.header;
    assert!(header.contains("#ifndef GLB_GLCORE_H\n#define GLB_GLCORE_H"));
    assert!(header.contains("extern \"C\" {"));
    assert!(header.contains("#include <stdbool.h>"));
    assert!(!header.contains("#include <X11/Xlib.h>"));
    assert!(header.contains("#ifndef GLBINDIFY_COMMON_GL_TYPEDEFS"));
    assert!(header.contains("typedef unsigned int GLenum;"));
    assert!(header.contains("#ifndef GLB_GL_VERSION\n#define GLB_GL_VERSION 32\n#endif"));
    assert!(header.contains("bool glb_glcore_init(int maj, int min);"));

    // Sections appear in order
    let typedefs = header.find("GLBINDIFY_COMMON_GL_TYPEDEFS").unwrap();
    let version = header.find("#define GLB_GL_VERSION 32").unwrap();
    let gate = header.find("GLB_GL_VERSION >= 43").unwrap();
    let extension = header.find("#if defined(GLB_ENABLE_GL_ARB_debug_output)").unwrap();
    let init = header.find("glb_glcore_init").unwrap();
    assert!(typedefs < version && version < gate && gate < extension && extension < init);
}

#[test]
fn test_gl_header_base_declarations() {
    let header = gl_files(LookupPreference::Linear).header;

    assert!(header.contains("#define GL_NUM_EXTENSIONS 0x821d\n"));
    assert!(header.contains("#define GL_TIMEOUT_IGNORED 0xffffffffffffffffull\n"));
    assert!(header.contains("#define GL_DEBUG_OUTPUT_SYNCHRONOUS_ARB 0x8242\n"));
    assert!(header.contains("#define glGetIntegerv _glb_glGetIntegerv\n"));
    assert!(header.contains("extern void (*_glb_glGetIntegerv)(GLenum pname, GLint *data);"));
    assert!(header.contains("(*_glb_glGetStringi)(GLenum name, GLuint index);"));

    // Removed by the core profile at 3.2
    assert!(!header.contains("GL_QUADS"));
    assert!(!header.contains("glBegin"));
    // Other APIs' symbols stay out
    assert!(!header.contains("ActiveProgram"));
    assert!(!header.contains("GLfixed"));
}

#[test]
fn test_gl_header_types_are_guarded_and_ordered() {
    let header = gl_files(LookupPreference::Linear).header;
    assert!(header.contains(
        "#ifndef GLB_TYPE_GLsync\n#define GLB_TYPE_GLsync\ntypedef struct __GLsync *GLsync;\n#endif"
    ));
    let int64 = header.find("#ifndef GLB_TYPE_GLint64").unwrap();
    let sync = header.find("#ifndef GLB_TYPE_GLsync").unwrap();
    assert!(int64 < sync);

    // Only needed by the 4.3 block and the debug extensions
    let gate = header.find("GLB_GL_VERSION >= 43").unwrap();
    let debugproc = header.find("#ifndef GLB_TYPE_GLDEBUGPROC").unwrap();
    assert!(debugproc > gate);
}

#[test]
fn test_gl_header_feature_and_extension_blocks() {
    let header = gl_files(LookupPreference::Linear).header;

    assert!(header.contains("#if defined(GLB_GL_VERSION) && GLB_GL_VERSION >= 43"));
    assert!(header.contains("#define GL_DEBUG_OUTPUT 0x92e0\n"));
    assert!(header.contains("#define glDebugMessageCallback _glb_glDebugMessageCallback\n"));
    // Features up to the minimum are folded into the base, not gated
    assert!(!header.contains("GLB_GL_VERSION >= 32"));
    assert!(!header.contains("GLB_GL_VERSION >= 30"));

    for name in ["ARB_debug_output", "EXT_direct_state_access", "KHR_debug"] {
        assert!(header.contains(&format!("#if defined(GLB_ENABLE_GL_{})", name)));
        assert!(header.contains(&format!("extern bool GLB_GL_{};", name)));
    }
    assert!(header.contains(
        "extern void (*_glb_glNamedBufferDataEXT)(GLuint buffer, GLsizeiptr size, const void *data, GLenum usage);"
    ));
    assert!(!header.contains("OES_fixed_point"));
    assert!(!header.contains("EXT_separate_shader_objects"));
}

// =============================================================================
// GL source
// =============================================================================

#[test]
fn test_gl_source_definitions_and_flags() {
    let files = gl_files(LookupPreference::Linear);
    assert_eq!(files.lookup, "linear");
    let source = &files.source;

    assert!(source.contains("#define GLB_GL_VERSION 43\n"));
    assert!(source.contains("#define GLB_ENABLE_GL_KHR_debug\n"));
    assert!(source.contains("#include \"glb-glcore.h\""));
    assert!(source.contains("void (*_glb_glClear)(GLbitfield mask) = NULL;"));
    assert!(source.contains("void (*_glb_glDebugMessageCallbackARB)(GLDEBUGPROC callback, const void *userParam) = NULL;"));
    assert!(source.contains("bool GLB_GL_KHR_debug = false;"));
    assert!(source.contains("bool glb_glcore_init(int maj, int min)"));

    let define = source.find("#define GLB_GL_VERSION 43").unwrap();
    let include = source.find("#include \"glb-glcore.h\"").unwrap();
    assert!(define < include);
}

#[test]
fn test_gl_source_init_body() {
    let source = gl_files(LookupPreference::Linear).source;

    assert!(source.contains("if (req_version < 32)\n\t\treturn false;"));
    assert!(source.contains("if (req_version > 43)\n\t\treturn false;"));
    assert!(source.contains("_glb_glClear = (void (*)(GLbitfield mask))LoadProcAddress(\"glClear\");"));
    assert!(source.contains("if (!_glb_glGetIntegerv || !_glb_glGetStringi)"));
    assert!(source.contains("_glb_glGetIntegerv(GL_NUM_EXTENSIONS, &num_extensions);"));
    assert!(source.contains("if (actual_version < req_version)"));
    assert!(source.contains("if (!strcmp(extname, \"GL_ARB_debug_output\")) {"));
    assert!(source.contains(
        "GLB_GL_EXT_direct_state_access = GLB_GL_EXT_direct_state_access && _glb_glNamedBufferDataEXT;"
    ));
    assert!(source.contains(
        "return (_glb_glClear && _glb_glFenceSync && _glb_glGetInteger64v && _glb_glGetIntegerv && _glb_glGetString && _glb_glGetStringi) && ((req_version < 43) || _glb_glDebugMessageCallback);"
    ));
}

#[test]
fn test_gl_source_lookup_strategy_matches_output() {
    let files = gl_files(LookupPreference::Auto);
    match files.lookup {
        "gperf" => {
            assert!(files.source.contains("in_word_set(extname, strlen(extname))"));
            assert!(!files.source.contains("strcmp(extname"));
        }
        "linear" => assert!(files.source.contains("strcmp(extname, \"GL_KHR_debug\")")),
        other => panic!("unexpected lookup {}", other),
    }
}

#[test]
fn test_named_extension_selection() {
    let registry = build(ApiKind::Gl, &load_document(fixture("gl.xml")).unwrap());
    let mut ctx = GenerationContext::new(ApiKind::Gl, "glb");
    ctx.lookup = LookupPreference::Linear;
    ctx.extensions = ExtensionSelection::from_names(["KHR_debug"]);
    let files = emit(&ctx, &registry).unwrap();

    assert!(files.header.contains("extern bool GLB_GL_KHR_debug;"));
    assert!(!files.header.contains("ARB_debug_output"));
    assert!(!files.source.contains("ARB_debug_output"));
    assert!(!files.source.contains("NamedBufferDataEXT"));
}

#[test]
fn test_gl_without_query_commands() {
    let root = parse_document(
        r#"<registry>
            <commands>
                <command><proto>void <name>glClear</name></proto></command>
            </commands>
            <feature api="gl" name="GL_VERSION_3_2" number="3.2">
                <require><command name="glClear"/></require>
            </feature>
        </registry>"#,
    )
    .unwrap();
    let registry = build(ApiKind::Gl, &root);
    let ctx = GenerationContext::new(ApiKind::Gl, "glb");
    let err = emit(&ctx, &registry).unwrap_err();
    assert!(matches!(err, EmitError::MissingQueryCommand(ref name) if name == "glGetIntegerv"));
}

// =============================================================================
// GLX
// =============================================================================

#[test]
fn test_glx_files() {
    let registry = build(ApiKind::Glx, &load_document(fixture("glx.xml")).unwrap());
    let ctx = GenerationContext::new(ApiKind::Glx, "glb");
    let files = emit(&ctx, &registry).unwrap();
    assert_eq!(files.header_name, "glb-glx.h");
    assert_eq!(files.lookup, "none");

    let header = &files.header;
    assert!(header.contains("#include <X11/Xlib.h>\n#include <X11/Xutil.h>\n#include <stdint.h>"));
    assert!(header.contains("#define GLB_GLX_VERSION 14"));
    assert!(header.contains("#define GLX_DRAWABLE_TYPE 0x8010\n"));
    assert!(header.contains("#ifndef GLB_TYPE_GLXFBConfig"));
    assert!(header.contains("extern bool GLB_GLX_EXT_swap_control;"));
    // SGI families are skipped except swap_control
    assert!(header.contains("extern bool GLB_GLX_SGI_swap_control;"));
    assert!(!header.contains("SGIX_fbconfig"));

    let source = &files.source;
    assert!(source.contains("bool GLB_GLX_EXT_swap_control = true;"));
    assert!(source.contains("GLB_GLX_EXT_swap_control = _glb_glXSwapIntervalEXT;"));
    assert!(!source.contains("num_extensions"));
    assert!(source.contains("return _glb_glXChooseFBConfig && _glb_glXSwapBuffers;"));
}

// =============================================================================
// Templates
// =============================================================================

#[test]
fn test_custom_templates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.yaml");
    std::fs::write(
        &path,
        r#"
version: "1.0"
templates:
  header:
    description: Init prototype only
    template: "int {{init_name}}(int, int);"
  source:
    description: Version range only
    template: "{{min_version}}..{{max_version}}"
  block:
    description: Unused
    template: ""
"#,
    )
    .unwrap();

    let registry = build(ApiKind::Glx, &load_document(fixture("glx.xml")).unwrap());
    let mut ctx = GenerationContext::new(ApiKind::Glx, "ext");
    ctx.templates_path = Some(path);
    let files = emit(&ctx, &registry).unwrap();
    assert_eq!(files.header, "int ext_glx_init(int, int);");
    assert_eq!(files.source, "14..14");
}
