//! C loader emission
//!
//! Renders a header and a source file for one target from a registry, its
//! base interface and its loader contract. Layout lives in Handlebars
//! templates (built in, or a user file with the same template names);
//! [`model`] computes everything they print.

pub mod lookup;
pub mod model;
pub mod renderer;
pub mod templates;

pub use lookup::{
    generate_lookup, ExtensionLookup, LinearLookup, LookupCode, LookupEntry, LookupError,
};
#[cfg(feature = "gperf")]
pub use lookup::GperfLookup;
pub use model::{c_expression, HeaderModel, Naming, SourceModel};
pub use renderer::TemplateRenderer;
pub use templates::{Template, TemplatesFile};

use bindify_core::{BindifyError, GenerationContext, ResolvedInterface};
use bindify_loader::LoaderContract;
use bindify_registry::Registry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("EMIT/templates: {0}")]
    Templates(String),

    #[error("EMIT/template '{name}': {reason}")]
    Template { name: String, reason: String },

    #[error("EMIT/render '{name}': {reason}")]
    Render { name: String, reason: String },

    #[error("EMIT/{0} is needed to enumerate extensions but is not loaded")]
    MissingQueryCommand(String),
}

impl From<EmitError> for BindifyError {
    fn from(err: EmitError) -> Self {
        let detail = err.to_string();
        let detail = detail.strip_prefix("EMIT/").unwrap_or(&detail);
        BindifyError::Emit(detail.to_string())
    }
}

/// What one target is emitted from
pub struct EmitRequest<'a> {
    pub registry: &'a Registry,
    /// Type-closed interface at the minimum version
    pub base: &'a ResolvedInterface,
    /// Bound extensions, bare names
    pub extensions: &'a [&'a str],
    pub contract: &'a LoaderContract,
}

#[derive(Debug, Clone)]
pub struct EmittedFiles {
    pub header_name: String,
    pub header: String,
    pub source_name: String,
    pub source: String,
    /// Extension lookup strategy used by the source
    pub lookup: &'static str,
}

pub struct Emitter<'a> {
    renderer: TemplateRenderer<'a>,
}

impl<'a> Emitter<'a> {
    pub fn new(templates: TemplatesFile) -> Result<Self, EmitError> {
        Ok(Self {
            renderer: TemplateRenderer::new(templates)?,
        })
    }

    /// Built-in templates, or the file the context names
    pub fn for_context(ctx: &GenerationContext) -> Result<Self, EmitError> {
        let templates = match &ctx.templates_path {
            Some(path) => TemplatesFile::load(path)?,
            None => TemplatesFile::builtin()?,
        };
        Self::new(templates)
    }

    pub fn emit(
        &self,
        ctx: &GenerationContext,
        request: &EmitRequest<'_>,
    ) -> Result<EmittedFiles, EmitError> {
        let naming = Naming::new(ctx);
        let header_name = ctx.header_name();

        let (code, lookup) = if request.contract.enumerates_extensions() {
            generate_lookup(ctx.lookup, &model::lookup_entries(&naming, request.contract))
        } else {
            (LookupCode::default(), "none")
        };

        let header_model = HeaderModel::build(
            &naming,
            request.registry,
            request.base,
            request.extensions,
            request.contract.max_version,
        );
        let source_model =
            SourceModel::build(&naming, &header_name, request.registry, request.contract, code)?;

        let header = self.renderer.render("header", &header_model)?;
        let source = self.renderer.render("source", &source_model)?;
        tracing::info!(
            header = %header_name,
            header_bytes = header.len(),
            source_bytes = source.len(),
            lookup,
            "emitted loader"
        );

        Ok(EmittedFiles {
            header_name,
            header,
            source_name: ctx.source_name(),
            source,
            lookup,
        })
    }
}
