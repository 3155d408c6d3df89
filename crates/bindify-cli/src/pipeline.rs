//! Generation pipeline: schema → registry → interfaces and contract →
//! emitted files, each step timed by the [`PipelineRunner`].

use bindify_core::{
    parse_version, BindifyError, GenerationContext, GenerationReport, InterfaceStats,
    PipelineRunner, ResolvedInterface,
};
use bindify_loader::{
    default_library, platform_resolver, ExtensionQuery, LoadOutcome, LoaderContract,
    StaticExtensions,
};
use bindify_out::{EmitRequest, EmittedFiles, Emitter};
use bindify_registry::{
    compose, resolve_types, selected_extensions, CompatRules, Registry, RegistryBuilder,
};
use bindify_schema::{load_document, SchemaNode};
use std::path::PathBuf;
use tracing::info;

fn schema_error(ctx: &GenerationContext, reason: impl ToString) -> BindifyError {
    BindifyError::Schema {
        path: ctx.schema_path.display().to_string(),
        reason: reason.to_string(),
    }
}

pub fn parse_schema(ctx: &GenerationContext) -> Result<SchemaNode, BindifyError> {
    load_document(&ctx.schema_path).map_err(|e| schema_error(ctx, e))
}

pub fn build_registry(ctx: &GenerationContext, root: &SchemaNode) -> Result<Registry, BindifyError> {
    let compat = CompatRules::for_api(ctx.api).with_exempt(ctx.exempt_extensions.iter().cloned());
    let mut builder = RegistryBuilder::with_compat(ctx.api, ctx.profile, compat);
    builder.ingest(root).map_err(|e| schema_error(ctx, e))?;
    Ok(builder.finish())
}

/// Everything one target is emitted or probed from
pub struct Target<'r> {
    pub extensions: Vec<&'r str>,
    pub base: ResolvedInterface,
    pub full: ResolvedInterface,
    pub contract: LoaderContract,
}

impl<'r> Target<'r> {
    pub fn resolve(ctx: &GenerationContext, registry: &'r Registry) -> Result<Self, BindifyError> {
        let max_rank = registry.max_rank().ok_or_else(|| {
            schema_error(ctx, format!("no feature blocks for api '{}'", ctx.api))
        })?;
        let ceiling = ctx.resolve_ceiling(max_rank)?;
        let extensions = selected_extensions(registry, &ctx.extensions);

        let mut base = compose(registry, ctx.api.min_version(), None::<&str>);
        resolve_types(&mut base, registry);
        let mut full = compose(registry, ceiling, extensions.iter().copied());
        resolve_types(&mut full, registry);

        let contract =
            LoaderContract::generate(registry, &full, extensions.iter().copied()).with_ceiling(ceiling);
        Ok(Self {
            extensions,
            base,
            full,
            contract,
        })
    }

    pub fn request<'a>(&'a self, registry: &'a Registry) -> EmitRequest<'a> {
        EmitRequest {
            registry,
            base: &self.base,
            extensions: &self.extensions,
            contract: &self.contract,
        }
    }

    fn stats(&self) -> InterfaceStats {
        InterfaceStats {
            min_version: self.contract.min_version,
            max_version: self.contract.max_version,
            base_commands: self.contract.base_commands.len(),
            full_commands: self.full.command_keys.len(),
            full_enums: self.full.enum_keys.len(),
            extensions: self.extensions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn write_files(ctx: &GenerationContext, files: &EmittedFiles) -> Result<[PathBuf; 2], BindifyError> {
    std::fs::create_dir_all(&ctx.out_dir).map_err(|e| BindifyError::io(&ctx.out_dir, e))?;
    let header = ctx.out_dir.join(&files.header_name);
    let source = ctx.out_dir.join(&files.source_name);
    std::fs::write(&header, &files.header).map_err(|e| BindifyError::io(&header, e))?;
    std::fs::write(&source, &files.source).map_err(|e| BindifyError::io(&source, e))?;
    Ok([header, source])
}

// ============================================================================
// GENERATE
// ============================================================================

pub fn generate(ctx: &GenerationContext) -> Result<GenerationReport, BindifyError> {
    let mut runner = PipelineRunner::new(ctx.run_id.clone());
    info!(
        api = %ctx.api,
        namespace = %ctx.namespace,
        schema = %ctx.schema_path.display(),
        "generating bindings"
    );

    let root = runner.step("parse", || parse_schema(ctx))?;
    let registry = runner.step("build", || build_registry(ctx, &root))?;
    let target = runner.step("compose", || Target::resolve(ctx, &registry))?;
    let files = runner.step("emit", || -> Result<EmittedFiles, BindifyError> {
        let emitter = Emitter::for_context(ctx)?;
        Ok(emitter.emit(ctx, &target.request(&registry))?)
    })?;
    let [header_path, source_path] = runner.step("write", || write_files(ctx, &files))?;
    info!(
        header = %header_path.display(),
        source = %source_path.display(),
        "bindings written"
    );

    let artifacts = vec![
        runner.artifact(&header_path.display().to_string(), files.header.as_bytes()),
        runner.artifact(&source_path.display().to_string(), files.source.as_bytes()),
    ];

    Ok(GenerationReport {
        run_id: ctx.run_id.clone(),
        api: ctx.api.to_string(),
        namespace: ctx.namespace.clone(),
        schema: ctx.schema_path.display().to_string(),
        generated_at: chrono::Utc::now(),
        registry: registry.stats(),
        interface: target.stats(),
        lookup: files.lookup.to_string(),
        warnings: registry.warnings().iter().map(ToString::to_string).collect(),
        steps: runner.into_steps(),
        artifacts,
    })
}

// ============================================================================
// PROBE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ProbeRequest {
    pub library: Option<PathBuf>,
    /// "major.minor"; the API minimum when absent
    pub version: Option<String>,
    /// Full extension strings the context is taken to advertise
    pub advertised: Vec<String>,
    pub context_version: Option<String>,
}

fn split_version(text: &str) -> Result<(u32, u32), BindifyError> {
    parse_version(text)
        .map(|rank| (rank / 10, rank % 10))
        .ok_or_else(|| BindifyError::Config(format!("'{}' is not a version number", text)))
}

/// Evaluate the loader contract in-process against a real library
pub fn probe(ctx: &GenerationContext, request: &ProbeRequest) -> Result<LoadOutcome, BindifyError> {
    let root = parse_schema(ctx)?;
    let registry = build_registry(ctx, &root)?;
    let target = Target::resolve(ctx, &registry)?;

    let (major, minor) = match request.version.as_deref() {
        Some(text) => split_version(text)?,
        None => {
            let min = ctx.api.min_version();
            (min / 10, min % 10)
        }
    };

    let mut query = StaticExtensions::new(request.advertised.iter().cloned());
    if let Some(text) = request.context_version.as_deref() {
        let (maj, min) = split_version(text)?;
        query = query.with_version(maj, min);
    }

    let library = request
        .library
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_library()));
    let resolver = platform_resolver(ctx.api, &library)?;
    info!(library = %library.display(), major, minor, "probing");

    let query: Option<&dyn ExtensionQuery> = if target.contract.enumerates_extensions() {
        Some(&query)
    } else {
        None
    };
    Ok(target.contract.init(major, minor, &resolver, query))
}
