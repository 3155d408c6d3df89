//! glbindify binary
use anyhow::Result;
use bindify_cli::cli::{Cli, Commands};
use bindify_cli::{config, pipeline, ProbeRequest};
use bindify_core::format_version;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BINDIFY_LOG";

fn setup_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Generate { target, out_dir } => {
            let ctx = config::resolve(cli.config.as_deref(), &target, out_dir.as_deref())?;
            let report = pipeline::generate(&ctx)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Generated {} bindings '{}' ({}..{}, {} extension(s), lookup {})",
                    report.api,
                    report.namespace,
                    format_version(report.interface.min_version),
                    format_version(report.interface.max_version),
                    report.interface.extensions.len(),
                    report.lookup,
                );
                for artifact in &report.artifacts {
                    println!("  {} ({} bytes)", artifact.path, artifact.bytes);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Probe {
            target,
            library,
            request,
            advertised,
            context_version,
        } => {
            let ctx = config::resolve(cli.config.as_deref(), &target, None)?;
            let outcome = pipeline::probe(
                &ctx,
                &ProbeRequest {
                    library,
                    version: request,
                    advertised,
                    context_version,
                },
            )?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "{} {}: {}",
                    ctx.api,
                    format_version(outcome.requested),
                    if outcome.supported { "supported" } else { "unsupported" }
                );
                if let Some(failure) = &outcome.failure {
                    println!("  {}", failure);
                }
                for key in &outcome.missing {
                    println!("  missing {}", key);
                }
                for (name, present) in &outcome.extensions {
                    println!("  {} {}", if *present { "+" } else { "-" }, name);
                }
            }
            Ok(if outcome.supported {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
    }
}
