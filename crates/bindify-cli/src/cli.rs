//! Command line definition
use bindify_core::{LookupPreference, ProfilePolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "glbindify",
    version,
    about = "Generate C loaders for the Khronos GL, GLX and WGL registries"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Print the run report as JSON on stdout")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Debug logging (BINDIFY_LOG takes precedence)")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "YAML configuration file; flags override its values"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the header and source for one API
    Generate {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(short, long, value_name = "DIR", help = "Directory for the generated files")]
        out_dir: Option<PathBuf>,
    },
    /// Evaluate the loader contract against a GL library, without emitting
    Probe {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(long, value_name = "PATH", help = "GL library (platform default if omitted)")]
        library: Option<PathBuf>,

        #[arg(
            long,
            value_name = "MAJOR.MINOR",
            help = "Version passed to init (the API minimum if omitted)"
        )]
        request: Option<String>,

        #[arg(
            long = "advertise",
            value_name = "NAME",
            help = "Extension string the context advertises (repeatable)"
        )]
        advertised: Vec<String>,

        #[arg(long, value_name = "MAJOR.MINOR", help = "Version the context reports")]
        context_version: Option<String>,
    },
}

/// Settings shared by every subcommand, each overriding the config file
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    #[arg(short, long, help = "Target API: gl, glx or wgl")]
    pub api: Option<String>,

    #[arg(short, long, help = "First part of every emitted symbol and file name")]
    pub namespace: Option<String>,

    #[arg(short, long, value_name = "DIR", help = "Directory holding {api}.xml")]
    pub srcdir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub profile: Option<ProfileArg>,

    #[arg(
        short = 'e',
        long = "extension",
        value_name = "NAME",
        help = "Bind only these extensions, bare names (repeatable)"
    )]
    pub extensions: Vec<String>,

    #[arg(
        long = "exempt",
        value_name = "NAME",
        help = "Extension allowed to list commands owned elsewhere (repeatable)"
    )]
    pub exempt_extensions: Vec<String>,

    #[arg(long, value_name = "MAJOR.MINOR", help = "Highest version to bind")]
    pub max_version: Option<String>,

    #[arg(long, value_enum)]
    pub lookup: Option<LookupArg>,

    #[arg(long, value_name = "FILE", help = "Templates file replacing the built-in one")]
    pub templates: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Core,
    Compatibility,
}

impl From<ProfileArg> for ProfilePolicy {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Core => ProfilePolicy::Core,
            ProfileArg::Compatibility => ProfilePolicy::Compatibility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupArg {
    Auto,
    Gperf,
    Linear,
}

impl From<LookupArg> for LookupPreference {
    fn from(arg: LookupArg) -> Self {
        match arg {
            LookupArg::Auto => LookupPreference::Auto,
            LookupArg::Gperf => LookupPreference::Gperf,
            LookupArg::Linear => LookupPreference::Linear,
        }
    }
}
