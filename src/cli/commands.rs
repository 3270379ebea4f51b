use crate::config::BuildMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build orchestrator for scene-based static content sites
#[derive(Parser, Debug)]
#[command(
    name = "scenery",
    about = "Build orchestrator for scene-based static content sites",
    version,
    author,
    long_about = "scenery compiles each scene of a content site with the optimizing \
                  compiler, merges the markup import graph into deduplicated bundles, \
                  expands every page per locale and publishes a hashed version manifest."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (can be used multiple times)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build the site",
        long_about = "Compiles the selected scenes and, in prod mode, bundles, localizes \
                      and publishes them under a versioned output directory.\n\n\
                      Examples:\n  \
                      scenery build\n  \
                      scenery build /path/to/site --mode prod\n  \
                      scenery build --scene boatload,jetpack --compile\n  \
                      scenery build --mode prod --build-tag v202608230800"
    )]
    Build(BuildArgs),

    #[command(
        about = "List the scenes in the catalog",
        long_about = "Prints every scene the catalog declares along with its compile \
                      configuration.\n\n\
                      Examples:\n  \
                      scenery scenes\n  \
                      scenery scenes /path/to/site"
    )]
    Scenes(ScenesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the site root (defaults to current directory)"
    )]
    pub site_root: Option<PathBuf>,

    #[arg(short = 'm', long, value_enum, default_value = "dev", help = "Build mode")]
    pub mode: BuildModeArg,

    #[arg(
        short = 's',
        long = "scene",
        value_name = "ID",
        value_delimiter = ',',
        help = "Scene(s) to build; omit to build every scene"
    )]
    pub scenes: Vec<String>,

    #[arg(long, help = "Force full optimization for every scene")]
    pub compile: bool,

    #[arg(long, help = "Fail the build on any missing translation")]
    pub strict: bool,

    #[arg(
        short = 'b',
        long,
        value_name = "TAG",
        help = "Version tag for the output directory (defaults to the current UTC minute)"
    )]
    pub build_tag: Option<String>,

    #[arg(long, help = "Readable output: no minification, unversioned directory")]
    pub pretty: bool,

    #[arg(
        short = 'j',
        long,
        value_name = "N",
        default_value = "0",
        help = "Parallel compile workers (0 = derive from CPU count)"
    )]
    pub jobs: usize,

    #[arg(
        long,
        value_name = "PATH",
        help = "Compiler binary or jar (defaults to SCENERY_COMPILER, then closure-compiler)"
    )]
    pub compiler: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ScenesArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to the site root (defaults to current directory)"
    )]
    pub site_root: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildModeArg {
    Dev,
    Prod,
}

impl From<BuildModeArg> for BuildMode {
    fn from(arg: BuildModeArg) -> Self {
        match arg {
            BuildModeArg::Dev => BuildMode::Dev,
            BuildModeArg::Prod => BuildMode::Prod,
        }
    }
}
