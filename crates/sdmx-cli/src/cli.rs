//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sdmx-codelists",
    version,
    about = "Turn SDMX code lists into SKOS Turtle documents",
    long_about = "Flatten SDMX code-list documents into analysis tables, mint stable\n\
                  URIs for every code list and code, write one SKOS concept scheme per\n\
                  list plus a combined document, and score each document for quality."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the pipeline.
    Run(RunArgs),

    /// List known owning organizations and their labels.
    Organizations(ConfigArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// TOML run configuration; defaults apply when omitted.
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Download source documents before flattening.
    #[arg(long = "retrieval", overrides_with = "no_retrieval")]
    pub retrieval: bool,

    /// Skip downloading (the default).
    #[arg(long = "no-retrieval")]
    pub no_retrieval: bool,

    /// Flatten and analyze source documents (the default).
    #[arg(long = "analysis", overrides_with = "no_analysis")]
    pub analysis: bool,

    /// Reuse the filtered tables of an earlier run instead of analyzing.
    #[arg(long = "no-analysis")]
    pub no_analysis: bool,
}

impl RunArgs {
    pub fn retrieval_override(&self) -> Option<bool> {
        flag_override(self.retrieval, self.no_retrieval)
    }

    pub fn analysis_override(&self) -> Option<bool> {
        flag_override(self.analysis, self.no_analysis)
    }
}

fn flag_override(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
