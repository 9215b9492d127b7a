//! CLI argument definitions for the trellis tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "trellis",
    version,
    about = "Build, inspect and query trellis displays",
    long_about = "Build trellis display artifacts from cognostic tables, then inspect,\n\
                  filter, sort and page through them from the terminal.\n\n\
                  The app root defaults to $TRELLIS_APP_DIR, else the current directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
    /// Encode a cognostic table into a display under an app root.
    Build(BuildArgs),

    /// Show a display's metas, row count and decode warnings.
    Inspect(DisplayArgs),

    /// Filter, sort and page through a display.
    Query(QueryArgs),

    /// List, save or delete the named views stored in a display.
    Views {
        #[command(subcommand)]
        action: ViewsAction,
    },
}

#[derive(Args)]
pub struct BuildArgs {
    /// JSON array of meta descriptors.
    #[arg(long = "metas", value_name = "JSON")]
    pub metas: PathBuf,

    /// CSV file with one row per panel; must have a `panelKey` column.
    #[arg(long = "data", value_name = "CSV")]
    pub data: PathBuf,

    /// Display name.
    #[arg(long = "name")]
    pub name: String,

    #[arg(long = "description", default_value = "")]
    pub description: String,

    /// App root to write into (the display lands in <OUT>/displays/<NAME>/).
    #[arg(long = "out", value_name = "DIR")]
    pub out: PathBuf,

    /// Directory of rendered panel files to copy next to the display.
    #[arg(long = "panels", value_name = "DIR")]
    pub panels: Option<PathBuf>,

    /// Fail on factor values that are not one of the levels.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Base directory recorded for file panels (adds a panel column if the
    /// metas have none).
    #[arg(long = "panel-base", value_name = "DIR")]
    pub panel_base: Option<String>,
}

/// Which display to open.
#[derive(Args, Clone)]
pub struct DisplayArgs {
    /// App root or display directory.
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Named display under <ROOT>/displays/ (default: the first one).
    #[arg(long = "display", value_name = "NAME")]
    pub display: Option<String>,
}

/// Session state flags shared by `query` and `views save`.
#[derive(Args, Clone, Default)]
pub struct StateArgs {
    /// Filter, repeatable: `var=a,b` (select), `var=min..max` (range, either
    /// bound optional), `var~text` (substring).
    #[arg(long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Sort key `var[:asc|desc]`, repeatable; the first one has top priority.
    #[arg(long = "sort", value_name = "KEY")]
    pub sorts: Vec<String>,

    #[arg(long = "ncol")]
    pub ncol: Option<usize>,

    #[arg(long = "nrow")]
    pub nrow: Option<usize>,

    /// Variables shown as panel labels.
    #[arg(long = "labels", value_delimiter = ',', value_name = "VARS")]
    pub labels: Option<Vec<String>>,
}

#[derive(Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub target: DisplayArgs,

    #[command(flatten)]
    pub state: StateArgs,

    /// Start from a saved view; other flags apply on top of it.
    #[arg(long = "view", value_name = "NAME")]
    pub view: Option<String>,

    /// Free-text search over factor, string and href columns.
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    #[arg(long = "page", default_value_t = 1)]
    pub page: usize,
}

#[derive(Subcommand)]
pub enum ViewsAction {
    /// List stored views.
    List(DisplayArgs),

    /// Save (or replace) a view built from state flags.
    Save {
        name: String,
        #[command(flatten)]
        target: DisplayArgs,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Delete the view at a position shown by `views list`.
    Delete {
        index: usize,
        #[command(flatten)]
        target: DisplayArgs,
    },
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
