use clap::{Parser, Subcommand, ValueEnum};

use core::fmt;
use std::{path::PathBuf, time::Duration};

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    propagate_version = true,
    infer_long_args = true,
    infer_subcommands = true,
    flatten_help = true
)]
#[command(help_template = HELP_TEMPLATE)]
pub struct Options {
    #[command(subcommand)]
    pub command: Commands,
    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Clone, Debug, Parser)]
pub struct CommonOptions {
    /// Path to settings file
    #[arg(global = true, short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Registry directory, overrides the settings file
    #[arg(global = true, short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Increase log level (will be overridden by --log-level).
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(global = true, long, value_name = "LEVEL")]
    pub log_level: Option<log::LevelFilter>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    List(ListOptions),
    /// Print the active profile
    Active,
    Create(CreateArgs),
    Activate(SelectOptions),
    Deactivate(SelectOptions),
    Remove(RemoveOptions),
    Gc(GcOptions),
    /// Adopt a legacy single-profile layout as profile 0
    Migrate,
    /// Validate and print the effective configuration
    Validate,
    /// Print an example configuration file
    ExampleConfig,
}

#[derive(Clone, Debug, Parser)]
#[command(about = "List profiles")]
pub struct ListOptions {
    /// Also list removed profiles waiting for collection.
    #[arg(long)]
    pub gc: bool,
}

#[derive(Clone, Debug, Parser)]
#[command(about = "Create a profile")]
pub struct CreateArgs {
    /// Display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Explicit id, defaults to the next free id
    #[arg(long)]
    pub id: Option<u64>,

    /// Do not make the new profile active.
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Clone, Debug, Parser)]
#[command(about = "Change the active flag of a profile")]
#[command(arg_required_else_help = true)]
pub struct SelectOptions {
    /// Profile id
    #[arg(value_name = "ID")]
    pub id: u64,
}

#[derive(Clone, Debug, Parser)]
#[command(about = "Remove profiles, their storage is deleted by gc")]
#[command(arg_required_else_help = true)]
pub struct RemoveOptions {
    /// Profile ids
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<u64>,

    /// Prompt according to WHEN: never, once, or always
    ///
    /// `-i` or `--interactive` means `--interactive=always`.
    #[arg(
        short,
        long,
        value_name = "WHEN",
        default_value_t = Interactive::Once,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "always",
        default_value_if("no_prompt", "true", "never")
    )]
    pub interactive: Interactive,

    /// Never prompt flag, override by `--interactive`.
    #[arg(short, long)]
    pub no_prompt: bool,
}

#[derive(Clone, Debug, Parser)]
#[command(about = "Delete the storage of removed profiles")]
pub struct GcOptions {
    /// Grace period, defaults to `gc_delay` of the settings file
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub delay: Option<Duration>,

    /// Do not output statistic data.
    #[arg(long)]
    pub no_statistic: bool,
}

#[derive(Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum Interactive {
    Never,
    Once,
    Always,
}

impl fmt::Display for Interactive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Interactive::Never => write!(f, "never"),
            Interactive::Once => write!(f, "once"),
            Interactive::Always => write!(f, "always"),
        }
    }
}
