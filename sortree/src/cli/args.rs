//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::config::SortKey;

/// Print indented outlines as trees with every level kept in sorted order
#[derive(Parser, Debug)]
#[command(name = "sortree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d, -d -d, -d -d -d)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print an outline as a sorted tree
    Sort {
        /// Outline file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        sort: SortArgs,
    },

    /// Rename a node and print the re-sorted tree
    Rename {
        /// Outline file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Label path of the node, e.g. `fruit/apple`
        path: String,
        /// New label
        label: String,
        #[command(flatten)]
        sort: SortArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Sort options overriding the loaded settings
#[derive(Args, Debug, Default, Clone)]
pub struct SortArgs {
    /// Compare labels by this key
    #[arg(short, long, value_enum)]
    pub key: Option<SortKey>,

    /// Sort in descending order
    #[arg(long, conflicts_with = "ascending")]
    pub descending: bool,

    /// Sort in ascending order, overriding a configured `descending = true`
    #[arg(long)]
    pub ascending: bool,

    /// Ignore case for lexical comparison
    #[arg(short = 'i', long, conflicts_with = "match_case")]
    pub ignore_case: bool,

    /// Compare case-sensitively, overriding a configured `case_insensitive = true`
    #[arg(long)]
    pub match_case: bool,

    /// Spaces per outline level
    #[arg(long)]
    pub indent: Option<usize>,
}

impl SortArgs {
    /// `Some` only when a direction flag was given.
    pub fn descending_override(&self) -> Option<bool> {
        flag_pair(self.descending, self.ascending)
    }

    pub fn case_insensitive_override(&self) -> Option<bool> {
        flag_pair(self.ignore_case, self.match_case)
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings as TOML
    Show,
    /// Show global config file path
    Path,
}
