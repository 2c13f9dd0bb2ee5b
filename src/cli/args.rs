//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

use crate::transform::TransformMode;

/// Rewrite the text of XML elements into sibling elements
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// XML files to transform. Reads stdin when omitted or `-`
    #[arg(value_name = "INPUT", value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Config file path (default: mung.toml, searched upward)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Context selector, e.g. `trans-unit`
    #[arg(short, long, value_name = "SELECTOR")]
    pub each: Option<String>,

    /// Source selector, relative to each context
    #[arg(short, long, value_name = "SELECTOR")]
    pub from: Option<String>,

    /// Destination selector, created when missing
    #[arg(short, long, value_name = "SELECTOR")]
    pub to: Option<String>,

    /// Replace destinations that already have content
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub overwrite: Option<bool>,

    /// Keep text matching this regex unchanged (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    pub skip: Vec<String>,

    /// Built-in transform
    #[arg(short, long, value_enum)]
    pub mode: Option<TransformMode>,

    /// JSON replacement table (implies `--mode table` when no mode is set)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub table: Option<PathBuf>,

    /// Write output to file instead of stdout (single input only)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Rewrite each input file
    #[arg(short, long)]
    pub in_place: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
