//! Command-line interface module.

mod args;
mod run;

pub use args::Cli;
pub use run::{Input, run};
