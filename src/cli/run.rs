//! Running the transform over the command-line inputs.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::Cli;
use crate::config::{MungConfig, MungJob};
use crate::log;
use crate::mung::MungStats;

/// Where one document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// Inputs named on the command line; none or `-` means stdin.
    pub fn collect(paths: &[PathBuf]) -> Vec<Self> {
        if paths.is_empty() {
            return vec![Self::Stdin];
        }
        paths
            .iter()
            .map(|path| {
                if path.as_os_str() == "-" {
                    Self::Stdin
                } else {
                    Self::File(path.clone())
                }
            })
            .collect()
    }

    fn read(&self) -> Result<String> {
        match self {
            Self::Stdin => {
                let mut xml = String::new();
                io::stdin()
                    .read_to_string(&mut xml)
                    .context("Failed to read stdin")?;
                Ok(xml)
            }
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load config, then transform every input.
pub fn run(cli: &Cli) -> Result<()> {
    crate::logger::set_verbose(cli.verbose);

    let config = MungConfig::load(cli)?;
    if let Some(path) = &config.config_path {
        crate::debug!("config"; "loaded {}", path.display());
    }
    let job = config.compile()?;
    crate::debug!(
        "config";
        "each `{}`, from `{}`, to `{}`, transform {}",
        job.munger.each(),
        job.munger.from(),
        job.munger.to(),
        job.transform.mode().as_str()
    );

    let inputs = Input::collect(&cli.inputs);
    check_usage(cli, &inputs)?;

    let mut total = MungStats::default();
    for input in &inputs {
        let stats = process(cli, &job, input)?;
        log!(
            "mung";
            "{input}: {} contexts, {} written, {} created",
            stats.contexts, stats.written, stats.created
        );
        total.merge(stats);
    }

    if inputs.len() > 1 {
        log!(
            "mung";
            "{} files: {} contexts, {} written, {} created",
            inputs.len(), total.contexts, total.written, total.created
        );
    }
    Ok(())
}

fn check_usage(cli: &Cli, inputs: &[Input]) -> Result<()> {
    if cli.output.is_some() && inputs.len() > 1 {
        bail!("--output accepts a single input, got {}", inputs.len());
    }
    if cli.in_place && inputs.contains(&Input::Stdin) {
        bail!("--in-place cannot rewrite stdin");
    }
    if inputs.iter().filter(|input| **input == Input::Stdin).count() > 1 {
        bail!("stdin can only be read once");
    }
    Ok(())
}

fn process(cli: &Cli, job: &MungJob, input: &Input) -> Result<MungStats> {
    let xml = input.read()?;
    let (out, stats) = job
        .run(&xml)
        .with_context(|| format!("Failed to transform {input}"))?;

    match (input, &cli.output) {
        (_, Some(output)) => write_file(output, &out)?,
        (Input::File(path), None) if cli.in_place => write_file(path, &out)?,
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(out.as_bytes())
                .context("Failed to write stdout")?;
            stdout.flush().ok();
        }
    }

    Ok(stats)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
