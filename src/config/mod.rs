//! Configuration management for `mung.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error.rs   # ConfigError, ConfigDiagnostics
//! ├── field.rs   # FieldPath
//! ├── util.rs    # config discovery, path helpers
//! └── mod.rs     # MungConfig, MungJob (this file)
//! ```
//!
//! # Fields
//!
//! | Field               | Purpose                                         |
//! |---------------------|-------------------------------------------------|
//! | `each`              | context selector                                |
//! | `from`              | source selector (child chain)                   |
//! | `to`                | destination selector (child chain)              |
//! | `overwrite`         | replace populated destinations                  |
//! | `skip`              | regex alternatives kept out of the transform    |
//! | `[transform]`       | built-in transform and its replacement table    |
//!
//! Command-line flags override file values; `--skip` patterns are appended.

mod error;
mod field;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
pub use util::find_config_file;

use util::resolve_relative;

use crate::cli::Cli;
use crate::error::Result as MungResult;
use crate::{debug, log};
use crate::mung::{MungStats, Munger, SkipMatcher};
use crate::selector::Selector;
use crate::transform::{ReplaceTable, Transform, TransformMode};
use anyhow::{Context, Result};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// File name searched for when no `--config` is given.
pub const DEFAULT_CONFIG: &str = "mung.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing mung.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MungConfig {
    /// Path of the file this was loaded from (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub each: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub overwrite: bool,
    pub skip: Vec<String>,
    pub transform: TransformConfig,
}

/// `[transform]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransformConfig {
    /// Defaults to `table` when a table is given, `none` otherwise.
    pub mode: Option<TransformMode>,
    /// JSON object of replacements, relative to the config file.
    pub file: Option<PathBuf>,
    /// Inline replacements; these win over entries from `file`.
    pub map: FxHashMap<String, String>,
}

impl MungConfig {
    const EACH: FieldPath = FieldPath::new("each");
    const FROM: FieldPath = FieldPath::new("from");
    const TO: FieldPath = FieldPath::new("to");
    const SKIP: FieldPath = FieldPath::new("skip");
    const MODE: FieldPath = FieldPath::new("transform.mode");
    const FILE: FieldPath = FieldPath::new("transform.file");
    const MAP: FieldPath = FieldPath::new("transform.map");

    /// Load configuration for a command line.
    ///
    /// An explicit `--config` must exist. Otherwise `mung.toml` is searched
    /// upward from the current directory and defaults apply when none is
    /// found.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let path = match &cli.config {
            Some(path) => {
                let path = resolve_relative(&cwd, path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => find_config_file(&cwd, Path::new(DEFAULT_CONFIG)),
        };

        let mut config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let root = path.parent().unwrap_or_else(|| Path::new(""));
        if let Some(file) = config.transform.file.take() {
            config.transform.file = Some(resolve_relative(root, &file));
        }
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            eprintln!("- {field}");
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        Self::update_field(&mut self.each, &cli.each);
        Self::update_field(&mut self.from, &cli.from);
        Self::update_field(&mut self.to, &cli.to);
        Self::update_option(&mut self.overwrite, cli.overwrite.as_ref());
        self.skip.extend(cli.skip.iter().cloned());
        Self::update_field(&mut self.transform.mode, &cli.mode);
        Self::update_field(&mut self.transform.file, &cli.table);
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update an optional config field if the CLI sets it.
    fn update_field<T: Clone>(config_field: &mut Option<T>, cli_field: &Option<T>) {
        if cli_field.is_some() {
            config_field.clone_from(cli_field);
        }
    }

    /// Effective transform mode.
    pub fn transform_mode(&self) -> TransformMode {
        match self.transform.mode {
            Some(mode) => mode,
            None if self.transform.file.is_some() || !self.transform.map.is_empty() => {
                TransformMode::Table
            }
            None => TransformMode::None,
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate everything and build a runnable job.
    ///
    /// Collects all problems and returns them at once.
    pub fn compile(&self) -> Result<MungJob, ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        let munger = self.compile_munger(&mut diag);
        let skip = self.compile_skip(&mut diag);
        let transform = self.compile_transform(&mut diag);

        match (munger, transform) {
            (Some(munger), Some(transform)) if diag.is_empty() => Ok(MungJob {
                munger,
                transform,
                skip,
            }),
            _ => Err(ConfigError::Diagnostics(diag)),
        }
    }

    fn compile_munger(&self, diag: &mut ConfigDiagnostics) -> Option<Munger> {
        type Check = fn(&Selector) -> MungResult<()>;
        let fields: [(FieldPath, &Option<String>, &str, Check); 3] = [
            (Self::EACH, &self.each, "--each", Selector::ensure_matchable),
            (Self::FROM, &self.from, "--from", Selector::ensure_child_chain),
            (Self::TO, &self.to, "--to", Selector::ensure_child_chain),
        ];

        let mut valid = true;
        for (field, value, flag, check) in fields {
            let Some(text) = value else {
                diag.error_with_hint(
                    field,
                    "selector is required",
                    format!("set `{}` in {DEFAULT_CONFIG} or pass {flag}", field.as_str()),
                );
                valid = false;
                continue;
            };
            if let Err(err) = Selector::parse(text).and_then(|s| check(&s)) {
                diag.error(field, err.to_string());
                valid = false;
            }
        }

        let (true, Some(each), Some(from), Some(to)) = (valid, &self.each, &self.from, &self.to)
        else {
            return None;
        };
        match Munger::new(each, from, to) {
            Ok(munger) => Some(munger.overwrite(self.overwrite)),
            Err(err) => {
                diag.error(Self::TO, err.to_string());
                None
            }
        }
    }

    fn compile_skip(&self, diag: &mut ConfigDiagnostics) -> Option<Regex> {
        if self.skip.is_empty() {
            return None;
        }

        for pattern in &self.skip {
            if let Err(err) = Regex::new(pattern) {
                diag.error_with_hint(
                    Self::SKIP,
                    format!("invalid pattern `{pattern}`: {err}"),
                    "patterns use `regex` crate syntax",
                );
            }
        }
        if diag.errors().iter().any(|d| d.field == Self::SKIP) {
            return None;
        }

        let joined = self
            .skip
            .iter()
            .map(|pattern| format!("(?:{pattern})"))
            .collect::<Vec<_>>()
            .join("|");
        match Regex::new(&joined) {
            Ok(regex) => Some(regex),
            Err(err) => {
                diag.error(Self::SKIP, err.to_string());
                None
            }
        }
    }

    fn compile_transform(&self, diag: &mut ConfigDiagnostics) -> Option<Transform> {
        match self.transform_mode() {
            TransformMode::None => Some(Transform::None),
            TransformMode::Upper => Some(Transform::Upper),
            TransformMode::Lower => Some(Transform::Lower),
            TransformMode::Ascii => Some(Transform::Ascii),
            TransformMode::Table => self.compile_table(diag).map(Transform::Table),
        }
    }

    fn compile_table(&self, diag: &mut ConfigDiagnostics) -> Option<ReplaceTable> {
        if self.transform.file.is_none() && self.transform.map.is_empty() {
            diag.error_with_hint(
                Self::MODE,
                "`table` mode needs a replacement table",
                "set `transform.file` or `[transform.map]`, or pass --table",
            );
            return None;
        }

        let mut entries = FxHashMap::default();
        if let Some(file) = &self.transform.file {
            let loaded = fs::read_to_string(file)
                .map_err(|err| format!("cannot read {}: {err}", file.display()))
                .and_then(|text| {
                    ReplaceTable::parse_json(&text)
                        .map_err(|err| format!("{} is not a JSON string map: {err}", file.display()))
                });
            match loaded {
                Ok(map) => entries.extend(map),
                Err(message) => {
                    diag.error(Self::FILE, message);
                    return None;
                }
            }
        }
        entries.extend(self.transform.map.clone());

        match ReplaceTable::new(entries) {
            Ok(table) => {
                if table.is_empty() {
                    log!("warning"; "replacement table is empty, text is copied unchanged");
                } else {
                    debug!("config"; "replacement table with {} entries", table.len());
                }
                Some(table)
            }
            Err(err) => {
                diag.error(Self::MAP, err.to_string());
                None
            }
        }
    }
}

// ============================================================================
// compiled job
// ============================================================================

/// A validated configuration, ready to run over documents.
#[derive(Debug, Clone)]
pub struct MungJob {
    pub munger: Munger,
    pub transform: Transform,
    pub skip: Option<Regex>,
}

impl MungJob {
    pub fn run(&self, xml: &str) -> MungResult<(String, MungStats)> {
        let transform = |text: &str| self.transform.apply(text);
        let skip = self.skip.as_ref().map(|re| re as &dyn SkipMatcher);
        self.munger.run(xml, &transform, skip)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> MungConfig {
    let (parsed, ignored) = MungConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const MINIMAL: &str = "each = \"trans-unit\"\nfrom = \"source\"\nto = \"target\"\n";

    fn diagnostics(config: &MungConfig) -> ConfigDiagnostics {
        match config.compile() {
            Err(ConfigError::Diagnostics(diag)) => diag,
            Err(other) => panic!("expected diagnostics, got {other}"),
            Ok(_) => panic!("expected diagnostics, config compiled"),
        }
    }

    fn fields(diag: &ConfigDiagnostics) -> Vec<&'static str> {
        diag.errors().iter().map(|d| d.field.as_str()).collect()
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(matches!(
            MungConfig::from_str("each = [unclosed"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = MungConfig::default();
        assert!(config.each.is_none());
        assert!(!config.overwrite);
        assert!(config.skip.is_empty());
        assert_eq!(config.transform_mode(), TransformMode::None);
    }

    #[test]
    fn test_parse_full() {
        let config = test_parse_config(
            r#"
each = "trans-unit"
from = "source"
to = 'alt-trans[origin="mt"] > target'
overwrite = true
skip = ['\{\w+\}', '%(?:\d+\$)?[a-z]']

[transform]
mode = "table"

[transform.map]
"sh" = "ш"
"#,
        );
        assert_eq!(config.to.as_deref(), Some(r#"alt-trans[origin="mt"] > target"#));
        assert!(config.overwrite);
        assert_eq!(config.skip.len(), 2);
        assert_eq!(config.transform.mode, Some(TransformMode::Table));
        assert_eq!(config.transform.map.get("sh").map(String::as_str), Some("ш"));

        let job = config.compile().unwrap();
        let (out, stats) = job
            .run("<trans-unit><source>shash {n} %1$s</source><target/></trans-unit>")
            .unwrap();
        assert_eq!(
            out,
            concat!(
                "<trans-unit><source>shash {n} %1$s</source><target/>",
                r#"<alt-trans origin="mt"><target>шaш {n} %1$s</target></alt-trans>"#,
                "</trans-unit>"
            )
        );
        assert_eq!(stats.written, 1);
        assert_eq!(stats.created, 2);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = format!("{MINIMAL}overwrit = true\n[transform]\nmod = \"upper\"\n");
        let (config, ignored) = MungConfig::parse_with_ignored(&content).unwrap();
        assert_eq!(config.each.as_deref(), Some("trans-unit"));
        assert_eq!(ignored, ["overwrit", "transform.mod"]);
    }

    #[test]
    fn test_missing_selectors() {
        let diag = diagnostics(&MungConfig::default());
        assert_eq!(fields(&diag), ["each", "from", "to"]);
        assert!(
            diag.errors()[0]
                .hint
                .as_deref()
                .is_some_and(|h| h.contains("--each"))
        );
    }

    #[test]
    fn test_selector_errors_attributed() {
        let config = test_parse_config("each = \"a:hover\"\nfrom = \"b >\"\nto = \"c d\"\n");
        let diag = diagnostics(&config);
        assert_eq!(fields(&diag), ["each", "from", "to"]);
        assert!(diag.errors()[0].message.contains("pseudo-class"));
        assert!(diag.errors()[2].message.contains("descendant"));
    }

    #[test]
    fn test_invalid_skip_pattern() {
        let config = test_parse_config(&format!("{MINIMAL}skip = ['(unclosed', 'fine']\n"));
        let diag = diagnostics(&config);
        assert_eq!(fields(&diag), ["skip"]);
        assert!(diag.errors()[0].message.contains("(unclosed"));
    }

    #[test]
    fn test_skip_patterns_joined() {
        let config = test_parse_config(&format!("{MINIMAL}skip = ['a|b', 'c']\n"));
        let job = config.compile().unwrap();
        assert_eq!(job.skip.map(|r| r.as_str().to_string()).as_deref(), Some("(?:a|b)|(?:c)"));
    }

    #[test]
    fn test_table_mode_requires_table() {
        let config = test_parse_config(&format!("{MINIMAL}[transform]\nmode = \"table\"\n"));
        let diag = diagnostics(&config);
        assert_eq!(fields(&diag), ["transform.mode"]);
    }

    #[test]
    fn test_table_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("tables")).unwrap();
        fs::write(
            dir.path().join("tables/latin.json"),
            r#"{"a": "а", "ya": "я"}"#,
        )
        .unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        fs::write(
            &path,
            format!("{MINIMAL}[transform]\nfile = \"tables/latin.json\"\n[transform.map]\n\"a\" = \"A\"\n"),
        )
        .unwrap();

        let config = MungConfig::from_path(&path).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(
            config.transform.file,
            Some(dir.path().join("tables/latin.json"))
        );
        assert_eq!(config.transform_mode(), TransformMode::Table);

        let job = config.compile().unwrap();
        // inline map overrides the file entry for "a"
        assert_eq!(job.transform.apply("yaa"), "яA");
    }

    #[test]
    fn test_unreadable_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[1, 2]").unwrap();

        let mut config = test_parse_config(MINIMAL);
        config.transform.file = Some(bad);
        assert_eq!(fields(&diagnostics(&config)), ["transform.file"]);

        config.transform.file = Some(dir.path().join("missing.json"));
        let diag = diagnostics(&config);
        assert!(diag.errors()[0].message.contains("cannot read"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = test_parse_config(&format!(
            "{MINIMAL}overwrite = true\nskip = ['x']\n[transform]\nmode = \"upper\"\n"
        ));
        let cli = Cli::try_parse_from([
            "mung",
            "--to",
            "note",
            "--overwrite=false",
            "-s",
            "y",
            "-m",
            "lower",
        ])
        .unwrap();
        config.apply_cli(&cli);

        assert_eq!(config.each.as_deref(), Some("trans-unit"));
        assert_eq!(config.to.as_deref(), Some("note"));
        assert!(!config.overwrite);
        assert_eq!(config.skip, ["x", "y"]);
        assert_eq!(config.transform_mode(), TransformMode::Lower);
    }

    #[test]
    fn test_cli_table_implies_table_mode() {
        let mut config = test_parse_config(MINIMAL);
        let cli = Cli::try_parse_from(["mung", "--table", "t.json"]).unwrap();
        config.apply_cli(&cli);
        assert_eq!(config.transform.file, Some(PathBuf::from("t.json")));
        assert_eq!(config.transform_mode(), TransformMode::Table);
    }

    #[test]
    fn test_load_explicit_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let cli = Cli::try_parse_from(["mung", "-C", missing.to_str().unwrap()]).unwrap();
        let err = MungConfig::load(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, MINIMAL).unwrap();
        let cli = Cli::try_parse_from(["mung", "-C", path.to_str().unwrap(), "-e", "unit"]).unwrap();

        let config = MungConfig::load(&cli).unwrap();
        assert_eq!(config.each.as_deref(), Some("unit"));
        assert_eq!(config.from.as_deref(), Some("source"));
    }
}
