//! Built-in string transforms.
//!
//! | Mode    | Effect                                         |
//! |---------|------------------------------------------------|
//! | `none`  | copy text unchanged                            |
//! | `upper` | Unicode uppercase                              |
//! | `lower` | Unicode lowercase                              |
//! | `ascii` | transliterate to ASCII (`deunicode`)           |
//! | `table` | longest-match replacement from a [`ReplaceTable`] |

mod table;

pub use table::ReplaceTable;

use serde::{Deserialize, Serialize};

/// Name of a built-in transform, as written in config files and on the
/// command line.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    #[default]
    None,
    Upper,
    Lower,
    Ascii,
    Table,
}

impl TransformMode {
    /// Name as written in `mung.toml` and on the command line.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Ascii => "ascii",
            Self::Table => "table",
        }
    }
}

/// A ready-to-run transform.
#[derive(Debug, Clone, Default)]
pub enum Transform {
    #[default]
    None,
    Upper,
    Lower,
    Ascii,
    Table(ReplaceTable),
}

impl Transform {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
            Self::Ascii => deunicode::deunicode(text),
            Self::Table(table) => table.apply(text),
        }
    }

    pub const fn mode(&self) -> TransformMode {
        match self {
            Self::None => TransformMode::None,
            Self::Upper => TransformMode::Upper,
            Self::Lower => TransformMode::Lower,
            Self::Ascii => TransformMode::Ascii,
            Self::Table(_) => TransformMode::Table,
        }
    }
}
