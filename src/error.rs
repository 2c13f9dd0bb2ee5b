//! Error types for the transform engine.

use std::fmt;
use thiserror::Error;

use crate::selector::Combinator;

/// Result alias used throughout the library.
pub type Result<T, E = MungError> = std::result::Result<T, E>;

// ============================================================================
// MungError
// ============================================================================

/// Errors raised while parsing selectors, reading XML or rewriting content.
#[derive(Debug, Error)]
pub enum MungError {
    #[error("invalid selector `{selector}` at offset {offset}: {message}")]
    SelectorSyntax {
        selector: String,
        offset: usize,
        message: String,
    },

    #[error("unsupported selector feature in `{selector}`: {feature}")]
    UnsupportedSelectorFeature {
        selector: String,
        feature: SelectorFeature,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("XML parse error at position {position}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed XML at position {position}: {message}")]
    MalformedXml { position: u64, message: String },

    #[error("skip matcher returned invalid span {start}..{end} for text of length {len}")]
    SkipSpan { start: usize, end: usize, len: usize },

    #[error("node {0} does not belong to this document")]
    UnknownNode(usize),
}

impl MungError {
    pub(crate) fn syntax(selector: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::SelectorSyntax {
            selector: selector.to_string(),
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(selector: &str, feature: SelectorFeature) -> Self {
        Self::UnsupportedSelectorFeature {
            selector: selector.to_string(),
            feature,
        }
    }
}

// ============================================================================
// SelectorFeature
// ============================================================================

/// Selector constructs the engine can parse but refuses to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorFeature {
    /// `#id`: ids must be unique, so they cannot describe an element to create.
    Id,
    /// `*` in place of a tag name.
    WildcardTag,
    /// `:name` or `:name(...)`.
    PseudoClass(String),
    /// `::name`.
    PseudoElement(String),
    /// Any combinator other than the one the selector role allows.
    Combinator(Combinator),
    /// `[a~=b]`, `[a^=b]` and friends.
    AttributeOperator(String),
    /// `[a=b i]`.
    AttributeFlag,
    /// `a, b`.
    SelectorList,
}

impl fmt::Display for SelectorFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id selector"),
            Self::WildcardTag => f.write_str("wildcard tag `*`"),
            Self::PseudoClass(name) => write!(f, "pseudo-class `:{name}`"),
            Self::PseudoElement(name) => write!(f, "pseudo-element `::{name}`"),
            Self::Combinator(c) => write!(f, "{} combinator", c.describe()),
            Self::AttributeOperator(op) => write!(f, "attribute operator `{op}`"),
            Self::AttributeFlag => f.write_str("attribute case flag"),
            Self::SelectorList => f.write_str("selector list"),
        }
    }
}
