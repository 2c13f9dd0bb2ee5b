//! Content splitter.
//!
//! Raw inner markup is cut into tags (kept verbatim) and text. Text is
//! unescaped, cut again around skip matches, and only the pieces between
//! skip matches reach the transform:
//!
//! ```text
//! contains <g>tag</g> {placeholder} + trailing
//! └──Text─┘└Tag┘└T┘└Tag┘└─────────Text────────┘
//!                       ├┤└──Skip─────┘└──────┤
//!                       Transformable  Transformable
//! ```

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::error::{MungError, Result};
use crate::utils::entity::{ENTITY_REF, escape, resolve_entity, unescape};

/// A comment, a CDATA section, or a start, end or self-closing tag.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<[^>]+>").unwrap()
});

// ============================================================================
// Types
// ============================================================================

/// A slice of raw inner markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Markup tag, comment or CDATA section, never transformed.
    Tag(&'a str),
    /// Escaped character data.
    Text(&'a str),
    /// Entity reference the codec cannot resolve, kept as written.
    Entity(&'a str),
}

/// A slice of unescaped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Matched by the skip matcher; copied as is.
    Skip(&'a str),
    /// Passed through the transform.
    Transformable(&'a str),
}

/// Finds spans of text that must survive the transform unchanged.
///
/// Spans must be increasing, non-overlapping and fall on char boundaries.
pub trait SkipMatcher {
    fn find_spans(&self, text: &str) -> Vec<Range<usize>>;
}

impl SkipMatcher for Regex {
    fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.find_iter(text).map(|m| m.range()).collect()
    }
}

// ============================================================================
// Splitting
// ============================================================================

/// Split raw inner markup into tag, text and opaque-entity segments.
///
/// Text runs come before, between and after tags even when empty, so
/// `"<x/>"` gives `Text(""), Tag("<x/>"), Text("")` and `""` gives one empty
/// `Text`.
pub fn split_markup(raw: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for tag in TAG.find_iter(raw) {
        push_text(&mut segments, &raw[last..tag.start()]);
        segments.push(Segment::Tag(tag.as_str()));
        last = tag.end();
    }
    push_text(&mut segments, &raw[last..]);
    segments
}

fn push_text<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    let start = segments.len();
    let mut last = 0;
    for caps in ENTITY_REF.captures_iter(text) {
        if resolve_entity(&caps[1]).is_some() {
            continue;
        }
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(&text[last..whole.start()]));
        }
        segments.push(Segment::Entity(whole.as_str()));
        last = whole.end();
    }
    if last < text.len() || segments.len() == start {
        segments.push(Segment::Text(&text[last..]));
    }
}

/// Partition unescaped `text` around the matches of `skip`.
///
/// The result alternates `Transformable, Skip, Transformable, ...` and
/// always starts and ends with a (possibly empty) transformable piece.
pub fn split_text<'a>(text: &'a str, skip: Option<&dyn SkipMatcher>) -> Result<Vec<Piece<'a>>> {
    let Some(skip) = skip else {
        return Ok(vec![Piece::Transformable(text)]);
    };

    let mut pieces = Vec::new();
    let mut cursor = 0;
    for span in skip.find_spans(text) {
        let valid = cursor <= span.start
            && span.start <= span.end
            && span.end <= text.len()
            && text.is_char_boundary(span.start)
            && text.is_char_boundary(span.end);
        if !valid {
            return Err(MungError::SkipSpan {
                start: span.start,
                end: span.end,
                len: text.len(),
            });
        }
        pieces.push(Piece::Transformable(&text[cursor..span.start]));
        pieces.push(Piece::Skip(&text[span.start..span.end]));
        cursor = span.end;
    }
    pieces.push(Piece::Transformable(&text[cursor..]));

    Ok(pieces)
}

/// Apply `transform` to the transformable text of `raw`, keeping tags,
/// unresolvable entities and skip matches intact. The result is escaped
/// markup.
///
/// Every transformable piece reaches `transform`, empty ones included.
pub fn transform_markup(
    raw: &str,
    transform: &dyn Fn(&str) -> String,
    skip: Option<&dyn SkipMatcher>,
) -> Result<String> {
    let mut out = String::with_capacity(raw.len());

    for segment in split_markup(raw) {
        match segment {
            Segment::Tag(verbatim) | Segment::Entity(verbatim) => out.push_str(verbatim),
            Segment::Text(text) => {
                let text = unescape(text);
                for piece in split_text(&text, skip)? {
                    match piece {
                        Piece::Skip(kept) => out.push_str(&escape(kept)),
                        Piece::Transformable(s) => out.push_str(&escape(&transform(s))),
                    }
                }
            }
        }
    }

    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
