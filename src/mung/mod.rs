//! Transform orchestrator.
//!
//! For every context element matched by `each`, the inner markup of the
//! `from` child is split, run through a string transform and written into
//! the `to` destination, which is created on demand.
//!
//! # Module Structure
//!
//! ```text
//! mung/
//! ├── mod.rs      # MungOptions, Munger, mung() (this file)
//! ├── split.rs    # tag / text / skip segmentation
//! ├── resolve.rs  # destination lookup and creation
//! └── tests.rs    # end-to-end scenarios
//! ```
//!
//! # Example
//!
//! ```
//! use mung::{MungOptions, mung};
//!
//! let upper = |s: &str| s.to_uppercase();
//! let xml = "<xml><a><b>text 1</b></a><a><b>text 2</b></a></xml>";
//! let out = mung(xml, &MungOptions::new("a", "b", "c", &upper)).unwrap();
//! assert_eq!(
//!     out,
//!     "<xml><a><b>text 1</b><c>TEXT 1</c></a><a><b>text 2</b><c>TEXT 2</c></a></xml>"
//! );
//! ```

mod resolve;
pub mod split;


pub use resolve::{Resolved, materialize, resolve_or_create};
pub use split::{Piece, Segment, SkipMatcher, transform_markup};

use crate::debug;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::selector::Selector;
use crate::utils::entity::normalize_entities;

// ============================================================================
// Options
// ============================================================================

/// Everything one [`mung`] call needs.
#[derive(Clone, Copy)]
pub struct MungOptions<'a> {
    /// Contexts to iterate.
    pub each: &'a str,
    /// Source, a child chain relative to each context.
    pub from: &'a str,
    /// Destination, a child chain relative to each context.
    pub to: &'a str,
    pub transform: &'a dyn Fn(&str) -> String,
    /// Replace destinations that already have content.
    pub overwrite: bool,
    pub skip: Option<&'a dyn SkipMatcher>,
}

impl<'a> MungOptions<'a> {
    pub fn new(
        each: &'a str,
        from: &'a str,
        to: &'a str,
        transform: &'a dyn Fn(&str) -> String,
    ) -> Self {
        Self {
            each,
            from,
            to,
            transform,
            overwrite: false,
            skip: None,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn skip(mut self, skip: &'a dyn SkipMatcher) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// Transform `xml` as described by `options`.
///
/// Selectors are checked before the document is parsed. The returned text
/// has every resolvable entity reference in its shortest form.
pub fn mung(xml: &str, options: &MungOptions<'_>) -> Result<String> {
    let munger =
        Munger::new(options.each, options.from, options.to)?.overwrite(options.overwrite);
    let (out, _) = munger.run(xml, options.transform, options.skip)?;
    Ok(out)
}

// ============================================================================
// Munger
// ============================================================================

/// Counters gathered by one [`Munger::apply`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MungStats {
    /// Context elements visited.
    pub contexts: usize,
    /// Destinations whose content was replaced.
    pub written: usize,
    /// Destinations left alone because they already had content.
    pub skipped_populated: usize,
    /// Elements created while resolving destinations.
    pub created: usize,
}

impl MungStats {
    pub fn merge(&mut self, other: Self) {
        self.contexts += other.contexts;
        self.written += other.written;
        self.skipped_populated += other.skipped_populated;
        self.created += other.created;
    }
}

/// Parsed and validated selectors, reusable across documents.
#[derive(Debug, Clone)]
pub struct Munger {
    each: Selector,
    from: Selector,
    to: Selector,
    overwrite: bool,
}

impl Munger {
    /// Parse all three selectors, then reject anything the engine cannot
    /// evaluate. Syntax errors are reported before feature errors.
    pub fn new(each: &str, from: &str, to: &str) -> Result<Self> {
        let each = Selector::parse(each)?;
        let from = Selector::parse(from)?;
        let to = Selector::parse(to)?;

        each.ensure_matchable()?;
        from.ensure_child_chain()?;
        to.ensure_child_chain()?;

        Ok(Self {
            each,
            from,
            to,
            overwrite: false,
        })
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn each(&self) -> &Selector {
        &self.each
    }

    pub fn from(&self) -> &Selector {
        &self.from
    }

    pub fn to(&self) -> &Selector {
        &self.to
    }

    /// Rewrite `doc` in place.
    ///
    /// Contexts are collected before the first mutation, so elements created
    /// here are never visited as contexts. An error leaves the contexts
    /// already processed modified.
    pub fn apply(
        &self,
        doc: &mut Document,
        transform: &dyn Fn(&str) -> String,
        skip: Option<&dyn SkipMatcher>,
    ) -> Result<MungStats> {
        let contexts = doc.select_all(&self.each);
        debug!("mung"; "`{}` matched {} contexts", self.each, contexts.len());

        let mut stats = MungStats {
            contexts: contexts.len(),
            ..MungStats::default()
        };
        for context in contexts {
            self.apply_context(doc, context, transform, skip, &mut stats)?;
        }

        Ok(stats)
    }

    fn apply_context(
        &self,
        doc: &mut Document,
        context: NodeId,
        transform: &dyn Fn(&str) -> String,
        skip: Option<&dyn SkipMatcher>,
        stats: &mut MungStats,
    ) -> Result<()> {
        let source = doc
            .find_path(context, self.from.steps())
            .map(|node| doc.inner_markup(node))
            .unwrap_or_default();

        let Resolved { node: dest, created } = resolve_or_create(doc, context, &self.to)?;
        stats.created += created;

        if !self.overwrite && doc.has_content(dest) {
            debug!("skip"; "`{}` under node {} is populated", self.to, context.index());
            stats.skipped_populated += 1;
            return Ok(());
        }

        let markup = transform_markup(&source, transform, skip)?;
        doc.set_inner_markup(dest, &markup)?;
        stats.written += 1;
        Ok(())
    }

    /// Parse `xml`, [`apply`](Self::apply) and serialize with entity
    /// references normalized.
    pub fn run(
        &self,
        xml: &str,
        transform: &dyn Fn(&str) -> String,
        skip: Option<&dyn SkipMatcher>,
    ) -> Result<(String, MungStats)> {
        let mut doc = Document::parse(xml)?;
        let stats = self.apply(&mut doc, transform, skip)?;
        let out = normalize_entities(&doc.to_xml()).into_owned();
        Ok((out, stats))
    }
}
