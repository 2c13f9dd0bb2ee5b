//! Selector model.
//!
//! A constrained CSS subset used to address elements relative to a context:
//!
//! ```text
//! alt-trans[origin="mt"] > target.class[attr][name=val]
//! └──────── step ──────┘ │ └────────── step ─────────┘
//!                   combinator
//! ```
//!
//! Every step names one tag (or `*`) and carries zero or more qualifiers.
//! Parsing accepts more than the engine acts on (ids, pseudo-classes,
//! sibling combinators) so that such selectors fail with a precise
//! [`SelectorFeature`] instead of being misread.

mod parse;

use std::fmt;

use crate::dom::{Document, Element, NodeId};
use crate::error::{MungError, Result, SelectorFeature};

// ============================================================================
// Types
// ============================================================================

/// Relationship between two adjacent steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a > b`
    Child,
    /// `a b`
    Descendant,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

impl Combinator {
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::NextSibling => "next-sibling",
            Self::SubsequentSibling => "subsequent-sibling",
        }
    }

    const fn separator(&self) -> &'static str {
        match self {
            Self::Child => " > ",
            Self::Descendant => " ",
            Self::NextSibling => " + ",
            Self::SubsequentSibling => " ~ ",
        }
    }
}

/// Tag part of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagName {
    Named(String),
    /// `*`
    Any,
}

/// A qualifier attached to a step's tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    /// `.name`: membership in the whitespace-separated `class` attribute.
    Class(String),
    /// `[name]` when `value` is `None`, `[name=value]` otherwise.
    Attribute { name: String, value: Option<String> },
    /// `#value`
    Id(String),
    /// `:name` or `:name(argument)`
    PseudoClass {
        name: String,
        argument: Option<String>,
    },
    /// `::name`
    PseudoElement(String),
}

/// One tag-plus-qualifiers unit of a selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub tag: TagName,
    pub qualifiers: Vec<Qualifier>,
}

/// A parsed selector: steps joined by combinators.
///
/// `combinators[i]` joins `steps[i]` and `steps[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    steps: Vec<Step>,
    combinators: Vec<Combinator>,
}

// ============================================================================
// Construction and access
// ============================================================================

impl Step {
    /// A bare `tag` step.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            tag: TagName::Named(name.into()),
            qualifiers: Vec::new(),
        }
    }

    pub fn with(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Render as a direct-child selector relative to some anchor.
    ///
    /// ```
    /// use mung::selector::{Qualifier, Step};
    /// let step = Step::tag("alt-trans").with(Qualifier::Attribute {
    ///     name: "origin".into(),
    ///     value: Some("mt".into()),
    /// });
    /// assert_eq!(step.render_child(), r#"> alt-trans[origin="mt"]"#);
    /// ```
    pub fn render_child(&self) -> String {
        format!("> {self}")
    }
}

impl Selector {
    /// Parse selector text.
    pub fn parse(input: &str) -> Result<Self> {
        parse::Parser::new(input).parse()
    }

    /// Build a child-combinator chain from steps.
    ///
    /// An empty `steps` vector yields a selector that every query rejects
    /// with [`MungError::InvariantViolation`].
    pub fn from_steps(steps: Vec<Step>) -> Self {
        let combinators = vec![Combinator::Child; steps.len().saturating_sub(1)];
        let mut selector = Self {
            source: String::new(),
            steps,
            combinators,
        };
        selector.source = selector.to_string();
        selector
    }

    /// The text this selector was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Reject constructs no query can evaluate: pseudo-classes,
    /// pseudo-elements and sibling combinators.
    pub fn ensure_matchable(&self) -> Result<()> {
        self.ensure_steps()?;
        for step in &self.steps {
            for qualifier in &step.qualifiers {
                match qualifier {
                    Qualifier::PseudoClass { name, .. } => {
                        return Err(self.unsupported(SelectorFeature::PseudoClass(name.clone())));
                    }
                    Qualifier::PseudoElement(name) => {
                        return Err(
                            self.unsupported(SelectorFeature::PseudoElement(name.clone()))
                        );
                    }
                    Qualifier::Class(_) | Qualifier::Attribute { .. } | Qualifier::Id(_) => {}
                }
            }
        }
        match self.combinators.iter().find(|c| {
            matches!(c, Combinator::NextSibling | Combinator::SubsequentSibling)
        }) {
            Some(c) => Err(self.unsupported(SelectorFeature::Combinator(*c))),
            None => Ok(()),
        }
    }

    /// Like [`ensure_matchable`](Self::ensure_matchable), and additionally
    /// require every combinator to be `>`.
    pub fn ensure_child_chain(&self) -> Result<()> {
        self.ensure_matchable()?;
        match self.combinators.iter().find(|c| **c != Combinator::Child) {
            Some(c) => Err(self.unsupported(SelectorFeature::Combinator(*c))),
            None => Ok(()),
        }
    }

    pub(crate) fn ensure_steps(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(MungError::InvariantViolation(format!(
                "selector `{}` has no steps",
                self.source
            )));
        }
        Ok(())
    }

    pub(crate) fn unsupported(&self, feature: SelectorFeature) -> MungError {
        MungError::unsupported(&self.source, feature)
    }
}

// ============================================================================
// Matching
// ============================================================================

impl Step {
    /// Whether `element` satisfies this step's tag and every qualifier.
    pub fn matches(&self, element: &Element) -> bool {
        if let TagName::Named(name) = &self.tag
            && name != element.name()
        {
            return false;
        }

        self.qualifiers.iter().all(|qualifier| match qualifier {
            Qualifier::Class(class) => element
                .attr("class")
                .is_some_and(|v| v.split_whitespace().any(|token| token == class)),
            Qualifier::Attribute { name, value: None } => element.has_attr(name),
            Qualifier::Attribute {
                name,
                value: Some(value),
            } => element.attr(name).is_some_and(|v| v.as_ref() == value.as_str()),
            Qualifier::Id(id) => element.attr("id").is_some_and(|v| v.as_ref() == id.as_str()),
            // rejected by `Selector::ensure_matchable` before any query runs
            Qualifier::PseudoClass { .. } | Qualifier::PseudoElement(_) => false,
        })
    }
}

impl Selector {
    /// Whether `node` is selected, checking ancestors for the earlier steps.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self.steps.len() {
            0 => false,
            n => self.matches_at(doc, node, n - 1),
        }
    }

    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if !self.steps[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|parent| self.matches_at(doc, parent, index - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .any(|ancestor| self.matches_at(doc, ancestor, index - 1)),
            Combinator::NextSibling | Combinator::SubsequentSibling => false,
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Write `s` as an identifier, escaping characters the parser would stop at.
fn write_ident(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for c in s.chars() {
        if !parse::is_name_char(c) {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => {
                f.write_str(".")?;
                write_ident(f, name)
            }
            Self::Attribute { name, value } => {
                f.write_str("[")?;
                write_ident(f, name)?;
                if let Some(value) = value {
                    f.write_str("=")?;
                    write_quoted(f, value)?;
                }
                f.write_str("]")
            }
            Self::Id(id) => {
                f.write_str("#")?;
                write_ident(f, id)
            }
            Self::PseudoClass { name, argument } => {
                f.write_str(":")?;
                write_ident(f, name)?;
                match argument {
                    Some(arg) => write!(f, "({arg})"),
                    None => Ok(()),
                }
            }
            Self::PseudoElement(name) => {
                f.write_str("::")?;
                write_ident(f, name)
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            TagName::Named(name) => write_ident(f, name)?,
            TagName::Any => f.write_str("*")?,
        }
        for qualifier in &self.qualifiers {
            write!(f, "{qualifier}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(self.combinators[i - 1].separator())?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
