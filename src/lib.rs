//! Mung - rewrite the text of XML elements into sibling elements.
//!
//! For every element matched by an `each` selector, the inner markup of a
//! `from` child is passed through a string transform and written into a `to`
//! child, which is created when missing. Markup tags and text matching a skip
//! pattern pass through untouched.
//!
//! The library entry point is [`mung()`]; the `mung` binary wraps it with a
//! `mung.toml` config and a handful of built-in transforms.

pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod logger;
pub mod mung;
pub mod selector;
pub mod transform;
pub mod utils;

pub use dom::{Document, Element, NodeId};
pub use error::{MungError, Result, SelectorFeature};
pub use mung::{MungOptions, MungStats, Munger, SkipMatcher, mung};
pub use selector::Selector;
