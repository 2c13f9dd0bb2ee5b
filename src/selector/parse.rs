//! Selector text parser.

use super::{Combinator, Qualifier, Selector, Step, TagName};
use crate::error::{MungError, Result, SelectorFeature};

/// Characters allowed unescaped in identifiers.
pub(super) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

pub(super) struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(super) fn parse(mut self) -> Result<Selector> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("empty selector"));
        }

        let mut steps = vec![self.step()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(',') => {
                    return Err(MungError::unsupported(
                        self.input,
                        SelectorFeature::SelectorList,
                    ));
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
            }
            if self.peek().is_none() {
                return Err(self.error("expected a step after combinator"));
            }
            combinators.push(combinator);
            steps.push(self.step()?);
        }

        Ok(Selector {
            source: self.input.to_string(),
            steps,
            combinators,
        })
    }

    // ========================================================================
    // Grammar
    // ========================================================================

    fn step(&mut self) -> Result<Step> {
        let tag = match self.peek() {
            Some('*') => {
                self.bump();
                TagName::Any
            }
            Some(c) if is_name_char(c) || c == '\\' => TagName::Named(self.ident("tag name")?),
            _ => return Err(self.error("expected tag name or `*`")),
        };

        let mut qualifiers = Vec::new();
        loop {
            let qualifier = match self.peek() {
                Some('.') => {
                    self.bump();
                    Qualifier::Class(self.ident("class name")?)
                }
                Some('#') => {
                    self.bump();
                    Qualifier::Id(self.ident("id")?)
                }
                Some('[') => self.attribute()?,
                Some(':') => self.pseudo()?,
                _ => break,
            };
            qualifiers.push(qualifier);
        }

        Ok(Step { tag, qualifiers })
    }

    fn attribute(&mut self) -> Result<Qualifier> {
        self.bump(); // [
        self.skip_ws();
        let name = self.ident("attribute name")?;
        self.skip_ws();

        let value = match self.peek() {
            Some(']') => None,
            Some('=') => {
                self.bump();
                self.skip_ws();
                let value = match self.peek() {
                    Some(q @ ('"' | '\'')) => self.quoted(q)?,
                    _ => self.ident("attribute value")?,
                };
                self.skip_ws();
                Some(value)
            }
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                if self.peek() == Some('=') {
                    return Err(MungError::unsupported(
                        self.input,
                        SelectorFeature::AttributeOperator(format!("{c}=")),
                    ));
                }
                return Err(self.error(format!("unexpected `{c}` in attribute selector")));
            }
            None => return Err(self.error("unterminated attribute selector")),
            Some(c) => return Err(self.error(format!("unexpected `{c}` in attribute selector"))),
        };

        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(Qualifier::Attribute { name, value })
            }
            Some(c) if value.is_some() && c.is_ascii_alphabetic() => Err(MungError::unsupported(
                self.input,
                SelectorFeature::AttributeFlag,
            )),
            None => Err(self.error("unterminated attribute selector")),
            Some(c) => Err(self.error(format!("expected `]`, found `{c}`"))),
        }
    }

    fn pseudo(&mut self) -> Result<Qualifier> {
        self.bump(); // :
        if self.peek() == Some(':') {
            self.bump();
            return Ok(Qualifier::PseudoElement(self.ident("pseudo-element name")?));
        }

        let name = self.ident("pseudo-class name")?;
        let argument = if self.peek() == Some('(') {
            Some(self.balanced()?)
        } else {
            None
        };
        Ok(Qualifier::PseudoClass { name, argument })
    }

    // ========================================================================
    // Lexing helpers
    // ========================================================================

    fn ident(&mut self, what: &str) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("dangling `\\` escape")),
                }
            } else if is_name_char(c) {
                self.bump();
                out.push(c);
            } else {
                break;
            }
        }

        if out.is_empty() {
            return Err(self.error(format!("expected {what}")));
        }
        Ok(out)
    }

    fn quoted(&mut self, quote: char) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(MungError::syntax(self.input, start, "unterminated string"))
    }

    /// Consume `( ... )` with nesting, returning the inner text.
    fn balanced(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump(); // (
        let inner_start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.input[inner_start..self.pos - 1].to_string());
                    }
                }
                _ => {}
            }
        }
        Err(MungError::syntax(self.input, start, "unterminated `(`"))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace, returning whether any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn error(&self, message: impl Into<String>) -> MungError {
        MungError::syntax(self.input, self.pos, message)
    }
}

// ============================================================================
// Tests
// ============================================================================
