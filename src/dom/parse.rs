//! Building a [`Document`] from text with quick-xml.
//!
//! Every non-element event is stored as the exact source slice it spans, so
//! text keeps its original escaping and comments, CDATA sections and
//! declarations come back unchanged.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Document, Element, NodeId};
use crate::debug;
use crate::error::{MungError, Result};

impl Document {
    /// Parse a complete document.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut doc = Self::new();
        let root = doc.root();
        doc.parse_into(root, xml)?;
        debug!("parse"; "{} nodes from {} bytes", doc.len(), xml.len());
        Ok(doc)
    }

    /// Parse `xml` as a fragment and append its nodes under `parent`.
    pub(crate) fn parse_into(&mut self, parent: NodeId, xml: &str) -> Result<()> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack = vec![parent];
        let mut start = 0usize;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(source) => {
                    return Err(MungError::Xml {
                        position: reader.error_position(),
                        source,
                    });
                }
            };
            let end = usize::try_from(reader.buffer_position())
                .unwrap_or(xml.len())
                .min(xml.len());
            let raw = &xml[start..end];
            let current = stack.last().copied().unwrap_or(parent);

            match event {
                Event::Start(e) => {
                    let element = element_from(&e, start, false)?;
                    stack.push(self.append_element(current, element)?);
                }
                Event::Empty(e) => {
                    self.append_element(current, element_from(&e, start, true)?)?;
                }
                Event::End(_) => {
                    if stack.len() == 1 {
                        return Err(MungError::MalformedXml {
                            position: start as u64,
                            message: "closing tag without matching opening tag".into(),
                        });
                    }
                    stack.pop();
                }
                Event::Text(_) | Event::GeneralRef(_) => self.append_raw_text(current, raw)?,
                Event::Eof => break,
                // comments, CDATA, processing instructions, declarations, doctype
                _ => self.append_verbatim(current, raw)?,
            }
            start = end;
        }

        if stack.len() > 1 {
            let name = stack
                .last()
                .and_then(|id| self.element(*id))
                .map(|e| e.name().to_string())
                .unwrap_or_default();
            return Err(MungError::MalformedXml {
                position: xml.len() as u64,
                message: format!("unclosed element `{name}`"),
            });
        }

        Ok(())
    }
}

fn element_from(e: &BytesStart<'_>, position: usize, self_closing: bool) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
    element.set_self_closing(self_closing);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| MungError::Xml {
            position: position as u64,
            source: err.into(),
        })?;
        element.push_raw_attr(
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        );
    }

    Ok(element)
}
