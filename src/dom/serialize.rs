//! Writing a [`Document`] back to text.

use super::{Document, NodeId, NodeKind};

impl Document {
    /// Serialize the whole document.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_children(self.root(), &mut out);
        out
    }

    /// Serialize the children of `id`.
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    /// Serialize `id` itself, tags included.
    pub fn outer_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_children(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            self.write_node(child, out);
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(element.name());
                for (name, raw) in element.raw_attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    // single-quoted source values may hold a bare `"`
                    if raw.contains('"') {
                        out.push_str(&raw.replace('"', "&quot;"));
                    } else {
                        out.push_str(raw);
                    }
                    out.push('"');
                }

                if self.children(id).is_empty() && element.is_self_closing() {
                    out.push_str("/>");
                    return;
                }

                out.push('>');
                self.write_children(id, out);
                out.push_str("</");
                out.push_str(element.name());
                out.push('>');
            }
            Some(NodeKind::Text(raw) | NodeKind::Verbatim(raw)) => out.push_str(raw),
            Some(NodeKind::Root) => self.write_children(id, out),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn test_round_trip() {
        for xml in [
            "<xml>\n    <a><b>text 1</b></a>\n    <a><b>text 2</b></a>\n</xml>",
            r#"<a x="1" y="&amp;"><b/><c></c></a>"#,
            "<a>x &amp; &#65; &product;</a>",
        ] {
            assert_eq!(Document::parse(xml).unwrap().to_xml(), xml);
        }
    }

    #[test]
    fn test_single_quoted_attribute() {
        let doc = Document::parse(r#"<a t='say "hi"'/>"#).unwrap();
        assert_eq!(doc.to_xml(), r#"<a t="say &quot;hi&quot;"/>"#);
    }

    #[test]
    fn test_created_elements() {
        let mut doc = Document::parse("<a></a>").unwrap();
        let a = doc.child_elements(doc.root()).next().unwrap();
        let mut target = Element::new("target");
        target.set_attr("class", "class");
        target.set_attr("attr", "");
        target.set_attr("name", "val");
        let target = doc.append_element(a, target).unwrap();

        assert_eq!(
            doc.outer_markup(target),
            r#"<target class="class" attr="" name="val"/>"#
        );
        doc.set_inner_markup(target, "T").unwrap();
        assert_eq!(
            doc.to_xml(),
            r#"<a><target class="class" attr="" name="val">T</target></a>"#
        );
        assert_eq!(doc.inner_markup(a), doc.outer_markup(target));
    }
}
