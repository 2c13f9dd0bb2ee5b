//! Destination lookup and creation.

use crate::debug;
use crate::dom::{Document, Element, NodeId};
use crate::error::{Result, SelectorFeature};
use crate::selector::{Qualifier, Selector, Step, TagName};

/// Outcome of [`resolve_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub node: NodeId,
    /// Number of elements created along the path.
    pub created: usize,
}

/// Find the element addressed by `to` below `context`, creating whatever
/// part of the path is missing.
///
/// A complete existing path wins. Otherwise each step is resolved against the
/// children of the current anchor: the first match becomes the next anchor,
/// and a missing step is materialized and appended as the anchor's last child.
pub fn resolve_or_create(doc: &mut Document, context: NodeId, to: &Selector) -> Result<Resolved> {
    to.ensure_steps()?;

    if let Some(node) = doc.find_path(context, to.steps()) {
        return Ok(Resolved { node, created: 0 });
    }

    let mut anchor = context;
    let mut remaining = to.steps();
    let mut created = 0;

    while let Some((step, rest)) = remaining.split_first() {
        anchor = match doc.find_child(anchor, step) {
            Some(found) => found,
            None => {
                let element = materialize(step, to)?;
                debug!("create"; "{} under node {}", step.render_child(), anchor.index());
                created += 1;
                doc.append_element(anchor, element)?
            }
        };
        remaining = rest;
    }

    Ok(Resolved {
        node: anchor,
        created,
    })
}

/// Turn a step into a new element carrying its class and attribute
/// qualifiers.
pub fn materialize(step: &Step, selector: &Selector) -> Result<Element> {
    let TagName::Named(name) = &step.tag else {
        return Err(selector.unsupported(SelectorFeature::WildcardTag));
    };

    let mut element = Element::new(name.as_str());
    for qualifier in &step.qualifiers {
        match qualifier {
            Qualifier::Class(class) => {
                let value = match element.attr("class") {
                    Some(existing) => format!("{existing} {class}"),
                    None => class.clone(),
                };
                element.set_attr("class", &value);
            }
            Qualifier::Attribute { name, value } => {
                element.set_attr(name, value.as_deref().unwrap_or_default());
            }
            Qualifier::Id(_) => return Err(selector.unsupported(SelectorFeature::Id)),
            Qualifier::PseudoClass { name, .. } => {
                return Err(selector.unsupported(SelectorFeature::PseudoClass(name.clone())));
            }
            Qualifier::PseudoElement(name) => {
                return Err(selector.unsupported(SelectorFeature::PseudoElement(name.clone())));
            }
        }
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MungError;

    fn context(doc: &Document) -> NodeId {
        doc.child_elements(doc.root()).next().unwrap()
    }

    #[test]
    fn test_materialize_attributes() {
        let selector = Selector::parse("target.class[attr][name=val]").unwrap();
        let element = materialize(&selector.steps()[0], &selector).unwrap();
        assert_eq!(element.name(), "target");
        let attrs: Vec<_> = element
            .attrs()
            .map(|(k, v)| (k.to_string(), v.into_owned()))
            .collect();
        assert_eq!(
            attrs,
            [
                ("class".to_string(), "class".to_string()),
                ("attr".to_string(), String::new()),
                ("name".to_string(), "val".to_string()),
            ]
        );
    }

    #[test]
    fn test_materialize_joins_classes() {
        let selector = Selector::parse("t.a[x=1].b").unwrap();
        let element = materialize(&selector.steps()[0], &selector).unwrap();
        assert_eq!(element.attr("class").as_deref(), Some("a b"));
        let names: Vec<_> = element.attrs().map(|(k, _)| k).collect();
        assert_eq!(names, ["class", "x"]);
    }

    #[test]
    fn test_materialize_rejects_uncreatable() {
        for (text, feature) in [
            ("t#id", SelectorFeature::Id),
            ("*", SelectorFeature::WildcardTag),
            ("t:empty", SelectorFeature::PseudoClass("empty".into())),
            ("t::after", SelectorFeature::PseudoElement("after".into())),
        ] {
            let selector = Selector::parse(text).unwrap();
            match materialize(&selector.steps()[0], &selector) {
                Err(MungError::UnsupportedSelectorFeature { feature: got, .. }) => {
                    assert_eq!(got, feature, "{text}");
                }
                other => panic!("expected unsupported feature for {text}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_creates_nested_path() {
        let mut doc = Document::parse("<u><source>s</source></u>").unwrap();
        let unit = context(&doc);
        let to = Selector::parse(r#"alt-trans[origin="mt"] > target.class[attr][name=val]"#).unwrap();

        let resolved = resolve_or_create(&mut doc, unit, &to).unwrap();
        assert_eq!(resolved.created, 2);
        assert_eq!(
            doc.to_xml(),
            concat!(
                r#"<u><source>s</source><alt-trans origin="mt">"#,
                r#"<target class="class" attr="" name="val"/></alt-trans></u>"#
            )
        );

        let again = resolve_or_create(&mut doc, unit, &to).unwrap();
        assert_eq!(again, Resolved { node: resolved.node, created: 0 });
    }

    #[test]
    fn test_extends_existing_prefix() {
        let mut doc = Document::parse(r#"<u><alt-trans origin="mt"/></u>"#).unwrap();
        let unit = context(&doc);
        let to = Selector::parse(r#"alt-trans[origin="mt"] > target"#).unwrap();

        let resolved = resolve_or_create(&mut doc, unit, &to).unwrap();
        assert_eq!(resolved.created, 1);
        assert_eq!(
            doc.to_xml(),
            r#"<u><alt-trans origin="mt"><target/></alt-trans></u>"#
        );
    }

    #[test]
    fn test_prefers_complete_path() {
        let mut doc = Document::parse(
            r#"<u><alt origin="mt"/><alt origin="mt"><target>x</target></alt></u>"#,
        )
        .unwrap();
        let unit = context(&doc);
        let to = Selector::parse(r#"alt[origin="mt"] > target"#).unwrap();

        let resolved = resolve_or_create(&mut doc, unit, &to).unwrap();
        assert_eq!(resolved.created, 0);
        assert_eq!(doc.text(resolved.node), "x");
    }

    #[test]
    fn test_does_not_match_other_qualifiers() {
        let mut doc =
            Document::parse(r#"<u><alt origin="other"><target>x</target></alt></u>"#).unwrap();
        let unit = context(&doc);
        let to = Selector::parse(r#"alt[origin="mt"] > target"#).unwrap();

        let resolved = resolve_or_create(&mut doc, unit, &to).unwrap();
        assert_eq!(resolved.created, 2);
        assert_eq!(
            doc.to_xml(),
            r#"<u><alt origin="other"><target>x</target></alt><alt origin="mt"><target/></alt></u>"#
        );
    }

    #[test]
    fn test_id_only_fails_when_creating() {
        let mut doc = Document::parse(r#"<u><t id="a">x</t></u>"#).unwrap();
        let unit = context(&doc);

        let existing = Selector::parse("t#a").unwrap();
        assert!(resolve_or_create(&mut doc, unit, &existing).is_ok());

        let missing = Selector::parse("t#b").unwrap();
        assert!(matches!(
            resolve_or_create(&mut doc, unit, &missing),
            Err(MungError::UnsupportedSelectorFeature {
                feature: SelectorFeature::Id,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_chain() {
        let mut doc = Document::parse("<u/>").unwrap();
        let unit = context(&doc);
        assert!(matches!(
            resolve_or_create(&mut doc, unit, &Selector::from_steps(Vec::new())),
            Err(MungError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_isomorphic_creation_across_contexts() {
        let mut doc = Document::parse("<r><u/><u/></r>").unwrap();
        let units = doc.select_all(&Selector::parse("u").unwrap());
        let to = Selector::parse(r#"a > b.x[attr="v"]"#).unwrap();

        let first = resolve_or_create(&mut doc, units[0], &to).unwrap();
        let second = resolve_or_create(&mut doc, units[1], &to).unwrap();
        assert_ne!(first.node, second.node);
        assert_eq!(doc.outer_markup(units[0]), doc.outer_markup(units[1]));
        assert_eq!(
            doc.outer_markup(units[0]),
            r#"<u><a><b class="x" attr="v"/></a></u>"#
        );
    }
}
