//! XML entity utilities.
//!
//! Provides the entity codec shared by the splitter and the serializer:
//! - `escape()` - escape the five markup-significant characters
//! - `unescape()` - resolve entity and character references
//! - `resolve_entity()` - resolve a single reference name
//! - `normalize_entities()` - canonicalize every reference in serialized output

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

// =============================================================================
// Patterns
// =============================================================================

/// A single entity or character reference; group 1 is the name.
pub static ENTITY_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#?[\w.:\-]+);").unwrap());

/// References outside comments and CDATA sections; groups 1 and 2 mark the
/// sections that must be left alone.
static NORMALIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(<!--.*?-->)|(<!\[CDATA\[.*?\]\]>)|&(#?[\w.:\-]+);").unwrap()
});

// =============================================================================
// Escaping
// =============================================================================

/// Shortest reference for a markup-significant character.
const fn entity_for(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape `<`, `>`, `&`, `"` and `'`.
///
/// The same form is used for text and attribute values, and it is the
/// canonical form [`normalize_entities`] produces.
///
/// ```
/// use mung::utils::entity::escape;
/// assert_eq!(escape("<g>"), "&lt;g&gt;");
/// assert_eq!(escape("hello"), "hello");
/// ```
pub fn escape(s: &str) -> Cow<'_, str> {
    let Some(first) = s.find(|c: char| entity_for(c).is_some()) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first]);
    for c in s[first..].chars() {
        match entity_for(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

// =============================================================================
// Unescaping
// =============================================================================

/// Resolve a reference name (the part between `&` and `;`) to its character.
///
/// Knows the five predefined XML entities, `nbsp`, and decimal or hex
/// character references. Anything else (typically a DTD-declared entity)
/// returns `None`.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            // NUL is never a legal XML character
            if code == 0 {
                return None;
            }
            char::from_u32(code)
        }
    }
}

/// Unescape entity references back to characters.
///
/// Unresolvable references are kept as written.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    ENTITY_REF.replace_all(s, |caps: &Captures<'_>| match resolve_entity(&caps[1]) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    })
}

// =============================================================================
// Normalization
// =============================================================================

/// Re-escape every resolvable reference in its minimal canonical form.
///
/// `&apos;` becomes `&#39;`, `&#65;` becomes `A`, `&#x3C;` becomes `&lt;`.
/// Comments, CDATA sections and unresolvable references are left untouched.
/// Applying this twice gives the same result as applying it once.
pub fn normalize_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    NORMALIZE.replace_all(s, |caps: &Captures<'_>| {
        if caps.get(1).is_some() || caps.get(2).is_some() {
            return caps[0].to_string();
        }
        match resolve_entity(&caps[3]) {
            Some(c) => {
                let mut buf = [0u8; 4];
                escape(c.encode_utf8(&mut buf)).into_owned()
            }
            None => caps[0].to_string(),
        }
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape("hello world"), "hello world");
        assert!(matches!(escape("hello"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape("<g>"), "&lt;g&gt;");
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape("it's"), "it&#39;s");
    }

    #[test]
    fn test_escape_keeps_unescaped_prefix() {
        assert_eq!(escape("кирилл & co"), "кирилл &amp; co");
        assert_eq!(escape("a\"b&c"), "a&quot;b&amp;c");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("hello"), "hello");
        assert_eq!(unescape("&lt;g&gt;"), "<g>");
        assert_eq!(unescape("a &amp; b"), "a & b");
        assert_eq!(unescape("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(unescape("&#39;"), "'");
        assert_eq!(unescape("&apos;"), "'");
        assert_eq!(unescape("&#x27;"), "'");
        assert_eq!(unescape("&#65;"), "A");
        assert_eq!(unescape("&nbsp;"), "\u{00A0}");
    }

    #[test]
    fn test_unescape_keeps_unknown() {
        assert_eq!(unescape("&product; &amp;"), "&product; &");
        assert_eq!(unescape("&#0;"), "&#0;");
        assert_eq!(unescape("AT&T"), "AT&T");
    }

    #[test]
    fn test_escape_round_trip() {
        for s in ["", "plain", "<a href=\"x\">'&'</a>", "&amp;", "кирилл & co"] {
            assert_eq!(unescape(&escape(s)), s);
        }
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("lt"), Some('<'));
        assert_eq!(resolve_entity("#x41"), Some('A'));
        assert_eq!(resolve_entity("#X41"), Some('A'));
        assert_eq!(resolve_entity("#1046"), Some('Ж'));
        assert_eq!(resolve_entity("#xD800"), None);
        assert_eq!(resolve_entity("copy"), None);
        assert_eq!(resolve_entity("#"), None);
    }

    #[test]
    fn test_normalize_entities() {
        assert_eq!(normalize_entities("<a>&apos;</a>"), "<a>&#39;</a>");
        assert_eq!(normalize_entities("&#65;&#x3C;&gt;"), "A&lt;&gt;");
        assert_eq!(normalize_entities("&amp;amp;"), "&amp;amp;");
        assert_eq!(normalize_entities("&product;"), "&product;");
    }

    #[test]
    fn test_normalize_skips_comments_and_cdata() {
        let s = "<!-- &#65; --><![CDATA[&#66;]]>&#67;";
        assert_eq!(normalize_entities(s), "<!-- &#65; --><![CDATA[&#66;]]>C");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let s = "<x a=\"&apos;&#34;\">&#x26;amp; &nbsp; &#169; &foo;</x>";
        let once = normalize_entities(s).into_owned();
        let twice = normalize_entities(&once).into_owned();
        assert_eq!(once, twice);
    }
}
