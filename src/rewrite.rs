//! Renames list, font and div tags to private tokens before tokenizing.
//!
//! The basic markup layer owns `p`, `a`, `img` and friends; the tag handler
//! owns list, font and div semantics. Renaming keeps the two from ever
//! competing for the same tag name.

/// Private token for `<ul>`.
pub(crate) const UNORDERED_LIST: &str = "htmltext_ul";
/// Private token for `<ol>`.
pub(crate) const ORDERED_LIST: &str = "htmltext_ol";
/// Private token for `<li>`.
pub(crate) const LIST_ITEM: &str = "htmltext_li";
/// Private token for `<font>`.
pub(crate) const FONT: &str = "htmltext_font";
/// Private token for `<div>`.
pub(crate) const DIV: &str = "htmltext_div";

/// Root element wrapped around every rewritten document.
pub(crate) const ROOT: &str = "html";

const RENAMES: [(&str, &str); 5] = [
    ("ul", UNORDERED_LIST),
    ("ol", ORDERED_LIST),
    ("li", LIST_ITEM),
    ("font", FONT),
    ("div", DIV),
];

/// Rename `ul`, `ol`, `li`, `font` and `div` tags to private tokens and wrap
/// the document in a single root element.
///
/// Tag names match ASCII case-insensitively and only as whole names, so
/// `<link>` or `<divider>` are left alone. Empty input stays empty.
///
/// Not idempotent: the output wraps a second root around an already
/// rewritten document, so run it exactly once per conversion.
pub fn override_tags(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(html.len() + 64);
    out.push('<');
    out.push_str(ROOT);
    out.push('>');

    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tag = &rest[lt + 1..];
        let (closing, name_start) = match tag.strip_prefix('/') {
            Some(after) => (true, after),
            None => (false, tag),
        };
        match rename_for(name_start) {
            Some((consumed, token)) => {
                out.push('<');
                if closing {
                    out.push('/');
                }
                out.push_str(token);
                let skip = 1 + usize::from(closing) + consumed;
                rest = &rest[lt + skip..];
            }
            None => {
                out.push('<');
                rest = &rest[lt + 1..];
            }
        }
    }
    out.push_str(rest);

    out.push_str("</");
    out.push_str(ROOT);
    out.push('>');
    out
}

/// If `tag` starts with one of the renamed names followed by a name
/// boundary, return the name length and its private token.
fn rename_for(tag: &str) -> Option<(usize, &'static str)> {
    RENAMES.iter().find_map(|(name, token)| {
        let head = tag.get(..name.len())?;
        if !head.eq_ignore_ascii_case(name) {
            return None;
        }
        let boundary = tag[name.len()..].chars().next();
        match boundary {
            Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => {
                Some((name.len(), *token))
            }
            _ => None,
        }
    })
}
