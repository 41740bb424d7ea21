//! quick-xml reader configured for HTML fragments, plus tag/attribute
//! decoding shared by the size scanner and the converter.

use std::borrow::Cow;

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;
use smallvec::SmallVec;

/// Elements that never have content, whether or not they are self-closed.
pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr")
}

/// Replace every `<` that cannot open a tag with `&lt;` so that text such
/// as `1 < 2` survives tokenizing. Borrows when nothing needs escaping.
pub(crate) fn escape_stray_angles(markup: &str) -> Cow<'_, str> {
    let bytes = markup.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    for (i, _) in markup.match_indices('<') {
        if starts_tag(&bytes[i + 1..]) {
            continue;
        }
        let buf = out.get_or_insert_with(|| String::with_capacity(markup.len() + 8));
        buf.push_str(&markup[copied..i]);
        buf.push_str("&lt;");
        copied = i + 1;
    }
    match out {
        Some(mut buf) => {
            buf.push_str(&markup[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(markup),
    }
}

fn starts_tag(rest: &[u8]) -> bool {
    match rest {
        [b'/', next, ..] => next.is_ascii_alphabetic(),
        [b'!' | b'?', ..] => true,
        [first, ..] => first.is_ascii_alphabetic(),
        [] => false,
    }
}

/// Whether a tag's content ends in an unquoted attribute value that ran
/// straight into the closing `/>`, as in `<a href=http://x/>`. HTML reads
/// that slash as part of the value.
pub(crate) fn ends_with_unquoted_value(content: &[u8]) -> bool {
    if content.last().map_or(true, u8::is_ascii_whitespace) {
        return false;
    }
    let Some(last) = content.split(u8::is_ascii_whitespace).next_back() else {
        return false;
    };
    let Some(eq) = last.iter().position(|&b| b == b'=') else {
        return false;
    };
    let value = &last[eq + 1..];
    !value.is_empty() && !value.iter().any(|&b| b == b'"' || b == b'\'')
}

/// Build a reader that tolerates the sloppiness of hand-written HTML.
pub(crate) fn lenient_reader(markup: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(markup.as_bytes());
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    reader
}

pub(crate) fn reader_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Lower-cased local name of a tag, or `None` if it is not valid UTF-8 or
/// does not start with an ASCII letter.
pub(crate) fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Option<String> {
    let decoded = reader.decoder().decode(raw).ok()?;
    let local_name = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    if !local_name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(local_name.to_ascii_lowercase())
}

/// Resolve an entity body (without `&` and `;`) to its text.
pub(crate) fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse::<u32>().ok()?,
        };
        return char::from_u32(value).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_html5_entity(name).map(Cow::Borrowed)
}

/// Attributes of one tag, names lower-cased, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagAttributes {
    entries: SmallVec<[(String, String); 4]>,
}

impl TagAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute; the name is lower-cased.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_ascii_lowercase(), value.into()));
    }

    /// Value of the first attribute named `name` (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Append `suffix` to the value of the most recently inserted attribute.
    pub(crate) fn extend_last_value(&mut self, suffix: &str) {
        if let Some((_, value)) = self.entries.last_mut() {
            value.push_str(suffix);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Read a start tag's attributes with HTML rules (unquoted and value-less
/// attributes accepted). Undecodable attributes are skipped; values whose
/// references cannot be resolved are kept verbatim.
pub(crate) fn read_attributes(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> TagAttributes {
    let mut attributes = TagAttributes::new();
    for attr in start.html_attributes().flatten() {
        let Ok(key) = reader.decoder().decode(attr.key.as_ref()) else {
            continue;
        };
        let Ok(raw) = reader.decoder().decode(&attr.value) else {
            continue;
        };
        let value = match unescape_with(&raw, resolve_html5_entity) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => raw.into_owned(),
        };
        attributes.insert(&key, value);
    }
    attributes
}
