//! Declared `<img width height>` hints.

use quick_xml::events::Event;

use crate::tokenizer::{
    decode_tag_name, escape_stray_angles, lenient_reader, read_attributes, TagAttributes,
};

/// Width/height declared on one image tag, in density-independent pixels.
///
/// Each component is `None` when absent or unparsable. A hint is only usable
/// when both components are present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageHint {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageHint {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Read `width`/`height` from an image tag's attributes.
    pub fn from_attributes(attributes: &TagAttributes) -> Self {
        Self {
            width: attributes.get("width").and_then(parse_dimension),
            height: attributes.get("height").and_then(parse_dimension),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// `(width, height)` when both components parsed.
    pub fn size(&self) -> Option<(u32, u32)> {
        Some((self.width?, self.height?))
    }
}

/// Parse a dimension attribute as a plain non-negative integer.
///
/// Units are not understood: `"100px"` and `"50%"` are rejected.
pub fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u32>().ok()
}

/// Collect one hint per `<img>` tag, in document order.
///
/// Tags are visited with the same reader the converter uses, so index `i`
/// of the result describes the `i`-th image the converter will place.
pub fn scan_image_hints(markup: &str) -> Vec<ImageHint> {
    let markup = escape_stray_angles(markup);
    let mut reader = lenient_reader(&markup);
    let mut buf = Vec::with_capacity(8);
    let mut out = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let Some(tag) = decode_tag_name(&reader, e.name().as_ref()) else {
                    buf.clear();
                    continue;
                };
                if tag == "img" {
                    let attributes = read_attributes(&reader, &e);
                    out.push(ImageHint::from_attributes(&attributes));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
        buf.clear();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_hints_in_document_order() {
        let hints = scan_image_hints(
            r#"<p><IMG src="a" WIDTH="100" height=50></p><img src=b><img src=c width='7' height="x">"#,
        );
        assert_eq!(
            hints,
            vec![
                ImageHint::new(100, 50),
                ImageHint::default(),
                ImageHint {
                    width: Some(7),
                    height: None
                },
            ]
        );
        assert!(hints[0].is_valid());
        assert!(!hints[1].is_valid());
        assert!(!hints[2].is_valid());
    }

    #[test]
    fn counts_images_without_attributes() {
        let hints = scan_image_hints("<img><img/><img width=1 height=2/>");
        assert_eq!(hints.len(), 3);
        assert_eq!(hints[2].size(), Some((1, 2)));
    }

    #[test]
    fn dimensions_are_plain_non_negative_integers() {
        assert_eq!(parse_dimension("0"), Some(0));
        assert_eq!(parse_dimension(" 42 "), Some(42));
        assert_eq!(parse_dimension("100px"), None);
        assert_eq!(parse_dimension("-1"), None);
        assert_eq!(parse_dimension("+5"), None);
        assert_eq!(parse_dimension(""), None);
    }

    #[test]
    fn stray_less_than_does_not_hide_images() {
        let hints = scan_image_hints("1 < 2 <img src=a width=3 height=4> 3 <4 <img src=b>");
        assert_eq!(hints, vec![ImageHint::new(3, 4), ImageHint::default()]);
    }

    #[test]
    fn empty_markup_has_no_hints() {
        assert!(scan_image_hints("").is_empty());
    }
}
