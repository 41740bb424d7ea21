//! Markup to [`SpannedText`]: basic inline styles, paragraphs, links and
//! images, with every other tag delegated to the [`TagHandler`].

use quick_xml::events::{BytesStart, Event};

use crate::image::{ImageGetter, ImageSpan};
use crate::image_hints::ImageHint;
use crate::rewrite::ROOT;
use crate::spanned::{Span, SpanFlags, SpannedText, TextStyle};
use crate::tag_handler::{TagEvent, TagHandler};
use crate::tokenizer::{
    decode_tag_name, ends_with_unquoted_value, escape_stray_angles, is_void_tag, lenient_reader,
    read_attributes, reader_offset, resolve_entity, TagAttributes,
};

/// Character standing in for an image in the text.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BasicKind {
    Bold,
    Italic,
    Underline,
    Anchor,
}

#[derive(Clone, Debug)]
struct BasicMark {
    kind: BasicKind,
    start: usize,
    href: Option<String>,
}

struct Converter<'a, G> {
    out: SpannedText,
    marks: Vec<BasicMark>,
    images: &'a mut G,
    tags: &'a mut TagHandler,
}

/// Convert markup in one pass.
///
/// Tokenizer errors stop the conversion; the text produced up to that
/// point is returned.
pub(crate) fn from_html<G: ImageGetter>(
    markup: &str,
    images: &mut G,
    tags: &mut TagHandler,
) -> SpannedText {
    let mut conv = Converter {
        out: SpannedText::new(),
        marks: Vec::with_capacity(8),
        images,
        tags,
    };
    let markup = escape_stray_angles(markup);
    let mut reader = lenient_reader(&markup);
    let mut buf = Vec::with_capacity(64);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if let Some((tag, attributes)) = start_tag(&reader, &e) {
                    conv.open(&tag, &attributes);
                    if is_void_tag(&tag) {
                        conv.close(&tag);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some((tag, mut attributes)) = start_tag(&reader, &e) {
                    if !is_void_tag(&tag) && ends_with_unquoted_value(&e) {
                        // `<a href=http://x/>` opens a link whose href ends in `/`.
                        attributes.extend_last_value("/");
                        conv.open(&tag, &attributes);
                    } else {
                        conv.open(&tag, &attributes);
                        conv.close(&tag);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if let Some(tag) = decode_tag_name(&reader, e.name().as_ref()) {
                    if !is_void_tag(&tag) {
                        conv.close(&tag);
                    }
                }
            }
            Ok(Event::Text(e)) => match e.decode() {
                Ok(text) => conv.push_text(&text),
                Err(err) => {
                    log::warn!(
                        "stopping conversion at byte {}: text decode error: {:?}",
                        reader_offset(&reader),
                        err
                    );
                    break;
                }
            },
            Ok(Event::CData(e)) => match reader.decoder().decode(&e) {
                Ok(text) => conv.push_text(&text),
                Err(err) => {
                    log::warn!(
                        "stopping conversion at byte {}: cdata decode error: {:?}",
                        reader_offset(&reader),
                        err
                    );
                    break;
                }
            },
            Ok(Event::GeneralRef(e)) => match e.decode() {
                Ok(name) => match resolve_entity(&name) {
                    Some(resolved) => conv.push_text(&resolved),
                    None => conv.push_text(&format!("&{name};")),
                },
                Err(err) => {
                    log::warn!(
                        "stopping conversion at byte {}: entity decode error: {:?}",
                        reader_offset(&reader),
                        err
                    );
                    break;
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                log::warn!(
                    "stopping conversion at byte {}: markup error: {:?}",
                    reader_offset(&reader),
                    err
                );
                break;
            }
        }
        buf.clear();
    }

    conv.out
}

fn start_tag(
    reader: &quick_xml::Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Option<(String, TagAttributes)> {
    let tag = decode_tag_name(reader, start.name().as_ref())?;
    let attributes = read_attributes(reader, start);
    Some((tag, attributes))
}

impl<G: ImageGetter> Converter<'_, G> {
    fn open(&mut self, tag: &str, attributes: &TagAttributes) {
        match tag {
            ROOT | "body" => {}
            "b" | "strong" => self.start(BasicKind::Bold, None),
            "i" | "em" | "cite" | "dfn" => self.start(BasicKind::Italic, None),
            "u" => self.start(BasicKind::Underline, None),
            "a" => self.start(BasicKind::Anchor, attributes.get("href").map(str::to_string)),
            "p" => self.paragraph_break(),
            "br" => self.out.append("\n"),
            "img" => self.image(attributes),
            _ => {
                let event = TagEvent {
                    opening: true,
                    tag,
                    attributes,
                };
                self.tags.handle_tag(&event, &mut self.out);
            }
        }
    }

    fn close(&mut self, tag: &str) {
        match tag {
            ROOT | "body" | "br" | "img" => {}
            "b" | "strong" => self.end(BasicKind::Bold),
            "i" | "em" | "cite" | "dfn" => self.end(BasicKind::Italic),
            "u" => self.end(BasicKind::Underline),
            "a" => self.end(BasicKind::Anchor),
            "p" => self.paragraph_break(),
            _ => {
                let attributes = TagAttributes::new();
                let event = TagEvent {
                    opening: false,
                    tag,
                    attributes: &attributes,
                };
                self.tags.handle_tag(&event, &mut self.out);
            }
        }
    }

    fn start(&mut self, kind: BasicKind, href: Option<String>) {
        self.marks.push(BasicMark {
            kind,
            start: self.out.len(),
            href,
        });
    }

    fn end(&mut self, kind: BasicKind) {
        let Some(idx) = self.marks.iter().rposition(|mark| mark.kind == kind) else {
            log::debug!("dropping {kind:?} close without a matching open tag");
            return;
        };
        let mark = self.marks.remove(idx);
        let span = match kind {
            BasicKind::Bold => Span::Style(TextStyle::Bold),
            BasicKind::Italic => Span::Style(TextStyle::Italic),
            BasicKind::Underline => Span::Underline,
            BasicKind::Anchor => match mark.href {
                Some(href) => Span::Url(href),
                None => return,
            },
        };
        let end = self.out.len();
        if mark.start < end {
            self.out
                .set_span(span, mark.start..end, SpanFlags::ExclusiveExclusive);
        }
    }

    fn paragraph_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with_newline() {
            self.out.append("\n");
        }
    }

    fn image(&mut self, attributes: &TagAttributes) {
        let source = attributes.get("src").unwrap_or_default();
        let hint = ImageHint::from_attributes(attributes);
        let placeholder = self.images.get_drawable(source, hint);
        let start = self.out.len();
        let mut glyph = [0u8; 4];
        self.out.append(OBJECT_REPLACEMENT.encode_utf8(&mut glyph));
        let end = self.out.len();
        self.out.set_span(
            Span::Image(ImageSpan::new(source, placeholder)),
            start..end,
            SpanFlags::ExclusiveExclusive,
        );
    }

    /// Append text with HTML whitespace collapsing.
    fn push_text(&mut self, raw: &str) {
        let mut chunk = String::with_capacity(raw.len());
        let mut prev = self.out.as_str().chars().next_back();
        for c in raw.chars() {
            if c.is_ascii_whitespace() {
                if matches!(prev, None | Some(' ') | Some('\n')) {
                    continue;
                }
                chunk.push(' ');
                prev = Some(' ');
            } else {
                chunk.push(c);
                prev = Some(c);
            }
        }
        self.out.append(&chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DetachedImages;
    use crate::options::{DisplayMetrics, HtmlTextOptions};
    use crate::rewrite::override_tags;
    use crate::spanned::SpanKind;

    fn convert(markup: &str) -> (SpannedText, DetachedImages) {
        let mut images = DetachedImages::new();
        let mut tags = TagHandler::new(&HtmlTextOptions::default(), DisplayMetrics::default());
        let text = from_html(&override_tags(markup), &mut images, &mut tags);
        (text, images)
    }

    fn covered(text: &SpannedText, kind: SpanKind) -> Vec<&str> {
        text.spans_of(kind)
            .into_iter()
            .map(|entry| &text.as_str()[entry.range()])
            .collect()
    }

    #[test]
    fn basic_styles_cover_their_content() {
        let (text, _) = convert("a <b>bold</b> <i>it</i> <em>em</em> <u>under</u>");
        assert_eq!(text.as_str(), "a bold it em under");
        assert_eq!(covered(&text, SpanKind::Style), vec!["bold", "it", "em"]);
        assert_eq!(covered(&text, SpanKind::Underline), vec!["under"]);
    }

    #[test]
    fn whitespace_collapses_like_html() {
        let (text, _) = convert("  one\n\n  two <br>   three ");
        assert_eq!(text.as_str(), "one two \nthree ");
    }

    #[test]
    fn paragraphs_break_lines() {
        let (text, _) = convert("<p>first</p><p>second</p>tail");
        assert_eq!(text.as_str(), "first\nsecond\ntail");
    }

    #[test]
    fn entities_resolve_and_unknown_ones_stay_literal() {
        let (text, _) = convert("a&amp;b &lt;x&gt; &#65;&nbsp;&bogus;");
        assert_eq!(text.as_str(), "a&b <x> A\u{a0}&bogus;");
    }

    #[test]
    fn anchors_produce_url_spans_only_with_href() {
        let (text, _) = convert("<a href=\"https://x\">x</a> <a>y</a>");
        let urls = text.spans_of(SpanKind::Url);
        assert_eq!(urls.len(), 1);
        assert!(matches!(&urls[0].span, Span::Url(url) if url == "https://x"));
    }

    #[test]
    fn images_insert_replacement_char_in_order() {
        let (text, images) =
            convert("<img src=\"a.png\" width=10 height=20>mid<img src='b.png'/>");
        assert_eq!(text.as_str(), "\u{FFFC}mid\u{FFFC}");
        let spans = text.spans_of(SpanKind::Image);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range(), 0..3);
        let Span::Image(second) = &spans[1].span else {
            panic!("expected image span");
        };
        assert_eq!(second.source(), "b.png");
        assert_eq!(second.placeholder().position(), 1);
        assert_eq!(
            images.seen,
            vec![
                ("a.png".to_string(), ImageHint::new(10, 20)),
                ("b.png".to_string(), ImageHint::default()),
            ]
        );
    }

    #[test]
    fn lists_flow_through_tag_handler() {
        let (text, _) = convert("<ul><li>a</li><li>b</li></ul>");
        assert_eq!(text.as_str(), "a\nb\n");
        assert_eq!(text.spans_of(SpanKind::Bullet).len(), 2);
    }

    #[test]
    fn unsupported_tags_pass_through() {
        let (text, _) = convert("<span class=x>plain</span><blink>on</blink>");
        assert_eq!(text.as_str(), "plainon");
        assert_eq!(text.spans().count(), 0);
    }

    #[test]
    fn unmatched_close_tags_are_ignored() {
        let (text, _) = convert("x</b></strike></font>y");
        assert_eq!(text.as_str(), "xy");
        assert_eq!(text.spans().count(), 0);
    }

    #[test]
    fn font_attributes_survive_to_close() {
        let (text, _) = convert("<font color=\"red\" size=\"4\">hot</font>");
        assert_eq!(covered(&text, SpanKind::ForegroundColor), vec!["hot"]);
        assert_eq!(covered(&text, SpanKind::AbsoluteSize), vec!["hot"]);
    }

    #[test]
    fn stray_less_than_stays_in_text() {
        let (text, _) = convert("<b>a</b> 1 < 2 <i>x</i> tail");
        assert_eq!(text.as_str(), "a 1 < 2 x tail");
        assert_eq!(covered(&text, SpanKind::Style), vec!["a", "x"]);
    }

    #[test]
    fn unquoted_href_keeps_trailing_slash() {
        let (text, _) = convert("<a href=http://x/>link</a> after");
        assert_eq!(text.as_str(), "link after");
        let urls = text.spans_of(SpanKind::Url);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].range(), 0..4);
        assert!(matches!(&urls[0].span, Span::Url(url) if url == "http://x/"));
    }

    #[test]
    fn self_closed_tags_with_quoted_values_still_close() {
        let (text, _) = convert("<b class=\"x\"/>plain<br/>next");
        assert_eq!(text.as_str(), "plain\nnext");
        assert_eq!(text.spans().count(), 0);
    }

    #[test]
    fn empty_markup_converts_to_empty_text() {
        let (text, images) = convert("");
        assert!(text.is_empty());
        assert!(images.seen.is_empty());
    }
}
