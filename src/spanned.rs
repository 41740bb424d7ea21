//! Styled text: a string plus a table of range-tagged spans.
//!
//! Offsets are byte offsets into the text. Every mutation made by this crate
//! appends or inserts whole strings, so offsets always sit on char
//! boundaries.

use core::ops::Range;

use crate::click::{ImageClickSpan, LinkClickSpan};
use crate::image::ImageSpan;

/// Byte range inside a [`SpannedText`].
pub type TextRange = Range<usize>;

/// Boundary behaviour of a span when text is inserted exactly at its edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanFlags {
    /// Text inserted at either edge stays outside the span.
    ExclusiveExclusive,
    /// Text inserted at the end edge joins the span.
    ExclusiveInclusive,
    /// Text inserted at the start edge joins the span.
    InclusiveExclusive,
    /// Text inserted at either edge joins the span.
    InclusiveInclusive,
}

impl SpanFlags {
    fn start_inclusive(self) -> bool {
        matches!(self, Self::InclusiveExclusive | Self::InclusiveInclusive)
    }

    fn end_inclusive(self) -> bool {
        matches!(self, Self::ExclusiveInclusive | Self::InclusiveInclusive)
    }
}

/// Font style toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextStyle {
    Bold,
    Italic,
}

/// Paragraph alignment. Only `<center>` produces one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Center,
}

/// Bullet glyph drawn in the leading margin of a list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulletSpan {
    /// Gap between the glyph and the text. Nested items use a reduced,
    /// possibly negative, gap to cancel stacked indentation.
    pub gap_width: i32,
    /// Glyph radius.
    pub radius: i32,
}

impl BulletSpan {
    /// Margin this span contributes to the line it covers.
    pub fn leading_margin(&self) -> i32 {
        2 * self.radius + self.gap_width
    }
}

/// Number glyph drawn in the leading margin of an ordered list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberSpan {
    pub number: usize,
}

impl NumberSpan {
    /// Text the widget draws for this item, e.g. `"3. "`.
    pub fn label(&self) -> String {
        format!("{}. ", self.number)
    }
}

/// A visual or behavioural property attached to a text range.
#[derive(Clone, Debug)]
pub enum Span {
    Style(TextStyle),
    Underline,
    Strikethrough,
    Monospace,
    Alignment(Alignment),
    /// Opaque ARGB colour.
    ForegroundColor(u32),
    /// Absolute text size; `dip` marks density-independent units.
    AbsoluteSize { size: i32, dip: bool },
    /// Plain indentation, in pixels.
    LeadingMargin(i32),
    Bullet(BulletSpan),
    Number(NumberSpan),
    /// Native link destination, as produced by `<a href>`.
    Url(String),
    Image(ImageSpan),
    ImageClick(ImageClickSpan),
    LinkClick(LinkClickSpan),
}

/// Discriminant of [`Span`], used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Style,
    Underline,
    Strikethrough,
    Monospace,
    Alignment,
    ForegroundColor,
    AbsoluteSize,
    LeadingMargin,
    Bullet,
    Number,
    Url,
    Image,
    ImageClick,
    LinkClick,
}

impl SpanKind {
    /// Whether spans of this kind react to clicks.
    pub fn is_clickable(self) -> bool {
        matches!(self, Self::Url | Self::ImageClick | Self::LinkClick)
    }

    /// Stable lower-case name, used by debug dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Monospace => "monospace",
            Self::Alignment => "alignment",
            Self::ForegroundColor => "foreground_color",
            Self::AbsoluteSize => "absolute_size",
            Self::LeadingMargin => "leading_margin",
            Self::Bullet => "bullet",
            Self::Number => "number",
            Self::Url => "url",
            Self::Image => "image",
            Self::ImageClick => "image_click",
            Self::LinkClick => "link_click",
        }
    }
}

impl Span {
    pub fn kind(&self) -> SpanKind {
        match self {
            Self::Style(_) => SpanKind::Style,
            Self::Underline => SpanKind::Underline,
            Self::Strikethrough => SpanKind::Strikethrough,
            Self::Monospace => SpanKind::Monospace,
            Self::Alignment(_) => SpanKind::Alignment,
            Self::ForegroundColor(_) => SpanKind::ForegroundColor,
            Self::AbsoluteSize { .. } => SpanKind::AbsoluteSize,
            Self::LeadingMargin(_) => SpanKind::LeadingMargin,
            Self::Bullet(_) => SpanKind::Bullet,
            Self::Number(_) => SpanKind::Number,
            Self::Url(_) => SpanKind::Url,
            Self::Image(_) => SpanKind::Image,
            Self::ImageClick(_) => SpanKind::ImageClick,
            Self::LinkClick(_) => SpanKind::LinkClick,
        }
    }
}

/// Identity of one span entry, stable across insertions and removals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanId(u64);

/// A span attached to a range of a [`SpannedText`].
#[derive(Clone, Debug)]
pub struct SpanEntry {
    pub id: SpanId,
    pub span: Span,
    pub start: usize,
    pub end: usize,
    pub flags: SpanFlags,
}

impl SpanEntry {
    pub fn range(&self) -> TextRange {
        self.start..self.end
    }

    pub fn kind(&self) -> SpanKind {
        self.span.kind()
    }

    fn covers(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Text with attached spans.
#[derive(Clone, Debug, Default)]
pub struct SpannedText {
    text: String,
    spans: Vec<SpanEntry>,
    next_id: u64,
}

impl SpannedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn ends_with_newline(&self) -> bool {
        self.text.ends_with('\n')
    }

    /// Append `s` at the end of the text.
    ///
    /// Spans ending exactly at the old end grow only if their end is
    /// inclusive.
    pub fn append(&mut self, s: &str) {
        let at = self.text.len();
        self.insert(at, s);
    }

    /// Insert `s` at byte offset `at` and move span boundaries per their
    /// flags. Offsets past the end or inside a char are clamped to the end.
    pub fn insert(&mut self, at: usize, s: &str) {
        if s.is_empty() {
            return;
        }
        let at = if at <= self.text.len() && self.text.is_char_boundary(at) {
            at
        } else {
            self.text.len()
        };
        let n = s.len();
        self.text.insert_str(at, s);
        for entry in &mut self.spans {
            let moves_start = at < entry.start || (at == entry.start && !entry.flags.start_inclusive());
            let moves_end = at < entry.end || (at == entry.end && entry.flags.end_inclusive());
            if moves_start {
                entry.start += n;
            }
            if moves_end {
                entry.end += n;
            }
            if entry.end < entry.start {
                entry.end = entry.start;
            }
        }
    }

    /// Attach `span` to `range`.
    ///
    /// Returns `None` for ranges that are inverted, out of bounds, not on
    /// char boundaries, or empty with [`SpanFlags::ExclusiveExclusive`].
    pub fn set_span(&mut self, span: Span, range: TextRange, flags: SpanFlags) -> Option<SpanId> {
        if range.start > range.end
            || range.end > self.text.len()
            || !self.text.is_char_boundary(range.start)
            || !self.text.is_char_boundary(range.end)
        {
            log::debug!(
                "rejecting {} span over {:?} (text length {})",
                span.kind().name(),
                range,
                self.text.len()
            );
            return None;
        }
        if range.is_empty() && flags == SpanFlags::ExclusiveExclusive {
            return None;
        }
        let id = SpanId(self.next_id);
        self.next_id += 1;
        self.spans.push(SpanEntry {
            id,
            span,
            start: range.start,
            end: range.end,
            flags,
        });
        Some(id)
    }

    pub fn remove_span(&mut self, id: SpanId) -> Option<SpanEntry> {
        let idx = self.spans.iter().position(|entry| entry.id == id)?;
        Some(self.spans.remove(idx))
    }

    pub fn span(&self, id: SpanId) -> Option<&SpanEntry> {
        self.spans.iter().find(|entry| entry.id == id)
    }

    /// All spans in insertion order.
    pub fn spans(&self) -> impl Iterator<Item = &SpanEntry> {
        self.spans.iter()
    }

    /// Spans of one kind in document order (by start, then insertion order).
    pub fn spans_of(&self, kind: SpanKind) -> Vec<&SpanEntry> {
        let mut out: Vec<&SpanEntry> = self
            .spans
            .iter()
            .filter(|entry| entry.kind() == kind)
            .collect();
        out.sort_by_key(|entry| (entry.start, entry.id));
        out
    }

    /// Spans of `kind` whose range intersects `range`. Empty ranges match
    /// spans covering that offset.
    pub fn spans_in(&self, range: TextRange, kind: SpanKind) -> Vec<&SpanEntry> {
        self.spans
            .iter()
            .filter(|entry| entry.kind() == kind)
            .filter(|entry| {
                if range.is_empty() {
                    entry.covers(range.start)
                } else {
                    entry.start < range.end && range.start < entry.end
                }
            })
            .collect()
    }

    /// Spans of `kind` covering the char at `offset`.
    pub fn spans_at(&self, offset: usize, kind: SpanKind) -> Vec<&SpanEntry> {
        self.spans_in(offset..offset, kind)
    }

    /// Route a click at `offset` to the first click region covering it.
    ///
    /// Returns whether a region was found. Native URL spans are not click
    /// regions; only the rewired image and link regions respond.
    pub fn click_at(&self, offset: usize) -> bool {
        let hit = self.spans.iter().find(|entry| {
            entry.covers(offset)
                && matches!(entry.kind(), SpanKind::ImageClick | SpanKind::LinkClick)
        });
        match hit.map(|entry| &entry.span) {
            Some(Span::ImageClick(click)) => {
                click.on_click();
                true
            }
            Some(Span::LinkClick(click)) => {
                click.on_click();
                true
            }
            _ => false,
        }
    }

    /// Sum of plain indentation covering the line at `offset`.
    pub fn leading_margin_at(&self, offset: usize) -> i32 {
        self.spans
            .iter()
            .filter(|entry| entry.covers(offset))
            .filter_map(|entry| match entry.span {
                Span::LeadingMargin(margin) => Some(margin),
                _ => None,
            })
            .sum()
    }
}

impl From<&str> for SpannedText {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }
}
