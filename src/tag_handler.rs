//! Stack-driven handling of list, font, div, code, center, strike and table
//! tags.
//!
//! Each open tag leaves a mark recording where its content began. The
//! matching close finds the most recent still-open mark of the same kind,
//! removes it, and turns `[mark, end of text)` into finished spans. A close
//! with no open mark is dropped.

use smallvec::SmallVec;

use crate::color::parse_color;
use crate::options::{
    DisplayMetrics, HtmlTextOptions, ListMetrics, FONT_SIZE_MAX, FONT_SIZE_MIN, FONT_SIZE_NORMAL,
};
use crate::rewrite::{DIV, FONT, LIST_ITEM, ORDERED_LIST, UNORDERED_LIST};
use crate::spanned::{Alignment, BulletSpan, NumberSpan, Span, SpanFlags, SpannedText};
use crate::tokenizer::TagAttributes;

/// One open or close tag, with the attributes written on its open tag.
#[derive(Clone, Copy, Debug)]
pub struct TagEvent<'a> {
    pub opening: bool,
    /// Lower-cased tag name.
    pub tag: &'a str,
    pub attributes: &'a TagAttributes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MarkKind {
    BulletItem,
    NumberItem,
    Font,
    Code,
    Center,
    Strike,
    TableRow,
    TableHeader,
    TableCell,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct FontAttrs {
    color: Option<String>,
    size: Option<String>,
}

#[derive(Clone, Debug)]
struct OpenMark {
    kind: MarkKind,
    start: usize,
    font: Option<FontAttrs>,
}

/// Per-conversion tag state. Create a fresh handler for every document.
#[derive(Debug)]
pub struct TagHandler {
    list_metrics: ListMetrics,
    display: DisplayMetrics,
    lists: SmallVec<[ListKind; 4]>,
    /// Next item number, one entry per open ordered list.
    counters: SmallVec<[usize; 4]>,
    marks: Vec<OpenMark>,
}

impl TagHandler {
    pub fn new(options: &HtmlTextOptions, display: DisplayMetrics) -> Self {
        Self {
            list_metrics: options.lists,
            display,
            lists: SmallVec::new(),
            counters: SmallVec::new(),
            marks: Vec::new(),
        }
    }

    /// Current list nesting depth.
    pub fn list_depth(&self) -> usize {
        self.lists.len()
    }

    /// Apply one tag event to `out`. Returns `false` for tags this handler
    /// does not own.
    pub fn handle_tag(&mut self, event: &TagEvent<'_>, out: &mut SpannedText) -> bool {
        if event.opening {
            self.open(event, out)
        } else {
            self.close(event.tag, out)
        }
    }

    fn open(&mut self, event: &TagEvent<'_>, out: &mut SpannedText) -> bool {
        match event.tag {
            UNORDERED_LIST => self.lists.push(ListKind::Unordered),
            ORDERED_LIST => {
                self.lists.push(ListKind::Ordered);
                self.counters.push(1);
            }
            LIST_ITEM => {
                ensure_newline(out);
                match self.lists.last().copied() {
                    Some(ListKind::Ordered) => {
                        self.start(MarkKind::NumberItem, out);
                        if let Some(next) = self.counters.last_mut() {
                            *next += 1;
                        }
                    }
                    Some(ListKind::Unordered) => self.start(MarkKind::BulletItem, out),
                    None => {}
                }
            }
            FONT => self.marks.push(OpenMark {
                kind: MarkKind::Font,
                start: out.len(),
                font: Some(FontAttrs {
                    color: event.attributes.get("color").map(str::to_string),
                    size: event.attributes.get("size").map(str::to_string),
                }),
            }),
            DIV => handle_div(out),
            "code" => self.start(MarkKind::Code, out),
            "center" => self.start(MarkKind::Center, out),
            "s" | "strike" => self.start(MarkKind::Strike, out),
            "tr" => self.start(MarkKind::TableRow, out),
            "th" => self.start(MarkKind::TableHeader, out),
            "td" => self.start(MarkKind::TableCell, out),
            _ => return false,
        }
        true
    }

    fn close(&mut self, tag: &str, out: &mut SpannedText) -> bool {
        match tag {
            UNORDERED_LIST => {
                if self.lists.pop().is_none() {
                    log::debug!("dropping list close without an open list");
                }
            }
            ORDERED_LIST => {
                if self.lists.pop().is_none() {
                    log::debug!("dropping list close without an open list");
                }
                self.counters.pop();
            }
            LIST_ITEM => self.close_list_item(out),
            FONT => self.close_font(out),
            DIV => handle_div(out),
            "code" => self.end(MarkKind::Code, out, false, [Span::Monospace]),
            "center" => self.end(
                MarkKind::Center,
                out,
                true,
                [Span::Alignment(Alignment::Center)],
            ),
            "s" | "strike" => self.end(MarkKind::Strike, out, false, [Span::Strikethrough]),
            "tr" => self.end(MarkKind::TableRow, out, false, []),
            "th" => self.end(MarkKind::TableHeader, out, false, []),
            "td" => self.end(MarkKind::TableCell, out, false, []),
            _ => return false,
        }
        true
    }

    fn close_list_item(&mut self, out: &mut SpannedText) {
        let depth = self.lists.len();
        let (mark, spans) = match self.lists.last().copied() {
            Some(ListKind::Unordered) => {
                let Some(mark) = self.take_mark(MarkKind::BulletItem) else {
                    return;
                };
                ensure_newline(out);
                let m = self.list_metrics;
                (
                    mark,
                    [
                        Span::LeadingMargin(unordered_indent(&m, depth)),
                        Span::Bullet(BulletSpan {
                            gap_width: bullet_gap(&m, depth),
                            radius: m.bullet_radius,
                        }),
                    ],
                )
            }
            Some(ListKind::Ordered) => {
                let Some(mark) = self.take_mark(MarkKind::NumberItem) else {
                    return;
                };
                ensure_newline(out);
                let number = self.counters.last().map_or(0, |next| next.saturating_sub(1));
                (
                    mark,
                    [
                        Span::LeadingMargin(ordered_indent(&self.list_metrics, depth)),
                        Span::Number(NumberSpan { number }),
                    ],
                )
            }
            None => {
                log::debug!("dropping list item close outside any list");
                return;
            }
        };
        finish(mark.start, out, false, spans);
    }

    fn close_font(&mut self, out: &mut SpannedText) {
        let Some(mark) = self.take_mark(MarkKind::Font) else {
            return;
        };
        let font = mark.font.unwrap_or_default();
        let color = font
            .color
            .as_deref()
            .and_then(parse_color)
            .map(|argb| Span::ForegroundColor(argb | 0xFF00_0000));
        let size = font
            .size
            .as_deref()
            .and_then(|size| self.font_size_dp(size))
            .map(|size| Span::AbsoluteSize { size, dip: true });
        finish(mark.start, out, false, color.into_iter().chain(size));
    }

    /// Map a `<font size>` step to an absolute size in dp relative to the
    /// widget's own text size.
    fn font_size_dp(&self, size: &str) -> Option<i32> {
        let step = size.trim().parse::<i32>().ok()?;
        let step = step.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX);
        let dp = self.display.base_text_size_dp() + (step - FONT_SIZE_NORMAL);
        (dp > 0).then_some(dp)
    }

    fn start(&mut self, kind: MarkKind, out: &SpannedText) {
        self.marks.push(OpenMark {
            kind,
            start: out.len(),
            font: None,
        });
    }

    fn take_mark(&mut self, kind: MarkKind) -> Option<OpenMark> {
        match self.marks.iter().rposition(|mark| mark.kind == kind) {
            Some(idx) => Some(self.marks.remove(idx)),
            None => {
                log::debug!("dropping {kind:?} close without a matching open tag");
                None
            }
        }
    }

    fn end<I>(&mut self, kind: MarkKind, out: &mut SpannedText, paragraph: bool, spans: I)
    where
        I: IntoIterator<Item = Span>,
    {
        if let Some(mark) = self.take_mark(kind) {
            finish(mark.start, out, paragraph, spans);
        }
    }
}

/// Attach `spans` over `[start, end of text)`. Paragraph styles end with a
/// line break. Empty content gets nothing.
fn finish<I>(start: usize, out: &mut SpannedText, paragraph: bool, spans: I)
where
    I: IntoIterator<Item = Span>,
{
    if start == out.len() {
        return;
    }
    if paragraph {
        out.append("\n");
    }
    let end = out.len();
    for span in spans {
        out.set_span(span, start..end, SpanFlags::ExclusiveExclusive);
    }
}

fn ensure_newline(out: &mut SpannedText) {
    if !out.is_empty() && !out.ends_with_newline() {
        out.append("\n");
    }
}

fn handle_div(out: &mut SpannedText) {
    ensure_newline(out);
}

// A renderer walks a line's margin spans in insertion order. Inner items
// close first, so an item's own margin and bullet come before those of the
// items enclosing it, and its glyph lands at its own indentation.

/// Indentation of a bulleted item: one unit per enclosing list.
fn unordered_indent(metrics: &ListMetrics, depth: usize) -> i32 {
    metrics.indent_unit * (depth_i32(depth) - 1)
}

/// Gap for a bullet at `depth`, reduced by what the enclosing items stack
/// after it so that every glyph sits the same distance from its text.
fn bullet_gap(metrics: &ListMetrics, depth: usize) -> i32 {
    let mut gap = metrics.bullet_gap;
    if depth > 1 {
        gap -= metrics.bullet_leading_margin();
        if depth > 2 {
            gap -= (depth_i32(depth) - 2) * metrics.indent_unit;
        }
    }
    gap
}

/// Indentation of a numbered item, capped at one unit past the top level.
fn ordered_indent(metrics: &ListMetrics, depth: usize) -> i32 {
    let mut margin = metrics.indent_unit * (depth_i32(depth) - 1);
    if depth > 2 {
        margin -= (depth_i32(depth) - 2) * metrics.indent_unit;
    }
    margin
}

fn depth_i32(depth: usize) -> i32 {
    i32::try_from(depth).unwrap_or(i32::MAX)
}
