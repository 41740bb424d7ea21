//! Restricted HTML to styled text for text widgets.
//!
//! `htmltext` converts a small HTML subset (`b`, `i`, `u`, `ul`, `ol`, `li`,
//! `font`, `div`, `code`, `center`, `s`/`strike`, `tr`/`th`/`td`, `img`,
//! `a`) into a [`SpannedText`]: a string with range-tagged style spans.
//! Images become placeholders that an [`HtmlImageLoader`] fills
//! asynchronously, and image/link regions are routed to an
//! [`OnTagClickListener`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use htmltext::{HtmlText, TextWidget};
//!
//! fn show<W: TextWidget + 'static>(widget: &Arc<W>) -> Result<(), htmltext::HtmlTextError> {
//!     HtmlText::new("<ul><li><font color=\"red\">hot</font></li></ul>").into_widget(widget)
//! }
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod click;
mod color;
mod error;
mod from_html;
mod html_text;
mod image;
mod image_hints;
mod options;
mod rewrite;
mod spanned;
mod tag_handler;
mod tokenizer;
mod widget;

#[cfg(feature = "async")]
mod async_loader;

#[cfg(feature = "async")]
pub use async_loader::TokioImageLoader;
pub use click::{rewire_clicks, ImageClickSpan, LinkClickSpan, OnTagClickListener};
pub use color::parse_color;
pub use error::{ErrorPhase, HtmlTextError, ImageLoadError};
pub use from_html::OBJECT_REPLACEMENT;
pub use html_text::{predict_image_sizes, After, HtmlText};
pub use image::{
    fit_loaded_size, Bounds, Canvas, Drawable, HtmlImageLoader, ImageLoadCallback, ImageSpan,
    Placeholder, PlaceholderState,
};
pub use image_hints::{parse_dimension, scan_image_hints, ImageHint};
pub use options::{
    DisplayMetrics, HtmlTextOptions, ListMetrics, FONT_SIZE_MAX, FONT_SIZE_MIN, FONT_SIZE_NORMAL,
};
pub use rewrite::override_tags;
pub use spanned::{
    Alignment, BulletSpan, NumberSpan, Span, SpanEntry, SpanFlags, SpanId, SpanKind, SpannedText,
    TextRange, TextStyle,
};
pub use tag_handler::{TagEvent, TagHandler};
pub use tokenizer::TagAttributes;
pub use widget::{DocumentGeneration, DocumentToken, TextWidget, UiTask, UiThreadQueue};
