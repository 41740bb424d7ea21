//! Application-routed click regions for images and links.

use core::fmt;
use std::sync::Arc;

use crate::spanned::{Span, SpanFlags, SpanId, SpanKind, SpannedText, TextRange};

/// Receives clicks on image and link regions.
pub trait OnTagClickListener: Send + Sync {
    /// `urls` lists every image of the document in order; `position` is the
    /// clicked image's index in it.
    fn on_image_click(&self, urls: &[String], position: usize);

    fn on_link_click(&self, url: &str);
}

/// Click region over one image.
#[derive(Clone)]
pub struct ImageClickSpan {
    urls: Arc<[String]>,
    position: usize,
    listener: Option<Arc<dyn OnTagClickListener>>,
}

impl ImageClickSpan {
    pub fn new(
        urls: Arc<[String]>,
        position: usize,
        listener: Option<Arc<dyn OnTagClickListener>>,
    ) -> Self {
        Self {
            urls,
            position,
            listener,
        }
    }

    /// Image URLs of the whole document, shared by every image region.
    pub fn urls(&self) -> &Arc<[String]> {
        &self.urls
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn on_click(&self) {
        if let Some(listener) = &self.listener {
            listener.on_image_click(&self.urls, self.position);
        }
    }

    /// Image regions draw without an underline.
    pub fn underline(&self) -> bool {
        false
    }
}

impl fmt::Debug for ImageClickSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageClickSpan")
            .field("urls", &self.urls)
            .field("position", &self.position)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Click region over one link.
#[derive(Clone)]
pub struct LinkClickSpan {
    url: String,
    listener: Option<Arc<dyn OnTagClickListener>>,
}

impl LinkClickSpan {
    pub fn new(url: impl Into<String>, listener: Option<Arc<dyn OnTagClickListener>>) -> Self {
        Self {
            url: url.into(),
            listener,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn on_click(&self) {
        if let Some(listener) = &self.listener {
            listener.on_link_click(&self.url);
        }
    }

    /// Link regions keep the usual link underline.
    pub fn underline(&self) -> bool {
        true
    }
}

impl fmt::Debug for LinkClickSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkClickSpan")
            .field("url", &self.url)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Replace native clickable behaviour on images and links with
/// listener-routed click regions.
///
/// Image regions get `ExclusiveExclusive` bounds, link regions
/// `ExclusiveInclusive`.
pub fn rewire_clicks(text: &mut SpannedText, listener: Option<&Arc<dyn OnTagClickListener>>) {
    let images: Vec<(TextRange, String)> = text
        .spans_of(SpanKind::Image)
        .into_iter()
        .filter_map(|entry| match &entry.span {
            Span::Image(image) => Some((entry.range(), image.source().to_string())),
            _ => None,
        })
        .collect();
    let urls: Arc<[String]> = images.iter().map(|(_, url)| url.clone()).collect();

    for (position, (range, _)) in images.into_iter().enumerate() {
        let native: Vec<SpanId> = text
            .spans()
            .filter(|entry| entry.kind().is_clickable() && entry.range() == range)
            .map(|entry| entry.id)
            .collect();
        for id in native {
            text.remove_span(id);
        }
        let click = ImageClickSpan::new(Arc::clone(&urls), position, listener.cloned());
        text.set_span(Span::ImageClick(click), range, SpanFlags::ExclusiveExclusive);
    }

    let links: Vec<(SpanId, TextRange, String)> = text
        .spans_of(SpanKind::Url)
        .into_iter()
        .filter_map(|entry| match &entry.span {
            Span::Url(url) => Some((entry.id, entry.range(), url.clone())),
            _ => None,
        })
        .collect();
    for (id, range, url) in links {
        text.remove_span(id);
        let click = LinkClickSpan::new(url, listener.cloned());
        text.set_span(Span::LinkClick(click), range, SpanFlags::ExclusiveInclusive);
    }
}
