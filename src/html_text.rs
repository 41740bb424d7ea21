//! Conversion entry point.

use core::fmt;
use std::sync::Arc;

use crate::click::{rewire_clicks, OnTagClickListener};
use crate::error::HtmlTextError;
use crate::from_html::from_html;
use crate::image::{HtmlImageLoader, PlaceholderFactory};
use crate::image_hints::{scan_image_hints, ImageHint};
use crate::options::HtmlTextOptions;
use crate::rewrite::override_tags;
use crate::spanned::SpannedText;
use crate::tag_handler::TagHandler;
use crate::widget::{DocumentToken, TextWidget};

/// Post-conversion transform applied before the text is published.
pub type After = Box<dyn FnOnce(SpannedText) -> SpannedText + Send>;

/// Builder converting one markup string for one widget.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use htmltext::{HtmlText, TextWidget};
/// # fn show<W: TextWidget + 'static>(widget: &Arc<W>) -> Result<(), htmltext::HtmlTextError> {
/// HtmlText::new("<b>Hello</b> <a href=\"https://example.com\">world</a>")
///     .into_widget(widget)
/// # }
/// ```
pub struct HtmlText {
    source: String,
    image_loader: Option<Arc<dyn HtmlImageLoader>>,
    on_tag_click: Option<Arc<dyn OnTagClickListener>>,
    after: Option<After>,
    options: HtmlTextOptions,
}

impl fmt::Debug for HtmlText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlText")
            .field("source_len", &self.source.len())
            .field("image_loader", &self.image_loader.is_some())
            .field("on_tag_click", &self.on_tag_click.is_some())
            .field("after", &self.after.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl HtmlText {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            image_loader: None,
            on_tag_click: None,
            after: None,
            options: HtmlTextOptions::default(),
        }
    }

    pub fn with_image_loader(mut self, loader: Arc<dyn HtmlImageLoader>) -> Self {
        self.image_loader = Some(loader);
        self
    }

    pub fn with_on_tag_click_listener(mut self, listener: Arc<dyn OnTagClickListener>) -> Self {
        self.on_tag_click = Some(listener);
        self
    }

    /// Transform the converted text once more before it is returned or
    /// published.
    pub fn with_after<F>(mut self, after: F) -> Self
    where
        F: FnOnce(SpannedText) -> SpannedText + Send + 'static,
    {
        self.after = Some(Box::new(after));
        self
    }

    pub fn with_options(mut self, options: HtmlTextOptions) -> Self {
        self.options = options;
        self
    }

    /// Convert the markup for `widget` without showing it.
    ///
    /// The result belongs to a new document generation that is not
    /// published: image loads still running for the text on screen keep
    /// updating it. Use [`HtmlText::into_widget`] to show the result and
    /// retire the previous document. Must be called on the widget's
    /// rendering thread when an image loader may complete synchronously.
    ///
    /// Empty markup yields empty text without touching the loader or the
    /// listener.
    pub fn convert<W>(self, widget: &Arc<W>) -> Result<SpannedText, HtmlTextError>
    where
        W: TextWidget + 'static,
    {
        self.convert_document(widget).map(|(text, _)| text)
    }

    /// Convert, publish the result through [`TextWidget::set_text`], and make
    /// every earlier document on `widget` stale.
    pub fn into_widget<W>(self, widget: &Arc<W>) -> Result<(), HtmlTextError>
    where
        W: TextWidget + 'static,
    {
        let (text, token) = self.convert_document(widget)?;
        widget.generation().publish(&token);
        widget.set_text(text);
        Ok(())
    }

    fn convert_document<W>(
        self,
        widget: &Arc<W>,
    ) -> Result<(SpannedText, DocumentToken), HtmlTextError>
    where
        W: TextWidget + 'static,
    {
        if self.source.is_empty() {
            return Ok((SpannedText::new(), widget.generation().reserve()));
        }

        let metrics = widget.display_metrics();
        metrics.validate()?;
        let token = widget.generation().reserve();

        let ui: Arc<dyn TextWidget> = widget.clone();
        let mut images = PlaceholderFactory::new(self.image_loader, ui, token.clone(), metrics);
        let mut tags = TagHandler::new(&self.options, metrics);
        let markup = override_tags(&self.source);
        let mut text = from_html(&markup, &mut images, &mut tags);

        rewire_clicks(&mut text, self.on_tag_click.as_ref());
        log::debug!(
            "converted {} bytes of markup into {} bytes of text with {} spans, {} images",
            self.source.len(),
            text.len(),
            text.spans().count(),
            images.images_seen()
        );

        let text = match self.after {
            Some(after) => after(text),
            None => text,
        };
        Ok((text, token))
    }
}

/// Declared size hint of every `<img>` in `source`, in document order, for
/// callers that reserve layout before converting.
pub fn predict_image_sizes(source: &str) -> Vec<ImageHint> {
    scan_image_hints(source)
}
