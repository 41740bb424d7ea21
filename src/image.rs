//! Image placeholders and the asynchronous loading contract.
//!
//! Every `<img>` becomes one [`Placeholder`] shared between the published
//! text and the load callback. The placeholder first shows the loader's
//! loading graphic at that graphic's own size, then swaps to the loaded
//! image (sized from the tag's declared hint, capped by the loader's max
//! width) or to the loader's error graphic.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ImageLoadError;
use crate::image_hints::ImageHint;
use crate::options::DisplayMetrics;
use crate::widget::{run_on_ui, DocumentToken, TextWidget};

/// Width and height in device pixels, anchored at the origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Something a placeholder can show.
pub trait Drawable: Send + Sync + fmt::Debug {
    fn intrinsic_width(&self) -> i32;
    fn intrinsic_height(&self) -> i32;

    /// `false` once the backing pixels are gone (for example a recycled
    /// bitmap). Unavailable content draws nothing.
    fn is_available(&self) -> bool {
        true
    }

    fn intrinsic_bounds(&self) -> Bounds {
        Bounds::new(self.intrinsic_width(), self.intrinsic_height())
    }
}

/// Draw target handed to [`Placeholder::draw`].
pub trait Canvas {
    fn draw_drawable(&mut self, drawable: &dyn Drawable, bounds: Bounds);
}

/// What a placeholder currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderState {
    /// No loader configured, or the loader had no graphic to offer.
    Empty,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug)]
struct PlaceholderInner {
    content: Option<Arc<dyn Drawable>>,
    bounds: Bounds,
    state: PlaceholderState,
}

/// Mutable stand-in for one image occurrence.
///
/// Clones share state: the copy inside the published text sees every
/// update the load callback applies.
#[derive(Clone, Debug)]
pub struct Placeholder {
    position: usize,
    token: DocumentToken,
    inner: Arc<Mutex<PlaceholderInner>>,
}

impl Placeholder {
    pub(crate) fn new(position: usize, token: DocumentToken) -> Self {
        Self {
            position,
            token,
            inner: Arc::new(Mutex::new(PlaceholderInner {
                content: None,
                bounds: Bounds::ZERO,
                state: PlaceholderState::Empty,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaceholderInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Occurrence index of the image tag, 0-based in document order.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn bounds(&self) -> Bounds {
        self.lock().bounds
    }

    pub fn state(&self) -> PlaceholderState {
        self.lock().state
    }

    pub fn content(&self) -> Option<Arc<dyn Drawable>> {
        self.lock().content.clone()
    }

    /// Whether the widget still shows the document this placeholder
    /// belongs to.
    pub fn is_current(&self) -> bool {
        self.token.is_current()
    }

    /// Draw the current content, if any is still available.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let (content, bounds) = {
            let inner = self.lock();
            (inner.content.clone(), inner.bounds)
        };
        let Some(content) = content else {
            return;
        };
        if !content.is_available() {
            return;
        }
        canvas.draw_drawable(content.as_ref(), bounds);
    }

    /// Show `content` at `bounds`. Missing content collapses to zero size.
    fn show(&self, content: Option<Arc<dyn Drawable>>, bounds: Bounds, state: PlaceholderState) {
        let mut inner = self.lock();
        inner.bounds = if content.is_some() {
            bounds
        } else {
            Bounds::ZERO
        };
        inner.state = if content.is_some() {
            state
        } else {
            PlaceholderState::Empty
        };
        inner.content = content;
    }

    /// Show a loader-provided graphic at its own intrinsic size.
    fn show_intrinsic(&self, content: Option<Arc<dyn Drawable>>, state: PlaceholderState) {
        let bounds = content
            .as_ref()
            .map_or(Bounds::ZERO, |drawable| drawable.intrinsic_bounds());
        self.show(content, bounds, state);
    }
}

/// Image span payload: the tag's source attribute and its placeholder.
#[derive(Clone, Debug)]
pub struct ImageSpan {
    source: String,
    placeholder: Placeholder,
}

impl ImageSpan {
    pub fn new(source: impl Into<String>, placeholder: Placeholder) -> Self {
        Self {
            source: source.into(),
            placeholder,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }
}

/// Asynchronous image source.
pub trait HtmlImageLoader: Send + Sync {
    /// Start loading `url` and report through `callback`, from any thread.
    fn load_image(&self, url: &str, callback: ImageLoadCallback);

    /// Graphic shown while loading.
    fn default_drawable(&self) -> Option<Arc<dyn Drawable>> {
        None
    }

    /// Graphic shown after a failed load.
    fn error_drawable(&self) -> Option<Arc<dyn Drawable>> {
        None
    }

    /// Loaded images wider than this are scaled down to it. Non-positive
    /// means unbounded.
    fn max_width(&self) -> i32 {
        0
    }

    /// Scale every loaded image to exactly [`HtmlImageLoader::max_width`].
    fn fit_width(&self) -> bool {
        false
    }
}

/// Size a successfully loaded image.
///
/// A valid hint wins over the image's intrinsic size and is converted from
/// dp to device pixels. The result is then scaled, aspect preserved, to
/// `max_width` when it is wider or when `fit_width` asks for it.
pub fn fit_loaded_size(
    hint: ImageHint,
    intrinsic: Bounds,
    metrics: &DisplayMetrics,
    max_width: i32,
    fit_width: bool,
) -> Bounds {
    let (mut width, mut height) = match hint.size() {
        Some((w, h)) => (metrics.dp_to_px(w as f32), metrics.dp_to_px(h as f32)),
        None => (intrinsic.width, intrinsic.height),
    };
    if width > 0 && height > 0 && max_width > 0 && (width > max_width || fit_width) {
        height = (height as f32 / width as f32 * max_width as f32) as i32;
        width = max_width;
    }
    Bounds::new(width, height)
}

/// One-shot completion handle for a single image load.
///
/// Completion may be reported from any thread; the placeholder update and
/// re-render are marshaled onto the widget's rendering thread. Updates for
/// a document the widget no longer shows are dropped.
pub struct ImageLoadCallback {
    placeholder: Placeholder,
    hint: ImageHint,
    metrics: DisplayMetrics,
    loader: Arc<dyn HtmlImageLoader>,
    widget: Arc<dyn TextWidget>,
}

impl fmt::Debug for ImageLoadCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLoadCallback")
            .field("position", &self.placeholder.position())
            .field("hint", &self.hint)
            .finish_non_exhaustive()
    }
}

impl ImageLoadCallback {
    pub fn position(&self) -> usize {
        self.placeholder.position()
    }

    pub fn on_load_complete(self, image: Arc<dyn Drawable>) {
        let Self {
            placeholder,
            hint,
            metrics,
            loader,
            widget,
        } = self;
        let ui_widget = Arc::clone(&widget);
        run_on_ui(widget.as_ref(), move || {
            if !placeholder.is_current() {
                log::debug!(
                    "dropping loaded image {} for a superseded document",
                    placeholder.position()
                );
                return;
            }
            let bounds = fit_loaded_size(
                hint,
                image.intrinsic_bounds(),
                &metrics,
                loader.max_width(),
                loader.fit_width(),
            );
            placeholder.show(Some(image), bounds, PlaceholderState::Loaded);
            ui_widget.request_render();
        });
    }

    pub fn on_load_failed(self) {
        let Self {
            placeholder,
            loader,
            widget,
            ..
        } = self;
        let ui_widget = Arc::clone(&widget);
        run_on_ui(widget.as_ref(), move || {
            if !placeholder.is_current() {
                log::debug!(
                    "dropping failed image {} for a superseded document",
                    placeholder.position()
                );
                return;
            }
            placeholder.show_intrinsic(loader.error_drawable(), PlaceholderState::Failed);
            ui_widget.request_render();
        });
    }

    /// Log `error` and take the failure path.
    pub fn on_load_error(self, error: ImageLoadError) {
        log::debug!("{error}");
        self.on_load_failed();
    }
}

/// Produces the placeholder for each image tag, in document order.
pub(crate) trait ImageGetter {
    fn get_drawable(&mut self, source: &str, hint: ImageHint) -> Placeholder;
}

/// Placeholder factory bound to one conversion.
pub(crate) struct PlaceholderFactory {
    loader: Option<Arc<dyn HtmlImageLoader>>,
    widget: Arc<dyn TextWidget>,
    token: DocumentToken,
    metrics: DisplayMetrics,
    next_position: usize,
}

impl PlaceholderFactory {
    pub(crate) fn new(
        loader: Option<Arc<dyn HtmlImageLoader>>,
        widget: Arc<dyn TextWidget>,
        token: DocumentToken,
        metrics: DisplayMetrics,
    ) -> Self {
        Self {
            loader,
            widget,
            token,
            metrics,
            next_position: 0,
        }
    }

    pub(crate) fn images_seen(&self) -> usize {
        self.next_position
    }
}

impl ImageGetter for PlaceholderFactory {
    fn get_drawable(&mut self, source: &str, hint: ImageHint) -> Placeholder {
        let placeholder = Placeholder::new(self.next_position, self.token.clone());
        self.next_position += 1;

        let Some(loader) = self.loader.as_ref() else {
            return placeholder;
        };
        placeholder.show_intrinsic(loader.default_drawable(), PlaceholderState::Loading);
        let callback = ImageLoadCallback {
            placeholder: placeholder.clone(),
            hint,
            metrics: self.metrics,
            loader: Arc::clone(loader),
            widget: Arc::clone(&self.widget),
        };
        loader.load_image(source, callback);
        placeholder
    }
}

/// Placeholders with no loader, for conversions that never fetch images.
#[cfg(test)]
pub(crate) struct DetachedImages {
    token: DocumentToken,
    pub(crate) seen: Vec<(String, ImageHint)>,
}

#[cfg(test)]
impl DetachedImages {
    pub(crate) fn new() -> Self {
        Self {
            token: crate::widget::DocumentGeneration::new().advance(),
            seen: Vec::new(),
        }
    }
}

#[cfg(test)]
impl ImageGetter for DetachedImages {
    fn get_drawable(&mut self, source: &str, hint: ImageHint) -> Placeholder {
        let placeholder = Placeholder::new(self.seen.len(), self.token.clone());
        self.seen.push((source.to_string(), hint));
        placeholder
    }
}
