//! Collaborator fakes shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use htmltext::{
    DisplayMetrics, DocumentGeneration, Drawable, HtmlImageLoader, ImageLoadCallback,
    OnTagClickListener, Placeholder, Span, SpanKind, SpannedText, TextWidget, UiTask,
    UiThreadQueue,
};

/// Widget bound to the creating thread, recording everything it is told.
pub struct RecordingWidget {
    pub metrics: DisplayMetrics,
    pub queue: UiThreadQueue,
    pub generation: DocumentGeneration,
    pub published: Mutex<Vec<SpannedText>>,
    pub renders: AtomicUsize,
    pub posted: AtomicUsize,
}

impl RecordingWidget {
    pub fn new() -> Arc<Self> {
        Self::with_metrics(DisplayMetrics::default())
    }

    pub fn with_density(density: f32) -> Arc<Self> {
        Self::with_metrics(DisplayMetrics {
            density,
            ..DisplayMetrics::default()
        })
    }

    pub fn with_metrics(metrics: DisplayMetrics) -> Arc<Self> {
        Arc::new(Self {
            metrics,
            queue: UiThreadQueue::for_current_thread(),
            generation: DocumentGeneration::new(),
            published: Mutex::new(Vec::new()),
            renders: AtomicUsize::new(0),
            posted: AtomicUsize::new(0),
        })
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> usize {
        self.posted.load(Ordering::SeqCst)
    }

    pub fn last_published(&self) -> Option<SpannedText> {
        self.published
            .lock()
            .expect("lock should succeed")
            .last()
            .cloned()
    }
}

impl TextWidget for RecordingWidget {
    fn set_text(&self, text: SpannedText) {
        self.published
            .lock()
            .expect("lock should succeed")
            .push(text);
    }

    fn request_render(&self) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }

    fn display_metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    fn is_ui_thread(&self) -> bool {
        self.queue.is_ui_thread()
    }

    fn post(&self, task: UiTask) {
        self.posted.fetch_add(1, Ordering::SeqCst);
        self.queue.post(task);
    }

    fn generation(&self) -> &DocumentGeneration {
        &self.generation
    }
}

#[derive(Debug)]
pub struct FakeDrawable {
    pub width: i32,
    pub height: i32,
}

impl FakeDrawable {
    pub fn new(width: i32, height: i32) -> Arc<dyn Drawable> {
        Arc::new(Self { width, height })
    }
}

impl Drawable for FakeDrawable {
    fn intrinsic_width(&self) -> i32 {
        self.width
    }

    fn intrinsic_height(&self) -> i32 {
        self.height
    }
}

/// Loader that parks every request until the test completes it.
pub struct FakeLoader {
    pub requests: Mutex<Vec<(String, Option<ImageLoadCallback>)>>,
    pub default_graphic: Option<Arc<dyn Drawable>>,
    pub error_graphic: Option<Arc<dyn Drawable>>,
    pub max_width: i32,
    pub fit_width: bool,
}

impl Default for FakeLoader {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            default_graphic: Some(FakeDrawable::new(24, 24)),
            error_graphic: Some(FakeDrawable::new(32, 16)),
            max_width: 0,
            fit_width: false,
        }
    }
}

impl FakeLoader {
    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("lock should succeed")
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Take the parked callback for request `index`.
    pub fn take(&self, index: usize) -> ImageLoadCallback {
        self.requests.lock().expect("lock should succeed")[index]
            .1
            .take()
            .unwrap_or_else(|| panic!("request {index} already completed"))
    }
}

impl HtmlImageLoader for FakeLoader {
    fn load_image(&self, url: &str, callback: ImageLoadCallback) {
        self.requests
            .lock()
            .expect("lock should succeed")
            .push((url.to_string(), Some(callback)));
    }

    fn default_drawable(&self) -> Option<Arc<dyn Drawable>> {
        self.default_graphic.clone()
    }

    fn error_drawable(&self) -> Option<Arc<dyn Drawable>> {
        self.error_graphic.clone()
    }

    fn max_width(&self) -> i32 {
        self.max_width
    }

    fn fit_width(&self) -> bool {
        self.fit_width
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
    Image { urls: Vec<String>, position: usize },
    Link(String),
}

#[derive(Default)]
pub struct RecordingListener {
    pub clicks: Mutex<Vec<Click>>,
}

impl RecordingListener {
    pub fn clicks(&self) -> Vec<Click> {
        self.clicks.lock().expect("lock should succeed").clone()
    }
}

impl OnTagClickListener for RecordingListener {
    fn on_image_click(&self, urls: &[String], position: usize) {
        self.clicks
            .lock()
            .expect("lock should succeed")
            .push(Click::Image {
                urls: urls.to_vec(),
                position,
            });
    }

    fn on_link_click(&self, url: &str) {
        self.clicks
            .lock()
            .expect("lock should succeed")
            .push(Click::Link(url.to_string()));
    }
}

/// Placeholders of every image span, in document order.
pub fn placeholders(text: &SpannedText) -> Vec<Placeholder> {
    text.spans_of(SpanKind::Image)
        .into_iter()
        .filter_map(|entry| match &entry.span {
            Span::Image(image) => Some(image.placeholder().clone()),
            _ => None,
        })
        .collect()
}

/// Text covered by every span of `kind`, in document order.
pub fn covered(text: &SpannedText, kind: SpanKind) -> Vec<String> {
    text.spans_of(kind)
        .into_iter()
        .map(|entry| text.as_str()[entry.range()].to_string())
        .collect()
}
