//! [`HtmlImageLoader`] backed by a tokio runtime.

use core::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::ImageLoadError;
use crate::image::{Drawable, HtmlImageLoader, ImageLoadCallback};

/// Runs an async fetch function for each image on a tokio runtime.
///
/// Completions arrive on runtime worker threads; the placeholder update is
/// marshaled onto the widget's rendering thread by the callback.
pub struct TokioImageLoader<F> {
    handle: Handle,
    fetch: Arc<F>,
    default_drawable: Option<Arc<dyn Drawable>>,
    error_drawable: Option<Arc<dyn Drawable>>,
    max_width: i32,
    fit_width: bool,
}

impl<F> fmt::Debug for TokioImageLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioImageLoader")
            .field("default_drawable", &self.default_drawable)
            .field("error_drawable", &self.error_drawable)
            .field("max_width", &self.max_width)
            .field("fit_width", &self.fit_width)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> TokioImageLoader<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<dyn Drawable>, ImageLoadError>> + Send + 'static,
{
    pub fn new(handle: Handle, fetch: F) -> Self {
        Self {
            handle,
            fetch: Arc::new(fetch),
            default_drawable: None,
            error_drawable: None,
            max_width: 0,
            fit_width: false,
        }
    }

    pub fn with_default_drawable(mut self, drawable: Arc<dyn Drawable>) -> Self {
        self.default_drawable = Some(drawable);
        self
    }

    pub fn with_error_drawable(mut self, drawable: Arc<dyn Drawable>) -> Self {
        self.error_drawable = Some(drawable);
        self
    }

    pub fn with_max_width(mut self, max_width: i32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_fit_width(mut self, fit_width: bool) -> Self {
        self.fit_width = fit_width;
        self
    }
}

impl<F, Fut> HtmlImageLoader for TokioImageLoader<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<dyn Drawable>, ImageLoadError>> + Send + 'static,
{
    fn load_image(&self, url: &str, callback: ImageLoadCallback) {
        let fetch = Arc::clone(&self.fetch);
        let url = url.to_string();
        self.handle.spawn(async move {
            match fetch(url).await {
                Ok(image) => callback.on_load_complete(image),
                Err(err) => callback.on_load_error(err),
            }
        });
    }

    fn default_drawable(&self) -> Option<Arc<dyn Drawable>> {
        self.default_drawable.clone()
    }

    fn error_drawable(&self) -> Option<Arc<dyn Drawable>> {
        self.error_drawable.clone()
    }

    fn max_width(&self) -> i32 {
        self.max_width
    }

    fn fit_width(&self) -> bool {
        self.fit_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::image::{Bounds, PlaceholderState};
    use crate::options::DisplayMetrics;
    use crate::spanned::{Span, SpanKind, SpannedText};
    use crate::widget::{DocumentGeneration, TextWidget, UiTask, UiThreadQueue};
    use crate::HtmlText;

    #[derive(Debug)]
    struct Pixels(i32, i32);

    impl Drawable for Pixels {
        fn intrinsic_width(&self) -> i32 {
            self.0
        }
        fn intrinsic_height(&self) -> i32 {
            self.1
        }
    }

    struct QueueWidget {
        queue: UiThreadQueue,
        generation: DocumentGeneration,
        renders: Mutex<usize>,
    }

    impl TextWidget for QueueWidget {
        fn set_text(&self, _text: SpannedText) {}
        fn request_render(&self) {
            *self.renders.lock().expect("lock should succeed") += 1;
        }
        fn display_metrics(&self) -> DisplayMetrics {
            DisplayMetrics {
                density: 2.0,
                text_size_px: 32.0,
            }
        }
        fn is_ui_thread(&self) -> bool {
            self.queue.is_ui_thread()
        }
        fn post(&self, task: UiTask) {
            self.queue.post(task);
        }
        fn generation(&self) -> &DocumentGeneration {
            &self.generation
        }
    }

    #[test]
    fn completions_from_runtime_threads_are_marshaled() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .expect("runtime should build");
        let loader = TokioImageLoader::new(runtime.handle().clone(), |url: String| async move {
            if url == "ok.png" {
                Ok(Arc::new(Pixels(8, 4)) as Arc<dyn Drawable>)
            } else {
                Err(ImageLoadError::new(url, "not found"))
            }
        })
        .with_default_drawable(Arc::new(Pixels(1, 1)))
        .with_error_drawable(Arc::new(Pixels(2, 2)));
        let widget = Arc::new(QueueWidget {
            queue: UiThreadQueue::for_current_thread(),
            generation: DocumentGeneration::new(),
            renders: Mutex::new(0),
        });

        let text = HtmlText::new("<img src=ok.png width=10 height=5><img src=missing.png>")
            .with_image_loader(Arc::new(loader))
            .convert(&widget)
            .expect("convert should succeed");

        let mut ran = 0;
        for _ in 0..50 {
            ran += widget.queue.run_pending_timeout(Duration::from_millis(100));
            if ran >= 2 {
                break;
            }
        }
        assert_eq!(ran, 2);
        assert_eq!(*widget.renders.lock().expect("lock should succeed"), 2);

        let placeholders: Vec<_> = text
            .spans_of(SpanKind::Image)
            .into_iter()
            .filter_map(|entry| match &entry.span {
                Span::Image(image) => Some(image.placeholder().clone()),
                _ => None,
            })
            .collect();
        assert_eq!(placeholders[0].state(), PlaceholderState::Loaded);
        assert_eq!(placeholders[0].bounds(), Bounds::new(20, 10));
        assert_eq!(placeholders[1].state(), PlaceholderState::Failed);
        assert_eq!(placeholders[1].bounds(), Bounds::new(2, 2));
    }
}
