//! Host widget contract and rendering-thread helpers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::options::DisplayMetrics;
use crate::spanned::SpannedText;

/// Work marshaled onto the rendering thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Text widget that displays converted markup.
///
/// Every mutation of published text (placeholder bounds, content swaps,
/// re-render requests) happens on the widget's rendering thread. Image
/// completions arriving elsewhere are handed to [`TextWidget::post`].
pub trait TextWidget: Send + Sync {
    /// Replace the displayed text.
    fn set_text(&self, text: SpannedText);

    /// Re-layout and redraw the current text after a placeholder changed.
    fn request_render(&self);

    fn display_metrics(&self) -> DisplayMetrics;

    /// Whether the caller is running on the rendering thread.
    fn is_ui_thread(&self) -> bool;

    /// Queue `task` to run on the rendering thread.
    fn post(&self, task: UiTask);

    /// Document generation counter owned by this widget.
    fn generation(&self) -> &DocumentGeneration;
}

/// Run `task` now if on the rendering thread, otherwise post it there.
pub(crate) fn run_on_ui<F>(widget: &dyn TextWidget, task: F)
where
    F: FnOnce() + Send + 'static,
{
    if widget.is_ui_thread() {
        task();
    } else {
        log::trace!("marshaling image update onto rendering thread");
        widget.post(Box::new(task));
    }
}

/// Task queue bound to the thread that created it.
///
/// Widgets without a native event loop can delegate `is_ui_thread` and
/// `post` here and drain the queue from their own loop.
#[derive(Debug)]
pub struct UiThreadQueue {
    owner: ThreadId,
    tx: Sender<UiTask>,
    rx: Mutex<Receiver<UiTask>>,
}

impl UiThreadQueue {
    /// Bind a new queue to the calling thread.
    pub fn for_current_thread() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            owner: thread::current().id(),
            tx,
            rx: Mutex::new(rx),
        }
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn post(&self, task: UiTask) {
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.tx.send(task);
    }

    /// Run every queued task. Returns how many ran; off the owning thread
    /// nothing runs.
    pub fn run_pending(&self) -> usize {
        if !self.is_ui_thread() {
            log::debug!("run_pending called off the owning thread; ignoring");
            return 0;
        }
        let tasks: Vec<UiTask> = {
            let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
            rx.try_iter().collect()
        };
        let ran = tasks.len();
        for task in tasks {
            task();
        }
        ran
    }

    /// Wait up to `timeout` for the first task, then drain the rest.
    pub fn run_pending_timeout(&self, timeout: Duration) -> usize {
        if !self.is_ui_thread() {
            log::debug!("run_pending_timeout called off the owning thread; ignoring");
            return 0;
        }
        let first = {
            let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
            match rx.recv_timeout(timeout) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return 0,
            }
        };
        first();
        1 + self.run_pending()
    }
}

#[derive(Debug, Default)]
struct GenerationState {
    issued: AtomicU64,
    shown: AtomicU64,
}

/// Generation counter for the documents a widget shows.
///
/// Each conversion reserves a generation. Publishing one makes every
/// earlier generation stale; reserving alone changes nothing for the
/// document on screen.
#[derive(Clone, Debug, Default)]
pub struct DocumentGeneration {
    state: Arc<GenerationState>,
}

impl DocumentGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a new document that is not shown yet.
    pub fn reserve(&self) -> DocumentToken {
        let generation = self.state.issued.fetch_add(1, Ordering::AcqRel) + 1;
        DocumentToken {
            state: Arc::clone(&self.state),
            generation,
        }
    }

    /// Mark `token`'s document as shown, superseding every earlier one.
    pub fn publish(&self, token: &DocumentToken) {
        self.state
            .shown
            .fetch_max(token.generation, Ordering::AcqRel);
    }

    /// Reserve and publish in one step.
    pub fn advance(&self) -> DocumentToken {
        let token = self.reserve();
        self.publish(&token);
        token
    }

    /// Token for the document shown right now.
    pub fn token(&self) -> DocumentToken {
        DocumentToken {
            state: Arc::clone(&self.state),
            generation: self.state.shown.load(Ordering::Acquire),
        }
    }
}

/// Proof of membership in one document generation.
#[derive(Clone, Debug)]
pub struct DocumentToken {
    state: Arc<GenerationState>,
    generation: u64,
}

impl DocumentToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `false` once the widget has published a later document.
    pub fn is_current(&self) -> bool {
        self.state.shown.load(Ordering::Acquire) <= self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn queue_runs_tasks_posted_from_other_threads() {
        let queue = Arc::new(UiThreadQueue::for_current_thread());
        let hits = Arc::new(AtomicUsize::new(0));
        let worker = {
            let queue = Arc::clone(&queue);
            let hits = Arc::clone(&hits);
            thread::spawn(move || {
                assert!(!queue.is_ui_thread());
                assert_eq!(queue.run_pending(), 0);
                queue.post(Box::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                }));
            })
        };
        worker.join().expect("worker should finish");
        assert_eq!(queue.run_pending_timeout(Duration::from_secs(5)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn advancing_invalidates_old_tokens() {
        let generation = DocumentGeneration::new();
        let first = generation.advance();
        assert!(first.is_current());
        let second = generation.advance();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(generation.token().generation(), second.generation());
    }

    #[test]
    fn reserving_leaves_the_shown_document_current() {
        let generation = DocumentGeneration::new();
        let shown = generation.advance();
        let preview = generation.reserve();
        assert!(shown.is_current());
        assert!(preview.is_current());

        let next = generation.reserve();
        generation.publish(&next);
        assert!(!shown.is_current());
        assert!(!preview.is_current());
        assert!(next.is_current());

        generation.publish(&shown);
        assert!(next.is_current(), "publishing an older token must not roll back");
    }

    #[test]
    fn run_on_ui_runs_inline_on_rendering_thread() {
        struct Inline(DocumentGeneration);
        impl TextWidget for Inline {
            fn set_text(&self, _text: SpannedText) {}
            fn request_render(&self) {}
            fn display_metrics(&self) -> DisplayMetrics {
                DisplayMetrics::default()
            }
            fn is_ui_thread(&self) -> bool {
                true
            }
            fn post(&self, _task: UiTask) {
                panic!("inline widget must not receive posted tasks");
            }
            fn generation(&self) -> &DocumentGeneration {
                &self.0
            }
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        run_on_ui(&Inline(DocumentGeneration::new()), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
