//! Structured errors for conversion setup and image loading.

use core::fmt;

/// Processing phase an error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Widget metrics or options were unusable.
    Config,
    /// Image loading collaborator.
    Image,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}

/// Error returned by conversion entry points.
///
/// Malformed markup is never reported through this type: unmatched tags and
/// unparsable attributes degrade to "no span". Only unusable configuration
/// (for example a zero display density) surfaces here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlTextError {
    /// Processing phase where this error originated.
    pub phase: ErrorPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
}

impl HtmlTextError {
    pub(crate) fn new(phase: ErrorPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
        }
    }

    pub(crate) fn config(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorPhase::Config, code, message)
    }
}

impl fmt::Display for HtmlTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)
    }
}

impl std::error::Error for HtmlTextError {}

/// Reason an image loader gave up on a source.
///
/// The core treats every failure the same way (the loader's error graphic is
/// shown); the reason only travels as far as the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLoadError {
    /// Source attribute the load was issued for.
    pub url: Box<str>,
    /// Human-readable reason.
    pub message: Box<str>,
}

impl ImageLoadError {
    /// Create a load error for `url`.
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
        }
    }
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:IMAGE_LOAD_FAILED: {} [url={}]", ErrorPhase::Image, self.message, self.url)
    }
}

impl std::error::Error for ImageLoadError {}
