//! Conversion options and display metrics.

use crate::error::HtmlTextError;

/// Smallest `<font size>` step.
pub const FONT_SIZE_MIN: i32 = 1;
/// Largest `<font size>` step.
pub const FONT_SIZE_MAX: i32 = 7;
/// `<font size>` step that maps to the widget's own text size.
pub const FONT_SIZE_NORMAL: i32 = 3;

/// Geometry used for list indentation and bullet/number glyph spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListMetrics {
    /// Indentation added per list nesting level, in pixels.
    pub indent_unit: i32,
    /// Gap between a top-level bullet and its item text, in pixels.
    pub bullet_gap: i32,
    /// Bullet glyph radius, in pixels.
    pub bullet_radius: i32,
}

impl ListMetrics {
    /// Leading margin a bullet glyph contributes on its own: the glyph
    /// diameter plus the natural gap.
    pub fn bullet_leading_margin(&self) -> i32 {
        2 * self.bullet_radius + self.bullet_gap
    }
}

impl Default for ListMetrics {
    fn default() -> Self {
        Self {
            indent_unit: 20,
            bullet_gap: 10,
            bullet_radius: 3,
        }
    }
}

/// Conversion options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HtmlTextOptions {
    /// List indentation geometry.
    pub lists: ListMetrics,
}

/// Display metrics reported by the host widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    /// Device pixels per density-independent pixel.
    pub density: f32,
    /// The widget's own text size, in device pixels.
    pub text_size_px: f32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            density: 1.0,
            text_size_px: 16.0,
        }
    }
}

impl DisplayMetrics {
    /// Reject metrics that would make every size computation meaningless.
    pub fn validate(&self) -> Result<(), HtmlTextError> {
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(HtmlTextError::config(
                "DISPLAY_DENSITY_INVALID",
                format!("display density must be positive, got {}", self.density),
            ));
        }
        if !self.text_size_px.is_finite() || self.text_size_px < 0.0 {
            return Err(HtmlTextError::config(
                "DISPLAY_TEXT_SIZE_INVALID",
                format!("text size must be non-negative, got {}", self.text_size_px),
            ));
        }
        Ok(())
    }

    /// Convert density-independent pixels to device pixels, rounding half up.
    pub fn dp_to_px(&self, dp: f32) -> i32 {
        (dp * self.density + 0.5) as i32
    }

    /// Convert device pixels to density-independent pixels, rounding half up.
    pub fn px_to_dp(&self, px: f32) -> i32 {
        (px / self.density + 0.5) as i32
    }

    /// The widget's text size in density-independent pixels.
    pub fn base_text_size_dp(&self) -> i32 {
        self.px_to_dp(self.text_size_px)
    }
}
