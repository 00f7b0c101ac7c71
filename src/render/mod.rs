//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Drawing Surface Module
//!
//! Drawing primitives the document writer needs, behind the
//! [`ZiDrawingSurface`] trait, plus the backends shipped with Zipage.
//!
//! ## Module Components
//!
//! - **Recording** ([recording.rs](recording/index.html)): in-memory surface
//!   that exports a JSON description of every page; used in tests and as a
//!   write counter.
//! - **PDF** ([pdf.rs](pdf/index.html)): printpdf backend (feature `pdf`).
//!
//! ## Coordinates
//!
//! Every backend receives millimetres measured from the **top-left** corner of
//! the page. Text `y` is the baseline. Backends with a bottom-left origin flip
//! the axis themselves.
//!
//! Page numbers passed to [`ZiDrawingSurface::set_page`] are 1-based.

pub mod recording;
#[cfg(feature = "pdf")]
pub mod pdf;

use serde::{Deserialize, Serialize};

use crate::config::ZiColor;
use crate::errors::Result;
use crate::layout::MM_PER_POINT;

pub use recording::{
    ZiDrawOp, ZiRecordedDocument, ZiRecordedPage, ZiRecordingSurface, ZiRecordingSurfaceFactory,
};
#[cfg(feature = "pdf")]
pub use pdf::{ZiPdfSurface, ZiPdfSurfaceFactory};

/// Average Helvetica glyph advance as a fraction of the font size.
const AVERAGE_GLYPH_EM: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZiFontStyle {
    #[default]
    Regular,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZiTextAlign {
    #[default]
    Left,
    /// `x` is the horizontal centre of the text.
    Center,
}

/// Document-level properties a surface is created with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiDocumentSpec {
    pub title: String,
    pub author: String,
    pub page_width: f64,
    pub page_height: f64,
}

/// Drawing backend owned by exactly one document writer.
///
/// A freshly created surface already holds page 1.
pub trait ZiDrawingSurface: Send {
    /// Appends a page and makes it current.
    fn add_page(&mut self) -> Result<()>;

    fn page_count(&self) -> usize;

    /// Makes an existing page current.
    fn set_page(&mut self, page: usize) -> Result<()>;

    fn set_font(&mut self, style: ZiFontStyle, size_pt: f64);

    fn set_fill_color(&mut self, color: ZiColor);

    /// Fills a rectangle with the current fill colour.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()>;

    /// Draws text at a baseline, truncated to `max_width` when given.
    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        align: ZiTextAlign,
        max_width: Option<f64>,
    ) -> Result<()>;

    /// Width of `text` in millimetres at the current font.
    fn text_width(&self, text: &str) -> f64;

    /// Serializes the document. Consumes the surface.
    fn export(self: Box<Self>) -> Result<Vec<u8>>;
}

/// Creates one surface per output document.
pub trait ZiSurfaceFactory: Send + Sync {
    fn create(&self, spec: &ZiDocumentSpec) -> Result<Box<dyn ZiDrawingSurface>>;
}

/// Estimated width in millimetres of `text` set in Helvetica at `size_pt`.
pub fn estimated_text_width(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * AVERAGE_GLYPH_EM * MM_PER_POINT
}

/// Longest prefix of `text` whose measured width fits `max_width`.
pub fn fit_text<F>(text: &str, max_width: Option<f64>, measure: F) -> String
where
    F: Fn(&str) -> f64,
{
    let Some(max_width) = max_width else {
        return text.to_string();
    };
    if measure(text) <= max_width {
        return text.to_string();
    }
    let mut fitted = String::new();
    for ch in text.chars() {
        fitted.push(ch);
        if measure(&fitted) > max_width {
            fitted.pop();
            break;
        }
    }
    fitted
}
