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

//! # Recording Surface
//!
//! A drawing surface that keeps every operation as data. Its exported bytes are
//! the JSON form of [`ZiRecordedDocument`].
//!
//! The factory shares one write counter with all surfaces it creates, so a
//! caller can observe whether anything was drawn after a given point.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    estimated_text_width, fit_text, ZiDocumentSpec, ZiDrawingSurface, ZiFontStyle,
    ZiSurfaceFactory, ZiTextAlign,
};
use crate::config::ZiColor;
use crate::errors::{Result, ZiError};

/// One drawing operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ZiDrawOp {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: ZiColor,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        style: ZiFontStyle,
        align: ZiTextAlign,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZiRecordedPage {
    pub ops: Vec<ZiDrawOp>,
}

impl ZiRecordedPage {
    /// Texts drawn on this page, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                ZiDrawOp::Text { text, .. } => Some(text.as_str()),
                ZiDrawOp::FillRect { .. } => None,
            })
            .collect()
    }

    pub fn fill_rects(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, ZiDrawOp::FillRect { .. }))
            .count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiRecordedDocument {
    pub spec: ZiDocumentSpec,
    pub pages: Vec<ZiRecordedPage>,
}

impl ZiRecordedDocument {
    /// Parses bytes exported by a [`ZiRecordingSurface`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-based page access.
    pub fn page(&self, page: usize) -> Option<&ZiRecordedPage> {
        page.checked_sub(1).and_then(|index| self.pages.get(index))
    }
}

/// In-memory surface.
#[derive(Debug)]
pub struct ZiRecordingSurface {
    document: ZiRecordedDocument,
    current: usize,
    font: (ZiFontStyle, f64),
    fill: ZiColor,
    writes: Option<Arc<AtomicUsize>>,
}

impl ZiRecordingSurface {
    pub fn new(spec: &ZiDocumentSpec) -> Self {
        Self {
            document: ZiRecordedDocument {
                spec: spec.clone(),
                pages: vec![ZiRecordedPage::default()],
            },
            current: 0,
            font: (ZiFontStyle::Regular, 10.0),
            fill: ZiColor::WHITE,
            writes: None,
        }
    }

    fn with_counter(mut self, writes: Arc<AtomicUsize>) -> Self {
        self.writes = Some(writes);
        self
    }

    /// The document recorded so far.
    pub fn into_document(self) -> ZiRecordedDocument {
        self.document
    }

    fn record(&mut self, op: ZiDrawOp) {
        self.bump();
        self.document.pages[self.current].ops.push(op);
    }

    fn bump(&self) {
        if let Some(writes) = &self.writes {
            writes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl ZiDrawingSurface for ZiRecordingSurface {
    fn add_page(&mut self) -> Result<()> {
        self.bump();
        self.document.pages.push(ZiRecordedPage::default());
        self.current = self.document.pages.len() - 1;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.document.pages.len()
    }

    fn set_page(&mut self, page: usize) -> Result<()> {
        if page == 0 || page > self.document.pages.len() {
            return Err(ZiError::render(format!(
                "page {} out of range 1..={}",
                page,
                self.document.pages.len()
            )));
        }
        self.current = page - 1;
        Ok(())
    }

    fn set_font(&mut self, style: ZiFontStyle, size_pt: f64) {
        self.font = (style, size_pt);
    }

    fn set_fill_color(&mut self, color: ZiColor) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let color = self.fill;
        self.record(ZiDrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        align: ZiTextAlign,
        max_width: Option<f64>,
    ) -> Result<()> {
        let text = fit_text(text, max_width, |s| self.text_width(s));
        let (style, size) = self.font;
        self.record(ZiDrawOp::Text {
            text,
            x,
            y,
            size,
            style,
            align,
        });
        Ok(())
    }

    fn text_width(&self, text: &str) -> f64 {
        estimated_text_width(text, self.font.1)
    }

    fn export(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.document)?)
    }
}

/// Creates recording surfaces that share one write counter.
#[derive(Clone, Debug, Default)]
pub struct ZiRecordingSurfaceFactory {
    writes: Arc<AtomicUsize>,
}

impl ZiRecordingSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages added plus rectangles and texts drawn, across all surfaces.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ZiSurfaceFactory for ZiRecordingSurfaceFactory {
    fn create(&self, spec: &ZiDocumentSpec) -> Result<Box<dyn ZiDrawingSurface>> {
        Ok(Box::new(
            ZiRecordingSurface::new(spec).with_counter(Arc::clone(&self.writes)),
        ))
    }
}
