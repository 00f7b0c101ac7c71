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

//! # PDF Surface
//!
//! printpdf backend. printpdf documents are reference counted and cannot cross
//! threads, so drawing operations are buffered per page and the PDF is built
//! in one pass on [`ZiDrawingSurface::export`]. Text is set in the built-in
//! Helvetica faces; no font files are embedded.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};

use super::recording::{ZiDrawOp, ZiRecordedDocument, ZiRecordingSurface};
use super::{
    estimated_text_width, ZiDocumentSpec, ZiDrawingSurface, ZiFontStyle, ZiSurfaceFactory,
    ZiTextAlign,
};
use crate::config::ZiColor;
use crate::errors::{Result, ZiError};

/// Buffers drawing operations and renders them with printpdf.
#[derive(Debug)]
pub struct ZiPdfSurface {
    buffer: ZiRecordingSurface,
}

impl ZiPdfSurface {
    pub fn new(spec: &ZiDocumentSpec) -> Self {
        Self {
            buffer: ZiRecordingSurface::new(spec),
        }
    }
}

impl ZiDrawingSurface for ZiPdfSurface {
    fn add_page(&mut self) -> Result<()> {
        self.buffer.add_page()
    }

    fn page_count(&self) -> usize {
        self.buffer.page_count()
    }

    fn set_page(&mut self, page: usize) -> Result<()> {
        self.buffer.set_page(page)
    }

    fn set_font(&mut self, style: ZiFontStyle, size_pt: f64) {
        self.buffer.set_font(style, size_pt);
    }

    fn set_fill_color(&mut self, color: ZiColor) {
        self.buffer.set_fill_color(color);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.buffer.fill_rect(x, y, width, height)
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        align: ZiTextAlign,
        max_width: Option<f64>,
    ) -> Result<()> {
        self.buffer.draw_text(text, x, y, align, max_width)
    }

    fn text_width(&self, text: &str) -> f64 {
        self.buffer.text_width(text)
    }

    fn export(self: Box<Self>) -> Result<Vec<u8>> {
        render_pdf(&self.buffer.into_document())
    }
}

/// Creates printpdf-backed surfaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZiPdfSurfaceFactory;

impl ZiPdfSurfaceFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ZiSurfaceFactory for ZiPdfSurfaceFactory {
    fn create(&self, spec: &ZiDocumentSpec) -> Result<Box<dyn ZiDrawingSurface>> {
        Ok(Box::new(ZiPdfSurface::new(spec)))
    }
}

struct ZiPdfFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl ZiPdfFonts {
    fn get(&self, style: ZiFontStyle) -> &IndirectFontRef {
        match style {
            ZiFontStyle::Regular => &self.regular,
            ZiFontStyle::Bold => &self.bold,
        }
    }
}

fn render_pdf(document: &ZiRecordedDocument) -> Result<Vec<u8>> {
    let spec = &document.spec;
    let width = Mm(spec.page_width as f32);
    let height = Mm(spec.page_height as f32);

    let (doc, first_page, first_layer) = PdfDocument::new(spec.title.as_str(), width, height, "Layer 1");
    let doc = doc.with_author(spec.author.as_str());
    let fonts = ZiPdfFonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ZiError::render(format!("font error: {}", e)))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ZiError::render(format!("font error: {}", e)))?,
    };

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(width, height, format!("Page {}", index + 1));
            doc.get_page(page_index).get_layer(layer_index)
        };
        for op in &page.ops {
            draw_op(&layer, &fonts, spec.page_height, op);
        }
    }

    save(doc)
}

fn draw_op(layer: &PdfLayerReference, fonts: &ZiPdfFonts, page_height: f64, op: &ZiDrawOp) {
    match op {
        ZiDrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        } => {
            layer.set_fill_color(rgb(*color));
            let rect = Rect::new(
                Mm(*x as f32),
                Mm((page_height - y - height) as f32),
                Mm((x + width) as f32),
                Mm((page_height - y) as f32),
            )
            .with_mode(PaintMode::Fill);
            layer.add_rect(rect);
        }
        ZiDrawOp::Text {
            text,
            x,
            y,
            size,
            style,
            align,
        } => {
            if text.is_empty() {
                return;
            }
            let left = match align {
                ZiTextAlign::Left => *x,
                ZiTextAlign::Center => x - estimated_text_width(text, *size) / 2.0,
            };
            layer.set_fill_color(rgb(ZiColor::BLACK));
            layer.use_text(
                text.as_str(),
                *size as f32,
                Mm(left as f32),
                Mm((page_height - y) as f32),
                fonts.get(*style),
            );
        }
    }
}

fn rgb(color: ZiColor) -> Color {
    let ZiColor(r, g, b) = color;
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn save(doc: PdfDocumentReference) -> Result<Vec<u8>> {
    doc.save_to_bytes()
        .map_err(|e| ZiError::render(format!("pdf serialization failed: {}", e)))
}
