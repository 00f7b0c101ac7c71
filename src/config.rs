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

//! # Export Configuration
//!
//! Every knob of a generation run lives in [`ZiExportConfig`], passed by value
//! into the exporter. There is no process-wide state.
//!
//! Configuration can be built in code with the fluent `with_*` setters, or
//! loaded from partial JSON/YAML documents through [`ZiExportConfigBuilder`];
//! fields missing from the document keep their defaults.
//!
//! ```rust
//! use zipage::config::{ZiExportConfig, ZiOrientation, ZiPageSize};
//!
//! let config = ZiExportConfig::default()
//!     .with_page_size(ZiPageSize::Letter)
//!     .with_orientation(ZiOrientation::Landscape)
//!     .with_rows_per_file(Some(50_000));
//! config.validate().unwrap();
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ZiError};

/// Placeholder substituted with the 1-based file number in file names.
pub const FILE_INDEX_PLACEHOLDER: &str = "{index}";

/// Named paper sizes, in millimetres (portrait).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZiPageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    /// Arbitrary portrait size.
    Custom { width_mm: f64, height_mm: f64 },
}

impl ZiPageSize {
    /// Portrait `(width, height)` in millimetres.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match *self {
            ZiPageSize::A3 => (297.0, 420.0),
            ZiPageSize::A4 => (210.0, 297.0),
            ZiPageSize::A5 => (148.0, 210.0),
            ZiPageSize::Letter => (215.9, 279.4),
            ZiPageSize::Legal => (215.9, 355.6),
            ZiPageSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZiOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for ZiMargins {
    fn default() -> Self {
        // Bottom margin leaves room for the footer.
        Self {
            top: 15.0,
            right: 15.0,
            bottom: 25.0,
            left: 15.0,
        }
    }
}

impl ZiMargins {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// RGB fill colour, 0..=255 per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZiColor(pub u8, pub u8, pub u8);

impl ZiColor {
    pub const WHITE: ZiColor = ZiColor(255, 255, 255);
    pub const BLACK: ZiColor = ZiColor(0, 0, 0);
}

/// Configuration for a streaming export run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiExportConfig {
    pub page_size: ZiPageSize,
    pub orientation: ZiOrientation,
    pub margins: ZiMargins,
    /// Draw the column header band at the top of the table.
    pub include_header_row: bool,
    /// Re-emit the header band on every new page.
    pub repeat_header_row: bool,
    pub include_footer: bool,
    pub include_page_numbers: bool,
    pub title: String,
    pub author: String,
    /// Body font size in points.
    pub font_size: f64,
    /// Cell padding in millimetres.
    pub cell_padding: f64,
    pub header_fill_color: ZiColor,
    pub alternate_row_fill_color: ZiColor,
    /// Row quota per output document; `None` writes a single document.
    pub rows_per_file: Option<usize>,
    pub file_name_pattern: String,
    /// Package multi-file exports into one ZIP archive.
    pub create_archive: bool,
    pub archive_name: String,
    /// Rows requested from the source per chunk.
    pub chunk_size: usize,
    /// Persist finished documents here instead of keeping them in memory.
    pub output_dir: Option<PathBuf>,
}

impl Default for ZiExportConfig {
    fn default() -> Self {
        Self {
            page_size: ZiPageSize::A4,
            orientation: ZiOrientation::Portrait,
            margins: ZiMargins::default(),
            include_header_row: true,
            repeat_header_row: true,
            include_footer: true,
            include_page_numbers: true,
            title: String::new(),
            author: String::new(),
            font_size: 10.0,
            cell_padding: 2.0,
            header_fill_color: ZiColor(240, 240, 240),
            alternate_row_fill_color: ZiColor(249, 249, 249),
            rows_per_file: None,
            file_name_pattern: "export-{index}.pdf".to_string(),
            create_archive: true,
            archive_name: "export.zip".to_string(),
            chunk_size: 1000,
            output_dir: None,
        }
    }
}

impl ZiExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oriented page `(width, height)` in millimetres.
    pub fn page_dimensions_mm(&self) -> (f64, f64) {
        let (width, height) = self.page_size.dimensions_mm();
        match self.orientation {
            ZiOrientation::Portrait => (width, height),
            ZiOrientation::Landscape => (height, width),
        }
    }

    /// File name for a 1-based file number.
    pub fn file_name(&self, file_number: usize) -> String {
        self.file_name_pattern
            .replace(FILE_INDEX_PLACEHOLDER, &file_number.to_string())
    }

    /// Rejects configurations that cannot produce a readable document.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.page_dimensions_mm();
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ZiError::usage(format!(
                "page dimensions must be positive, got {}x{} mm",
                width, height
            )));
        }
        let m = &self.margins;
        if [m.top, m.right, m.bottom, m.left]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ZiError::usage("margins must be finite and non-negative"));
        }
        if m.left + m.right >= width {
            return Err(ZiError::usage("horizontal margins leave no room for the table"));
        }
        if m.top + m.bottom >= height {
            return Err(ZiError::usage("vertical margins leave no room for the table"));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ZiError::usage("font size must be positive"));
        }
        if !(self.cell_padding.is_finite() && self.cell_padding >= 0.0) {
            return Err(ZiError::usage("cell padding must be non-negative"));
        }
        let bands = 1 + usize::from(self.include_header_row);
        let needed = crate::layout::row_height(self.font_size, self.cell_padding) * bands as f64;
        if m.top + needed > height - m.bottom {
            return Err(ZiError::usage(format!(
                "a page needs {:.1} mm for the header and one row but only {:.1} mm fit between the margins",
                needed,
                height - m.top - m.bottom
            )));
        }
        if self.create_archive && self.archive_name.trim().is_empty() {
            return Err(ZiError::usage("archive name must not be empty"));
        }
        if self.chunk_size == 0 {
            return Err(ZiError::usage("chunk size must be at least 1"));
        }
        if self.rows_per_file == Some(0) {
            return Err(ZiError::usage("rows per file must be at least 1"));
        }
        if self.rows_per_file.is_some() && !self.file_name_pattern.contains(FILE_INDEX_PLACEHOLDER) {
            return Err(ZiError::usage(format!(
                "file name pattern '{}' must contain {} when splitting into multiple files",
                self.file_name_pattern, FILE_INDEX_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn with_page_size(mut self, page_size: ZiPageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_orientation(mut self, orientation: ZiOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_margins(mut self, margins: ZiMargins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_header_row(mut self, include: bool, repeat: bool) -> Self {
        self.include_header_row = include;
        self.repeat_header_row = repeat;
        self
    }

    pub fn with_footer(mut self, include_footer: bool, include_page_numbers: bool) -> Self {
        self.include_footer = include_footer;
        self.include_page_numbers = include_page_numbers;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_cell_padding(mut self, cell_padding: f64) -> Self {
        self.cell_padding = cell_padding;
        self
    }

    pub fn with_rows_per_file(mut self, rows_per_file: Option<usize>) -> Self {
        self.rows_per_file = rows_per_file;
        self
    }

    pub fn with_file_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_name_pattern = pattern.into();
        self
    }

    pub fn with_archive(mut self, create_archive: bool) -> Self {
        self.create_archive = create_archive;
        self
    }

    pub fn with_archive_name(mut self, archive_name: impl Into<String>) -> Self {
        self.archive_name = archive_name.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }
}

/// Partial configuration, every field optional. Missing fields fall back to
/// [`ZiExportConfig::default`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZiExportConfigBuilder {
    pub page_size: Option<ZiPageSize>,
    pub orientation: Option<ZiOrientation>,
    pub margins: Option<ZiMargins>,
    pub include_header_row: Option<bool>,
    pub repeat_header_row: Option<bool>,
    pub include_footer: Option<bool>,
    pub include_page_numbers: Option<bool>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub font_size: Option<f64>,
    pub cell_padding: Option<f64>,
    pub header_fill_color: Option<ZiColor>,
    pub alternate_row_fill_color: Option<ZiColor>,
    pub rows_per_file: Option<usize>,
    pub file_name_pattern: Option<String>,
    pub create_archive: Option<bool>,
    pub archive_name: Option<String>,
    pub chunk_size: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl ZiExportConfigBuilder {
    pub fn build(self) -> ZiExportConfig {
        let base = ZiExportConfig::default();
        ZiExportConfig {
            page_size: self.page_size.unwrap_or(base.page_size),
            orientation: self.orientation.unwrap_or(base.orientation),
            margins: self.margins.unwrap_or(base.margins),
            include_header_row: self.include_header_row.unwrap_or(base.include_header_row),
            repeat_header_row: self.repeat_header_row.unwrap_or(base.repeat_header_row),
            include_footer: self.include_footer.unwrap_or(base.include_footer),
            include_page_numbers: self
                .include_page_numbers
                .unwrap_or(base.include_page_numbers),
            title: self.title.unwrap_or(base.title),
            author: self.author.unwrap_or(base.author),
            font_size: self.font_size.unwrap_or(base.font_size),
            cell_padding: self.cell_padding.unwrap_or(base.cell_padding),
            header_fill_color: self.header_fill_color.unwrap_or(base.header_fill_color),
            alternate_row_fill_color: self
                .alternate_row_fill_color
                .unwrap_or(base.alternate_row_fill_color),
            rows_per_file: self.rows_per_file.or(base.rows_per_file),
            file_name_pattern: self.file_name_pattern.unwrap_or(base.file_name_pattern),
            create_archive: self.create_archive.unwrap_or(base.create_archive),
            archive_name: self.archive_name.unwrap_or(base.archive_name),
            chunk_size: self.chunk_size.unwrap_or(base.chunk_size),
            output_dir: self.output_dir.or(base.output_dir),
        }
    }

    /// Loads and validates a configuration from a JSON value.
    pub fn from_json(value: &Value) -> Result<ZiExportConfig> {
        let builder: ZiExportConfigBuilder = serde_json::from_value(value.clone())?;
        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<ZiExportConfig> {
        let builder: ZiExportConfigBuilder = serde_yaml::from_str(text)?;
        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}
