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

//! # Archive Packaging
//!
//! Bundles the documents of a multi-file export into one archive. Every
//! failure surfaces as [`ZiError::Packaging`]; the documents themselves are
//! never touched.

use std::fs::File;
use std::io::{self, Cursor, Seek, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::persist::write_atomic_with;
use crate::errors::{Result, ZiError};
use crate::splitter::{ZiCompletedFile, ZiDocumentData};

/// Packaged archive.
#[derive(Clone, Debug, PartialEq)]
pub struct ZiArchive {
    pub file_name: String,
    pub document: ZiDocumentData,
}

pub trait ZiArchivePackager: Send + Sync {
    /// Packages `files` under `archive_name`, in memory or inside `output_dir`.
    fn package(
        &self,
        archive_name: &str,
        files: &[ZiCompletedFile],
        output_dir: Option<&Path>,
    ) -> Result<ZiArchive>;
}

/// ZIP packager using DEFLATE.
#[derive(Clone, Copy, Debug)]
pub struct ZiZipPackager {
    compression_level: i32,
}

impl Default for ZiZipPackager {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

impl ZiZipPackager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    fn write_entries<W: Write + Seek>(&self, sink: W, files: &[ZiCompletedFile]) -> Result<W> {
        let mut zip = ZipWriter::new(sink);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.compression_level));
        for file in files {
            zip.start_file(file.file_name.as_str(), options)?;
            match &file.document {
                ZiDocumentData::Memory(bytes) => zip.write_all(bytes)?,
                ZiDocumentData::File(path) => {
                    let mut source = File::open(path)?;
                    io::copy(&mut source, &mut zip)?;
                }
            }
        }
        Ok(zip.finish()?)
    }
}

impl ZiArchivePackager for ZiZipPackager {
    fn package(
        &self,
        archive_name: &str,
        files: &[ZiCompletedFile],
        output_dir: Option<&Path>,
    ) -> Result<ZiArchive> {
        let packaged = match output_dir {
            Some(dir) => {
                let path = dir.join(archive_name);
                write_atomic_with(&path, |writer| {
                    self.write_entries(writer, files)?;
                    Ok(())
                })
                .map(|_| ZiDocumentData::File(path))
            }
            None => self
                .write_entries(Cursor::new(Vec::new()), files)
                .map(|cursor| ZiDocumentData::Memory(cursor.into_inner())),
        };
        let document = packaged.map_err(|e| match e {
            ZiError::Packaging { .. } => e,
            other => ZiError::packaging(other.to_string()),
        })?;
        log::info!("packaged {} documents into {}", files.len(), archive_name);
        Ok(ZiArchive {
            file_name: archive_name.to_string(),
            document,
        })
    }
}
