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

//! # Data Export Module
//!
//! Output side of a generation run: writing finished documents to disk and
//! packaging multi-file exports.
//!
//! ## Module Components
//!
//! - **Persist** ([persist.rs](persist/index.html)): atomic temp-file-then-rename writes
//! - **Archive** ([archive.rs](archive/index.html)): ZIP packaging of completed documents
//!
//! ## Usage Patterns
//!
//! ```rust
//! use zipage::export::{ZiArchivePackager, ZiZipPackager};
//!
//! let archive = ZiZipPackager::new().package("export.zip", &result.files, None)?;
//! ```

pub mod archive;
pub mod persist;

pub use archive::{ZiArchive, ZiArchivePackager, ZiZipPackager};
pub use persist::{write_atomic, write_atomic_with};
