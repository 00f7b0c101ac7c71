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

//! # Generation Events
//!
//! Progress and lifecycle notifications sent from a running export to its
//! caller. Sending never blocks the engine. On a bounded channel an event is
//! dropped when the buffer is full, so a caller that stops reading costs at
//! most the buffer. Events are also dropped once the receiver is gone.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Sender, UnboundedSender};

/// Progress snapshot, emitted at most once per chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZiProgress {
    pub rows_processed: usize,
    pub total_rows_expected: usize,
    pub skipped_rows: usize,
    pub chunks_processed: usize,
    /// 1-based page inside the current file.
    pub current_page: usize,
    /// 1-based file number.
    pub current_file: usize,
    pub total_files: usize,
}

impl ZiProgress {
    /// Completion percentage, clamped to `0..=100`.
    pub fn percent(&self) -> f64 {
        if self.total_rows_expected == 0 {
            return if self.rows_processed > 0 { 100.0 } else { 0.0 };
        }
        (self.rows_processed as f64 / self.total_rows_expected as f64 * 100.0).min(100.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ZiEvent {
    Progress(ZiProgress),
    FileStarted {
        file_index: usize,
        file_name: String,
    },
    FileCompleted {
        file_index: usize,
        file_name: String,
        row_count: usize,
        page_count: usize,
    },
    PageAdded {
        file_index: usize,
        page: usize,
    },
}

#[derive(Clone, Debug)]
enum ZiEventSender {
    Bounded(Sender<ZiEvent>),
    Unbounded(UnboundedSender<ZiEvent>),
}

/// Optional sending half of the event channel.
#[derive(Clone, Debug, Default)]
pub struct ZiEventSink {
    sender: Option<ZiEventSender>,
}

impl ZiEventSink {
    /// Sink over an unbounded channel. The caller must keep draining it.
    pub fn new(sender: UnboundedSender<ZiEvent>) -> Self {
        Self {
            sender: Some(ZiEventSender::Unbounded(sender)),
        }
    }

    /// Sink over a bounded channel. Events that find the buffer full are
    /// dropped.
    pub fn bounded(sender: Sender<ZiEvent>) -> Self {
        Self {
            sender: Some(ZiEventSender::Bounded(sender)),
        }
    }

    /// A sink that discards every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ZiEvent) {
        match &self.sender {
            Some(ZiEventSender::Bounded(sender)) => {
                if let Err(TrySendError::Full(event)) = sender.try_send(event) {
                    log::trace!("event buffer full, dropped {:?}", event);
                }
            }
            Some(ZiEventSender::Unbounded(sender)) => {
                let _ = sender.send(event);
            }
            None => {}
        }
    }
}

impl From<Sender<ZiEvent>> for ZiEventSink {
    fn from(sender: Sender<ZiEvent>) -> Self {
        Self::bounded(sender)
    }
}

impl From<UnboundedSender<ZiEvent>> for ZiEventSink {
    fn from(sender: UnboundedSender<ZiEvent>) -> Self {
        Self::new(sender)
    }
}

impl From<Option<UnboundedSender<ZiEvent>>> for ZiEventSink {
    fn from(sender: Option<UnboundedSender<ZiEvent>>) -> Self {
        Self {
            sender: sender.map(ZiEventSender::Unbounded),
        }
    }
}
