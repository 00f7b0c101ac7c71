//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use zipage::config::{ZiColor, ZiExportConfig, ZiMargins, ZiPageSize};
use zipage::engine::ZiOutcome;
use zipage::errors::{Result, ZiError};
use zipage::events::{ZiEvent, ZiEventSink};
use zipage::exporter::{ZiGenerationUpdate, ZiStreamExporter, EVENT_BUFFER};
use zipage::ingest::{ZiChunk, ZiRowSource, ZiVecRowSource};
use zipage::record::{ZiColumnSet, ZiRow, ZiRowBatch};
use zipage::render::{
    ZiDocumentSpec, ZiDrawingSurface, ZiFontStyle, ZiRecordedDocument, ZiRecordingSurfaceFactory,
    ZiSurfaceFactory, ZiTextAlign,
};

fn columns() -> ZiColumnSet {
    ZiColumnSet::new(["id", "name"]).unwrap()
}

fn rows(n: usize) -> Vec<ZiRow> {
    (0..n)
        .map(|i| ZiRow::from_texts([i.to_string(), format!("row {}", i)]))
        .collect()
}

/// Header plus two data rows per page, no footer.
fn short_page_config() -> ZiExportConfig {
    ZiExportConfig::default()
        .with_page_size(ZiPageSize::Custom {
            width_mm: 210.0,
            height_mm: 45.0,
        })
        .with_margins(ZiMargins {
            top: 10.0,
            right: 15.0,
            bottom: 10.0,
            left: 15.0,
        })
        .with_footer(false, false)
}

async fn export_rows(
    config: ZiExportConfig,
    data: Vec<ZiRow>,
    chunk_size: usize,
    factory: &ZiRecordingSurfaceFactory,
) -> ZiOutcome {
    let total = data.len();
    let mut source = ZiVecRowSource::new(data, chunk_size).unwrap();
    ZiStreamExporter::new(config)
        .run(
            columns(),
            total,
            &mut source,
            Arc::new(factory.clone()),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap()
}

fn recorded(outcome: ZiOutcome) -> Vec<ZiRecordedDocument> {
    outcome
        .completed()
        .unwrap()
        .files
        .iter()
        .map(|f| ZiRecordedDocument::from_bytes(&f.bytes().unwrap()).unwrap())
        .collect()
}

/// Serves `chunks` chunks of `chunk_size` rows and cancels `token` when
/// chunk `cancel_at` is requested, remembering the write count at that point.
struct CancellingSource {
    chunk_size: usize,
    chunks: usize,
    cancel_at: usize,
    token: CancellationToken,
    factory: ZiRecordingSurfaceFactory,
    writes_at_cancel: Arc<AtomicUsize>,
}

#[async_trait]
impl ZiRowSource for CancellingSource {
    async fn next_chunk(&mut self, chunk_index: usize) -> Result<ZiChunk> {
        if chunk_index == self.cancel_at {
            self.writes_at_cancel
                .store(self.factory.write_count(), Ordering::SeqCst);
            self.token.cancel();
        }
        if chunk_index >= self.chunks {
            return Ok(ZiChunk::EndOfData);
        }
        let start = chunk_index * self.chunk_size;
        let batch = (start..start + self.chunk_size)
            .map(|i| ZiRow::from_texts([i.to_string(), "x".to_string()]))
            .collect();
        Ok(ZiChunk::Rows(ZiRowBatch::new(batch)))
    }
}

/// Fails chunk `broken` with a decode error, otherwise like a vec source.
struct FlakySource {
    inner: ZiVecRowSource,
    broken: usize,
    chunk_size: usize,
}

#[async_trait]
impl ZiRowSource for FlakySource {
    async fn next_chunk(&mut self, chunk_index: usize) -> Result<ZiChunk> {
        if chunk_index == self.broken {
            return Err(ZiError::row_decode(chunk_index, self.chunk_size, "bad bytes"));
        }
        self.inner.next_chunk(chunk_index).await
    }
}

struct BrokenSource;

#[async_trait]
impl ZiRowSource for BrokenSource {
    async fn next_chunk(&mut self, _chunk_index: usize) -> Result<ZiChunk> {
        Err(ZiError::input("disk went away"))
    }
}

/// Recording surfaces that cancel `token` right after drawing `trigger`,
/// remembering the write count at that point.
#[derive(Clone)]
struct CancelOnTextFactory {
    inner: ZiRecordingSurfaceFactory,
    trigger: String,
    token: CancellationToken,
    writes_at_cancel: Arc<AtomicUsize>,
}

impl ZiSurfaceFactory for CancelOnTextFactory {
    fn create(&self, spec: &ZiDocumentSpec) -> Result<Box<dyn ZiDrawingSurface>> {
        Ok(Box::new(CancelOnTextSurface {
            inner: self.inner.create(spec)?,
            factory: self.clone(),
        }))
    }
}

struct CancelOnTextSurface {
    inner: Box<dyn ZiDrawingSurface>,
    factory: CancelOnTextFactory,
}

impl ZiDrawingSurface for CancelOnTextSurface {
    fn add_page(&mut self) -> Result<()> {
        self.inner.add_page()
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn set_page(&mut self, page: usize) -> Result<()> {
        self.inner.set_page(page)
    }

    fn set_font(&mut self, style: ZiFontStyle, size_pt: f64) {
        self.inner.set_font(style, size_pt)
    }

    fn set_fill_color(&mut self, color: ZiColor) {
        self.inner.set_fill_color(color)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.inner.fill_rect(x, y, width, height)
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        align: ZiTextAlign,
        max_width: Option<f64>,
    ) -> Result<()> {
        self.inner.draw_text(text, x, y, align, max_width)?;
        if text == self.factory.trigger && !self.factory.token.is_cancelled() {
            self.factory
                .writes_at_cancel
                .store(self.factory.inner.write_count(), Ordering::SeqCst);
            self.factory.token.cancel();
        }
        Ok(())
    }

    fn text_width(&self, text: &str) -> f64 {
        self.inner.text_width(text)
    }

    fn export(self: Box<Self>) -> Result<Vec<u8>> {
        self.inner.export()
    }
}

#[tokio::test]
async fn test_chunk_size_does_not_change_output() {
    let config = short_page_config().with_title("Orders");
    let mut outputs = Vec::new();
    for chunk_size in [1, 7, 1000] {
        let factory = ZiRecordingSurfaceFactory::new();
        let outcome = export_rows(config.clone(), rows(57), chunk_size, &factory).await;
        outputs.push(recorded(outcome));
    }

    assert_eq!(outputs[0].len(), 1);
    // 57 rows at two per page
    assert_eq!(outputs[0][0].page_count(), 29);
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
}

#[tokio::test]
async fn test_alternate_shading_follows_global_row_parity() {
    let factory = ZiRecordingSurfaceFactory::new();
    let outcome = export_rows(short_page_config(), rows(4), 3, &factory).await;
    let docs = recorded(outcome);

    // header band plus the shaded second row on each page
    assert_eq!(docs[0].page(1).unwrap().fill_rects(), 2);
    assert_eq!(docs[0].page(2).unwrap().fill_rects(), 2);
}

#[tokio::test]
async fn test_header_repeat_toggle() {
    let people = || {
        vec![
            ZiRow::from_texts(["1", "Alice"]),
            ZiRow::from_texts(["2", "Bob"]),
            ZiRow::from_texts(["3", "Carol"]),
        ]
    };
    let factory = ZiRecordingSurfaceFactory::new();

    let repeated = recorded(export_rows(short_page_config(), people(), 10, &factory).await);
    assert_eq!(repeated[0].page_count(), 2);
    assert_eq!(
        repeated[0].page(1).unwrap().texts(),
        vec!["id", "name", "1", "Alice", "2", "Bob"]
    );
    assert_eq!(repeated[0].page(2).unwrap().texts(), vec!["id", "name", "3", "Carol"]);

    let once = short_page_config().with_header_row(true, false);
    let single = recorded(export_rows(once, people(), 10, &factory).await);
    assert_eq!(single[0].page_count(), 2);
    assert_eq!(single[0].page(2).unwrap().texts(), vec!["3", "Carol"]);
}

#[tokio::test]
async fn test_unrepeated_header_frees_a_row() {
    let factory = ZiRecordingSurfaceFactory::new();
    let once = short_page_config().with_header_row(true, false);
    let docs = recorded(export_rows(once, rows(5), 10, &factory).await);

    // three rows fit on a page without the header band
    assert_eq!(docs[0].page_count(), 2);
    assert_eq!(
        docs[0].page(2).unwrap().texts(),
        vec!["2", "row 2", "3", "row 3", "4", "row 4"]
    );
}

#[tokio::test]
async fn test_cancel_stops_all_drawing() {
    let factory = ZiRecordingSurfaceFactory::new();
    let token = CancellationToken::new();
    let writes_at_cancel = Arc::new(AtomicUsize::new(0));
    let mut source = CancellingSource {
        chunk_size: 10,
        chunks: 10,
        cancel_at: 2,
        token: token.clone(),
        factory: factory.clone(),
        writes_at_cancel: Arc::clone(&writes_at_cancel),
    };

    let outcome = ZiStreamExporter::new(ZiExportConfig::default())
        .run(
            columns(),
            100,
            &mut source,
            Arc::new(factory.clone()),
            token,
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.rows_processed(), 20);
    assert_eq!(factory.write_count(), writes_at_cancel.load(Ordering::SeqCst));
    match outcome {
        ZiOutcome::Cancelled {
            completed_files, ..
        } => assert!(completed_files.is_empty()),
        ZiOutcome::Completed(_) => panic!("expected cancellation"),
    }
}

#[tokio::test]
async fn test_cancel_inside_a_chunk_stops_at_the_next_row() {
    let recording = ZiRecordingSurfaceFactory::new();
    let token = CancellationToken::new();
    let writes_at_cancel = Arc::new(AtomicUsize::new(0));
    let factory = CancelOnTextFactory {
        inner: recording.clone(),
        trigger: "30".to_string(),
        token: token.clone(),
        writes_at_cancel: Arc::clone(&writes_at_cancel),
    };
    // one chunk holds every row
    let mut source = ZiVecRowSource::new(rows(100), 100).unwrap();

    let outcome = ZiStreamExporter::new(ZiExportConfig::default())
        .run(
            columns(),
            100,
            &mut source,
            Arc::new(factory),
            token,
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    // row 30 finishes its second cell, row 31 never starts
    assert_eq!(outcome.rows_processed(), 31);
    assert_eq!(
        recording.write_count(),
        writes_at_cancel.load(Ordering::SeqCst) + 1
    );
}

#[tokio::test]
async fn test_cancel_keeps_finished_split_files() {
    let factory = ZiRecordingSurfaceFactory::new();
    let token = CancellationToken::new();
    let mut source = CancellingSource {
        chunk_size: 10,
        chunks: 10,
        cancel_at: 3,
        token: token.clone(),
        factory: factory.clone(),
        writes_at_cancel: Arc::new(AtomicUsize::new(0)),
    };

    let outcome = ZiStreamExporter::new(ZiExportConfig::default().with_rows_per_file(Some(10)))
        .run(
            columns(),
            100,
            &mut source,
            Arc::new(factory.clone()),
            token,
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();

    match outcome {
        ZiOutcome::Cancelled {
            rows_processed,
            completed_files,
            ..
        } => {
            assert_eq!(rows_processed, 30);
            // file 3 was still open when the cancel landed
            assert_eq!(completed_files.len(), 2);
        }
        ZiOutcome::Completed(_) => panic!("expected cancellation"),
    }
}

#[tokio::test]
async fn test_decode_error_skips_one_chunk() {
    let factory = ZiRecordingSurfaceFactory::new();
    let mut source = FlakySource {
        inner: ZiVecRowSource::new(rows(100), 10).unwrap(),
        broken: 4,
        chunk_size: 10,
    };

    let outcome = ZiStreamExporter::new(ZiExportConfig::default())
        .run(
            columns(),
            100,
            &mut source,
            Arc::new(factory.clone()),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();

    let result = outcome.completed().unwrap();
    assert_eq!(result.rows_processed, 90);
    assert_eq!(result.skipped_rows, 10);
    assert_eq!(result.files[0].row_count, 90);
}

#[tokio::test]
async fn test_other_source_errors_end_the_run() {
    let factory = ZiRecordingSurfaceFactory::new();
    let err = ZiStreamExporter::new(ZiExportConfig::default())
        .run(
            columns(),
            10,
            &mut BrokenSource,
            Arc::new(factory),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ZiError::Input { .. }));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_drawing() {
    let factory = ZiRecordingSurfaceFactory::new();
    let mut source = ZiVecRowSource::new(rows(3), 1).unwrap();
    let err = ZiStreamExporter::new(ZiExportConfig::default().with_font_size(0.0))
        .run(
            columns(),
            3,
            &mut source,
            Arc::new(factory.clone()),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ZiError::Usage { .. }));
    assert_eq!(factory.write_count(), 0);
}

#[tokio::test]
async fn test_progress_once_per_chunk() {
    let factory = ZiRecordingSurfaceFactory::new();
    let (sender, mut receiver) = mpsc::unbounded_channel::<ZiEvent>();
    let mut source = ZiVecRowSource::new(rows(95), 10).unwrap();

    ZiStreamExporter::new(ZiExportConfig::default())
        .run(
            columns(),
            95,
            &mut source,
            Arc::new(factory),
            CancellationToken::new(),
            sender,
        )
        .await
        .unwrap();

    let mut progress = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let ZiEvent::Progress(p) = event {
            progress.push(p);
        }
    }
    assert_eq!(progress.len(), 10);
    let last = progress.last().unwrap();
    assert_eq!(last.rows_processed, 95);
    assert_eq!(last.chunks_processed, 10);
    assert!((last.percent() - 100.0).abs() < 1e-9);
    assert!(progress
        .windows(2)
        .all(|w| w[0].rows_processed <= w[1].rows_processed));
}

#[tokio::test]
async fn test_unread_bounded_events_stay_capped() {
    let (sender, mut receiver) = mpsc::channel::<ZiEvent>(8);
    let mut source = ZiVecRowSource::new(rows(5_000), 10).unwrap();

    let outcome = ZiStreamExporter::new(ZiExportConfig::default().with_rows_per_file(Some(1_000)))
        .run(
            columns(),
            5_000,
            &mut source,
            Arc::new(ZiRecordingSurfaceFactory::new()),
            CancellationToken::new(),
            sender,
        )
        .await
        .unwrap();
    assert_eq!(outcome.rows_processed(), 5_000);

    let mut queued = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        queued.push(event);
    }
    assert_eq!(queued.len(), 8);
    assert!(matches!(
        queued[0],
        ZiEvent::FileStarted { file_index: 1, .. }
    ));
}

#[tokio::test]
async fn test_progress_reports_the_splitter_file_total() {
    let (sender, mut receiver) = mpsc::unbounded_channel::<ZiEvent>();
    let mut source = ZiVecRowSource::new(rows(25), 10).unwrap();

    ZiStreamExporter::new(ZiExportConfig::default().with_rows_per_file(Some(10)))
        .run(
            columns(),
            25,
            &mut source,
            Arc::new(ZiRecordingSurfaceFactory::new()),
            CancellationToken::new(),
            sender,
        )
        .await
        .unwrap();

    let mut totals = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let ZiEvent::Progress(p) = event {
            totals.push(p.total_files);
        }
    }
    assert_eq!(totals, vec![3, 3, 3]);
}

#[tokio::test]
async fn test_spawned_run_without_reading_events() {
    let total = EVENT_BUFFER * 20;
    let source = ZiVecRowSource::new(rows(total), 10).unwrap();
    let handle = ZiStreamExporter::new(ZiExportConfig::default()).spawn(
        columns(),
        total,
        Box::new(source),
        Arc::new(ZiRecordingSurfaceFactory::new()),
    );

    let outcome = handle.wait().await.unwrap();
    assert_eq!(outcome.rows_processed(), total);
}

#[tokio::test]
async fn test_spawned_run_streams_events_then_outcome() {
    let source = ZiVecRowSource::new(rows(25), 10).unwrap();
    let handle = ZiStreamExporter::new(ZiExportConfig::default()).spawn(
        columns(),
        25,
        Box::new(source),
        Arc::new(ZiRecordingSurfaceFactory::new()),
    );

    let updates: Vec<ZiGenerationUpdate> = handle.into_event_stream().collect().await;
    let (last, events) = updates.split_last().unwrap();

    assert!(matches!(
        events.first(),
        Some(ZiGenerationUpdate::Event(ZiEvent::FileStarted { file_index: 1, .. }))
    ));
    let progress = events
        .iter()
        .filter(|u| matches!(u, ZiGenerationUpdate::Event(ZiEvent::Progress(_))))
        .count();
    assert_eq!(progress, 3);
    match last {
        ZiGenerationUpdate::Finished(Ok(ZiOutcome::Completed(result))) => {
            assert_eq!(result.rows_processed, 25);
            assert_eq!(result.files.len(), 1);
        }
        other => panic!("unexpected final update: {:?}", other),
    }
}

#[tokio::test]
async fn test_handle_cancel_before_start() {
    let source = ZiVecRowSource::new(rows(25), 10).unwrap();
    let handle = ZiStreamExporter::new(ZiExportConfig::default()).spawn(
        columns(),
        25,
        Box::new(source),
        Arc::new(ZiRecordingSurfaceFactory::new()),
    );
    handle.cancel();

    let outcome = handle.wait().await.unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.rows_processed(), 0);
}
