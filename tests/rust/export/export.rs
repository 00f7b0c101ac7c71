//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

#![cfg(all(feature = "csv", feature = "pdf"))]

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use zipage::config::{ZiExportConfigBuilder, ZiOrientation, ZiPageSize};
use zipage::events::ZiEventSink;
use zipage::export::write_atomic;
use zipage::exporter::ZiStreamExporter;
use zipage::render::{ZiPdfSurfaceFactory, ZiRecordedDocument, ZiRecordingSurfaceFactory};

fn write_orders(path: &std::path::Path, rows: usize) {
    let mut file = File::create(path).unwrap();
    writeln!(file, "order_id,customer,amount,note").unwrap();
    for i in 0..rows {
        writeln!(file, "{},Customer {},{}.50,\"note, with comma\"", i, i % 17, i * 3).unwrap();
    }
}

#[tokio::test]
async fn test_csv_to_pdf_split_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orders.csv");
    write_orders(&input, 120);
    let out = dir.path().join("out");

    let config = ZiExportConfigBuilder::from_json(&json!({
        "title": "Orders",
        "rows_per_file": 50,
        "chunk_size": 16,
        "file_name_pattern": "orders-{index}.pdf",
        "archive_name": "orders.zip",
        "output_dir": out.display().to_string(),
    }))
    .unwrap();

    let outcome = ZiStreamExporter::new(config)
        .run_csv(
            &input,
            Arc::new(ZiPdfSurfaceFactory::new()),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();
    let result = outcome.completed().unwrap();

    assert_eq!(result.rows_processed, 120);
    assert_eq!(result.files.len(), 3);
    for file in &result.files {
        let bytes = file.bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(out.join(&file.file_name).exists());
    }
    assert_eq!(result.files[2].file_name, "orders-3.pdf");
    assert_eq!(result.files[2].row_count, 20);

    let archive = result.archive.unwrap();
    let zip = zip::ZipArchive::new(File::open(archive.document.path().unwrap()).unwrap()).unwrap();
    assert_eq!(zip.len(), 3);
}

#[tokio::test]
async fn test_csv_cells_reach_the_page() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orders.csv");
    write_orders(&input, 3);

    let config = ZiExportConfigBuilder::from_yaml_str(
        "page_size: letter\norientation: landscape\ninclude_footer: false\n",
    )
    .unwrap();
    assert_eq!(config.page_size, ZiPageSize::Letter);
    assert_eq!(config.orientation, ZiOrientation::Landscape);

    let outcome = ZiStreamExporter::new(config)
        .run_csv(
            &input,
            Arc::new(ZiRecordingSurfaceFactory::new()),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();
    let result = outcome.completed().unwrap();
    let doc = ZiRecordedDocument::from_bytes(&result.files[0].bytes().unwrap()).unwrap();

    assert_eq!(doc.spec.page_width, 279.4);
    let texts = doc.page(1).unwrap().texts();
    assert_eq!(&texts[..4], &["order_id", "customer", "amount", "note"]);
    assert!(texts.contains(&"Customer 2"));
    assert!(texts.contains(&"note, with comma"));
    assert!(texts.contains(&"6.5"));
}

#[tokio::test]
async fn test_single_pdf_saved_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("small.csv");
    write_orders(&input, 10);

    let outcome = ZiStreamExporter::new(Default::default())
        .run_csv(
            &input,
            Arc::new(ZiPdfSurfaceFactory::new()),
            CancellationToken::new(),
            ZiEventSink::disabled(),
        )
        .await
        .unwrap();
    let result = outcome.completed().unwrap();
    assert_eq!(result.files.len(), 1);
    assert!(result.archive.is_none());

    let target = dir.path().join("report.pdf");
    write_atomic(&target, &result.files[0].bytes().unwrap()).unwrap();
    assert!(std::fs::read(&target).unwrap().starts_with(b"%PDF"));
}
