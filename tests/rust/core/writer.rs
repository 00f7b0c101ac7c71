//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

use zipage::config::{ZiExportConfig, ZiMargins, ZiPageSize};
use zipage::errors::ZiError;
use zipage::layout::needs_page_break;
use zipage::record::{ZiColumnSet, ZiRow};
use zipage::render::{ZiDocumentSpec, ZiDrawOp, ZiRecordedDocument, ZiRecordingSurfaceFactory};
use zipage::writer::{ZiDocumentWriter, ZiWriterOptions, ZiWriterState};

/// Fits the header plus two data rows per page.
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
}

fn start(factory: &ZiRecordingSurfaceFactory, config: &ZiExportConfig, title: &str) -> ZiDocumentWriter {
    let (page_width, page_height) = config.page_dimensions_mm();
    let spec = ZiDocumentSpec {
        title: title.to_string(),
        author: config.author.clone(),
        page_width,
        page_height,
    };
    let columns = ZiColumnSet::new(["id", "name"]).unwrap();
    ZiDocumentWriter::start_document(factory, spec, columns, ZiWriterOptions::from(config)).unwrap()
}

fn place(writer: &mut ZiDocumentWriter, row: &ZiRow, alternate: bool) {
    if needs_page_break(writer.layout()) {
        writer.add_page().unwrap();
    }
    writer.write_data_row(row, alternate).unwrap();
}

#[test]
fn test_footer_numbers_every_page() {
    let factory = ZiRecordingSurfaceFactory::new();
    let config = short_page_config();
    let mut writer = start(&factory, &config, "");
    writer.write_header_row().unwrap();
    for i in 0..5 {
        place(&mut writer, &ZiRow::from_texts([i.to_string(), "x".to_string()]), false);
    }
    let finished = writer.finalize().unwrap();
    assert_eq!(finished.page_count, 3);

    let doc = ZiRecordedDocument::from_bytes(&finished.bytes).unwrap();
    for page in 1..=3 {
        let texts = doc.page(page).unwrap().texts();
        assert!(texts.contains(&format!("Page {}", page).as_str()));
    }
}

#[test]
fn test_footer_without_page_numbers_keeps_timestamp() {
    let factory = ZiRecordingSurfaceFactory::new();
    let config = short_page_config().with_footer(true, false);
    let mut writer = start(&factory, &config, "");
    place(&mut writer, &ZiRow::from_texts(["1", "a"]), false);
    let finished = writer.finalize().unwrap();

    let doc = ZiRecordedDocument::from_bytes(&finished.bytes).unwrap();
    let texts = doc.page(1).unwrap().texts();
    assert_eq!(texts.len(), 3);
    assert!(!texts.iter().any(|t| t.starts_with("Page ")));
}

#[test]
fn test_heading_stamped_on_each_page() {
    let factory = ZiRecordingSurfaceFactory::new();
    let config = short_page_config()
        .with_footer(false, false)
        .with_author("Ops");
    let mut writer = start(&factory, &config, "Orders");
    writer.write_header_row().unwrap();
    for i in 0..3 {
        place(&mut writer, &ZiRow::from_texts([i.to_string(), "x".to_string()]), false);
    }
    let finished = writer.finalize().unwrap();
    let doc = ZiRecordedDocument::from_bytes(&finished.bytes).unwrap();

    let first = doc.page(1).unwrap().texts();
    let second = doc.page(2).unwrap().texts();
    assert_eq!(&first[..2], &["Orders", "Ops"]);
    assert_eq!(&second[..4], &["Orders", "Ops", "id", "name"]);
}

#[test]
fn test_alternate_rows_are_shaded() {
    let factory = ZiRecordingSurfaceFactory::new();
    let config = ZiExportConfig::default().with_footer(false, false);
    let mut writer = start(&factory, &config, "");
    writer.write_header_row().unwrap();
    writer.write_data_row(&ZiRow::from_texts(["1", "a"]), false).unwrap();
    writer.write_data_row(&ZiRow::from_texts(["2", "b"]), true).unwrap();
    let finished = writer.finalize().unwrap();

    let doc = ZiRecordedDocument::from_bytes(&finished.bytes).unwrap();
    let fills: Vec<_> = doc
        .page(1)
        .unwrap()
        .ops
        .iter()
        .filter_map(|op| match op {
            ZiDrawOp::FillRect { color, .. } => Some(*color),
            ZiDrawOp::Text { .. } => None,
        })
        .collect();
    assert_eq!(fills, vec![config.header_fill_color, config.alternate_row_fill_color]);
}

#[test]
fn test_long_cells_are_clipped_and_excess_dropped() {
    let factory = ZiRecordingSurfaceFactory::new();
    let config = ZiExportConfig::default().with_footer(false, false);
    let mut writer = start(&factory, &config, "");
    let long = "w".repeat(500);
    writer
        .write_data_row(&ZiRow::from_texts([long.as_str(), "b", "dropped"]), false)
        .unwrap();
    let finished = writer.finalize().unwrap();

    let doc = ZiRecordedDocument::from_bytes(&finished.bytes).unwrap();
    let texts = doc.page(1).unwrap().texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].len() < long.len());
    assert_eq!(texts[1], "b");
}

#[test]
fn test_finalized_writer_rejects_writes() {
    let factory = ZiRecordingSurfaceFactory::new();
    let config = ZiExportConfig::default();
    let mut writer = start(&factory, &config, "");
    writer.finalize().unwrap();
    assert_eq!(writer.state(), ZiWriterState::Finalized);

    let err = writer.write_header_row().unwrap_err();
    assert!(matches!(err, ZiError::Usage { .. }));
}

#[test]
fn test_zero_columns_rejected() {
    assert!(matches!(
        ZiColumnSet::new(Vec::<&str>::new()),
        Err(ZiError::Usage { .. })
    ));
}
