//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zi.
//! The Zi project belongs to the Dunimd project team.

use proptest::prelude::*;
use zipage::config::{ZiExportConfig, ZiMargins, ZiOrientation, ZiPageSize};
use zipage::layout::{column_widths, needs_page_break, row_height, rows_per_page, ZiLayoutState};

#[test]
fn test_row_height_matches_point_conversion() {
    let height = row_height(10.0, 2.0);
    assert!((height - (10.0 / 72.0 * 25.4 + 4.0)).abs() < 1e-9);
}

#[test]
fn test_break_only_when_next_row_overflows() {
    let margins = ZiMargins {
        top: 10.0,
        right: 10.0,
        bottom: 20.0,
        left: 10.0,
    };
    let mut state = ZiLayoutState::new(100.0, margins, 5.0);

    state.current_offset = 75.0;
    assert!(!needs_page_break(&state));

    state.current_offset = 75.0001;
    assert!(needs_page_break(&state));
}

#[test]
fn test_a4_default_rows_per_page() {
    let config = ZiExportConfig::default();
    let (_, page_height) = config.page_dimensions_mm();
    let height = row_height(config.font_size, config.cell_padding);
    let state = ZiLayoutState::new(page_height, config.margins, height);

    // header row plus data rows fill 257 mm of printable height
    let data_rows = rows_per_page(&state, config.margins.top + height);
    assert_eq!(data_rows, 33);
}

#[test]
fn test_landscape_widens_columns() {
    let portrait = ZiExportConfig::default();
    let landscape = ZiExportConfig::default()
        .with_page_size(ZiPageSize::A4)
        .with_orientation(ZiOrientation::Landscape);

    let (pw, _) = portrait.page_dimensions_mm();
    let (lw, _) = landscape.page_dimensions_mm();
    let narrow = column_widths(pw, &portrait.margins, 3);
    let wide = column_widths(lw, &landscape.margins, 3);

    assert_eq!(narrow.len(), 3);
    assert!((narrow[0] - 60.0).abs() < 1e-9);
    assert!((wide[0] - 89.0).abs() < 1e-9);
}

#[test]
fn test_zero_columns_have_no_widths() {
    assert!(column_widths(210.0, &ZiMargins::default(), 0).is_empty());
}

proptest! {
    #[test]
    fn test_needs_page_break_is_pure(
        offset in 0.0f64..500.0,
        height in 0.1f64..50.0,
        page in 50.0f64..600.0,
        bottom in 0.0f64..40.0,
        page_number in 1usize..1000,
    ) {
        let margins = ZiMargins { top: 10.0, right: 10.0, bottom, left: 10.0 };
        let state = ZiLayoutState {
            current_offset: offset,
            current_page: page_number,
            row_height: height,
            page_height: page,
            margins,
        };
        let before = state;
        let first = needs_page_break(&state);
        let second = needs_page_break(&state);

        prop_assert_eq!(first, second);
        prop_assert_eq!(state, before);
        prop_assert_eq!(first, offset + height > page - bottom);

        // the page number never influences the decision
        let other = ZiLayoutState { current_page: 1, ..state };
        prop_assert_eq!(needs_page_break(&other), first);
    }

    #[test]
    fn test_column_widths_cover_printable_width(
        width in 100.0f64..500.0,
        columns in 1usize..40,
    ) {
        let margins = ZiMargins::uniform(10.0);
        let widths = column_widths(width, &margins, columns);
        let total: f64 = widths.iter().sum();
        prop_assert_eq!(widths.len(), columns);
        prop_assert!((total - (width - 20.0)).abs() < 1e-6);
    }
}
