//! Property-based tests for scroll placement and window convergence.
//!
//! Properties Under Test:
//! - Every placement is a valid, bounded range around the top visible block
//! - The translate offset is the cumulative height before the range start
//! - After the settle debounce fires and its fetch lands, the mounted range
//!   covers the visible span (whenever the span fits in the load budget)
//! - A change in one block's height moves every later offset by the delta

use persistent_window::config::{ViewportTuning, WindowConfig};
use persistent_window::metrics::TextMetricsCache;
use persistent_window::model::BlockRange;
use persistent_window::store::MemoryBlockStore;
use persistent_window::window::{HeadlessContainer, HeadlessSurface};
use persistent_window::{HeightIndex, PersistentWindow, ViewportCoordinator};
use proptest::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

// ===== Arbitrary Strategies =====

/// Block heights between a one-line paragraph and a large image.
fn arb_heights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(8.0f64..600.0, 1..1500)
}

/// Tuning with budgets large enough to hold both buffers.
fn arb_tuning() -> impl Strategy<Value = ViewportTuning> {
    (1usize..150, 0usize..60, 0usize..400).prop_map(|(buffer, hysteresis, extra)| ViewportTuning {
        buffer_blocks: buffer,
        hysteresis_blocks: hysteresis,
        max_loaded_blocks: 2 * buffer + 1 + extra,
        ..ViewportTuning::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn placement_is_bounded_and_contains_first_visible(
        heights in arb_heights(),
        tuning in arb_tuning(),
        viewport in 100.0f64..2000.0,
        fraction in 0.0f64..1.2,
    ) {
        let coordinator = ViewportCoordinator::new(tuning, &heights, viewport);
        let scroll_top = coordinator.total_height() * fraction;
        let placement = coordinator.place(scroll_top);

        prop_assert!(placement.range.start_block <= placement.range.end_block);
        prop_assert!(placement.range.end_block <= heights.len());
        prop_assert!(placement.range.len() <= tuning.max_loaded_blocks);
        prop_assert!(placement.range.contains(placement.first_visible));
        prop_assert!(placement.first_visible <= placement.last_visible);
        prop_assert!(placement.last_visible < heights.len());
        prop_assert_eq!(
            placement.translate_y,
            coordinator.offset_of(placement.range.start_block)
        );
    }

    #[test]
    fn first_visible_block_contains_scroll_offset(
        heights in arb_heights(),
        fraction in 0.0f64..1.0,
    ) {
        let index = HeightIndex::from_heights(&heights);
        let offset = index.total() * fraction;
        let block = index.locate(offset).unwrap();

        // Offsets are rounded to 1/64 px before the search
        let unit = 1.0 / 64.0;
        prop_assert!(index.cumulative(block) <= offset + unit);
        prop_assert!(offset < index.cumulative(block + 1) + unit);
    }

    #[test]
    fn height_change_shifts_later_offsets(
        heights in arb_heights(),
        pick in any::<prop::sample::Index>(),
        new_height in 8.0f64..600.0,
    ) {
        let mut index = HeightIndex::from_heights(&heights);
        let i = pick.index(heights.len());
        let before: Vec<f64> = (0..=heights.len()).map(|j| index.cumulative(j)).collect();
        let delta = new_height - index.height(i).unwrap();

        prop_assert!(index.set(i, new_height));
        for (j, old) in before.iter().enumerate() {
            let expected = if j > i { old + delta } else { *old };
            // Fixed-point storage rounds to 1/64 px per block
            prop_assert!((index.cumulative(j) - expected).abs() < 0.05);
        }
    }

    #[test]
    fn settled_window_covers_visible_span(
        count in 1usize..3000,
        fraction in 0.0f64..1.0,
    ) {
        let markdown = (0..count)
            .map(|i| format!("Block {i}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut store = MemoryBlockStore::new();
        store.insert_markdown("prop.md", &markdown).unwrap();
        let mut window = PersistentWindow::new(
            WindowConfig::default(),
            HeadlessSurface::new(),
            HeadlessContainer::new(),
            TextMetricsCache::unavailable(),
            600.0,
            800.0,
        );

        let mut now = Instant::now();
        if let Some(ticket) = window.open(&mut store, Path::new("prop.md"), now).unwrap() {
            window.fetch_and_apply(&mut store, &ticket);
        }

        let scroll_top = window.total_height() * fraction;
        window.on_scroll(scroll_top, now);
        if let Some(ticket) = window.on_animation_frame(now) {
            window.fetch_and_apply(&mut store, &ticket);
        }
        now += Duration::from_millis(200);
        if let Some(ticket) = window.on_timer(&mut store, now) {
            window.fetch_and_apply(&mut store, &ticket);
        }

        let coordinator = window.coordinator().unwrap();
        let placement = coordinator.place(scroll_top);
        let visible = BlockRange::new(placement.first_visible, placement.last_visible + 1);
        let loaded = window.loaded_range().unwrap();

        prop_assert!(loaded.covers(visible), "loaded {} visible {}", loaded, visible);
        prop_assert!(!window.is_dimmed());
        prop_assert_eq!(window.container().anchor_offset, coordinator.offset_of(loaded.start_block));
    }
}
