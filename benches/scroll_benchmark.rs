//! Scroll performance benchmarks for the per-frame path.
//!
//! Every animation frame during a scroll runs one offset lookup and one
//! placement; every measurement runs one height update. These must stay
//! well under a frame budget for documents with hundreds of thousands of
//! blocks.
//!
//! Run with: cargo bench --bench scroll_benchmark

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use persistent_window::config::{ViewportTuning, WindowConfig};
use persistent_window::metrics::{CellMeasureSurface, TextMetricsCache};
use persistent_window::store::MemoryBlockStore;
use persistent_window::window::{HeadlessContainer, HeadlessSurface};
use persistent_window::{HeightIndex, PersistentWindow, ViewportCoordinator};
use std::path::Path;
use std::time::{Duration, Instant};

/// Scroll position in the document.
#[derive(Debug, Clone, Copy)]
enum ScrollPosition {
    Start,
    Middle,
    End,
}

impl ScrollPosition {
    fn name(&self) -> &'static str {
        match self {
            ScrollPosition::Start => "start",
            ScrollPosition::Middle => "middle",
            ScrollPosition::End => "end",
        }
    }

    fn offset(&self, total_height: f64) -> f64 {
        match self {
            ScrollPosition::Start => 0.0,
            ScrollPosition::Middle => total_height / 2.0,
            ScrollPosition::End => total_height - 800.0,
        }
    }
}

/// Deterministic mix of paragraph, heading, code and image heights.
fn mixed_heights(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| match i % 7 {
            0 => 56.0,
            1 | 2 | 3 => 28.0,
            4 => 84.0,
            5 => 212.0,
            _ => 41.5,
        })
        .collect()
}

fn bench_height_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("height_index");

    for &count in &[10_000usize, 100_000, 500_000] {
        let heights = mixed_heights(count);

        group.bench_with_input(BenchmarkId::new("build", count), &heights, |b, heights| {
            b.iter(|| HeightIndex::from_heights(black_box(heights)));
        });

        let index = HeightIndex::from_heights(&heights);
        let total = index.total();
        group.bench_with_input(BenchmarkId::new("locate", count), &index, |b, index| {
            let mut offset = 0.0;
            b.iter(|| {
                offset = (offset + 9_973.0) % total;
                black_box(index.locate(black_box(offset)))
            });
        });

        group.bench_function(BenchmarkId::new("set", count), |b| {
            let mut index = HeightIndex::from_heights(&heights);
            let mut i = 0;
            b.iter(|| {
                i = (i + 7_919) % count;
                index.set(black_box(i), black_box(45.0 + (i % 3) as f64))
            });
        });
    }

    group.finish();
}

fn bench_coordinator_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinator_frame");
    let heights = mixed_heights(200_000);

    for position in [ScrollPosition::Start, ScrollPosition::Middle, ScrollPosition::End] {
        group.bench_function(position.name(), |b| {
            let mut coordinator =
                ViewportCoordinator::new(ViewportTuning::default(), &heights, 800.0);
            let target = position.offset(coordinator.total_height());
            let mut now = Instant::now();
            let mut wobble = 0.0;
            b.iter(|| {
                now += Duration::from_millis(16);
                wobble = if wobble > 0.0 { 0.0 } else { 3.0 };
                coordinator.handle_scroll(black_box(target + wobble), now);
                black_box(coordinator.on_frame(now))
            });
        });
    }

    group.finish();
}

fn bench_window_settle(c: &mut Criterion) {
    let markdown = (0..50_000)
        .map(|i| format!("Paragraph {i} with a few words of body text."))
        .collect::<Vec<_>>()
        .join("\n\n");

    c.bench_function("window_settle_and_mount", |b| {
        b.iter_batched(
            || {
                let mut store = MemoryBlockStore::new();
                store.insert_markdown("bench.md", &markdown).unwrap();
                let mut window = PersistentWindow::new(
                    WindowConfig::default(),
                    HeadlessSurface::new(),
                    HeadlessContainer::new(),
                    TextMetricsCache::new(Box::new(CellMeasureSurface::default())),
                    600.0,
                    800.0,
                );
                let now = Instant::now();
                if let Some(ticket) = window.open(&mut store, Path::new("bench.md"), now).unwrap() {
                    window.fetch_and_apply(&mut store, &ticket);
                }
                (window, store, now)
            },
            |(mut window, mut store, now)| {
                let target = window.total_height() / 2.0;
                window.on_scroll(target, now);
                window.on_animation_frame(now);
                let later = now + Duration::from_millis(200);
                if let Some(ticket) = window.on_timer(&mut store, later) {
                    black_box(window.fetch_and_apply(&mut store, &ticket));
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_height_index,
    bench_coordinator_frame,
    bench_window_settle
);
criterion_main!(benches);
