//! Benchmarks for pagination and page layout.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(
    clippy::expect_used,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xlpager::layout::{break_into_pages, wrap};
use xlpager::{
    layout_sheet, BreakMode, Cell, CellBorders, CharWidthMetrics, LayoutConfig, MergeRange,
    MetricsProvider, PageGeometry, SheetGrid,
};

/// A `rows` x `cols` grid of boxed cells with a merged title every 50 rows.
fn synthetic_grid(rows: u32, cols: u32) -> SheetGrid {
    let mut grid = SheetGrid::new("bench", vec![64.0; cols as usize], vec![15.0; rows as usize]);
    for r in 0..rows {
        for c in 0..cols {
            let cell = Cell::text(format!("R{r}C{c} value")).with_borders(CellBorders::BOXED);
            grid.set_cell(r, c, cell);
        }
        if r % 50 == 0 && cols > 3 {
            grid.add_merge(MergeRange::new(r, 0, r, 3));
        }
    }
    grid
}

fn bench_break_into_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("break_into_pages");

    for rows in [1_000_u32, 10_000, 100_000] {
        let heights = vec![15.0_f32; rows as usize];
        let widths = vec![64.0_f32; 40];
        group.throughput(Throughput::Elements(u64::from(rows)));
        for mode in [BreakMode::Complete, BreakMode::Legacy] {
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), rows),
                &heights,
                |b, heights| {
                    b.iter(|| {
                        break_into_pages(black_box(heights), black_box(&widths), 559.56, 811.89, mode)
                            .expect("valid grid")
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_layout_sheet(c: &mut Criterion) {
    let metrics = CharWidthMetrics::new();
    let config = LayoutConfig::default();
    let geometry = PageGeometry::default();

    let mut group = c.benchmark_group("layout_sheet");
    for (rows, cols) in [(500_u32, 10_u32), (5_000, 20)] {
        let grid = synthetic_grid(rows, cols);
        group.throughput(Throughput::Elements(u64::from(rows * cols)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{rows}x{cols}")),
            &grid,
            |b, grid| {
                b.iter(|| {
                    layout_sheet(black_box(grid), &metrics, &geometry, &config)
                        .expect("layout succeeds")
                })
            },
        );
    }
    group.finish();
}

fn bench_wrap(c: &mut Criterion) {
    let metrics = CharWidthMetrics::new();
    let font = xlpager::Font::default();
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);

    c.bench_function("wrap_paragraph", |b| {
        b.iter(|| {
            wrap(black_box(&text), 120.0, |s| {
                metrics.measure_width(s, &font, 11.0).unwrap_or(0.0)
            })
        })
    });
}

criterion_group!(benches, bench_break_into_pages, bench_layout_sheet, bench_wrap);
criterion_main!(benches);
