#![forbid(unsafe_code)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domwave_core::wire::{decode_batch, encode_batch};
use domwave_core::{DocumentHost, GridApplier, GridMutation, MemoryDocument};
use std::hint::black_box;

fn first_frame(rows: u32, columns: u32) -> Vec<GridMutation> {
    (0..rows)
        .map(|row| {
            let markup: String = (0..columns)
                .map(|column| format!(r#"<span class="col{column}">{row}:{column}</span>"#))
                .collect();
            GridMutation::insert(row, markup)
        })
        .collect()
}

/// Touch every seventh cell, the shape of a cursor blink plus a little output.
fn delta_frame(rows: u32, columns: u32, tick: u32) -> Vec<GridMutation> {
    (0..rows * columns)
        .filter(|cell| (cell + tick) % 7 == 0)
        .map(|cell| {
            let (row, column) = (cell / columns, cell % columns);
            GridMutation::update(
                row,
                column,
                format!(r#"<span class="col{column}">t{tick}</span>"#),
            )
        })
        .collect()
}

fn bench_grid_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/apply");

    for (rows, columns) in [(24u32, 80u32), (50, 132)] {
        let first = first_frame(rows, columns);
        group.bench_with_input(
            BenchmarkId::new("first_frame", format!("{rows}x{columns}")),
            &first,
            |b, batch| {
                b.iter(|| {
                    let mut doc = MemoryDocument::with_body(r#"<div id="term"></div>"#);
                    let mut applier = GridApplier::default();
                    applier
                        .apply(&mut doc, "#term", batch)
                        .expect("first frame should apply");
                    black_box(applier.index().cell_count());
                });
            },
        );

        let deltas: Vec<_> = (0..8).map(|tick| delta_frame(rows, columns, tick)).collect();
        group.bench_with_input(
            BenchmarkId::new("delta_frames_x8", format!("{rows}x{columns}")),
            &deltas,
            |b, deltas| {
                let mut doc = MemoryDocument::with_body(r#"<div id="term"></div>"#);
                let mut applier = GridApplier::default();
                applier
                    .apply(&mut doc, "#term", &first)
                    .expect("first frame should apply");
                b.iter(|| {
                    for delta in deltas {
                        applier
                            .apply(&mut doc, "#term", delta)
                            .expect("delta frame should apply");
                    }
                    black_box(applier.index().rebuilds());
                });
            },
        );
    }

    group.finish();
}

fn bench_wire_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/wire");
    let json = encode_batch(&delta_frame(50, 132, 3)).expect("batch should encode");

    group.bench_function("decode_delta_50x132", |b| {
        b.iter(|| {
            let batch = decode_batch(black_box(&json)).expect("batch should decode");
            black_box(batch.len());
        });
    });

    group.bench_function("decode_and_apply_delta_50x132", |b| {
        let mut doc = MemoryDocument::with_body(r#"<div id="term"></div>"#);
        let mut applier = GridApplier::default();
        applier
            .apply(&mut doc, "#term", &first_frame(50, 132))
            .expect("first frame should apply");
        b.iter(|| {
            applier
                .apply_json(&mut doc, "#term", black_box(&json))
                .expect("delta should apply");
        });
        black_box(doc.inner_html("#term").len());
    });

    group.finish();
}

criterion_group!(benches, bench_grid_apply, bench_wire_decode);
criterion_main!(benches);
