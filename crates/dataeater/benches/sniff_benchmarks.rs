//! Sniffing performance benchmarks.
//!
//! Measures encoding, delimiter and structural detection over in-memory
//! prefixes of different sizes and shapes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dataeater::sniff::{Delimiter, Encoding, Sniffer, detect_encoding};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate delimited text with mixed value shapes.
fn generate_delimited(rows: usize, cols: usize, delimiter: char) -> String {
    let mut data = String::new();

    for i in 0..cols {
        if i > 0 {
            data.push(delimiter);
        }
        data.push_str(&format!("column_{}", i + 1));
    }
    data.push('\n');

    for row in 0..rows {
        for col in 0..cols {
            if col > 0 {
                data.push(delimiter);
            }
            match col % 4 {
                0 => data.push_str(&format!("ID_{:06}", row)),
                1 => data.push_str(&format!("{:.2}", row as f64 * 1.5)),
                2 => data.push_str(&format!("\"Doe, {}\"", row % 50)),
                3 => data.push_str(&format!("2024-{:02}-{:02}", (row % 12) + 1, (row % 28) + 1)),
                _ => unreachable!(),
            }
        }
        data.push('\n');
    }

    data
}

/// Text with Latin-1 bytes scattered through it.
fn generate_latin1(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len)
        .map(|_| {
            if rng.gen_ratio(1, 200) {
                0xE9
            } else {
                rng.gen_range(b'a'..=b'z')
            }
        })
        .collect()
}

fn bench_sniff_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("sniff_prefix");
    let sniffer = Sniffer::new();

    for (name, delimiter) in [("comma", ','), ("semicolon", ';'), ("tab", '\t')] {
        let data = generate_delimited(1_000, 10, delimiter);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("delimiter", name), &data, |b, data| {
            b.iter(|| black_box(sniffer.sniff_bytes(data.as_bytes(), true)))
        });
    }

    group.finish();
}

fn bench_detect_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_encoding");

    for size in [1_024, 8_192, 65_536] {
        let utf8 = "é,a,b\n".repeat(size / 7).into_bytes();
        let latin1 = generate_latin1(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("utf8", size), &utf8, |b, data| {
            b.iter(|| black_box(detect_encoding(data)))
        });
        group.bench_with_input(BenchmarkId::new("latin1", size), &latin1, |b, data| {
            b.iter(|| black_box(detect_encoding(data)))
        });
    }

    group.finish();
}

fn bench_jagged_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("jagged_scan");
    let sniffer = Sniffer::new();

    for cols in [5, 20, 50] {
        let data = generate_delimited(1_000, cols, ',');
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("cols", cols), &data, |b, data| {
            b.iter(|| {
                black_box(sniffer.jagged_rows_in(
                    data.as_bytes(),
                    true,
                    Some(Delimiter::Comma),
                    Encoding::Utf8,
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sniff_prefix,
    bench_detect_encoding,
    bench_jagged_scan,
);
criterion_main!(benches);
