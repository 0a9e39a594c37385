use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pagecast::synth::split;
use std::hint::black_box;

/// A page-sized body of mixed ASCII and multi-byte text.
fn sample_text(chars: usize) -> String {
    "Lorem ipsum dolor sit amet, naïve café résumé -- ünïcödé. "
        .chars()
        .cycle()
        .take(chars)
        .collect()
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_split");

    for &chars in &[3_000usize, 30_000, 300_000] {
        let text = sample_text(chars);
        group.throughput(Throughput::Bytes(text.len() as u64));
        for &max_len in &[500usize, 3_000] {
            group.bench_with_input(
                BenchmarkId::new(format!("max_{max_len}"), chars),
                &text,
                |b, text| b.iter(|| split(black_box(text), max_len).count()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_split);
criterion_main!(benches);
