/* crates use */
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use random_string::generate;

/* project use */
use mphf_kmers::hash::SeededHasher;
use mphf_kmers::params::Params;
use mphf_kmers::scanner::scan_contig;

const K: u8 = 31;
const M: u8 = 15;

pub fn scan(contig: &[u8]) -> u64 {
    let params = Params::new(K, M, 42, true);
    let hasher = SeededHasher::new(42);
    let mut mm_count = 0u64;
    scan_contig(contig, &params, &hasher, &mut mm_count, |_| {})
}

pub fn build_and_query(contig: &[u8]) -> u64 {
    let params = Params::new(K, M, 42, true);
    let hasher = SeededHasher::new(42);
    let index = mphf_kmers::build(std::iter::once(contig), params, &hasher).unwrap();
    index.evaluate(contig, &hasher).unwrap().len() as u64
}

pub fn scanning(c: &mut Criterion) {
    let charset = "ACGT";
    let mut g = c.benchmark_group("scanning");

    for i in 12..20 {
        let input = generate(1 << i, charset);
        let bytes = input.as_bytes();

        g.bench_with_input(BenchmarkId::new("scan_contig", 1 << i), &bytes, |b, &s| {
            b.iter(|| black_box(scan(s)));
        });
    }
}

pub fn query_latency(c: &mut Criterion) {
    let charset = "ACGT";
    let mut g = c.benchmark_group("query_latency");

    for i in 10..16 {
        let input = generate(1 << i, charset);
        let bytes = input.as_bytes();
        let params = Params::new(K, M, 42, true);
        let hasher = SeededHasher::new(42);
        // build once, outside the timed section, so the benchmark isolates
        // per-call query-path cost from the one-time build cost.
        let index = mphf_kmers::build(std::iter::once(bytes), params, &hasher).unwrap();

        g.bench_with_input(BenchmarkId::new("evaluate", 1 << i), &bytes, |b, &s| {
            b.iter(|| black_box(index.evaluate(s, &hasher).unwrap().len()));
        });
    }
}

pub fn end_to_end(c: &mut Criterion) {
    let charset = "ACGT";
    let mut g = c.benchmark_group("build_and_query");

    for i in 10..16 {
        let input = generate(1 << i, charset);
        let bytes = input.as_bytes();

        g.bench_with_input(
            BenchmarkId::new("build_and_query", 1 << i),
            &bytes,
            |b, &s| {
                b.iter(|| black_box(build_and_query(s)));
            },
        );
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    scanning(c);
    query_latency(c);
    end_to_end(c);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
