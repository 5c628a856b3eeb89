//! Criterion benchmarks for pagepack dispatch paths
//!
//! Benchmarks the per-job and per-compile costs of a dispatch run:
//! - Descriptor decoding: single jobs and JSON batches
//! - Batch validation
//! - Bundle config assembly and wire encoding
//! - Report condensing and warning extraction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagepack::bundler::{BundleStats, ConfigBuilder, DevelopmentBuilder, StatsDetail};
use pagepack::job::{self, JobDescriptor};
use pagepack::status::condense_report;
use std::time::Duration;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Generate one descriptor JSON object for a named page
fn make_job_json(name: &str) -> String {
    format!(
        r#"{{"src path": "pages/{name}/index.js", "dest dir": "build/{name}", "watch": false, "npm root": "node_modules", "src dir": "pages/{name}", "html template": "public/index.html", "page name": "{name}", "public url": "/static/{name}"}}"#
    )
}

/// Generate a batch payload with n descriptors
fn make_batch_json(n: usize) -> String {
    let jobs: Vec<String> = (0..n).map(|i| make_job_json(&format!("page_{i}"))).collect();
    format!("[{}]", jobs.join(", "))
}

/// Generate a bundler stats report with the given number of asset lines,
/// sprinkling in warnings and an error trace like a real compile
fn make_report(assets: usize) -> String {
    let mut lines = Vec::with_capacity(assets + 8);
    lines.push("Hash: 9a0364b9e99bb480dd25".to_string());
    lines.push("Time: 2841ms".to_string());
    for i in 0..assets {
        lines.push(format!("asset chunk_{i}.js {} KiB [emitted]", 12 + i % 40));
    }
    lines.push("WARNING in ./src/app.js".to_string());
    lines.push("  unused variable 'props'".to_string());
    lines.push("ERROR in ./src/missing.js".to_string());
    lines.push("  Module not found: Error: Can't resolve './gone'".to_string());
    lines.push("   @ ./src/app.js 3:0-24".to_string());
    lines.push("compiled with 1 error and 1 warning".to_string());
    lines.join("\n")
}

// =============================================================================
// Descriptor Decoding Benchmarks
// =============================================================================

fn bench_descriptors(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptors");

    let single = make_job_json("home");
    group.bench_function("parse_single", |b| {
        b.iter(|| JobDescriptor::parse(black_box(&single)))
    });

    for size in [1, 8, 32, 128].iter() {
        let payload = make_batch_json(*size);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_batch", size), &payload, |b, payload| {
            b.iter(|| JobDescriptor::parse_batch(black_box(payload)))
        });
    }

    for size in [8, 128].iter() {
        let jobs = JobDescriptor::parse_batch(&make_batch_json(*size)).unwrap();
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("validate_batch", size), &jobs, |b, jobs| {
            b.iter(|| job::validate_batch(black_box(jobs)))
        });
    }

    group.finish();
}

// =============================================================================
// Bundle Config Benchmarks
// =============================================================================

fn bench_config(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");

    let job = JobDescriptor::parse(&make_job_json("home")).unwrap();
    let builder = DevelopmentBuilder::new();

    group.bench_function("build", |b| {
        b.iter(|| builder.build(black_box(&job), StatsDetail::Condensed))
    });

    let config = builder.build(&job, StatsDetail::Condensed);
    group.bench_function("to_json", |b| b.iter(|| black_box(&config).to_json()));

    group.finish();
}

// =============================================================================
// Report Processing Benchmarks
// =============================================================================

fn bench_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports");

    for assets in [10, 100, 1000].iter() {
        let report = make_report(*assets);
        group.throughput(Throughput::Bytes(report.len() as u64));
        group.bench_with_input(BenchmarkId::new("condense", assets), &report, |b, report| {
            b.iter(|| condense_report(black_box(report)))
        });
    }

    let report = make_report(100);
    group.bench_function("extract_warnings_100", |b| {
        b.iter(|| BundleStats::new(black_box(report.clone()), Duration::ZERO))
    });

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(benches, bench_descriptors, bench_config, bench_reports);

criterion_main!(benches);
