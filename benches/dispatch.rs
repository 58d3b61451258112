//! Event correlation and feedback log benchmarks.
//!
//! Measures the in-process hot paths:
//! - Inbound frame dispatch through the registry
//! - Log summaries at growing log sizes
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use feedback_copilot::session::{FeedbackInput, ReviewLog};
use feedback_copilot::transport::EventRegistry;
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LOG_SIZES: &[usize] = &[10, 100, 1_000];
const SEVERITIES: &[&str] = &["critical", "major", "minor", "suggestion"];
const FRAME: &str = r#"{"event":"user_speech","data":"the button is misaligned"}"#;

// ============================================================================
// Benchmark: Registry Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("registry");

    group.bench_function("wait_and_resolve", |b| {
        b.to_async(&rt).iter(|| async {
            let registry = EventRegistry::new();
            let wait = registry.wait_for_event("user_speech", Duration::from_secs(60));
            registry.on_message(black_box(FRAME));
            black_box(wait.await.expect("resolved"));
        });
    });

    group.bench_function("unmatched_frame", |b| {
        let registry = EventRegistry::new();
        b.iter(|| registry.on_message(black_box(FRAME)));
    });

    group.bench_function("malformed_frame", |b| {
        let registry = EventRegistry::new();
        b.iter(|| registry.on_message(black_box("{not json")));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Log Summary
// ============================================================================

fn filled_log(size: usize) -> ReviewLog {
    let mut log = ReviewLog::new();
    for i in 0..size {
        log.add(
            FeedbackInput::new(format!("issue {i}"))
                .page(format!("/page-{}", i % 7))
                .severity(SEVERITIES[i % SEVERITIES.len()]),
        );
    }
    log
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("review_log");

    for &size in LOG_SIZES {
        let log = filled_log(size);
        group.bench_with_input(BenchmarkId::new("summary", size), &log, |b, log| {
            b.iter(|| black_box(log.summary()));
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(benches, bench_dispatch, bench_summary);
criterion_main!(benches);
