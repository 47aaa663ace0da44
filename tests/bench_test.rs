//! Benchmark tests for the storage backends
//!
//! Run with: cargo test --release bench -- --ignored --nocapture

use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

use bookmarker::database::init_db;
use bookmarker::model::BookmarkForm;
use bookmarker::service::{add_bookmark, resolve_bookmark};
use bookmarker::storage::{BookmarkBackend, DocumentBackend, JsonFileBackend};

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(usize),
{
    let start = Instant::now();

    for i in 0..iterations {
        f(i);
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

fn form(i: usize) -> BookmarkForm {
    BookmarkForm {
        custom_name: format!("bench-{}", i),
        url: format!("example.com/{}", i),
        notes: String::new(),
    }
}

fn run_suite(label: &str, store: &dyn BookmarkBackend, iterations: usize) {
    println!("\n=== Benchmark: {} ===\n", label);

    benchmark("Add", iterations, |i| {
        add_bookmark(store, Some("bench_user"), &form(i)).unwrap();
    });

    benchmark("Resolve", iterations, |i| {
        resolve_bookmark(store, Some("bench_user"), &format!("bench-{}", i)).unwrap();
    });

    benchmark("List", 100, |_| {
        store.list(Some("bench_user")).unwrap();
    });
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_document_backend() {
    let dir = TempDir::new().unwrap();
    let db = init_db(&dir.path().join("bench.redb"), "bookmarks").unwrap();
    let store = DocumentBackend::new(Arc::new(db), "bookmarks");
    run_suite("Document store", &store, 1000);
}

#[test]
#[ignore]
fn bench_json_file_backend() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileBackend::new(dir.path().join("bench.json"));
    // Whole-file rewrites make this backend quadratic; keep the count small
    run_suite("JSON file", &store, 200);
}
