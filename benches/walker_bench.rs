//! Benchmarks for mdu
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use std::path::Path;

fn benchmark_queue_operations(c: &mut Criterion) {
    use mdu::walker::{RootUsage, Task, TaskQueue};
    use std::sync::Arc;

    c.bench_function("queue_enqueue_dequeue", |b| {
        let mut queue = TaskQueue::new();
        let parent = Task::root(Arc::new(RootUsage::new(0, "/test/path")));

        b.iter(|| {
            queue.enqueue(parent.child("entry".as_ref())).unwrap();
            let task = queue.dequeue().unwrap();
            black_box(task);
        })
    });
}

fn build_tree(root: &Path) {
    for d in 0..16 {
        let dir = root.join(format!("d{}", d));
        fs::create_dir(&dir).unwrap();
        for f in 0..64 {
            fs::write(dir.join(format!("f{}", f)), b"payload").unwrap();
        }
    }
}

fn benchmark_walk(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    build_tree(dir.path());

    let mut group = c.benchmark_group("walk_tree");
    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let usages = mdu::run([dir.path()], threads).unwrap();
                black_box(usages);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_queue_operations, benchmark_walk);
criterion_main!(benches);
