use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grove::{BPlusTree, NativeOrd};

fn populated(n: i32) -> BPlusTree<i32, NativeOrd<i32>> {
    let mut tree = BPlusTree::new(NativeOrd::new());
    for i in 0..n {
        tree.insert(&i);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_1000_keys", |b| {
        b.iter(|| {
            let mut tree = BPlusTree::new(NativeOrd::new());
            for i in 0..1000 {
                tree.insert(black_box(&i));
            }
            tree
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let tree = populated(1000);

    c.bench_function("search_1000_keys", |b| {
        b.iter(|| {
            for i in 0..1000 {
                assert!(tree.search(black_box(&i)).is_some());
            }
        });
    });
}

fn bench_range_scan(c: &mut Criterion) {
    let tree = populated(10_000);

    c.bench_function("range_scan_1000_of_10000", |b| {
        b.iter(|| {
            let mut count = 0usize;
            tree.range_scan(black_box(&4000), black_box(&4999), |_| count += 1);
            assert_eq!(count, 1000);
        });
    });
}

fn bench_delete(c: &mut Criterion) {
    c.bench_function("fill_then_drain_1000_keys", |b| {
        b.iter(|| {
            let mut tree = populated(1000);
            for i in 0..1000 {
                assert!(tree.delete(black_box(&i)));
            }
            tree
        });
    });
}

criterion_group!(benches, bench_insert, bench_search, bench_range_scan, bench_delete);
criterion_main!(benches);
