// Compares lookups answered by the trie against lookups answered by the cache.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rxrouter::RadixTree;

fn routes() -> Vec<&'static str> {
    vec![
        "/",
        "/cmd/{(?P<tool>[a-z]+)}/{(?P<sub>[a-z]+)}",
        "/cmd/whoami",
        "/cmd/whoami/root/",
        "/src/{(?P<filepath>.+)}",
        "/search/",
        "/search/{(?P<query>[a-z0-9]+)}",
        "/search/invalid",
        "/user_{(?P<name>[a-z]+)}",
        "/user_x",
        "/user_{(?P<name>[a-z]+)}/about",
        "/files/{(?P<dir>[a-z]+)}/{(?P<file>[a-z]+)}.{(?P<ext>txt|md)}",
        "/doc/",
        "/doc/rust_faq.html",
        "/doc/rust1.26.html",
        "/info/{(?P<user>[a-z]+)}/public",
        "/info/{(?P<user>[a-z]+)}/project/{(?P<project>[a-z0-9-]+)}",
    ]
}

fn requests() -> Vec<&'static str> {
    vec![
        "/",
        "/cmd/test/3",
        "/cmd/whoami",
        "/cmd/whoami/root/",
        "/src/some/file.png",
        "/search/",
        "/search/someth1ng",
        "/search/invalid",
        "/user_gopher",
        "/user_x",
        "/user_gopher/about",
        "/files/dir/file.md",
        "/doc/",
        "/doc/rust_faq.html",
        "/doc/rust1.26.html",
        "/info/gordon/public",
        "/info/gordon/project/rust-lang",
    ]
}

fn tree(capacity: usize) -> RadixTree<usize> {
    let tree = RadixTree::with_capacity(capacity);
    for (i, route) in routes().into_iter().enumerate() {
        tree.insert(route, i).unwrap();
    }
    tree
}

fn lookup(c: &mut Criterion) {
    let requests = requests();

    let cold = tree(0);
    c.bench_function("lookup without cache", |b| {
        b.iter(|| {
            for path in &requests {
                black_box(cold.get(black_box(path)));
            }
        })
    });

    let warm = tree(rxrouter::DEFAULT_CACHE_CAPACITY);
    for path in &requests {
        warm.get(path);
    }
    c.bench_function("lookup with warm cache", |b| {
        b.iter(|| {
            for path in &requests {
                black_box(warm.get(black_box(path)));
            }
        })
    });
}

criterion_group!(benches, lookup);
criterion_main!(benches);
