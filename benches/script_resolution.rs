//! Benchmark: script name resolution
//!
//! The engine asks for scripts by path relative to its own working directory
//! (`./script/c123.lua`), which rarely matches the store key exactly. Every
//! miss walks the `/`-separated suffixes of the name, so resolution cost
//! grows with path depth.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ocg_host::data::resolve_script;
use ocg_host::ScriptStore;

fn store(size: u32) -> ScriptStore {
    let mut store = ScriptStore::new();
    for code in 0..size {
        store.add(format!("script/c{code}.lua"), format!("-- c{code}"));
    }
    store
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_script");

    for size in [100u32, 10_000] {
        let scripts = store(size);

        group.bench_with_input(BenchmarkId::new("exact", size), &scripts, |b, scripts| {
            b.iter(|| black_box(resolve_script(scripts, black_box("script/c42.lua"))));
        });

        group.bench_with_input(BenchmarkId::new("suffix", size), &scripts, |b, scripts| {
            b.iter(|| black_box(resolve_script(scripts, black_box("./expansions/script/c42.lua"))));
        });

        let missing = "./expansions/script/c999999.lua";
        group.bench_with_input(BenchmarkId::new("miss", size), &scripts, |b, scripts| {
            b.iter(|| black_box(resolve_script(scripts, black_box(missing))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
