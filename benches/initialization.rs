use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hoopoes::routines::initialization::{latin, sobol};
use hoopoes::structs::parameters::ORIG_BOUNDS;

fn benchmark_samplers(c: &mut Criterion) {
    let seed = 22;

    c.bench_function("sobol_1_000", |b| {
        b.iter(|| {
            let _ = sobol::generate(black_box(1000), black_box(&ORIG_BOUNDS), black_box(seed));
        });
    });

    c.bench_function("sobol_100_000", |b| {
        b.iter(|| {
            let _ = sobol::generate(black_box(100000), black_box(&ORIG_BOUNDS), black_box(seed));
        });
    });

    c.bench_function("latin_1_000", |b| {
        b.iter(|| {
            let _ = latin::generate(black_box(1000), black_box(&ORIG_BOUNDS), black_box(seed as u64));
        });
    });

    c.bench_function("latin_100_000", |b| {
        b.iter(|| {
            let _ = latin::generate(black_box(100000), black_box(&ORIG_BOUNDS), black_box(seed as u64));
        });
    });
}

criterion_group!(benches, benchmark_samplers);
criterion_main!(benches);
