use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hoopoes::simulator::{Model, TerritoryModel};
use hoopoes::structs::parameters::ParameterPoint;

fn benchmark_territory(c: &mut Criterion) {
    let model = TerritoryModel::default();
    let point = ParameterPoint::new(0.25, 0.975);

    c.bench_function("territory_single_run", |b| {
        b.iter(|| {
            let _ = model.simulate(black_box(&point), black_box(7));
        });
    });

    c.bench_function("territory_ensemble_10", |b| {
        b.iter(|| {
            let _ = model.run_ensemble(black_box(&point), black_box(10), black_box(7));
        });
    });
}

criterion_group!(benches, benchmark_territory);
criterion_main!(benches);
