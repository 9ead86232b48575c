use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delta_sssp::graph::generators::{generate_grid, generate_random_connected};
use delta_sssp::{DeltaStepping, Dijkstra, ShortestPathAlgorithm, SsspConfig};

fn random_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("sssp/random");
    group.sample_size(20);

    for &n in &[1_000usize, 10_000] {
        let graph = generate_random_connected(n, n * 8, 1.0..100.0, 42).unwrap();

        group.bench_with_input(BenchmarkId::new("dijkstra", n), &graph, |b, g| {
            let algorithm = Dijkstra::new();
            b.iter(|| black_box(algorithm.compute_shortest_paths(g, 0).unwrap()));
        });

        for workers in [1usize, 4] {
            let engine =
                DeltaStepping::with_config(SsspConfig::new().with_parallelism(workers));
            let prep = engine.preprocess(&graph).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("delta_stepping/{}w", workers), n),
                &graph,
                |b, g| {
                    b.iter(|| black_box(engine.solve(g, 0, &prep, None).unwrap()));
                },
            );
        }
    }
    group.finish();
}

fn grid_with_pruning(c: &mut Criterion) {
    let mut group = c.benchmark_group("sssp/grid");
    group.sample_size(20);

    let graph = generate_grid(100, 100, 1.0..10.0, 7).unwrap();
    let plain = DeltaStepping::new();
    let plain_prep = plain.preprocess(&graph).unwrap();
    let pruned = DeltaStepping::with_config(
        SsspConfig::new()
            .with_pruning(true)
            .with_landmark_count(8)
            .with_hierarchy(true),
    );
    let pruned_prep = pruned.preprocess(&graph).unwrap();

    group.bench_function("delta_stepping/plain", |b| {
        b.iter(|| black_box(plain.solve(&graph, 0, &plain_prep, None).unwrap()));
    });
    group.bench_function("delta_stepping/landmarks+hierarchy", |b| {
        b.iter(|| black_box(pruned.solve(&graph, 0, &pruned_prep, None).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, random_graphs, grid_with_pruning);
criterion_main!(benches);
