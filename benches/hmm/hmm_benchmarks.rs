use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hmm_lattice::hmm::{forward_batch, forward_with, viterbi_with, EvalConfig, Model};

fn next_f64(state: &mut u64) -> f64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    (*state >> 11) as f64 / (1u64 << 53) as f64
}

fn random_row(len: usize, state: &mut u64) -> Vec<f64> {
    let raw: Vec<f64> = (0..len).map(|_| next_f64(state) + 1e-3).collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|x| x / sum).collect()
}

fn random_model(n: usize, m: usize, seed: u64) -> Model {
    let mut state = seed;
    let initial = random_row(n, &mut state);
    let transition = (0..n).map(|_| random_row(n, &mut state)).collect();
    let emission = (0..n).map(|_| random_row(m, &mut state)).collect();
    Model::new(initial, transition, emission).unwrap()
}

fn random_observations(m: usize, len: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    (0..len)
        .map(|_| (next_f64(&mut state) * m as f64) as usize % m)
        .collect()
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");
    let model = random_model(8, 4, 42);
    let obs = random_observations(4, 1_000, 7);

    let configs = [
        ("log_space", EvalConfig::log_space()),
        ("scaled", EvalConfig::scaled()),
    ];
    for (name, config) in configs {
        group.bench_with_input(BenchmarkId::new(name, obs.len()), &obs, |b, obs| {
            b.iter(|| forward_with(black_box(&model), black_box(obs), &config))
        });
    }

    group.finish();
}

fn bench_viterbi(c: &mut Criterion) {
    let mut group = c.benchmark_group("viterbi");
    let model = random_model(8, 4, 42);
    let obs = random_observations(4, 1_000, 7);

    let configs = [
        ("log_space", EvalConfig::log_space()),
        ("scaled", EvalConfig::scaled()),
    ];
    for (name, config) in configs {
        group.bench_with_input(BenchmarkId::new(name, obs.len()), &obs, |b, obs| {
            b.iter(|| viterbi_with(black_box(&model), black_box(obs), &config))
        });
    }

    group.finish();
}

fn bench_forward_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_batch");
    let model = random_model(8, 4, 42);
    let sequences: Vec<Vec<usize>> = (0..256).map(|k| random_observations(4, 200, k)).collect();

    group.bench_function("256_x_200", |b| {
        b.iter(|| {
            forward_batch(
                black_box(&model),
                black_box(&sequences),
                &EvalConfig::default(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_forward, bench_viterbi, bench_forward_batch);
criterion_main!(benches);
