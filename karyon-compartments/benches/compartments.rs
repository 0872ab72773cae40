use criterion::{black_box, criterion_group, criterion_main, Criterion};
use karyon_compartments::cluster::{constrained_kmeans, ClusteringConfig};
use karyon_compartments::detect::{detect_compartments, DetectionParameters};
use karyon_compartments::matrix::{InteractionUnit, RowInfo};

fn lcg_noise(state: &mut u64) -> f64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    (*state >> 11) as f64 / (1u64 << 53) as f64
}

/// A unit with two interaction blocks plus noise, `replicates` rows per
/// position.
fn synthetic_unit(
    chromosome: &str,
    condition: &str,
    bins: usize,
    replicates: usize,
    seed: u64,
) -> InteractionUnit {
    let mut state = seed;
    let mut rows = Vec::with_capacity(bins * replicates);
    let mut values = Vec::with_capacity(bins * replicates * bins);
    for r in 0..replicates {
        for position in 0..bins {
            rows.push(RowInfo::new(format!("R{}", r + 1), position));
            let first_half = position < bins / 2;
            for bin in 0..bins {
                let base = if (bin < bins / 2) == first_half { 9.0 } else { 1.0 };
                values.push(base + lcg_noise(&mut state));
            }
        }
    }
    InteractionUnit::new(chromosome, condition, bins, rows, values).unwrap()
}

fn bench_constrained_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("constrained_kmeans");

    let unit = synthetic_unit("chr1", "1", 200, 3, 42);
    let groups = unit.must_link_groups();
    let view = unit.clustering_view();
    let config = ClusteringConfig {
        delta: 1e-4,
        max_iterations: 50,
        restarts: 20,
        seed: 42,
    };

    group.bench_function("200_bins_3_reps", |b| {
        b.iter(|| constrained_kmeans(black_box(&view), 200, &groups, &config))
    });

    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_compartments");
    group.sample_size(10);

    let units: Vec<InteractionUnit> = (0..4)
        .flat_map(|chr| {
            (0..2).map(move |cond| {
                synthetic_unit(
                    &format!("chr{}", chr + 1),
                    &format!("{}", cond + 1),
                    100,
                    2,
                    42 + (chr * 2 + cond) as u64,
                )
            })
        })
        .collect();
    let params = DetectionParameters::default();

    group.bench_function("4_chroms_2_conds_100_bins", |b| {
        b.iter(|| detect_compartments(black_box(&units), &params))
    });

    group.finish();
}

criterion_group!(benches, bench_constrained_kmeans, bench_detect);
criterion_main!(benches);
