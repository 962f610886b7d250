use criterion::{criterion_group, criterion_main};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lumo::bvh;
use lumo::geometry::{Material, Triangle};

fn triangle_cloud(count: usize, seed: u64) -> Vec<Triangle> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let center = Vec3::new(
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
            );
            Triangle::new(
                center + Vec3::new(-0.7, -0.4, 0.1),
                center + Vec3::new(0.6, -0.5, -0.2),
                center + Vec3::new(0.0, 0.8, 0.3),
                Vec3::ONE,
                Material::Matte,
            )
        })
        .collect()
}

fn criterion_benchmark(c: &mut criterion::Criterion) {
    let triangles = triangle_cloud(10_000, 0xb41c);

    c.bench_function("bvh build 10k", |b| {
        b.iter(|| bvh::build(&triangles).unwrap());
    });

    let root = bvh::build(&triangles).unwrap();
    c.bench_function("bvh flatten 10k", |b| {
        b.iter(|| bvh::flatten(&root, &triangles));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
