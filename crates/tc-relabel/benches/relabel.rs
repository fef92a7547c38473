use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tc_core::{BACKGROUND, Grid, Label, Shape};
use tc_relabel::{CarveConfig, PriorityPolicy, RelabelConfig, Relabeler, carve_outside};
use tc_topology::ConnectivitySpec;

/// Sphere of label 1 and an offset sphere of label 2.
fn spheres(n: usize, shift: f32) -> Grid<Label> {
    let shape = Shape::volume(n, n, n);
    let c = n as f32 * 0.5;
    let r = n as f32 * 0.3;
    let data = (0..shape.len())
        .map(|i| {
            let p = shape.coord_of(i);
            let d = |cx: f32| {
                let dx = p[0] as f32 - cx;
                let dy = p[1] as f32 - c;
                let dz = p[2] as f32 - c;
                (dx * dx + dy * dy + dz * dz).sqrt()
            };
            if d(c - r * 0.6 + shift) < r * 0.6 {
                1
            } else if d(c + r * 0.6 + shift) < r * 0.5 {
                2
            } else {
                BACKGROUND
            }
        })
        .collect();
    Grid::from_vec(shape, data).expect("valid grid")
}

fn bench_relabel(c: &mut Criterion) {
    let start = spheres(64, 0.0);
    let target = spheres(64, 2.5);
    let spec = ConnectivitySpec::volumetric();

    for (name, parallel) in [("relabel_shift_64", false), ("relabel_shift_64_parallel", true)] {
        let relabeler = Relabeler::new(RelabelConfig {
            parallel,
            ..RelabelConfig::default()
        });
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut grid = start.clone();
                let stats = relabeler
                    .run(&mut grid, black_box(&target), &spec, &PriorityPolicy::default())
                    .expect("valid input");
                black_box(stats.flips);
            });
        });
    }
}

fn bench_carve_outside(c: &mut Criterion) {
    let mut input = spheres(48, 0.0);
    // a narrow tunnel through the first sphere
    for z in 0..48 {
        *input.get_mut([16, 24, z]).expect("in bounds") = BACKGROUND;
    }
    let cfg = CarveConfig {
        radius: 2,
        ..CarveConfig::default()
    };

    c.bench_function("carve_outside_48_r2", |b| {
        b.iter(|| {
            let out = carve_outside(black_box(&input), &cfg, None).expect("valid input");
            black_box(out.stats.flips);
        });
    });
}

criterion_group!(benches, bench_relabel, bench_carve_outside);
criterion_main!(benches);
