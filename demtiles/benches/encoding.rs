use criterion::{black_box, criterion_group, criterion_main, Criterion};
use demtiles::encoding::{encode_grid, SampleGrid, TILE_SIZE};
use demtiles::{ArchiveCatalog, ColorRamp, EncodingMethod, QuadKey, TileCoord};

/// A 256×256 grid with a simple elevation gradient and a no-data border.
fn gradient_grid() -> SampleGrid {
    let mut samples = Vec::with_capacity((TILE_SIZE * TILE_SIZE) as usize);
    for row in 0..TILE_SIZE {
        for col in 0..TILE_SIZE {
            let sample = if row == 0 || col == 0 {
                -9999.0
            } else {
                ((row + col) * 10) as f32 - 200.0
            };
            samples.push(sample);
        }
    }
    SampleGrid::new(TILE_SIZE, TILE_SIZE, samples).unwrap()
}

fn bench_encode_mapbox(c: &mut Criterion) {
    let grid = gradient_grid();
    let ramp = ColorRamp::default_elevation();

    c.bench_function("encode_grid_mapbox_256", |b| {
        b.iter(|| {
            black_box(encode_grid(black_box(&grid), EncodingMethod::Mapbox, &ramp).unwrap());
        });
    });
}

fn bench_encode_ramp(c: &mut Criterion) {
    let grid = gradient_grid();
    let ramp = ColorRamp::default_elevation();

    c.bench_function("encode_grid_ramp_256", |b| {
        b.iter(|| {
            black_box(encode_grid(black_box(&grid), EncodingMethod::Ramp, &ramp).unwrap());
        });
    });
}

fn bench_quadkey(c: &mut Criterion) {
    let tile = TileCoord::new(18, 128_923, 81_114).unwrap();

    c.bench_function("quadkey_from_tile_z18", |b| {
        b.iter(|| {
            black_box(QuadKey::from_tile(black_box(tile)));
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let catalog = ArchiveCatalog::builtin();
    // Inside archive 11/2014/1267
    let covered = TileCoord::new(16, 64_460, 40_556).unwrap();
    let outside = TileCoord::new(16, 0, 0).unwrap();

    c.bench_function("find_covering_hit", |b| {
        b.iter(|| {
            black_box(
                catalog
                    .find_covering("Taranaki2021", black_box(covered))
                    .is_ok(),
            );
        });
    });

    c.bench_function("find_covering_miss", |b| {
        b.iter(|| {
            black_box(
                catalog
                    .find_covering("Taranaki2021", black_box(outside))
                    .is_ok(),
            );
        });
    });
}

criterion_group!(
    benches,
    bench_encode_mapbox,
    bench_encode_ramp,
    bench_quadkey,
    bench_resolve,
);
criterion_main!(benches);
