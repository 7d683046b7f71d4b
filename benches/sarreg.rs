use criterion::{criterion_group, criterion_main, Criterion};
use sarreg::{
    estimate_homography, sharpen, to_display_intensity, warp_perspective, CorrespondencePair,
    DisplayImage, Homography, NormalizeConfig, Point2, RansacConfig, RasterImage, SharpenConfig,
};
use std::hint::black_box;

fn make_raster(width: usize, height: usize) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        let v = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
        0.001 + v as f32 / 64.0
    })
    .unwrap()
}

fn make_rgb(width: usize, height: usize) -> DisplayImage {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            data.push(((x * 3) & 0xFF) as u8);
            data.push(((y * 5) & 0xFF) as u8);
            data.push(((x ^ y) & 0xFF) as u8);
        }
    }
    DisplayImage::rgb(data, width, height).unwrap()
}

fn make_pairs(h: &Homography, inliers: usize, outliers: usize) -> Vec<CorrespondencePair> {
    let mut pairs = Vec::with_capacity(inliers + outliers);
    for i in 0..inliers {
        let src = Point2::new(((i * 37) % 500) as f64, ((i * 91) % 400) as f64 + 0.3);
        let dst = h.project(src).unwrap();
        pairs.push(CorrespondencePair::new(src, dst));
    }
    for i in 0..outliers {
        let src = Point2::new(((i * 53) % 500) as f64, ((i * 17) % 400) as f64);
        let dst = Point2::new(((i * 29) % 500) as f64, ((i * 71) % 400) as f64);
        pairs.push(CorrespondencePair::new(src, dst));
    }
    pairs
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let raster = make_raster(512, 512);
    c.bench_function("normalize_512_db_percentiles", |b| {
        b.iter(|| black_box(to_display_intensity(&raster, &NormalizeConfig::default()).unwrap()));
    });

    let optical = make_rgb(512, 512);
    c.bench_function("sharpen_512_rgb", |b| {
        b.iter(|| black_box(sharpen(&optical, &SharpenConfig::default()).unwrap()));
    });

    let h = Homography::from_row_slice(&[1.02, 0.03, 12.0, -0.02, 0.98, -6.0, 1e-5, 2e-5, 1.0])
        .unwrap();
    let pairs = make_pairs(&h, 2000, 1000);
    c.bench_function("ransac_3000_pairs_2000_iters", |b| {
        b.iter(|| black_box(estimate_homography(&pairs, &RansacConfig::default()).unwrap()));
    });

    let display = to_display_intensity(&raster, &NormalizeConfig::default()).unwrap();
    c.bench_function("warp_perspective_512", |b| {
        b.iter(|| black_box(warp_perspective(&display, &h, 512, 512).unwrap()));
    });
}

criterion_group!(benches, bench_pipeline_stages);
criterion_main!(benches);
