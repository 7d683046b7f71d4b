use sarreg::{
    register, to_display_intensity, CorrespondencePair, Determinism, DisplayImage, Homography,
    Matcher, NormalizeConfig, NormalizedMatch, Point2, PrecomputedMatcher, RasterImage,
    RegistrationConfig, RegistrationError, RegistrationResult, Stage,
};

const WIDTH: usize = 96;
const HEIGHT: usize = 72;

fn smooth_raster() -> RasterImage {
    RasterImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let fx = x as f32 / WIDTH as f32;
        let fy = y as f32 / HEIGHT as f32;
        0.02 + 0.5 * fx * fx + 0.3 * fy + 0.1 * (fx * 6.0).sin() * (fy * 4.0).cos()
    })
    .unwrap()
}

fn grid_pairs(step: usize) -> Vec<CorrespondencePair> {
    let mut pairs = Vec::new();
    for y in (4..HEIGHT - 4).step_by(step) {
        for x in (4..WIDTH - 4).step_by(step) {
            let p = Point2::new(x as f64, y as f64);
            pairs.push(CorrespondencePair::new(p, p));
        }
    }
    pairs
}

fn mean_abs_diff(a: &DisplayImage, b: &DisplayImage) -> f64 {
    assert_eq!(a.data().len(), b.data().len());
    let total: u64 = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.data().len() as f64
}

#[test]
fn identical_images_register_to_identity() {
    let radar = smooth_raster();
    let optical = to_display_intensity(&radar, &NormalizeConfig::default())
        .unwrap()
        .to_rgb();
    let pairs = grid_pairs(12);
    let matcher = PrecomputedMatcher::from_pixel_pairs(&pairs, (WIDTH, HEIGHT), (WIDTH, HEIGHT));

    let out = register(
        &radar,
        &optical,
        &matcher,
        &RegistrationConfig::default(),
        &Determinism::initialize(42),
    )
    .unwrap();

    assert_eq!(out.report.total_matches, pairs.len());
    assert_eq!(out.report.valid_matches, pairs.len());
    assert_eq!(out.report.inliers, pairs.len());
    assert_eq!(out.report.inlier_ratio, 1.0);
    assert!(out.estimate.homography.max_abs_diff(&Homography::identity()) < 1e-3);

    assert_eq!(out.radar_display.channels(), 1);
    assert_eq!(out.optical_display.channels(), 3);
    assert_eq!(out.matches_image.width(), 2 * WIDTH);
    assert_eq!(out.matches_image.height(), HEIGHT);
    assert_eq!(
        (out.overlay.width(), out.overlay.height()),
        (optical.width(), optical.height())
    );
    assert!(mean_abs_diff(&out.overlay, &out.optical_display) < 4.0);
}

#[test]
fn too_few_valid_matches_abort_the_run() {
    let radar = smooth_raster();
    let optical = DisplayImage::filled(WIDTH, HEIGHT, 3, 90).unwrap();
    let matcher = PrecomputedMatcher::new(vec![
        NormalizedMatch {
            source: [0.0, 0.0],
            target: [0.0, 0.0],
        },
        NormalizedMatch {
            source: [0.5, 0.0],
            target: [0.5, 0.0],
        },
        NormalizedMatch {
            source: [0.0, 0.5],
            target: [0.0, 0.5],
        },
        NormalizedMatch {
            source: [-1.5, 0.5],
            target: [0.2, 0.2],
        },
    ]);
    let err = register(
        &radar,
        &optical,
        &matcher,
        &RegistrationConfig::default(),
        &Determinism::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::InsufficientMatches {
            stage: Stage::Filter,
            found: 3,
            required: 4,
        }
    );
}

struct FailingMatcher;

impl Matcher for FailingMatcher {
    fn match_images(
        &self,
        _source: &DisplayImage,
        _target: &DisplayImage,
        _sample_count: usize,
    ) -> RegistrationResult<Vec<NormalizedMatch>> {
        Err(RegistrationError::Matcher {
            reason: "model weights missing".to_string(),
        })
    }
}

#[test]
fn matcher_failure_propagates() {
    let radar = smooth_raster();
    let optical = DisplayImage::filled(WIDTH, HEIGHT, 3, 90).unwrap();
    let err = register(
        &radar,
        &optical,
        &FailingMatcher,
        &RegistrationConfig::default(),
        &Determinism::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::Matcher {
            reason: "model weights missing".to_string()
        }
    );
}

#[test]
fn runs_are_reproducible() {
    let radar = smooth_raster();
    let optical = to_display_intensity(&radar, &NormalizeConfig::default())
        .unwrap()
        .to_rgb();
    let mut pairs = grid_pairs(10);
    pairs.push(CorrespondencePair::new(
        Point2::new(10.0, 10.0),
        Point2::new(80.0, 60.0),
    ));
    let matcher = PrecomputedMatcher::from_pixel_pairs(&pairs, (WIDTH, HEIGHT), (WIDTH, HEIGHT));
    let cfg = RegistrationConfig::default();

    let a = register(&radar, &optical, &matcher, &cfg, &Determinism::initialize(7)).unwrap();
    let b = register(&radar, &optical, &matcher, &cfg, &Determinism::initialize(7)).unwrap();
    assert_eq!(a.estimate, b.estimate);
    assert_eq!(a.overlay, b.overlay);
    assert_eq!(a.matches_image, b.matches_image);
    assert_eq!(a.report.inliers, pairs.len() - 1);
}
