//! Correspondences between the radar (source) and optical (target) images.
//!
//! The dense matcher is an external collaborator behind [`Matcher`]. It
//! reports points in the normalized `[-1, 1]` interval of each image; those are
//! converted to pixel coordinates (`x` = column, `y` = row) and filtered. An
//! unmatched point is reported either through a negative coordinate or through
//! the explicit `valid` flag; both are dropped by [`filter_valid`].

use crate::image::DisplayImage;
use crate::trace::trace_event;
use crate::util::{RegistrationError, RegistrationResult, Stage};

/// Minimum number of correspondences that determine a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Pixel coordinate, `x` along columns and `y` along rows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both components are finite and non-negative.
    pub fn is_non_negative(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0
    }

    pub(crate) fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Source/target pixel correspondence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrespondencePair {
    /// Point in the radar image.
    pub source: Point2,
    /// Point in the optical image.
    pub target: Point2,
    /// Explicit validity reported by the matcher.
    pub valid: bool,
}

impl CorrespondencePair {
    /// Creates a pair marked valid.
    pub const fn new(source: Point2, target: Point2) -> Self {
        Self {
            source,
            target,
            valid: true,
        }
    }

    /// Returns `true` if the pair is usable for estimation.
    pub fn is_valid(&self) -> bool {
        self.valid && self.source.is_non_negative() && self.target.is_non_negative()
    }
}

/// Matcher output in normalized image coordinates (`[-1, 1]` on both axes).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedMatch {
    /// Normalized `[x, y]` in the source image.
    pub source: [f32; 2],
    /// Normalized `[x, y]` in the target image.
    pub target: [f32; 2],
}

/// Dense correspondence generator.
///
/// Implementations receive the radar display image (RGB) and the enhanced
/// optical image, and return up to `sample_count` matches.
pub trait Matcher {
    fn match_images(
        &self,
        source: &DisplayImage,
        target: &DisplayImage,
        sample_count: usize,
    ) -> RegistrationResult<Vec<NormalizedMatch>>;
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn match_images(
        &self,
        source: &DisplayImage,
        target: &DisplayImage,
        sample_count: usize,
    ) -> RegistrationResult<Vec<NormalizedMatch>> {
        (**self).match_images(source, target, sample_count)
    }
}

/// Matcher that replays a fixed list of matches, e.g. exported from an
/// offline run of a learned dense matcher.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedMatcher {
    matches: Vec<NormalizedMatch>,
}

impl PrecomputedMatcher {
    /// Wraps a list of normalized matches.
    pub fn new(matches: Vec<NormalizedMatch>) -> Self {
        Self { matches }
    }

    /// Builds normalized matches from pixel pairs in images of the given sizes.
    pub fn from_pixel_pairs(
        pairs: &[CorrespondencePair],
        source_size: (usize, usize),
        target_size: (usize, usize),
    ) -> Self {
        let matches = pairs
            .iter()
            .map(|p| NormalizedMatch {
                source: to_normalized(p.source, source_size),
                target: to_normalized(p.target, target_size),
            })
            .collect();
        Self { matches }
    }

    /// Returns the stored matches.
    pub fn matches(&self) -> &[NormalizedMatch] {
        &self.matches
    }
}

impl Matcher for PrecomputedMatcher {
    fn match_images(
        &self,
        _source: &DisplayImage,
        _target: &DisplayImage,
        sample_count: usize,
    ) -> RegistrationResult<Vec<NormalizedMatch>> {
        let n = sample_count.min(self.matches.len());
        Ok(self.matches[..n].to_vec())
    }
}

fn to_normalized(p: Point2, (width, height): (usize, usize)) -> [f32; 2] {
    [
        (2.0 * p.x / width as f64 - 1.0) as f32,
        (2.0 * p.y / height as f64 - 1.0) as f32,
    ]
}

fn to_pixel(p: [f32; 2], (width, height): (usize, usize)) -> Point2 {
    Point2::new(
        width as f64 * (f64::from(p[0]) + 1.0) / 2.0,
        height as f64 * (f64::from(p[1]) + 1.0) / 2.0,
    )
}

/// Converts normalized matches into pixel correspondences.
///
/// Sizes are `(width, height)`. Matches with non-finite coordinates are kept
/// but flagged invalid so the output stays parallel to the input.
pub fn to_pixel_pairs(
    matches: &[NormalizedMatch],
    source_size: (usize, usize),
    target_size: (usize, usize),
) -> Vec<CorrespondencePair> {
    matches
        .iter()
        .map(|m| {
            let finite = m.source.iter().chain(&m.target).all(|v| v.is_finite());
            CorrespondencePair {
                source: to_pixel(m.source, source_size),
                target: to_pixel(m.target, target_size),
                valid: finite,
            }
        })
        .collect()
}

/// Drops invalid pairs, preserving the order of the survivors.
///
/// Fails with `InsufficientMatches` when fewer than four pairs remain.
pub fn filter_valid(raw: &[CorrespondencePair]) -> RegistrationResult<Vec<CorrespondencePair>> {
    let kept: Vec<CorrespondencePair> = raw.iter().copied().filter(|p| p.is_valid()).collect();
    trace_event!("filter", raw = raw.len(), valid = kept.len());
    if kept.len() < MIN_CORRESPONDENCES {
        return Err(RegistrationError::InsufficientMatches {
            stage: Stage::Filter,
            found: kept.len(),
            required: MIN_CORRESPONDENCES,
        });
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_corners_map_to_image_extent() {
        let matches = [NormalizedMatch {
            source: [-1.0, -1.0],
            target: [1.0, 1.0],
        }];
        let pairs = to_pixel_pairs(&matches, (100, 50), (640, 480));
        assert_eq!(pairs[0].source, Point2::new(0.0, 0.0));
        assert_eq!(pairs[0].target, Point2::new(640.0, 480.0));
        assert!(pairs[0].valid);
    }

    #[test]
    fn out_of_interval_coordinates_become_negative_sentinels() {
        let matches = [NormalizedMatch {
            source: [-1.5, 0.0],
            target: [0.0, 0.0],
        }];
        let pairs = to_pixel_pairs(&matches, (10, 10), (10, 10));
        assert!(pairs[0].source.x < 0.0);
        assert!(!pairs[0].is_valid());
    }

    #[test]
    fn non_finite_matches_are_flagged() {
        let matches = [NormalizedMatch {
            source: [f32::NAN, 0.0],
            target: [0.0, 0.0],
        }];
        let pairs = to_pixel_pairs(&matches, (10, 10), (10, 10));
        assert!(!pairs[0].valid);
    }

    #[test]
    fn precomputed_matcher_truncates_to_sample_count() {
        let pairs: Vec<CorrespondencePair> = (0..6)
            .map(|i| {
                let p = Point2::new(i as f64, i as f64);
                CorrespondencePair::new(p, p)
            })
            .collect();
        let matcher = PrecomputedMatcher::from_pixel_pairs(&pairs, (8, 8), (8, 8));
        let img = DisplayImage::filled(8, 8, 3, 0).unwrap();
        let out = matcher.match_images(&img, &img, 4).unwrap();
        assert_eq!(out.len(), 4);
        let back = to_pixel_pairs(&out, (8, 8), (8, 8));
        assert!((back[3].source.x - 3.0).abs() < 1e-5);
    }
}
