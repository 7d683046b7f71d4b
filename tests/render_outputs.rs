use sarreg::{
    match_color, render_matches, render_overlay, warp_perspective, DisplayImage, Homography,
    MatchStyle, Point2, RegistrationError, WarpedImage,
};

fn checker(width: usize, height: usize, cell: usize) -> DisplayImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(if (x / cell + y / cell) % 2 == 0 { 40 } else { 220 });
        }
    }
    DisplayImage::gray(data, width, height).unwrap()
}

#[test]
fn integer_translation_matches_manual_shift() {
    let src = checker(40, 30, 5);
    let h = Homography::from_row_slice(&[1.0, 0.0, 7.0, 0.0, 1.0, 3.0, 0.0, 0.0, 1.0]).unwrap();
    let warped = warp_perspective(&src, &h, 50, 40).unwrap();

    assert_eq!(warped.image().width(), 50);
    assert_eq!(warped.image().height(), 40);
    assert!(warped.valid_count() >= 39 * 29);
    assert!(warped.valid_count() <= 40 * 30);
    for y in 0..40 {
        for x in 0..50 {
            let footprint = (7..47).contains(&x) && (3..33).contains(&y);
            let interior = (7..46).contains(&x) && (3..32).contains(&y);
            if interior {
                assert!(warped.is_valid(x, y), "({x}, {y})");
            }
            if !footprint {
                assert!(!warped.is_valid(x, y), "({x}, {y})");
            }
            let value = warped.image().pixel(x, y).unwrap()[0];
            if warped.is_valid(x, y) {
                assert_eq!(value, src.pixel(x - 7, y - 3).unwrap()[0], "({x}, {y})");
            } else {
                assert_eq!(value, 0, "({x}, {y})");
            }
        }
    }
}

#[test]
fn overlay_blends_warped_footprint_only() {
    let base = DisplayImage::filled(20, 10, 3, 100).unwrap();
    let src = DisplayImage::filled(10, 10, 1, 200).unwrap();
    let warped = warp_perspective(&src, &Homography::identity(), 20, 10).unwrap();
    let out = render_overlay(&base, &warped, 0.5).unwrap();
    assert_eq!(out.pixel(5, 5), Some(&[150u8, 150, 150][..]));
    assert_eq!(out.pixel(15, 5), Some(&[100u8, 100, 100][..]));
}

#[test]
fn overlay_with_zero_alpha_is_base() {
    let base = checker(16, 16, 4).to_rgb();
    let warped = WarpedImage::new(DisplayImage::filled(16, 16, 1, 255).unwrap(), vec![true; 256])
        .unwrap();
    assert_eq!(render_overlay(&base, &warped, 0.0).unwrap(), base);
}

#[test]
fn warped_image_rejects_short_mask() {
    let image = DisplayImage::filled(4, 3, 3, 0).unwrap();
    let err = WarpedImage::new(image, vec![true; 11]).unwrap_err();
    assert_eq!(
        err,
        RegistrationError::InvalidInput("validity mask length differs from the pixel count")
    );
}

#[test]
fn only_max_shown_matches_are_drawn() {
    let a = DisplayImage::filled(60, 60, 1, 128).unwrap();
    let b = DisplayImage::filled(60, 60, 1, 128).unwrap();
    let pts_a = [Point2::new(10.0, 10.0), Point2::new(10.0, 50.0)];
    let pts_b = [Point2::new(10.0, 10.0), Point2::new(10.0, 50.0)];
    let style = MatchStyle::default();

    let one = render_matches(&a, &b, &pts_a, &pts_b, 1, &style).unwrap();
    assert_eq!(one.pixel(10, 10), Some(&match_color(0, 1)[..]));
    assert_eq!(one.pixel(70, 10), Some(&match_color(0, 1)[..]));
    assert_eq!(one.pixel(10, 50), Some(&[128u8, 128, 128][..]));

    let both = render_matches(&a, &b, &pts_a, &pts_b, 20, &style).unwrap();
    assert_eq!(both.pixel(10, 50), Some(&match_color(1, 2)[..]));
    assert_eq!((both.width(), both.height()), (120, 60));
}

#[test]
fn match_colors_are_distinct_and_stable() {
    let colors: Vec<[u8; 3]> = (0..6).map(|i| match_color(i, 6)).collect();
    for (i, a) in colors.iter().enumerate() {
        for b in &colors[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(match_color(3, 6), match_color(3, 6));
}
