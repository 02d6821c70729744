//! Integration tests: run in-memory garment and body images through
//! `try_on` with deterministic providers.

#![allow(clippy::unwrap_used)]

use drape_pipeline::{
    AlphaChannel, BodyLandmarks, ExternalMask, FixedLandmarks, NoLandmarks, PipelineError, Point,
    TryOnConfig, WarpEngineKind, WarpFailurePolicy, try_on,
};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};

const GARMENT: Rgba<u8> = Rgba([240, 200, 10, 255]);
const SKIN: Rgba<u8> = Rgba([90, 60, 40, 255]);

fn encode(img: DynamicImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A T-shirt-ish silhouette: a wide top band and a narrower body.
fn shirt() -> Vec<u8> {
    encode(DynamicImage::ImageRgba8(RgbaImage::from_fn(160, 200, |x, y| {
        let top = y < 60 && (5..155).contains(&x);
        let body = (60..195).contains(&y) && (30..130).contains(&x);
        if top || body { GARMENT } else { Rgba([0, 0, 0, 0]) }
    })))
}

fn person() -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        480,
        480,
        Rgb([SKIN[0], SKIN[1], SKIN[2]]),
    )))
}

fn standing() -> FixedLandmarks {
    FixedLandmarks(BodyLandmarks::torso(
        Point::new(160.0, 120.0),
        Point::new(320.0, 120.0),
        Point::new(180.0, 320.0),
        Point::new(300.0, 320.0),
    ))
}

#[test]
fn both_engines_dress_the_torso() {
    for engine in [WarpEngineKind::PiecewiseAffine, WarpEngineKind::ThinPlateSpline] {
        let config = TryOnConfig {
            engine,
            ..TryOnConfig::default()
        };
        let out = try_on(&shirt(), &person(), &AlphaChannel, &standing(), &config).unwrap();
        assert_eq!(out.report.matched_keypoint_count, 16);
        assert!(out.report.body_detected);
        assert_eq!((out.composite.width(), out.composite.height()), (480, 480));
        // Centre chest: (240, 120 + 0.2 * 200).
        assert_eq!(*out.composite.get_pixel(240, 160), GARMENT, "{engine:?}");
        assert_eq!(*out.composite.get_pixel(5, 470), SKIN, "{engine:?}");
        // The warped canvas alone is transparent away from the garment.
        assert_eq!(out.warped.get_pixel(5, 470)[3], 0);
    }
}

#[test]
fn transparent_garment_has_no_mask() {
    let blank = encode(DynamicImage::ImageRgba8(RgbaImage::new(50, 50)));
    let result = try_on(&blank, &person(), &AlphaChannel, &standing(), &TryOnConfig::default());
    assert!(matches!(result, Err(PipelineError::NoGarmentMask)));
}

#[test]
fn garment_without_alpha_has_no_mask() {
    let opaque = encode(DynamicImage::ImageRgb8(RgbImage::new(50, 50)));
    let result = try_on(&opaque, &person(), &AlphaChannel, &standing(), &TryOnConfig::default());
    assert!(matches!(result, Err(PipelineError::NoGarmentMask)));
}

#[test]
fn external_mask_segments_an_opaque_photo() {
    let photo = encode(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        100,
        100,
        Rgb([GARMENT[0], GARMENT[1], GARMENT[2]]),
    )));
    let mut mask = GrayImage::new(100, 100);
    for y in 10..90 {
        for x in 10..90 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    let out = try_on(
        &photo,
        &person(),
        &ExternalMask::new(mask),
        &standing(),
        &TryOnConfig::default(),
    )
    .unwrap();
    assert_eq!(*out.composite.get_pixel(240, 160), GARMENT);
}

#[test]
fn body_without_landmarks_is_reported() {
    let result = try_on(&shirt(), &person(), &AlphaChannel, &NoLandmarks, &TryOnConfig::default());
    assert!(matches!(result, Err(PipelineError::NoPoseDetected)));
}

#[test]
fn single_column_garment_cannot_be_warped() {
    // A one-pixel-wide silhouette puts every anchor on one vertical line.
    let sliver = encode(DynamicImage::ImageRgba8(RgbaImage::from_fn(20, 40, |x, _| {
        if x == 7 { GARMENT } else { Rgba([0, 0, 0, 0]) }
    })));
    for engine in [WarpEngineKind::PiecewiseAffine, WarpEngineKind::ThinPlateSpline] {
        let config = TryOnConfig {
            engine,
            ..TryOnConfig::default()
        };
        let result = try_on(&sliver, &person(), &AlphaChannel, &standing(), &config);
        assert!(
            matches!(result, Err(PipelineError::WarpComputation(_))),
            "{engine:?}"
        );
    }
}

/// Hips collapsed onto the shoulder line: the hem anchors coincide.
fn crouched() -> FixedLandmarks {
    FixedLandmarks(BodyLandmarks::torso(
        Point::new(160.0, 120.0),
        Point::new(320.0, 120.0),
        Point::new(240.0, 120.0),
        Point::new(240.0, 120.0),
    ))
}

#[test]
fn warp_failure_is_terminal_by_default() {
    let config = TryOnConfig {
        engine: WarpEngineKind::ThinPlateSpline,
        ..TryOnConfig::default()
    };
    let result = try_on(&shirt(), &person(), &AlphaChannel, &crouched(), &config);
    assert!(matches!(result, Err(PipelineError::WarpComputation(_))));
}

#[test]
fn warp_failure_can_fall_back_to_overlay() {
    let config = TryOnConfig {
        engine: WarpEngineKind::ThinPlateSpline,
        on_warp_failure: WarpFailurePolicy::FallbackToSimpleOverlay,
        ..TryOnConfig::default()
    };
    let out = try_on(&shirt(), &person(), &AlphaChannel, &crouched(), &config).unwrap();
    let placement = out.report.overlay.unwrap();
    // 160 px shoulders * 1.4 = 224 px wide; garment is 160 px wide.
    assert!((placement.scale - 1.4).abs() < 1e-9);
    assert_eq!(placement.garment_output_size.width, 224);
    assert_eq!(placement.position.0, 240 - 112);
    assert_eq!(*out.composite.get_pixel(240, 200), GARMENT);
}

#[test]
fn unsupported_garment_kind_is_rejected() {
    let config = TryOnConfig {
        garment_kind: drape_pipeline::GarmentKind::Shoes,
        ..TryOnConfig::default()
    };
    let result = try_on(&shirt(), &person(), &AlphaChannel, &standing(), &config);
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
}

#[test]
fn empty_body_bytes_are_rejected() {
    let result = try_on(&shirt(), &[], &AlphaChannel, &standing(), &TryOnConfig::default());
    assert!(matches!(result, Err(PipelineError::EmptyInput)));
}
