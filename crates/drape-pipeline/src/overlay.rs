//! Simple overlay: scale the unwarped garment to the shoulders.
//!
//! Used in place of a warp when the caller's failure policy asks for
//! it. The garment is scaled uniformly so its width is a multiple of
//! the shoulder width, centred on the shoulders, and lifted so the
//! collar sits above the shoulder line.

use image::RgbaImage;
use image::imageops::FilterType;

use crate::landmarks::BodyLandmarks;
use crate::types::{Dimensions, OverlayPlacement, PipelineError, TryOnConfig};

/// Place `garment` onto a transparent canvas of size `canvas`.
///
/// Pixels that fall outside the canvas are clipped.
///
/// # Errors
///
/// Returns [`PipelineError::WarpComputation`] if the scaled garment
/// would be empty (e.g. zero shoulder width) or absurdly large.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn overlay_garment(
    garment: &RgbaImage,
    body: &BodyLandmarks,
    canvas: Dimensions,
    config: &TryOnConfig,
) -> Result<(RgbaImage, OverlayPlacement), PipelineError> {
    let target_width = (body.shoulder_width() * config.overlay_width_ratio).floor();
    let scale = target_width / f64::from(garment.width());
    let new_w = (f64::from(garment.width()) * scale).floor();
    let new_h = (f64::from(garment.height()) * scale).floor();
    if !(new_w >= 1.0 && new_h >= 1.0 && new_w <= f64::from(u32::MAX) && new_h <= f64::from(u32::MAX)) {
        return Err(PipelineError::WarpComputation(format!(
            "overlay garment would be {new_w}x{new_h} pixels"
        )));
    }
    let (new_w, new_h) = (new_w as u32, new_h as u32);

    let center = body.shoulder_center();
    let x = (center.x - f64::from(new_w / 2)).floor() as i64;
    let y = (center.y - (f64::from(new_h) * config.overlay_lift_ratio).floor()).floor() as i64;

    let resized = image::imageops::resize(garment, new_w, new_h, FilterType::Lanczos3);
    let mut layer = RgbaImage::new(canvas.width, canvas.height);
    image::imageops::replace(&mut layer, &resized, x, y);

    let placement = OverlayPlacement {
        scale,
        position: (x, y),
        garment_output_size: Dimensions {
            width: new_w,
            height: new_h,
        },
    };
    log::debug!("overlay placement {placement:?}");
    Ok((layer, placement))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;
    use image::Rgba;

    use super::*;
    use crate::types::Point;

    fn body() -> BodyLandmarks {
        BodyLandmarks::torso(
            Point::new(100.0, 50.0),
            Point::new(300.0, 50.0),
            Point::new(120.0, 250.0),
            Point::new(280.0, 250.0),
        )
    }

    #[test]
    fn garment_is_scaled_to_shoulders() {
        let garment = RgbaImage::from_pixel(100, 120, Rgba([0, 200, 0, 255]));
        let canvas = Dimensions {
            width: 400,
            height: 400,
        };
        let (layer, placement) =
            overlay_garment(&garment, &body(), canvas, &TryOnConfig::default()).unwrap();

        // 200 px shoulders * 1.4 = 280 px wide.
        assert_relative_eq!(placement.scale, 2.8);
        assert_eq!(
            placement.garment_output_size,
            Dimensions {
                width: 280,
                height: 336
            }
        );
        // Centred on x = 200, lifted by 15% of 336 = 50 px.
        assert_eq!(placement.position, (60, 0));
        assert_eq!(Dimensions::of(&layer), canvas);
        assert_eq!(layer.get_pixel(200, 100)[3], 255);
        assert_eq!(layer.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn overhang_is_clipped() {
        let garment = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let canvas = Dimensions {
            width: 100,
            height: 100,
        };
        let (layer, placement) =
            overlay_garment(&garment, &body(), canvas, &TryOnConfig::default()).unwrap();
        assert!(placement.position.0 + i64::from(placement.garment_output_size.width) > 100);
        assert_eq!(Dimensions::of(&layer), canvas);
        assert_eq!(layer.get_pixel(99, 50)[3], 255);
    }

    #[test]
    fn zero_shoulder_width_fails() {
        let mut b = body();
        b.right_shoulder = b.left_shoulder;
        let garment = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let result = overlay_garment(
            &garment,
            &b,
            Dimensions {
                width: 10,
                height: 10,
            },
            &TryOnConfig::default(),
        );
        assert!(matches!(result, Err(PipelineError::WarpComputation(_))));
    }
}
