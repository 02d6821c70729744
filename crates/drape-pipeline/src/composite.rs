//! Alpha compositing of the warped garment over the body photograph.

use image::{Rgba, RgbaImage};

use crate::types::PipelineError;

/// Porter-Duff "over" for one pair of straight-alpha pixels.
///
/// For an opaque background this reduces to
/// `garment * alpha + body * (1 - alpha)` per colour channel.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn over(fg: Rgba<u8>, bg: Rgba<u8>) -> Rgba<u8> {
    match fg[3] {
        0 => return bg,
        u8::MAX => return fg,
        _ => {}
    }
    let fa = f64::from(fg[3]) / 255.0;
    let ba = f64::from(bg[3]) / 255.0;
    let out_a = ba.mul_add(1.0 - fa, fa);
    let mut out = [0_u8; 4];
    for c in 0..3 {
        let blended = f64::from(fg[c])
            .mul_add(fa, f64::from(bg[c]) * ba * (1.0 - fa))
            / out_a;
        out[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Composite `garment` over `body`, producing a new raster.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the two rasters differ
/// in size; warp engines always produce a body-sized canvas.
pub fn composite_over(garment: &RgbaImage, body: &RgbaImage) -> Result<RgbaImage, PipelineError> {
    if garment.dimensions() != body.dimensions() {
        return Err(PipelineError::InvalidConfig(format!(
            "garment canvas is {:?} but body is {:?}",
            garment.dimensions(),
            body.dimensions()
        )));
    }
    let mut out = body.clone();
    for (o, g) in out.pixels_mut().zip(garment.pixels()) {
        *o = over(*g, *o);
    }
    Ok(out)
}
