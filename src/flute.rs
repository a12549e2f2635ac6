//! Pure mirror of the fluted-glass fragment shader.
//!
//! Every formula here matches the GLSL in [`crate::shaders`] constant for
//! constant, so the optics are testable without a GPU. The tuning values
//! (0.7 scale, exponent 6, 0.3 shadow scale) are empirical; they define the
//! feel of the size and shadow sliders and must not be "cleaned up".

use crate::params::RenderParams;
use crate::raster::RasterSurface;

/// Stripe density for a size slider value in [0, 1]. Steep inverse power
/// curve: density explodes as size approaches 0 and flattens toward 1.
pub fn effect_size(size: f32) -> f32 {
    1.0 / (0.7 * (size + 0.5)).powi(6)
}

/// "Cover" fit: rescale UV so the sampled region fills the target rect
/// without letterboxing, shrinking the wider axis around 0.5.
pub fn cover_uv(u: f32, v: f32, image_aspect: f32, screen_aspect: f32) -> (f32, f32) {
    if image_aspect > screen_aspect {
        let sx = screen_aspect / image_aspect;
        ((u - 0.5) * sx + 0.5, v)
    } else {
        let sy = image_aspect / screen_aspect;
        (u, (v - 0.5) * sy + 0.5)
    }
}

/// One stripe's worth of refraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripeSample {
    /// Final source x in [0, 1].
    pub sampled_x: f32,
    /// Raw cubic warp profile before the distortion mix.
    pub base: f32,
    pub stripe_index: f32,
}

/// Non-linear horizontal offset within a vertical glass rib.
pub fn stripe_sample(img_u: f32, size: f32, distortion: f32, shift: f32) -> StripeSample {
    let stripe_count = effect_size(size);
    let coord = img_u * stripe_count;
    let stripe_index = coord.floor();
    let frac_in_stripe = coord - stripe_index;

    let base = -(1.5 * frac_in_stripe).powi(3) + (0.5 + shift);
    let x_dist = 0.5 + (base - 0.5) * distortion;

    let sampled_x = ((stripe_index + x_dist) / stripe_count).clamp(0.0, 1.0);
    StripeSample { sampled_x, base, stripe_index }
}

/// Stripe-edge darkening factor applied to the sampled color.
pub fn shadow_factor(base: f32, shadow: f32) -> f32 {
    1.0 - (base - 0.5).abs() * (shadow * 0.3)
}

fn nine_tap_blur(surface: &RasterSurface, u: f32, v: f32, amount: f32) -> [f32; 4] {
    if amount <= 0.0 {
        return surface.sample(u, v);
    }
    let blur_size = amount * 0.01;
    let mut acc = [0.0f32; 4];
    for x in -1..=1 {
        for y in -1..=1 {
            let s = surface.sample(u + x as f32 * blur_size, v + y as f32 * blur_size);
            for c in 0..4 {
                acc[c] += s[c];
            }
        }
    }
    acc.map(|c| c / 9.0)
}

fn add_grain(rgb: &mut [f32; 3], grain: Option<&RasterSurface>, u: f32, v: f32, intensity: f32) {
    if intensity <= 0.0 {
        return;
    }
    if let Some(field) = grain {
        let value = field.sample(u, v)[0];
        let offset = (value - 0.5) * intensity;
        for c in rgb {
            *c += offset;
        }
    }
}

/// Reference evaluation of the full fragment pipeline at one screen UV.
/// `image_aspect` is the decoded image's aspect in image mode, the screen
/// aspect otherwise (which makes `cover_uv` the identity).
pub fn shade(
    surface: &RasterSurface,
    grain: Option<&RasterSurface>,
    params: &RenderParams,
    image_aspect: f32,
    u: f32,
    v: f32,
) -> [f32; 3] {
    let screen_aspect = params.resolution.aspect();
    let grain_intensity = params.grain_scaled();
    let (img_u, img_v) = cover_uv(u, v, image_aspect, screen_aspect);

    let m = params.margin.clamp(0.0, 0.49);
    if u < m || u > 1.0 - m || v < m || v > 1.0 - m {
        let color = surface.sample(img_u, img_v);
        let mut rgb = [color[0], color[1], color[2]];
        add_grain(&mut rgb, grain, u, v, grain_intensity);
        return rgb;
    }

    let stretched_v = (v - 0.5) / (1.0 + params.stretch) + 0.5;
    let (img_u, img_v) = cover_uv(u, stretched_v, image_aspect, screen_aspect);

    let stripe = stripe_sample(img_u, params.size, params.distortion, 0.0);

    let color = if params.blur > 0.0 {
        nine_tap_blur(surface, stripe.sampled_x, img_v, params.blur * 7.0)
    } else {
        surface.sample(stripe.sampled_x, img_v)
    };

    let darken = shadow_factor(stripe.base, params.shadow);
    let mut rgb = [color[0] * darken, color[1] * darken, color[2] * darken];
    add_grain(&mut rgb, grain, u, v, grain_intensity);
    rgb
}
