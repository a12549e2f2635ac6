//! CSS-style filter stack applied to raster layers.
//!
//! Matches the `blur(Npx) brightness(B%) contrast(C%) saturate(S%)` string
//! the original canvas pipeline used, in that order. Blur is a three-pass
//! box approximation of a gaussian with sigma = N px; a zero blur is
//! skipped outright rather than run as `blur(0px)`, which several 2D
//! backends silently no-op in inconsistent ways.

use tiny_skia::Pixmap;

use crate::color::{LUMA_B, LUMA_G, LUMA_R};

/// Per-layer filter settings. Percent fields use CSS semantics: 100 is the
/// identity.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSettings {
    /// Gaussian sigma in pixels. 0 disables the blur pass.
    pub blur: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self { blur: 0.0, brightness: 100.0, contrast: 100.0, saturation: 100.0 }
    }
}

impl FilterSettings {
    pub fn is_identity(&self) -> bool {
        self.blur <= 0.0
            && (self.brightness - 100.0).abs() < f32::EPSILON
            && (self.contrast - 100.0).abs() < f32::EPSILON
            && (self.saturation - 100.0).abs() < f32::EPSILON
    }

    pub fn apply(&self, pixmap: &mut Pixmap) {
        if self.blur > 0.0 {
            blur(pixmap, self.blur);
        }
        let brightness = self.brightness / 100.0;
        let contrast = self.contrast / 100.0;
        let saturation = self.saturation / 100.0;
        let color_pass = (brightness - 1.0).abs() >= f32::EPSILON
            || (contrast - 1.0).abs() >= f32::EPSILON
            || (saturation - 1.0).abs() >= f32::EPSILON;
        if !color_pass {
            return;
        }

        for px in pixmap.data_mut().chunks_exact_mut(4) {
            let a = px[3] as f32 / 255.0;
            if a == 0.0 {
                continue;
            }
            // tiny-skia stores premultiplied alpha; color math wants straight.
            let mut rgb = [
                px[0] as f32 / 255.0 / a,
                px[1] as f32 / 255.0 / a,
                px[2] as f32 / 255.0 / a,
            ];
            for c in &mut rgb {
                *c *= brightness;
                *c = (*c - 0.5) * contrast + 0.5;
            }
            let luma = LUMA_R * rgb[0] + LUMA_G * rgb[1] + LUMA_B * rgb[2];
            for c in &mut rgb {
                *c = luma + (*c - luma) * saturation;
            }
            for (slot, c) in px[..3].iter_mut().zip(rgb) {
                *slot = (c.clamp(0.0, 1.0) * a * 255.0).round() as u8;
            }
        }
    }
}

/// Box sizes whose triple application approximates a gaussian of the given
/// sigma (the usual ideal-filter-width derivation).
fn box_radii(sigma: f32) -> [usize; 3] {
    let ideal = (12.0 * sigma * sigma / 3.0 + 1.0).sqrt();
    let mut wl = ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wu = wl + 2;
    let m_ideal = (12.0 * sigma * sigma - (3 * wl * wl + 12 * wl + 9) as f32)
        / (-4 * wl - 4) as f32;
    let m = m_ideal.round() as i32;
    let mut radii = [0usize; 3];
    for (i, r) in radii.iter_mut().enumerate() {
        let w = if (i as i32) < m { wl } else { wu };
        *r = (w.max(1) as usize - 1) / 2;
    }
    radii
}

fn blur(pixmap: &mut Pixmap, sigma: f32) {
    let w = pixmap.width() as usize;
    let h = pixmap.height() as usize;
    if w == 0 || h == 0 {
        return;
    }
    let mut scratch = vec![0u8; w * h * 4];
    for radius in box_radii(sigma) {
        if radius == 0 {
            continue;
        }
        box_blur_axis(pixmap.data_mut(), &mut scratch, w, h, radius, true);
        box_blur_axis(pixmap.data_mut(), &mut scratch, w, h, radius, false);
    }
}

/// One box pass along an axis with edge clamping, running-sum style.
fn box_blur_axis(data: &mut [u8], scratch: &mut [u8], w: usize, h: usize, radius: usize, horizontal: bool) {
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let idx = |line: usize, i: usize| -> usize {
        if horizontal {
            (line * w + i) * 4
        } else {
            (i * w + line) * 4
        }
    };
    let norm = (2 * radius + 1) as u32;
    let r = radius as i32;
    let clamp = |i: i32| i.clamp(0, len as i32 - 1) as usize;

    for line in 0..lines {
        // clamped window [-r, r] around index 0
        let mut sum = [0u32; 4];
        for j in -r..=r {
            let p = idx(line, clamp(j));
            for c in 0..4 {
                sum[c] += data[p + c] as u32;
            }
        }

        for i in 0..len as i32 {
            let out = idx(line, i as usize);
            for c in 0..4 {
                scratch[out + c] = (sum[c] / norm) as u8;
            }
            let add = idx(line, clamp(i + r + 1));
            let sub = idx(line, clamp(i - r));
            for c in 0..4 {
                sum[c] += data[add + c] as u32;
                sum[c] -= data[sub + c] as u32;
            }
        }
    }
    data.copy_from_slice(scratch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn flat(r: u8, g: u8, b: u8) -> Pixmap {
        let mut pm = Pixmap::new(16, 16).unwrap();
        pm.fill(Color::from_rgba8(r, g, b, 255));
        pm
    }

    #[test]
    fn identity_settings_change_nothing() {
        let mut pm = flat(30, 90, 200);
        let before = pm.data().to_vec();
        FilterSettings::default().apply(&mut pm);
        assert_eq!(pm.data(), &before[..]);
        assert!(FilterSettings::default().is_identity());
    }

    #[test]
    fn zero_blur_is_skipped_not_applied() {
        let settings = FilterSettings { blur: 0.0, ..Default::default() };
        assert!(settings.is_identity());
    }

    #[test]
    fn brightness_scales_channels() {
        let mut pm = flat(100, 100, 100);
        FilterSettings { brightness: 50.0, ..Default::default() }.apply(&mut pm);
        let px = &pm.data()[..4];
        assert!((px[0] as i32 - 50).abs() <= 1);
    }

    #[test]
    fn saturate_zero_is_grayscale() {
        let mut pm = flat(255, 0, 0);
        FilterSettings { saturation: 0.0, ..Default::default() }.apply(&mut pm);
        let px = &pm.data()[..4];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        // red luminance weight
        assert!((px[0] as f32 - LUMA_R * 255.0).abs() <= 2.0);
    }

    #[test]
    fn contrast_pivots_around_half() {
        let mut pm = flat(128, 128, 128);
        FilterSettings { contrast: 200.0, ..Default::default() }.apply(&mut pm);
        let px = &pm.data()[..4];
        assert!((px[0] as i32 - 128).abs() <= 2);
    }

    #[test]
    fn blur_preserves_flat_regions_and_softens_edges() {
        let mut pm = Pixmap::new(32, 32).unwrap();
        pm.fill(Color::BLACK);
        // white right half
        for y in 0..32usize {
            for x in 16..32usize {
                let i = (y * 32 + x) * 4;
                pm.data_mut()[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        FilterSettings { blur: 3.0, ..Default::default() }.apply(&mut pm);
        let at = |x: usize, y: usize| pm.data()[(y * 32 + x) * 4];
        // far from the edge the halves stay near their original values
        assert!(at(2, 16) < 30);
        assert!(at(29, 16) > 225);
        // the edge itself is now a ramp
        let edge = at(16, 16);
        assert!(edge > 40 && edge < 215, "edge value {edge}");
    }
}
