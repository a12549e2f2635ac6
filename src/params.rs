//! Render parameter snapshot and change classification.
//!
//! The render loop owns one [`RenderParams`] value and hands immutable
//! references down to the rasterizer and the GPU layer; nothing reaches
//! into ambient state. Updates fall into two tiers: uniform-only fields
//! are pushed straight to the shader, while texture-affecting fields force
//! a CPU raster pass and texture upload first. [`TextureKey`] is the
//! projection that decides which tier a change landed in.

use crate::color::Rgba8;
use crate::filter::FilterSettings;
use crate::palette::{default_palettes, GradientPalette};
use crate::shape::{ShapeSpec, WaveSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Full parameter snapshot, mirroring the UI store's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    // Uniform-only: pushed every draw, never re-rasterize.
    pub size: f32,
    pub distortion: f32,
    pub margin: f32,
    pub shadow: f32,
    pub stretch: f32,
    pub blur: f32,
    /// UI range 0-100; divided by 100 before reaching the shader.
    pub grain_intensity: f32,

    // Texture-affecting: any change here invalidates the main texture.
    pub resolution: Resolution,
    pub with_image: bool,
    pub image_src: String,
    pub is_gradient: bool,
    pub background_solid: String,
    pub current_palette: String,
    pub palettes: Vec<GradientPalette>,
    pub background_filters: FilterSettings,
    pub shape_filters: FilterSettings,
    pub shapes: Vec<ShapeSpec>,
    pub waves: Vec<WaveSpec>,
    /// Bumped whenever shape geometry is rerolled (add/remove/shuffle).
    pub geometry_epoch: u64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            size: 0.29,
            distortion: 0.5,
            margin: 0.0,
            shadow: 0.3,
            stretch: 0.0,
            blur: 0.0,
            grain_intensity: 0.0,
            resolution: Resolution { width: 1920, height: 1080 },
            with_image: false,
            image_src: String::new(),
            is_gradient: true,
            background_solid: "121216".to_string(),
            current_palette: "deep-space".to_string(),
            palettes: default_palettes(),
            background_filters: FilterSettings::default(),
            shape_filters: FilterSettings { blur: 40.0, ..FilterSettings::default() },
            shapes: Vec::new(),
            waves: Vec::new(),
            geometry_epoch: 0,
        }
    }
}

impl RenderParams {
    pub fn active_palette(&self) -> Option<&GradientPalette> {
        self.palettes.iter().find(|p| p.name == self.current_palette)
    }

    /// Colors for the background fill. Unparseable entries are dropped with
    /// a warning; an empty result falls back to black.
    pub fn background_colors(&self) -> Vec<Rgba8> {
        let hex_list: Vec<&str> = if self.is_gradient {
            self.active_palette()
                .map(|p| p.colors.iter().map(String::as_str).collect())
                .unwrap_or_default()
        } else {
            vec![self.background_solid.as_str()]
        };
        let mut colors: Vec<Rgba8> = hex_list
            .into_iter()
            .filter_map(|hex| match Rgba8::from_hex(hex) {
                Ok(c) => Some(c),
                Err(err) => {
                    log::warn!("skipping background color {hex:?}: {err}");
                    None
                }
            })
            .collect();
        if colors.is_empty() {
            colors.push(Rgba8::new(0, 0, 0, 0xff));
        }
        colors
    }

    /// Grain intensity as the shader expects it.
    pub fn grain_scaled(&self) -> f32 {
        self.grain_intensity / 100.0
    }

    pub fn palette_colors(&self, name: &str) -> Vec<Rgba8> {
        self.palettes
            .iter()
            .find(|p| p.name == name)
            .map(|p| {
                p.colors
                    .iter()
                    .filter_map(|hex| Rgba8::from_hex(hex).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The texture-affecting projection of a snapshot. Two snapshots with equal
/// keys render from the same main texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureKey {
    resolution: Resolution,
    with_image: bool,
    image_src: String,
    is_gradient: bool,
    background_solid: String,
    current_palette: String,
    palettes: Vec<GradientPalette>,
    background_filters: FilterSettings,
    shape_filters: FilterSettings,
    shapes: Vec<ShapeSpec>,
    waves: Vec<WaveSpec>,
    geometry_epoch: u64,
}

impl TextureKey {
    pub fn of(params: &RenderParams) -> Self {
        Self {
            resolution: params.resolution,
            with_image: params.with_image,
            image_src: params.image_src.clone(),
            is_gradient: params.is_gradient,
            background_solid: params.background_solid.clone(),
            current_palette: params.current_palette.clone(),
            palettes: params.palettes.clone(),
            background_filters: params.background_filters.clone(),
            shape_filters: params.shape_filters.clone(),
            shapes: params.shapes.clone(),
            waves: params.waves.clone(),
            geometry_epoch: params.geometry_epoch,
        }
    }
}

/// True when the main texture must be rebuilt before the next draw.
pub fn needs_raster(prev: Option<&TextureKey>, next: &TextureKey) -> bool {
    prev != Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a mutation sequence the way the render loop does and counts
    /// raster passes.
    fn raster_passes(mutations: &[fn(&mut RenderParams)]) -> usize {
        let mut params = RenderParams::default();
        let mut key = TextureKey::of(&params);
        let mut passes = 0;
        for m in mutations {
            m(&mut params);
            let next = TextureKey::of(&params);
            if needs_raster(Some(&key), &next) {
                passes += 1;
                key = next;
            }
        }
        passes
    }

    #[test]
    fn uniform_only_changes_never_trigger_raster() {
        let passes = raster_passes(&[
            |p| p.size = 0.7,
            |p| p.distortion = 0.1,
            |p| p.margin = 0.2,
            |p| p.shadow = 0.9,
            |p| p.stretch = 1.5,
            |p| p.blur = 0.4,
            |p| p.grain_intensity = 30.0,
        ]);
        assert_eq!(passes, 0);
    }

    #[test]
    fn texture_changes_each_trigger_exactly_one_raster() {
        let passes = raster_passes(&[
            |p| p.resolution = Resolution { width: 800, height: 600 },
            |p| p.is_gradient = false,
            |p| p.background_solid = "0A0A0A".to_string(),
            |p| p.current_palette = "ember".to_string(),
            |p| p.background_filters.saturation = 140.0,
            |p| p.shape_filters.blur = 10.0,
            |p| p.shapes.push(ShapeSpec::new("DC2525")),
            |p| p.geometry_epoch += 1,
            |p| p.with_image = true,
            |p| p.image_src = "data:image/png;base64,xyz".to_string(),
        ]);
        assert_eq!(passes, 10);
    }

    #[test]
    fn idempotent_updates_do_not_raster() {
        let passes = raster_passes(&[
            |p| p.background_solid = "121216".to_string(),
            |p| p.current_palette = "deep-space".to_string(),
        ]);
        assert_eq!(passes, 0);
    }

    #[test]
    fn first_draw_always_rasters() {
        let params = RenderParams::default();
        assert!(needs_raster(None, &TextureKey::of(&params)));
    }

    #[test]
    fn background_colors_fall_back_to_black() {
        let params = RenderParams {
            is_gradient: false,
            background_solid: "not-a-color".to_string(),
            ..Default::default()
        };
        assert_eq!(params.background_colors(), vec![Rgba8::new(0, 0, 0, 0xff)]);
    }

    #[test]
    fn solid_mode_uses_the_solid_color() {
        let params = RenderParams { is_gradient: false, ..Default::default() };
        assert_eq!(params.background_colors(), vec![Rgba8::from_hex("121216").unwrap()]);
    }

    #[test]
    fn gradient_mode_resolves_active_palette() {
        let params = RenderParams::default();
        assert_eq!(params.background_colors().len(), 11);
    }
}
