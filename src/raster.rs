//! Off-screen compositing of the procedural background.
//!
//! Output is the literal pixel source for the GPU main texture whenever the
//! renderer is not in image mode: background fill (solid or gradient) under
//! its filter stack, then each blob under the shape filter stack, then wave
//! bands blended with `lighten` and a heavy blur.

use thiserror::Error;
use tiny_skia::{BlendMode, FillRule, Paint, Pixmap, PixmapPaint, Rect, Transform};

use crate::color::Rgba8;
use crate::filter::FilterSettings;
use crate::palette::{gradient_shader, GradientDirection};
use crate::params::RenderParams;
use crate::rng::Pcg32;
use crate::shape::{generate_wave, ShapeInstance};

/// Sigma for the soft wave bands. Waves are always drawn heavily blurred;
/// this is part of their look, not a user filter.
const WAVE_BLUR_SIGMA: f32 = 48.0;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// RGBA8 raster, row-major, y-down. The composited result is fully opaque,
/// so premultiplied and straight alpha coincide on the way to the GPU.
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(RasterError::InvalidDimensions { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_mut()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = ((y * self.width() + x) * 4) as usize;
        let d = self.data();
        Rgba8::new(d[i], d[i + 1], d[i + 2], d[i + 3])
    }

    /// Bilinear sample at normalized (u, v), clamp-to-edge, matching the
    /// LINEAR/CLAMP_TO_EDGE sampling the shader sees. Returns 0..1 RGBA.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let w = self.width() as f32;
        let h = self.height() as f32;
        let x = (u.clamp(0.0, 1.0) * w - 0.5).clamp(0.0, w - 1.0);
        let y = (v.clamp(0.0, 1.0) * h - 0.5).clamp(0.0, h - 1.0);
        let (x0, y0) = (x.floor() as u32, y.floor() as u32);
        let x1 = (x0 + 1).min(self.width() - 1);
        let y1 = (y0 + 1).min(self.height() - 1);
        let (fx, fy) = (x - x0 as f32, y - y0 as f32);

        let lerp = |a: Rgba8, b: Rgba8, t: f32| -> [f32; 4] {
            [
                (a.r as f32 + (b.r as f32 - a.r as f32) * t) / 255.0,
                (a.g as f32 + (b.g as f32 - a.g as f32) * t) / 255.0,
                (a.b as f32 + (b.b as f32 - a.b as f32) * t) / 255.0,
                (a.a as f32 + (b.a as f32 - a.a as f32) * t) / 255.0,
            ]
        };
        let top = lerp(self.pixel(x0, y0), self.pixel(x1, y0), fx);
        let bot = lerp(self.pixel(x0, y1), self.pixel(x1, y1), fx);
        [
            top[0] + (bot[0] - top[0]) * fy,
            top[1] + (bot[1] - top[1]) * fy,
            top[2] + (bot[2] - top[2]) * fy,
            top[3] + (bot[3] - top[3]) * fy,
        ]
    }
}

/// Compose the full procedural background for the current snapshot.
pub fn rasterize(
    params: &RenderParams,
    shapes: &[ShapeInstance],
    rng: &mut Pcg32,
) -> Result<RasterSurface, RasterError> {
    let width = params.resolution.width;
    let height = params.resolution.height;
    let mut surface = RasterSurface::new(width, height)?;

    fill_background(&mut surface.pixmap, params)?;

    for shape in shapes {
        draw_shape(&mut surface.pixmap, shape, &params.shape_filters)?;
    }

    for wave in &params.waves {
        draw_wave(&mut surface.pixmap, params, wave, rng)?;
    }

    log::debug!(
        "rasterized {}x{} background ({} shapes, {} waves)",
        width,
        height,
        shapes.len(),
        params.waves.len()
    );
    Ok(surface)
}

fn full_rect(pixmap: &Pixmap) -> Rect {
    // dimensions are validated at surface creation
    Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
        .expect("non-empty pixmap rect")
}

fn fill_background(target: &mut Pixmap, params: &RenderParams) -> Result<(), RasterError> {
    let colors = params.background_colors();
    let mut paint = Paint::default();
    paint.shader = gradient_shader(
        &colors,
        GradientDirection::Horizontal,
        target.width() as f32,
        target.height() as f32,
    );
    paint.anti_alias = false;

    if params.background_filters.is_identity() {
        target.fill_rect(full_rect(target), &paint, Transform::identity(), None);
        return Ok(());
    }

    let mut layer = Pixmap::new(target.width(), target.height())
        .ok_or(RasterError::InvalidDimensions { width: target.width(), height: target.height() })?;
    layer.fill_rect(full_rect(&layer), &paint, Transform::identity(), None);
    params.background_filters.apply(&mut layer);
    target.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    Ok(())
}

fn draw_shape(
    target: &mut Pixmap,
    shape: &ShapeInstance,
    filters: &FilterSettings,
) -> Result<(), RasterError> {
    let Some(path) = shape.geometry.path() else {
        log::warn!("blob with degenerate point ring skipped");
        return Ok(());
    };
    let mut paint = Paint::default();
    paint.set_color(shape.color.to_skia());
    paint.anti_alias = true;
    let transform = shape.geometry.transform();

    if filters.is_identity() {
        target.fill_path(&path, &paint, FillRule::Winding, transform, None);
        return Ok(());
    }

    let mut layer = Pixmap::new(target.width(), target.height())
        .ok_or(RasterError::InvalidDimensions { width: target.width(), height: target.height() })?;
    layer.fill_path(&path, &paint, FillRule::Winding, transform, None);
    filters.apply(&mut layer);
    target.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    Ok(())
}

fn draw_wave(
    target: &mut Pixmap,
    params: &RenderParams,
    wave: &crate::shape::WaveSpec,
    rng: &mut Pcg32,
) -> Result<(), RasterError> {
    let (w, h) = (target.width() as f32, target.height() as f32);
    let geometry = generate_wave(h, rng);
    let Some(path) = geometry.path(wave.origin, w, h) else {
        return Ok(());
    };

    let colors = params.palette_colors(&wave.palette);
    if colors.is_empty() {
        log::warn!("wave references unknown palette {:?}", wave.palette);
        return Ok(());
    }

    let mut paint = Paint::default();
    paint.shader = gradient_shader(&colors, GradientDirection::Diagonal, w, h);
    paint.anti_alias = true;

    let mut layer = Pixmap::new(target.width(), target.height())
        .ok_or(RasterError::InvalidDimensions { width: target.width(), height: target.height() })?;
    layer.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    FilterSettings { blur: WAVE_BLUR_SIGMA, ..FilterSettings::default() }.apply(&mut layer);

    let wave_paint = PixmapPaint { blend_mode: BlendMode::Lighten, ..PixmapPaint::default() };
    target.draw_pixmap(0, 0, layer.as_ref(), &wave_paint, Transform::identity(), None);
    Ok(())
}
