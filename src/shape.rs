//! Procedural blob and wave geometry.
//!
//! Blobs are irregular stretched rings turned into closed Catmull-Rom
//! style cubic paths. Creation is two-phase: a [`ShapeSpec`] only carries
//! the fill color; [`materialize`] rolls the geometry for a given canvas
//! size. Drawing never mutates a shape, so a raster pass is a pure read.

use tiny_skia::{Path, PathBuilder, Transform};

use crate::color::{ColorError, Rgba8};
use crate::rng::Pcg32;

/// One generated blob in local (pre-rotation, pre-translation) space.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobGeometry {
    pub center: (f32, f32),
    pub radius: f32,
    pub stretch_y: f32,
    /// Radians.
    pub rotation: f32,
    pub points: Vec<(f32, f32)>,
}

/// Shape as configured in the UI: just a hex color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSpec {
    pub color: String,
}

impl ShapeSpec {
    pub fn new(color: impl Into<String>) -> Self {
        Self { color: color.into() }
    }
}

/// Shape ready to draw: parsed color plus rolled geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInstance {
    pub color: Rgba8,
    pub geometry: BlobGeometry,
}

/// Roll geometry for a spec. Called once when a shape enters the list and
/// again on shuffle; a re-roll is a brand-new instance, never an in-place
/// mutation.
pub fn materialize(
    spec: &ShapeSpec,
    canvas_width: f32,
    canvas_height: f32,
    rng: &mut Pcg32,
) -> Result<ShapeInstance, ColorError> {
    Ok(ShapeInstance {
        color: Rgba8::from_hex(&spec.color)?,
        geometry: generate_blob(canvas_width, canvas_height, rng),
    })
}

/// Generate one blob. Placement keeps the unjittered stretched radius
/// inside the canvas by a 2x margin on each axis; jittered points may still
/// poke past on purpose. The margin collapses toward the canvas center when
/// the canvas is too small to honor it.
pub fn generate_blob(canvas_width: f32, canvas_height: f32, rng: &mut Pcg32) -> BlobGeometry {
    let radius = 100.0 + rng.next_f32() * 120.0;
    let stretch_y = 1.8 + rng.next_f32() * 1.2;
    let rotation = (rng.next_f32() - 0.5) * 80.0 * std::f32::consts::PI / 180.0;

    let margin_x = (radius * 2.0).min(canvas_width * 0.5);
    let margin_y = (radius * stretch_y * 2.0).min(canvas_height * 0.5);
    let x = margin_x + rng.next_f32() * (canvas_width - margin_x * 2.0);
    let y = margin_y + rng.next_f32() * (canvas_height - margin_y * 2.0);

    let num_points = rng.uniform_usize(12, 16);
    let angle_step = std::f32::consts::TAU / num_points as f32;

    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let angle = i as f32 * angle_step;
        let jittered = radius * (0.7 + rng.next_f32() * 0.6);
        points.push((angle.cos() * jittered, angle.sin() * jittered * stretch_y));
    }

    BlobGeometry { center: (x, y), radius, stretch_y, rotation, points }
}

impl BlobGeometry {
    /// Closed C1-continuous cubic through the point ring. Control points
    /// use the 1/6 Catmull-Rom tangent scale:
    /// `cp1 = p1 + (p2 - p0)/6`, `cp2 = p2 - (p3 - p1)/6`.
    pub fn path(&self) -> Option<Path> {
        let pts = &self.points;
        if pts.len() < 3 {
            return None;
        }
        let n = pts.len();
        let mut pb = PathBuilder::new();
        pb.move_to(pts[0].0, pts[0].1);
        for i in 0..n {
            let p0 = pts[(i + n - 1) % n];
            let p1 = pts[i];
            let p2 = pts[(i + 1) % n];
            let p3 = pts[(i + 2) % n];

            let cp1 = (p1.0 + (p2.0 - p0.0) / 6.0, p1.1 + (p2.1 - p0.1) / 6.0);
            let cp2 = (p2.0 - (p3.0 - p1.0) / 6.0, p2.1 - (p3.1 - p1.1) / 6.0);
            pb.cubic_to(cp1.0, cp1.1, cp2.0, cp2.1, p2.0, p2.1);
        }
        pb.close();
        pb.finish()
    }

    /// Local-space to canvas-space placement.
    pub fn transform(&self) -> Transform {
        Transform::from_translate(self.center.0, self.center.1)
            .pre_concat(Transform::from_rotate(self.rotation.to_degrees()))
    }
}

/// Wave band as configured: an origin in 0-100 canvas percent plus the
/// palette that fills it. All control geometry is re-rolled on every draw.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSpec {
    pub origin: (f32, f32),
    pub palette: String,
}

/// Control geometry for one wave band draw.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveGeometry {
    /// Sweep direction across the canvas, -1 or +1.
    pub direction: f32,
    pub mid_shift: f32,
    pub end_shift: f32,
    pub curvature: f32,
    pub thickness: f32,
}

pub fn generate_wave(canvas_height: f32, rng: &mut Pcg32) -> WaveGeometry {
    WaveGeometry {
        direction: if rng.next_f32() < 0.5 { -1.0 } else { 1.0 },
        mid_shift: rng.uniform(-0.25, 0.25) * canvas_height,
        end_shift: rng.uniform(-0.4, 0.4) * canvas_height,
        curvature: rng.uniform(0.2, 0.8),
        thickness: rng.uniform(0.18, 0.45) * canvas_height,
    }
}

impl WaveGeometry {
    /// Band path sweeping from the spec origin across the full canvas
    /// width: a curved top edge, a parallel bottom edge offset by the band
    /// thickness, closed into one fillable region.
    pub fn path(&self, origin_pct: (f32, f32), canvas_width: f32, canvas_height: f32) -> Option<Path> {
        let x0 = origin_pct.0 / 100.0 * canvas_width;
        let y0 = origin_pct.1 / 100.0 * canvas_height;
        let x1 = x0 + self.direction * canvas_width * 1.2;
        let y1 = y0 + self.end_shift;

        let bend = self.mid_shift * (1.0 + self.curvature);
        let cp1 = (x0 + self.direction * canvas_width * 0.4, y0 + bend);
        let cp2 = (x0 + self.direction * canvas_width * 0.8, y1 - bend * self.curvature);

        let t = self.thickness;
        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        pb.cubic_to(cp1.0, cp1.1, cp2.0, cp2.1, x1, y1);
        pb.line_to(x1, y1 + t);
        pb.cubic_to(cp2.0, cp2.1 + t, cp1.0, cp1.1 + t, x0, y0 + t);
        pb.close();
        pb.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_distributions_match_contract() {
        let mut rng = Pcg32::new(42);
        for _ in 0..1000 {
            let blob = generate_blob(1920.0, 1080.0, &mut rng);
            assert!((100.0..220.0).contains(&blob.radius));
            assert!((1.8..3.0).contains(&blob.stretch_y));
            let max_rot = 40.0_f32.to_radians();
            assert!(blob.rotation.abs() <= max_rot);
            assert!((12..16).contains(&blob.points.len()));
            for &(px, py) in &blob.points {
                let r = (px * px + (py / blob.stretch_y).powi(2)).sqrt();
                assert!(r >= blob.radius * 0.7 - 1e-3);
                assert!(r <= blob.radius * 1.3 + 1e-3);
            }
        }
    }

    #[test]
    fn blob_center_respects_safe_margins() {
        let (w, h) = (1920.0, 1080.0);
        let mut rng = Pcg32::new(7);
        for _ in 0..1000 {
            let blob = generate_blob(w, h, &mut rng);
            let mx = (blob.radius * 2.0).min(w * 0.5);
            let my = (blob.radius * blob.stretch_y * 2.0).min(h * 0.5);
            assert!(blob.center.0 >= mx && blob.center.0 <= w - mx);
            assert!(blob.center.1 >= my && blob.center.1 <= h - my);
        }
    }

    #[test]
    fn materialize_is_two_phase_and_rerolls() {
        let spec = ShapeSpec::new("DC2525");
        let mut rng = Pcg32::new(3);
        let a = materialize(&spec, 800.0, 600.0, &mut rng).unwrap();
        let b = materialize(&spec, 800.0, 600.0, &mut rng).unwrap();
        assert_eq!(a.color, Rgba8::new(0xdc, 0x25, 0x25, 0xff));
        assert_eq!(a.color, b.color);
        assert_ne!(a.geometry, b.geometry);
    }

    #[test]
    fn materialize_rejects_bad_hex() {
        let mut rng = Pcg32::new(3);
        assert!(materialize(&ShapeSpec::new("nope"), 800.0, 600.0, &mut rng).is_err());
    }

    #[test]
    fn blob_path_is_closed_and_finite() {
        let mut rng = Pcg32::new(11);
        let blob = generate_blob(1920.0, 1080.0, &mut rng);
        let path = blob.path().expect("blob path");
        let bounds = path.bounds();
        assert!(bounds.width() > 0.0 && bounds.height() > 0.0);
        // jitter is bounded by 1.3x the stretched radius
        let limit = blob.radius * 1.3 * blob.stretch_y * 1.2;
        assert!(bounds.width() <= limit * 2.0);
        assert!(bounds.height() <= limit * 2.0);
    }

    #[test]
    fn wave_geometry_is_rerolled_per_draw() {
        let mut rng = Pcg32::new(5);
        let a = generate_wave(1080.0, &mut rng);
        let b = generate_wave(1080.0, &mut rng);
        assert_ne!(a, b);
        assert!(a.direction.abs() == 1.0);
        assert!(a.path((20.0, 40.0), 1920.0, 1080.0).is_some());
    }
}
