//! Named color palettes and gradient stop resolution.

use tiny_skia::{GradientStop, LinearGradient, Point, Shader, SpreadMode, Transform};

use crate::color::Rgba8;

/// Ordered list of hex colors (stored without a leading `#`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientPalette {
    pub name: String,
    pub colors: Vec<String>,
}

impl GradientPalette {
    pub fn new(name: impl Into<String>, colors: &[&str]) -> Self {
        Self {
            name: name.into(),
            colors: colors.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// Gradient axis chosen by the call site: the background uses a horizontal
/// sweep, wave bands use whatever their randomized direction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    Horizontal,
    Vertical,
    Diagonal,
}

impl GradientDirection {
    fn endpoints(self, width: f32, height: f32) -> (Point, Point) {
        let (ex, ey) = match self {
            GradientDirection::Horizontal => (width, 0.0),
            GradientDirection::Vertical => (0.0, height),
            GradientDirection::Diagonal => (width, height),
        };
        (Point::from_xy(0.0, 0.0), Point::from_xy(ex, ey))
    }
}

/// Evenly spaced stop positions: `i / (n - 1)`. A single-color list yields
/// one stop at 0 so the position never degenerates to NaN.
pub fn stop_positions(count: usize) -> Vec<f32> {
    if count < 2 {
        return vec![0.0; count];
    }
    let last = (count - 1) as f32;
    (0..count).map(|i| i as f32 / last).collect()
}

fn gradient_stops(colors: &[Rgba8]) -> Vec<GradientStop> {
    stop_positions(colors.len())
        .into_iter()
        .zip(colors)
        .map(|(pos, c)| GradientStop::new(pos, c.to_skia()))
        .collect()
}

/// Build a linear gradient shader across the surface, degrading to a flat
/// color when fewer than two stops are available.
pub fn gradient_shader(
    colors: &[Rgba8],
    direction: GradientDirection,
    width: f32,
    height: f32,
) -> Shader<'static> {
    if let [only] = colors {
        return Shader::SolidColor(only.to_skia());
    }
    let (start, end) = direction.endpoints(width, height);
    LinearGradient::new(
        start,
        end,
        gradient_stops(colors),
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(tiny_skia::Color::BLACK))
}

/// Palettes shipped with the app. The first entry is the default
/// background sweep.
pub fn default_palettes() -> Vec<GradientPalette> {
    vec![
        GradientPalette::new(
            "deep-space",
            &[
                "040311", "081635", "00203C", "022954", "025D88", "0190B3", "9C7596", "6A0044",
                "9A024C", "300235", "1D4356",
            ],
        ),
        GradientPalette::new("ember", &["001220", "FF6600"]),
    ]
}
