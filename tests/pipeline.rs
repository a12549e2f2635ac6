//! End-to-end checks of the CPU half of the pipeline: raster a background,
//! then evaluate the shader mirror against it.

use fluted_wasm::color::Rgba8;
use fluted_wasm::filter::FilterSettings;
use fluted_wasm::flute::{shade, shadow_factor, stripe_sample};
use fluted_wasm::grain::generate_grain;
use fluted_wasm::params::{RenderParams, Resolution};
use fluted_wasm::raster::rasterize;
use fluted_wasm::rng::Pcg32;
use fluted_wasm::shape::{materialize, ShapeSpec};

fn solid_params(width: u32, height: u32) -> RenderParams {
    RenderParams {
        resolution: Resolution { width, height },
        is_gradient: false,
        background_solid: "121216".to_string(),
        shape_filters: FilterSettings::default(),
        ..Default::default()
    }
}

#[test]
fn margin_band_shows_the_source_untouched() {
    let params = RenderParams {
        margin: 0.2,
        distortion: 1.0,
        shadow: 1.0,
        ..solid_params(200, 150)
    };
    let mut rng = Pcg32::new(7);
    let surface = rasterize(&params, &[], &mut rng).unwrap();
    let aspect = params.resolution.aspect();
    let expected = Rgba8::from_hex("121216").unwrap();

    // points inside the frame band keep the raw background color
    for &(u, v) in &[(0.05, 0.5), (0.95, 0.5), (0.5, 0.05), (0.5, 0.95)] {
        let rgb = shade(&surface, None, &params, aspect, u, v);
        assert!((rgb[0] - expected.r as f32 / 255.0).abs() < 1e-2, "at ({u}, {v})");
        assert!((rgb[2] - expected.b as f32 / 255.0).abs() < 1e-2, "at ({u}, {v})");
    }
}

#[test]
fn shadow_darkens_the_interior_on_a_solid_field() {
    let base = solid_params(160, 120);
    let lit = RenderParams { shadow: 0.0, ..base.clone() };
    let shadowed = RenderParams { shadow: 1.0, ..base };
    let mut rng = Pcg32::new(3);
    let surface = rasterize(&lit, &[], &mut rng).unwrap();
    let aspect = lit.resolution.aspect();

    let mut darkened = 0;
    for i in 0..100 {
        let u = (i as f32 + 0.5) / 100.0;
        let plain = shade(&surface, None, &lit, aspect, u, 0.5);
        let shaded = shade(&surface, None, &shadowed, aspect, u, 0.5);
        assert!(shaded[0] <= plain[0] + 1e-6);
        if shaded[0] < plain[0] - 1e-4 {
            darkened += 1;
        }
    }
    assert!(darkened > 50, "only {darkened} of 100 columns picked up shadow");

    // the darkening matches the analytic factor at a probe point
    let stripe = stripe_sample(0.37, shadowed.size, shadowed.distortion, 0.0);
    let factor = shadow_factor(stripe.base, 1.0);
    let plain = shade(&surface, None, &lit, aspect, 0.37, 0.5);
    let shaded = shade(&surface, None, &shadowed, aspect, 0.37, 0.5);
    assert!((shaded[0] - plain[0] * factor).abs() < 1e-3);
}

#[test]
fn zero_distortion_reads_stripe_centers_from_a_gradient() {
    let params = RenderParams {
        distortion: 0.0,
        shadow: 0.0,
        current_palette: "ember".to_string(),
        is_gradient: true,
        ..solid_params(256, 128)
    };
    let mut rng = Pcg32::new(11);
    let surface = rasterize(&params, &[], &mut rng).unwrap();
    let aspect = params.resolution.aspect();

    for i in 0..40 {
        let u = (i as f32 + 0.5) / 40.0;
        let stripe = stripe_sample(u, params.size, 0.0, 0.0);
        let direct = surface.sample(stripe.sampled_x, 0.5);
        let shaded = shade(&surface, None, &params, aspect, u, 0.5);
        assert!((shaded[0] - direct[0]).abs() < 1e-5);
        assert!((shaded[2] - direct[2]).abs() < 1e-5);
    }
}

#[test]
fn grain_perturbs_around_the_base_color() {
    let params = RenderParams {
        grain_intensity: 40.0,
        shadow: 0.0,
        distortion: 0.0,
        ..solid_params(128, 128)
    };
    let mut rng = Pcg32::new(21);
    let surface = rasterize(&params, &[], &mut rng).unwrap();
    let grain = generate_grain(128, 128, &mut rng).unwrap();
    let aspect = 1.0;

    let base = shade(&surface, None, &params, aspect, 0.5, 0.5);
    let mut above = 0;
    let mut below = 0;
    for i in 0..200 {
        let u = (i % 20) as f32 / 20.0 + 0.013;
        let v = (i / 20) as f32 / 10.0 + 0.017;
        let rgb = shade(&surface, Some(&grain), &params, aspect, u, v);
        // offset is bounded by half the scaled intensity
        assert!((rgb[0] - base[0]).abs() <= 0.2 + 1e-3);
        if rgb[0] > base[0] + 1e-4 {
            above += 1;
        }
        if rgb[0] < base[0] - 1e-4 {
            below += 1;
        }
    }
    assert!(above > 20 && below > 20, "grain not two-sided: +{above} -{below}");

    // the field itself is static: the same UV always yields the same value
    let a = shade(&surface, Some(&grain), &params, aspect, 0.31, 0.62);
    let b = shade(&surface, Some(&grain), &params, aspect, 0.31, 0.62);
    assert_eq!(a, b);
}

#[test]
fn center_fragment_is_the_stripe_sample_times_the_shadow() {
    let mut params = RenderParams {
        size: 0.3,
        distortion: 0.5,
        margin: 0.0,
        shadow: 0.3,
        ..solid_params(800, 600)
    };
    params.shapes.push(ShapeSpec::new("DC2525"));

    let mut rng = Pcg32::new(17);
    let shapes: Vec<_> = params
        .shapes
        .iter()
        .map(|s| materialize(s, 800.0, 600.0, &mut rng).unwrap())
        .collect();
    let surface = rasterize(&params, &shapes, &mut rng).unwrap();
    let aspect = params.resolution.aspect();

    let stripe = stripe_sample(0.5, 0.3, 0.5, 0.0);
    let direct = surface.sample(stripe.sampled_x, 0.5);
    let factor = shadow_factor(stripe.base, 0.3);
    let shaded = shade(&surface, None, &params, aspect, 0.5, 0.5);
    for c in 0..3 {
        assert!((shaded[c] - direct[c] * factor).abs() < 1e-5, "channel {c}");
    }
}

#[test]
fn full_scene_rasters_and_shades_without_artifacts() {
    let mut params = RenderParams {
        blur: 0.3,
        grain_intensity: 10.0,
        ..solid_params(800, 600)
    };
    params.shapes.push(ShapeSpec::new("DC2525"));
    params.shapes.push(ShapeSpec::new("0190B3"));

    let mut rng = Pcg32::new(99);
    let shapes: Vec<_> = params
        .shapes
        .iter()
        .map(|s| materialize(s, 800.0, 600.0, &mut rng).unwrap())
        .collect();
    let surface = rasterize(&params, &shapes, &mut rng).unwrap();
    let grain = generate_grain(800, 600, &mut rng).unwrap();
    let aspect = params.resolution.aspect();

    for i in 0..500 {
        let u = (i % 25) as f32 / 25.0 + 0.019;
        let v = (i / 25) as f32 / 20.0 + 0.023;
        let rgb = shade(&surface, Some(&grain), &params, aspect, u, v);
        for c in rgb {
            assert!(c.is_finite());
            // grain may push slightly past the displayable range; the GPU clamps
            assert!((-0.1..=1.1).contains(&c), "channel {c} at ({u}, {v})");
        }
    }
}
