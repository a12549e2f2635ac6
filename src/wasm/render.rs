//! Mounted fluted-glass renderer.
//!
//! One [`FlutedGlass`] instance owns one canvas, one WebGL2 context and
//! all textures on it. Parameter setters are classified through
//! [`TextureKey`]: texture-affecting changes re-rasterize and re-upload
//! before drawing, uniform-only changes go straight to the draw call.
//! Unmount releases every GPU handle; callbacks that outlive the mount
//! (image decode, window resize) find the state gone and return.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlCanvasElement, HtmlImageElement};

use crate::grain::generate_grain;
use crate::params::{needs_raster, RenderParams, Resolution, TextureKey};
use crate::raster::rasterize;
use crate::rng::Pcg32;
use crate::shape::{materialize, ShapeInstance, ShapeSpec, WaveSpec};

use super::gl::GlPipeline;

fn report(context: &str, detail: &str) {
    web_sys::console::error_1(&JsValue::from_str(&format!("fluted-glass: {context}: {detail}")));
}

struct Mounted {
    canvas: HtmlCanvasElement,
    gl: GlPipeline,
    params: RenderParams,
    rng: Pcg32,
    /// Materialized shapes plus the inputs they were rolled for.
    shapes: Vec<ShapeInstance>,
    materialized_for: Option<(Vec<ShapeSpec>, Resolution, u64)>,
    texture_key: Option<TextureKey>,
    grain_res: Option<Resolution>,
    image: Option<HtmlImageElement>,
    image_aspect: Option<f32>,
    _image_hooks: Vec<Closure<dyn FnMut()>>,
}

impl Mounted {
    /// Resync the canvas backing store with the logical resolution. Cheap
    /// when nothing changed; the viewport is set unconditionally.
    fn resize_canvas(&self) {
        let res = self.params.resolution;
        if self.canvas.width() != res.width || self.canvas.height() != res.height {
            self.canvas.set_width(res.width);
            self.canvas.set_height(res.height);
            let style = self.canvas.style();
            let _ = style.set_property("width", &format!("{}px", res.width));
            let _ = style.set_property("height", &format!("{}px", res.height));
        }
        self.gl.viewport(res.width, res.height);
    }

    /// Re-roll shape instances only when the shape list, resolution or
    /// shuffle epoch moved; filter tweaks re-rasterize without re-rolling.
    fn sync_shapes(&mut self) {
        let wanted = (
            self.params.shapes.clone(),
            self.params.resolution,
            self.params.geometry_epoch,
        );
        if self.materialized_for.as_ref() == Some(&wanted) {
            return;
        }
        let width = self.params.resolution.width as f32;
        let height = self.params.resolution.height as f32;
        let params = &self.params;
        let rng = &mut self.rng;
        let shapes: Vec<ShapeInstance> = params
            .shapes
            .iter()
            .filter_map(|spec| match materialize(spec, width, height, rng) {
                Ok(instance) => Some(instance),
                Err(err) => {
                    log::warn!("skipping shape {:?}: {err}", spec.color);
                    None
                }
            })
            .collect();
        self.shapes = shapes;
        self.materialized_for = Some(wanted);
    }

    fn rebuild_grain(&mut self) {
        let res = self.params.resolution;
        if self.grain_res == Some(res) {
            return;
        }
        match generate_grain(res.width, res.height, &mut self.rng) {
            Ok(field) => match self.gl.upload_grain(field.width(), field.height(), field.data()) {
                Ok(()) => self.grain_res = Some(res),
                Err(err) => report("grain upload", &err.to_string()),
            },
            Err(err) => report("grain generation", &err.to_string()),
        }
    }

    fn rebuild_procedural(&mut self) {
        self.sync_shapes();
        match rasterize(&self.params, &self.shapes, &mut self.rng) {
            Ok(surface) => {
                if let Err(err) =
                    self.gl
                        .upload_main_pixels(surface.width(), surface.height(), surface.data())
                {
                    report("background upload", &err.to_string());
                }
            }
            Err(err) => report("background raster", &err.to_string()),
        }
    }

    fn draw(&self) {
        let aspect = match (self.params.with_image, self.image_aspect) {
            (true, Some(aspect)) => aspect,
            _ => self.params.resolution.aspect(),
        };
        self.gl.draw(&self.params, aspect);
    }
}

type State = Rc<RefCell<Option<Mounted>>>;

/// Classify the pending change, rebuild what the classification demands,
/// draw. This is the only render path; every setter funnels through it.
fn sync_state(state: &State) {
    let mut guard = state.borrow_mut();
    let Some(mounted) = guard.as_mut() else {
        return;
    };
    mounted.resize_canvas();
    let key = TextureKey::of(&mounted.params);
    if needs_raster(mounted.texture_key.as_ref(), &key) {
        mounted.texture_key = Some(key);
        mounted.rebuild_grain();
        if mounted.params.with_image && !mounted.params.image_src.is_empty() {
            start_image_load(state, mounted);
        } else {
            mounted.image_aspect = None;
            mounted.rebuild_procedural();
        }
    }
    mounted.draw();
}

/// Kick off an async decode. The continuation re-checks the mount and the
/// requested source, so a stale or post-unmount completion is a no-op and
/// a failed decode keeps the last valid texture.
fn start_image_load(state: &State, mounted: &mut Mounted) {
    let img = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(err) => {
            report("image element", &format!("{err:?}"));
            return;
        }
    };
    img.set_cross_origin(Some("anonymous"));
    let src = mounted.params.image_src.clone();

    let onload = {
        let state = state.clone();
        let img = img.clone();
        let src = src.clone();
        Closure::wrap(Box::new(move || {
            let mut guard = state.borrow_mut();
            let Some(mounted) = guard.as_mut() else {
                return;
            };
            if !mounted.params.with_image || mounted.params.image_src != src {
                return;
            }
            match mounted.gl.upload_main_image(&img) {
                Ok(()) => {
                    let height = img.natural_height().max(1);
                    mounted.image_aspect = Some(img.natural_width() as f32 / height as f32);
                    mounted.draw();
                }
                Err(err) => report("image upload", &err.to_string()),
            }
        }) as Box<dyn FnMut()>)
    };

    let onerror = {
        let src = src.clone();
        Closure::wrap(Box::new(move || {
            report("image decode", &src);
        }) as Box<dyn FnMut()>)
    };

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    img.set_src(&src);

    if let Some(old) = mounted.image.replace(img) {
        old.set_onload(None);
        old.set_onerror(None);
    }
    mounted._image_hooks = vec![onload, onerror];
}

/// Fluted-glass preview renderer bound to one canvas element.
#[wasm_bindgen]
pub struct FlutedGlass {
    state: State,
    resize_hook: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl FlutedGlass {
    /// Mount on a canvas. Fails terminally when WebGL2 is unavailable or
    /// the shader pair does not build; remount to retry.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement) -> Result<FlutedGlass, JsValue> {
        let gl = GlPipeline::new(&canvas).map_err(|err| {
            report("init", &err.to_string());
            JsValue::from(err)
        })?;

        let mounted = Mounted {
            canvas,
            gl,
            params: RenderParams::default(),
            rng: Pcg32::from_entropy(),
            shapes: Vec::new(),
            materialized_for: None,
            texture_key: None,
            grain_res: None,
            image: None,
            image_aspect: None,
            _image_hooks: Vec::new(),
        };
        let state: State = Rc::new(RefCell::new(Some(mounted)));

        let resize_hook = {
            let state = state.clone();
            Closure::wrap(Box::new(move || sync_state(&state)) as Box<dyn FnMut()>)
        };
        window()
            .ok_or_else(|| JsValue::from_str("no window"))?
            .add_event_listener_with_callback("resize", resize_hook.as_ref().unchecked_ref())?;

        let renderer = FlutedGlass { state, resize_hook: Some(resize_hook) };
        sync_state(&renderer.state);
        Ok(renderer)
    }

    fn update(&self, apply: impl FnOnce(&mut RenderParams)) {
        if let Some(mounted) = self.state.borrow_mut().as_mut() {
            apply(&mut mounted.params);
        }
        sync_state(&self.state);
    }

    // Uniform-tier controls.

    pub fn set_size(&self, value: f32) {
        self.update(|p| p.size = value);
    }

    pub fn set_distortion(&self, value: f32) {
        self.update(|p| p.distortion = value);
    }

    pub fn set_margin(&self, value: f32) {
        self.update(|p| p.margin = value);
    }

    pub fn set_shadow(&self, value: f32) {
        self.update(|p| p.shadow = value);
    }

    pub fn set_stretch(&self, value: f32) {
        self.update(|p| p.stretch = value);
    }

    pub fn set_blur(&self, value: f32) {
        self.update(|p| p.blur = value);
    }

    /// UI range 0-100.
    pub fn set_grain_intensity(&self, value: f32) {
        self.update(|p| p.grain_intensity = value);
    }

    // Texture-tier controls.

    pub fn set_resolution(&self, width: u32, height: u32) {
        self.update(|p| p.resolution = Resolution { width, height });
    }

    pub fn set_gradient(&self, enabled: bool) {
        self.update(|p| p.is_gradient = enabled);
    }

    pub fn set_background_solid(&self, hex: String) {
        self.update(|p| p.background_solid = hex);
    }

    pub fn set_palette(&self, name: String) {
        self.update(|p| p.current_palette = name);
    }

    pub fn set_palette_color(&self, palette: String, index: usize, hex: String) {
        self.update(|p| {
            if let Some(entry) = p.palettes.iter_mut().find(|pal| pal.name == palette) {
                if let Some(slot) = entry.colors.get_mut(index) {
                    *slot = hex;
                }
            }
        });
    }

    pub fn add_shape(&self, color: String) {
        self.update(|p| {
            p.shapes.push(ShapeSpec::new(color));
            p.geometry_epoch += 1;
        });
    }

    pub fn remove_shape(&self, index: usize) {
        self.update(|p| {
            if index < p.shapes.len() {
                p.shapes.remove(index);
                p.geometry_epoch += 1;
            }
        });
    }

    /// Re-roll every blob's geometry.
    pub fn shuffle_shapes(&self) {
        self.update(|p| p.geometry_epoch += 1);
    }

    pub fn add_wave(&self, origin_x_pct: f32, origin_y_pct: f32, palette: String) {
        self.update(|p| {
            p.waves.push(WaveSpec { origin: (origin_x_pct, origin_y_pct), palette });
        });
    }

    pub fn clear_waves(&self) {
        self.update(|p| p.waves.clear());
    }

    /// Switch to image mode; `src` is a URL or data URL.
    pub fn set_image(&self, src: String) {
        self.update(|p| {
            p.with_image = true;
            p.image_src = src;
        });
    }

    pub fn clear_image(&self) {
        self.update(|p| {
            p.with_image = false;
            p.image_src.clear();
        });
    }

    /// Unmount: releases all GPU resources and deregisters listeners.
    /// Further setter calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(hook) = self.resize_hook.take() {
            if let Some(w) = window() {
                let _ = w.remove_event_listener_with_callback(
                    "resize",
                    hook.as_ref().unchecked_ref(),
                );
            }
        }
        if let Some(mounted) = self.state.borrow_mut().take() {
            if let Some(img) = &mounted.image {
                img.set_onload(None);
                img.set_onerror(None);
            }
            mounted.gl.dispose();
        }
    }
}
