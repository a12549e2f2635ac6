//! Fluted-glass wallpaper renderer.
//!
//! The core modules (shape generation, palette resolution, CPU
//! rasterization, grain, shader math) are plain Rust and compile on any
//! target, so `cargo test` runs natively. The WebGL2 surface and the
//! render loop live in the `wasm` module and only build for
//! `wasm32-unknown-unknown`.

pub mod color;
pub mod filter;
pub mod flute;
pub mod grain;
pub mod palette;
pub mod params;
pub mod raster;
pub mod rng;
pub mod shaders;
pub mod shape;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod gl;
    mod render;

    pub use render::FlutedGlass;

    #[wasm_bindgen(start)]
    pub fn init() {
        console_error_panic_hook::set_once();
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::FlutedGlass;
