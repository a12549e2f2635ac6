//! WebGL2 program manager for the fluted-glass pass.
//!
//! Owns every GPU handle for one mounted renderer: program, VAO, the
//! full-screen-triangle buffer, the main and grain textures, and the
//! uniform location table. Compile or link failure is terminal for the
//! mount; the caller surfaces the diagnostic and renders nothing.

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, HtmlImageElement, WebGl2RenderingContext as GL, WebGlBuffer,
    WebGlContextAttributes, WebGlPowerPreference, WebGlProgram, WebGlShader, WebGlTexture,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::params::RenderParams;
use crate::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};

#[derive(Debug, Error)]
pub enum GlError {
    #[error("WebGL2 context unavailable")]
    ContextUnavailable,
    #[error("shader compile failed: {0}")]
    ShaderCompile(String),
    #[error("program link failed: {0}")]
    ProgramLink(String),
    #[error("failed to allocate GPU {0}")]
    Allocation(&'static str),
    #[error("texture upload failed: {0}")]
    TextureUpload(String),
}

impl From<GlError> for JsValue {
    fn from(err: GlError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

struct Uniforms {
    image: Option<WebGlUniformLocation>,
    grain_texture: Option<WebGlUniformLocation>,
    image_aspect: Option<WebGlUniformLocation>,
    resolution: Option<WebGlUniformLocation>,
    size: Option<WebGlUniformLocation>,
    distortion: Option<WebGlUniformLocation>,
    shift: Option<WebGlUniformLocation>,
    margin: Option<WebGlUniformLocation>,
    shadow: Option<WebGlUniformLocation>,
    grain_intensity: Option<WebGlUniformLocation>,
    stretch: Option<WebGlUniformLocation>,
    blur: Option<WebGlUniformLocation>,
}

pub struct GlPipeline {
    gl: GL,
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    position_buffer: WebGlBuffer,
    main_texture: WebGlTexture,
    grain_texture: WebGlTexture,
    uniforms: Uniforms,
}

fn compile_shader(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, GlError> {
    let shader = gl.create_shader(kind).ok_or(GlError::Allocation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if !gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        return Err(GlError::ShaderCompile(info));
    }
    Ok(shader)
}

fn link_program(gl: &GL) -> Result<WebGlProgram, GlError> {
    let vertex = compile_shader(gl, GL::VERTEX_SHADER, VERTEX_SHADER)?;
    let fragment = match compile_shader(gl, GL::FRAGMENT_SHADER, FRAGMENT_SHADER) {
        Ok(shader) => shader,
        Err(err) => {
            gl.delete_shader(Some(&vertex));
            return Err(err);
        }
    };

    let program = gl.create_program().ok_or(GlError::Allocation("program"))?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);

    let linked = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);

    gl.detach_shader(&program, &vertex);
    gl.detach_shader(&program, &fragment);
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    if !linked {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        return Err(GlError::ProgramLink(info));
    }
    Ok(program)
}

fn create_texture(gl: &GL, wrap: u32) -> Result<WebGlTexture, GlError> {
    let texture = gl.create_texture().ok_or(GlError::Allocation("texture"))?;
    gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, wrap as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, wrap as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
    gl.bind_texture(GL::TEXTURE_2D, None);
    Ok(texture)
}

impl GlPipeline {
    /// Acquire a WebGL2 context on the canvas and build every GPU resource
    /// the pass needs. The main texture starts as a 1x1 placeholder so a
    /// draw before the first upload stays well-defined.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, GlError> {
        let attrs = WebGlContextAttributes::new();
        attrs.set_premultiplied_alpha(false);
        attrs.set_preserve_drawing_buffer(true);
        attrs.set_antialias(false);
        attrs.set_power_preference(WebGlPowerPreference::HighPerformance);

        let gl: GL = canvas
            .get_context_with_context_options("webgl2", attrs.as_ref())
            .map_err(|_| GlError::ContextUnavailable)?
            .ok_or(GlError::ContextUnavailable)?
            .dyn_into()
            .map_err(|_| GlError::ContextUnavailable)?;

        let program = link_program(&gl)?;

        let vao = gl
            .create_vertex_array()
            .ok_or(GlError::Allocation("vertex array"))?;
        gl.bind_vertex_array(Some(&vao));

        let position_buffer = gl.create_buffer().ok_or(GlError::Allocation("buffer"))?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&position_buffer));
        let verts: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
        // view() borrows the stack array only for the duration of the call
        unsafe {
            let view = js_sys::Float32Array::view(&verts);
            gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &view, GL::STATIC_DRAW);
        }

        let position = gl.get_attrib_location(&program, "a_position");
        gl.enable_vertex_attrib_array(position as u32);
        gl.vertex_attrib_pointer_with_i32(position as u32, 2, GL::FLOAT, false, 0, 0);

        gl.bind_vertex_array(None);
        gl.bind_buffer(GL::ARRAY_BUFFER, None);

        let main_texture = create_texture(&gl, GL::CLAMP_TO_EDGE)?;
        let grain_texture = create_texture(&gl, GL::REPEAT)?;

        let uniforms = Uniforms {
            image: gl.get_uniform_location(&program, "u_image"),
            grain_texture: gl.get_uniform_location(&program, "u_grainTexture"),
            image_aspect: gl.get_uniform_location(&program, "u_imageAspect"),
            resolution: gl.get_uniform_location(&program, "u_resolution"),
            size: gl.get_uniform_location(&program, "u_size"),
            distortion: gl.get_uniform_location(&program, "u_distortion"),
            shift: gl.get_uniform_location(&program, "u_shift"),
            margin: gl.get_uniform_location(&program, "u_margin"),
            shadow: gl.get_uniform_location(&program, "u_shadow"),
            grain_intensity: gl.get_uniform_location(&program, "u_grainIntensity"),
            stretch: gl.get_uniform_location(&program, "u_stretch"),
            blur: gl.get_uniform_location(&program, "u_blur"),
        };

        let pipeline = Self {
            gl,
            program,
            vao,
            position_buffer,
            main_texture,
            grain_texture,
            uniforms,
        };
        pipeline.upload_main_pixels(1, 1, &[0, 0, 0, 255])?;
        Ok(pipeline)
    }

    /// Upload raw RGBA pixels as the main texture (procedural path).
    pub fn upload_main_pixels(&self, width: u32, height: u32, data: &[u8]) -> Result<(), GlError> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.main_texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            width as i32,
            height as i32,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            Some(data),
        )
        .map_err(|e| GlError::TextureUpload(format!("{e:?}")))?;
        gl.bind_texture(GL::TEXTURE_2D, None);
        Ok(())
    }

    /// Upload a decoded image as the main texture, flipped to sit upright.
    pub fn upload_main_image(&self, image: &HtmlImageElement) -> Result<(), GlError> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.main_texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            image,
        )
        .map_err(|e| GlError::TextureUpload(format!("{e:?}")))?;
        gl.bind_texture(GL::TEXTURE_2D, None);
        Ok(())
    }

    pub fn upload_grain(&self, width: u32, height: u32, data: &[u8]) -> Result<(), GlError> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.grain_texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            width as i32,
            height as i32,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            Some(data),
        )
        .map_err(|e| GlError::TextureUpload(format!("{e:?}")))?;
        gl.bind_texture(GL::TEXTURE_2D, None);
        Ok(())
    }

    pub fn viewport(&self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    /// Push the full uniform set from the snapshot and draw the triangle.
    pub fn draw(&self, params: &RenderParams, image_aspect: f32) {
        let gl = &self.gl;
        let u = &self.uniforms;

        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);

        gl.use_program(Some(&self.program));
        gl.bind_vertex_array(Some(&self.vao));

        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.main_texture));
        gl.uniform1i(u.image.as_ref(), 0);

        gl.active_texture(GL::TEXTURE1);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.grain_texture));
        gl.uniform1i(u.grain_texture.as_ref(), 1);

        let res = params.resolution;
        gl.uniform1f(u.image_aspect.as_ref(), image_aspect);
        gl.uniform2f(u.resolution.as_ref(), res.width as f32, res.height as f32);
        gl.uniform1f(u.size.as_ref(), params.size);
        gl.uniform1f(u.distortion.as_ref(), params.distortion);
        gl.uniform1f(u.shift.as_ref(), 0.0);
        gl.uniform1f(u.margin.as_ref(), params.margin);
        gl.uniform1f(u.shadow.as_ref(), params.shadow);
        gl.uniform1f(u.grain_intensity.as_ref(), params.grain_scaled());
        gl.uniform2f(u.stretch.as_ref(), 1.0, params.stretch);
        gl.uniform1f(u.blur.as_ref(), params.blur);

        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        gl.bind_vertex_array(None);
        gl.use_program(None);
    }

    /// Release every GPU handle. Driver objects are not garbage collected;
    /// a remount must start from a clean slate.
    pub fn dispose(&self) {
        let gl = &self.gl;
        gl.delete_texture(Some(&self.main_texture));
        gl.delete_texture(Some(&self.grain_texture));
        gl.delete_buffer(Some(&self.position_buffer));
        gl.delete_vertex_array(Some(&self.vao));
        gl.delete_program(Some(&self.program));
    }
}
