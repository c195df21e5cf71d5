//! OpenGL 4.5 core implementation of [`GraphicsDevice`] on top of glow.

use std::cell::Cell;

use glam::{Mat3, Mat4, Vec3};
use glow::HasContext;

use crate::{
    device::{BuildStatus, GraphicsDevice, PolygonMode, Primitive, ShaderStage},
    error::DeviceError,
    texture::{FilterMode, WrapMode},
};

type Gl = glow::Context;

pub struct GlDevice {
    gl: Gl,
    max_texture_units: u32,
    current_program: Cell<Option<<Gl as HasContext>::Program>>,
}

impl GlDevice {
    /// Wrap a loaded context and set the fixed pipeline state the demo relies on
    /// (depth test with `LESS`).
    ///
    /// # Safety
    ///
    /// The context must be current on this thread for the whole lifetime of the
    /// returned device, and every method must be called from this thread.
    pub unsafe fn new(gl: Gl) -> Self {
        // SAFETY: caller guarantees a current context.
        let max_texture_units = unsafe {
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS)
        };
        let max_texture_units = u32::try_from(max_texture_units).unwrap_or(0).max(1);

        log::info!(
            "OpenGL device: {} ({}), {} texture units",
            // SAFETY: as above.
            unsafe { gl.get_parameter_string(glow::RENDERER) },
            unsafe { gl.get_parameter_string(glow::VERSION) },
            max_texture_units
        );

        Self {
            gl,
            max_texture_units,
            current_program: Cell::new(None),
        }
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
        ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn filter_enum(filter: FilterMode) -> i32 {
    (match filter {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
        FilterMode::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        FilterMode::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        FilterMode::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

fn wrap_enum(wrap: WrapMode) -> i32 {
    (match wrap {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
    }) as i32
}

// SAFETY (all `unsafe` blocks below): `GlDevice::new` requires the context to be
// current on the calling thread for the device's lifetime; object handles passed
// in were created by this same context.
impl GraphicsDevice for GlDevice {
    type Shader = <Gl as HasContext>::Shader;
    type Program = <Gl as HasContext>::Program;
    type Texture = <Gl as HasContext>::Texture;
    type Buffer = <Gl as HasContext>::Buffer;
    type VertexArray = <Gl as HasContext>::VertexArray;
    type UniformLocation = <Gl as HasContext>::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, DeviceError> {
        unsafe { self.gl.create_shader(stage_enum(stage)) }
            .map_err(|e| DeviceError::new("shader", e))
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> BuildStatus {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            BuildStatus {
                success: self.gl.get_shader_compile_status(shader),
                log: self.gl.get_shader_info_log(shader),
            }
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, DeviceError> {
        unsafe { self.gl.create_program() }.map_err(|e| DeviceError::new("program", e))
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> BuildStatus {
        unsafe {
            self.gl.link_program(program);
            BuildStatus {
                success: self.gl.get_program_link_status(program),
                log: self.gl.get_program_info_log(program),
            }
        }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
        if self.current_program.get() == Some(program) {
            self.current_program.set(None);
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
        self.current_program.set(program);
    }

    fn current_program(&self) -> Option<Self::Program> {
        self.current_program.get()
    }

    fn active_uniforms(&self, program: Self::Program) -> Vec<String> {
        unsafe {
            let count = self.gl.get_active_uniforms(program);
            (0..count)
                .filter_map(|index| self.gl.get_active_uniform(program, index))
                .map(|uniform| uniform.name)
                .collect()
        }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn set_uniform_i32(&self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn set_uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3) {
        unsafe { self.gl.uniform_3_f32(Some(location), value.x, value.y, value.z) }
    }

    fn set_uniform_mat3(&self, location: &Self::UniformLocation, value: &Mat3) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(location), false, &value.to_cols_array())
        }
    }

    fn set_uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, &value.to_cols_array())
        }
    }

    fn max_texture_units(&self) -> u32 {
        self.max_texture_units
    }

    fn create_texture(&self) -> Result<Self::Texture, DeviceError> {
        unsafe { self.gl.create_texture() }.map_err(|e| DeviceError::new("texture", e))
    }

    fn upload_texture_bgr8(&self, texture: Self::Texture, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            // Rows are tightly packed, not 4-byte aligned.
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB8 as i32,
                width as i32,
                height as i32,
                0,
                glow::BGR,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn set_texture_sampling(&self, texture: Self::Texture, filter: FilterMode, wrap: WrapMode) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            let wrap = wrap_enum(wrap);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                filter_enum(filter.magnification()),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                filter_enum(filter),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn generate_mipmaps(&self, texture: Self::Texture) {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind_texture_unit(&self, slot: u32, texture: Option<Self::Texture>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + slot);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, DeviceError> {
        unsafe { self.gl.create_vertex_array() }
            .map_err(|e| DeviceError::new("vertex array", e))
    }

    fn create_buffer(&self) -> Result<Self::Buffer, DeviceError> {
        unsafe { self.gl.create_buffer() }.map_err(|e| DeviceError::new("buffer", e))
    }

    fn upload_vertex_attribute(
        &self,
        vao: Self::VertexArray,
        buffer: Self::Buffer,
        location: u32,
        components: u8,
        data: &[f32],
    ) {
        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
            self.gl.enable_vertex_attrib_array(location);
            self.gl.vertex_attrib_pointer_f32(
                location,
                i32::from(components),
                glow::FLOAT,
                false,
                0,
                0,
            );
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn upload_indices(&self, vao: Self::VertexArray, buffer: Self::Buffer, indices: &[u32]) {
        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            // The element binding is VAO state; keep it bound when the VAO unbinds.
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );
            self.gl.bind_vertex_array(None);
        }
    }

    fn draw_indexed(&self, vao: Self::VertexArray, primitive: Primitive, count: u32) {
        let mode = match primitive {
            Primitive::Triangles => glow::TRIANGLES,
            Primitive::Points => glow::POINTS,
            Primitive::Patches { vertices } => {
                unsafe {
                    self.gl
                        .patch_parameter_i32(glow::PATCH_VERTICES, i32::from(vertices))
                };
                glow::PATCHES
            }
        };
        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            self.gl
                .draw_elements(mode, count as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn delete_vertex_array(&self, vao: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vao) }
    }

    fn set_viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) }
    }

    fn clear(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_polygon_mode(&self, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
    }
}
