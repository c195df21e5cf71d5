//! Graphics driver seam.
//!
//! Resources ([`ShaderProgram`](crate::shader::ShaderProgram),
//! [`Texture`](crate::texture::Texture), [`GpuMesh`](crate::mesh::GpuMesh)) only
//! talk to the GPU through [`GraphicsDevice`]. The production implementation is
//! [`GlDevice`](crate::gl::GlDevice); tests use a recording mock.
//!
//! All calls assume a single thread with the context current.

use std::fmt::{self, Debug};

use glam::{Mat3, Mat4, Vec3};

use crate::{
    error::DeviceError,
    texture::{FilterMode, WrapMode},
};

/// One shader compilation unit of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
}

impl ShaderStage {
    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation-control",
            ShaderStage::TessEvaluation => "tessellation-evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a compile or link step: status flag plus driver info log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildStatus {
    pub success: bool,
    pub log: String,
}

/// Primitive assembly mode for indexed draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Points,
    /// Tessellation patches of `vertices` control points.
    Patches { vertices: u8 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

pub trait GraphicsDevice {
    type Shader: Copy + Debug;
    type Program: Copy + Debug + PartialEq;
    type Texture: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug;
    type VertexArray: Copy + Debug;
    type UniformLocation: Clone + Debug;

    // Shaders and programs.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, DeviceError>;
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> BuildStatus;
    fn delete_shader(&self, shader: Self::Shader);
    fn create_program(&self) -> Result<Self::Program, DeviceError>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program) -> BuildStatus;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    /// Program most recently made current through `use_program`.
    fn current_program(&self) -> Option<Self::Program>;
    fn active_uniforms(&self, program: Self::Program) -> Vec<String>;
    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn set_uniform_i32(&self, location: &Self::UniformLocation, value: i32);
    fn set_uniform_vec3(&self, location: &Self::UniformLocation, value: Vec3);
    fn set_uniform_mat3(&self, location: &Self::UniformLocation, value: &Mat3);
    fn set_uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4);

    // Textures.
    fn max_texture_units(&self) -> u32;
    fn create_texture(&self) -> Result<Self::Texture, DeviceError>;
    /// Upload tightly packed BGR8 pixels as an RGB8 image.
    fn upload_texture_bgr8(&self, texture: Self::Texture, width: u32, height: u32, pixels: &[u8]);
    fn set_texture_sampling(&self, texture: Self::Texture, filter: FilterMode, wrap: WrapMode);
    fn generate_mipmaps(&self, texture: Self::Texture);
    fn bind_texture_unit(&self, slot: u32, texture: Option<Self::Texture>);
    fn delete_texture(&self, texture: Self::Texture);

    // Geometry.
    fn create_vertex_array(&self) -> Result<Self::VertexArray, DeviceError>;
    fn create_buffer(&self) -> Result<Self::Buffer, DeviceError>;
    /// Fill `buffer` and wire it to attribute `location` of `vao` as `components`
    /// floats per vertex.
    fn upload_vertex_attribute(
        &self,
        vao: Self::VertexArray,
        buffer: Self::Buffer,
        location: u32,
        components: u8,
        data: &[f32],
    );
    fn upload_indices(&self, vao: Self::VertexArray, buffer: Self::Buffer, indices: &[u32]);
    fn draw_indexed(&self, vao: Self::VertexArray, primitive: Primitive, count: u32);
    fn delete_buffer(&self, buffer: Self::Buffer);
    fn delete_vertex_array(&self, vao: Self::VertexArray);

    // Framebuffer state.
    fn set_viewport(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4]);
    fn set_polygon_mode(&self, mode: PolygonMode);
}
