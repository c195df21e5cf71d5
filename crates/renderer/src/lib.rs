//! Renderer: GPU resources behind a driver seam, plus the terrain frame loop.
//! OpenGL 4.5 core via glow (tessellation and geometry stages are required).

pub mod device;
pub mod error;
pub mod gl;
pub mod mesh;
pub mod shader;
pub mod terrain;
pub mod texture;

#[cfg(test)]
mod mock;

pub use device::{GraphicsDevice, PolygonMode, Primitive, ShaderStage};
pub use error::{DeviceError, MeshError, ShaderError, TextureError};
pub use gl::GlDevice;
pub use mesh::GpuMesh;
pub use shader::{ProgramSources, ShaderProgram, StageReport};
pub use terrain::{ScenePass, TerrainRenderer};
pub use texture::{FilterMode, SamplerBinding, Texture, TextureSet, WrapMode};
