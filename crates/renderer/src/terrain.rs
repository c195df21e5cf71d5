//! Frame orchestration: a shared mesh, named textures, and a list of passes
//! that each bind a program, wire samplers, push transforms and draw.

use std::rc::Rc;

use corelib::frame::FrameMatrices;
use glam::Vec3;

use crate::{
    device::{GraphicsDevice, PolygonMode, Primitive},
    error::TextureError,
    mesh::GpuMesh,
    shader::ShaderProgram,
    texture::{SamplerBinding, TextureSet},
};

/// Light blue sky.
pub const CLEAR_COLOR: [f32; 4] = [0.7, 0.8, 1.0, 0.0];

/// Height map on slot 0, then diffuse and specular layers.
pub const TERRAIN_SAMPLERS: [SamplerBinding<'static>; 7] = [
    SamplerBinding::new("heightmap", "DiffuseTextureSampler"),
    SamplerBinding::new("rock", "rt.rock"),
    SamplerBinding::new("grass", "rt.grass"),
    SamplerBinding::new("snow", "rt.snow"),
    SamplerBinding::new("rock_specular", "rt.rock_s"),
    SamplerBinding::new("grass_specular", "rt.grass_s"),
    SamplerBinding::new("snow_specular", "rt.snow_s"),
];

pub const FLOWER_SAMPLERS: [SamplerBinding<'static>; 1] =
    [SamplerBinding::new("heightmap", "DiffuseTextureSampler")];

/// Diffuse-only binding for externally loaded meshes.
pub const MESH_SAMPLERS: [SamplerBinding<'static>; 1] =
    [SamplerBinding::new("rock", "DiffuseTextureSampler")];

/// Uniform names shared by every program.
pub mod uniforms {
    pub const MVP: &str = "MVP";
    pub const VIEW: &str = "V";
    pub const MODEL: &str = "M";
    pub const PROJECTION: &str = "P";
    pub const MODEL_VIEW_3X3: &str = "MV3x3";
    pub const LIGHT_POSITION: &str = "LightPosition_worldspace";
}

pub struct ScenePass<D: GraphicsDevice> {
    pub name: &'static str,
    pub program: ShaderProgram<D>,
    pub primitive: Primitive,
    pub samplers: &'static [SamplerBinding<'static>],
}

impl<D: GraphicsDevice> ScenePass<D> {
    pub fn new(
        name: &'static str,
        program: ShaderProgram<D>,
        primitive: Primitive,
        samplers: &'static [SamplerBinding<'static>],
    ) -> Self {
        Self {
            name,
            program,
            primitive,
            samplers,
        }
    }
}

pub struct TerrainRenderer<D: GraphicsDevice> {
    device: Rc<D>,
    mesh: GpuMesh<D>,
    textures: TextureSet<D>,
    passes: Vec<ScenePass<D>>,
}

impl<D: GraphicsDevice> TerrainRenderer<D> {
    pub fn new(
        device: Rc<D>,
        mesh: GpuMesh<D>,
        textures: TextureSet<D>,
        passes: Vec<ScenePass<D>>,
    ) -> Self {
        Self {
            device,
            mesh,
            textures,
            passes,
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.device.set_viewport(width.max(1), height.max(1));
    }

    /// Clear and draw every pass in order.
    pub fn render(
        &mut self,
        matrices: &FrameMatrices,
        light: Vec3,
        polygon_mode: PolygonMode,
    ) -> Result<(), TextureError> {
        self.device.clear(CLEAR_COLOR);
        self.device.set_polygon_mode(polygon_mode);

        for pass in &self.passes {
            let program = &pass.program;
            program.bind();
            if let Err(e) = self.textures.bind_all(program, pass.samplers) {
                program.unbind();
                return Err(e);
            }

            program.set_mat4(uniforms::MVP, &matrices.mvp);
            program.set_mat4(uniforms::VIEW, &matrices.view);
            program.set_mat4(uniforms::MODEL, &matrices.model);
            program.set_mat4(uniforms::PROJECTION, &matrices.projection);
            program.set_mat3(uniforms::MODEL_VIEW_3X3, &matrices.model_view_3x3);
            program.set_vec3(uniforms::LIGHT_POSITION, light);

            self.mesh.draw(pass.primitive);
            program.unbind();
        }
        Ok(())
    }

    /// Rebuild every program from its source files. Programs that fail keep
    /// their previous build; their pass names are returned.
    pub fn reload_shaders(&mut self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        for pass in &mut self.passes {
            match pass.program.reload() {
                Ok(()) => log::info!("Reloaded '{}' shaders", pass.name),
                Err(e) => {
                    log::error!("Reloading '{}' shaders failed: {}", pass.name, e);
                    failed.push(pass.name);
                }
            }
        }
        failed
    }

    pub fn textures(&self) -> &TextureSet<D> {
        &self.textures
    }
}
