//! Scene assembly: textures, mesh and shader passes loaded from the asset directory.

use std::{path::Path, rc::Rc};

use anyhow::{Context, Result};
use asset::{DecodeError, GridTopology, RasterImage, bmp, mesh::generate_grid, obj};
use renderer::{
    FilterMode, GpuMesh, GraphicsDevice, Primitive, ProgramSources, ScenePass, ShaderProgram,
    TerrainRenderer, Texture, TextureSet, WrapMode,
    terrain::{FLOWER_SAMPLERS, MESH_SAMPLERS, TERRAIN_SAMPLERS},
};

use crate::config::DemoConfig;

/// Texture name, file under the asset directory, and filter mode.
pub const TEXTURE_FILES: [(&str, &str, FilterMode); 7] = [
    ("heightmap", "mountains_height.bmp", FilterMode::Nearest),
    ("rock", "rocks.bmp", FilterMode::LinearMipmapLinear),
    ("grass", "grass.bmp", FilterMode::LinearMipmapLinear),
    ("snow", "snow.bmp", FilterMode::LinearMipmapLinear),
    ("rock_specular", "rocks-s.bmp", FilterMode::LinearMipmapLinear),
    ("grass_specular", "grass-s.bmp", FilterMode::LinearMipmapLinear),
    ("snow_specular", "snow-s.bmp", FilterMode::LinearMipmapLinear),
];

const FALLBACK_SIZE: u32 = 256;
const FALLBACK_CELL: u32 = 32;

/// Decode a bitmap. A missing file is replaced by a checkerboard so the demo
/// still starts without its art; any other decode failure is returned.
pub fn load_raster(path: &Path) -> Result<RasterImage> {
    match bmp::decode(path) {
        Ok(image) => Ok(image),
        Err(DecodeError::NotFound { path, .. }) => {
            log::warn!(
                "Texture {} not found, using a checkerboard",
                path.display()
            );
            Ok(RasterImage::checkerboard(FALLBACK_SIZE, FALLBACK_CELL))
        }
        Err(e) => Err(e).with_context(|| format!("decoding {}", path.display())),
    }
}

pub fn load_textures<D: GraphicsDevice>(
    device: &Rc<D>,
    config: &DemoConfig,
) -> Result<TextureSet<D>> {
    let mut textures = TextureSet::new();
    for (name, file, filter) in TEXTURE_FILES {
        let image = load_raster(&config.asset(file))?;
        let texture = Texture::create(device.clone(), image, filter, WrapMode::MirroredRepeat)
            .with_context(|| format!("uploading texture '{name}'"))?;
        textures.insert(name, texture);
    }
    Ok(textures)
}

/// Grid of tessellation patches, or the triangles of an external OBJ.
pub fn load_mesh<D: GraphicsDevice>(device: &Rc<D>, config: &DemoConfig) -> Result<GpuMesh<D>> {
    let data = match &config.mesh {
        Some(path) => obj::decode(path).with_context(|| format!("loading mesh {}", path.display()))?,
        None => generate_grid(config.grid_points, config.grid_spacing, GridTopology::Patches),
    };
    log::info!(
        "Mesh: {} vertices, {} indices",
        data.vertex_count(),
        data.indices.len()
    );
    Ok(GpuMesh::upload(device.clone(), &data)?)
}

fn compile<D: GraphicsDevice>(
    device: &Rc<D>,
    name: &str,
    sources: ProgramSources,
) -> Result<ShaderProgram<D>> {
    ShaderProgram::compile_and_link(device.clone(), sources)
        .with_context(|| format!("building '{name}' shaders"))
}

pub fn build_passes<D: GraphicsDevice>(
    device: &Rc<D>,
    config: &DemoConfig,
) -> Result<Vec<ScenePass<D>>> {
    if config.mesh.is_some() {
        let sources = ProgramSources::new(config.shader("Mesh.vert"), config.shader("Mesh.frag"));
        return Ok(vec![ScenePass::new(
            "mesh",
            compile(device, "mesh", sources)?,
            Primitive::Triangles,
            &MESH_SAMPLERS,
        )]);
    }

    let terrain = ProgramSources::builder()
        .vertex(config.shader("Terrain.vert"))
        .tess_control(config.shader("Terrain.tesc"))
        .tess_evaluation(config.shader("Terrain.tese"))
        .fragment(config.shader("Terrain.frag"))
        .build()?;
    let flowers = ProgramSources::builder()
        .vertex(config.shader("Flower.vert"))
        .geometry(config.shader("Flower.geom"))
        .fragment(config.shader("Flower.frag"))
        .build()?;

    Ok(vec![
        ScenePass::new(
            "terrain",
            compile(device, "terrain", terrain)?,
            Primitive::Patches { vertices: 4 },
            &TERRAIN_SAMPLERS,
        ),
        ScenePass::new(
            "flowers",
            compile(device, "flowers", flowers)?,
            Primitive::Points,
            &FLOWER_SAMPLERS,
        ),
    ])
}

pub fn build_scene<D: GraphicsDevice>(
    device: Rc<D>,
    config: &DemoConfig,
) -> Result<TerrainRenderer<D>> {
    let textures = load_textures(&device, config)?;
    let mesh = load_mesh(&device, config)?;
    let passes = build_passes(&device, config)?;
    let renderer = TerrainRenderer::new(device, mesh, textures, passes);
    renderer.resize(config.width, config.height);
    Ok(renderer)
}
