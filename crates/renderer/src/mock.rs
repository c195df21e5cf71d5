//! Recording device for tests. "Compiles" GLSL by scanning `uniform`
//! declarations; `#error` lines fail compilation. Linking needs a compiled
//! vertex and fragment stage.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use glam::{Mat3, Mat4, Vec3};

use crate::{
    device::{BuildStatus, GraphicsDevice, PolygonMode, Primitive, ShaderStage},
    error::DeviceError,
    texture::{FilterMode, WrapMode},
};

const MOCK_TEXTURE_UNITS: u32 = 16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
    pub filter: Option<FilterMode>,
    pub wrap: Option<WrapMode>,
    pub mipmapped: bool,
}

#[derive(Debug)]
struct MockShader {
    stage: ShaderStage,
    compiled: bool,
    uniforms: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct MockProgram {
    attached: Vec<(ShaderStage, bool, BTreeSet<String>)>,
    uniforms: BTreeSet<String>,
    linked: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, MockShader>,
    programs: HashMap<u32, MockProgram>,
    textures: HashMap<u32, TextureInfo>,
    buffers: HashMap<u32, usize>,
    vertex_arrays: BTreeSet<u32>,
    attributes: HashMap<u32, (u8, usize)>,
    units: HashMap<u32, u32>,
    current_program: Option<u32>,
    uniforms_i32: HashMap<String, i32>,
    draws: Vec<(Primitive, u32)>,
    polygon_mode: PolygonMode,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MockDevice {
    state: RefCell<State>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn attached_stages(&self, program: u32) -> Vec<ShaderStage> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.attached.iter().map(|(stage, _, _)| *stage).collect())
            .unwrap_or_default()
    }

    pub fn texture_info(&self, texture: u32) -> Option<TextureInfo> {
        self.state.borrow().textures.get(&texture).cloned()
    }

    pub fn bound_unit(&self, slot: u32) -> Option<u32> {
        self.state.borrow().units.get(&slot).copied()
    }

    /// Last value written to integer uniform `name`, in any program.
    pub fn uniform_i32(&self, name: &str) -> Option<i32> {
        self.state.borrow().uniforms_i32.get(name).copied()
    }

    /// `(components, float count)` uploaded for attribute `location`.
    pub fn attribute_len(&self, location: u32) -> Option<(u8, usize)> {
        self.state.borrow().attributes.get(&location).copied()
    }

    pub fn draws(&self) -> Vec<(Primitive, u32)> {
        self.state.borrow().draws.clone()
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.state.borrow().polygon_mode
    }
}

fn scan_uniforms(source: &str) -> BTreeSet<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            (tokens.next()? == "uniform").then_some(())?;
            let _ty = tokens.next()?;
            let name = tokens.next()?.trim_end_matches(';');
            let name = name.split('[').next().unwrap_or(name);
            Some(name.to_string())
        })
        .collect()
}

impl GraphicsDevice for MockDevice {
    type Shader = u32;
    type Program = u32;
    type Texture = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = (u32, String);

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.shaders.insert(
            id,
            MockShader {
                stage,
                compiled: false,
                uniforms: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> BuildStatus {
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.shaders.get_mut(&shader) else {
            return BuildStatus {
                success: false,
                log: format!("no shader object {shader}"),
            };
        };
        match source.lines().find(|l| l.trim_start().starts_with("#error")) {
            Some(line) => {
                entry.compiled = false;
                BuildStatus {
                    success: false,
                    log: format!("ERROR: 0:1: '{}'", line.trim()),
                }
            }
            None => {
                entry.compiled = true;
                entry.uniforms = scan_uniforms(source);
                BuildStatus {
                    success: true,
                    log: String::new(),
                }
            }
        }
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.programs.insert(id, MockProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        let Some((stage, compiled, uniforms)) = state
            .shaders
            .get(&shader)
            .map(|s| (s.stage, s.compiled, s.uniforms.clone()))
        else {
            return;
        };
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.push((stage, compiled, uniforms));
        }
    }

    fn link_program(&self, program: u32) -> BuildStatus {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.programs.get_mut(&program) else {
            return BuildStatus {
                success: false,
                log: format!("no program object {program}"),
            };
        };
        let has = |stage| p.attached.iter().any(|(s, ok, _)| *s == stage && *ok);
        let missing: Vec<&str> = [ShaderStage::Vertex, ShaderStage::Fragment]
            .into_iter()
            .filter(|s| !has(*s))
            .map(ShaderStage::label)
            .collect();
        if !missing.is_empty() {
            p.linked = false;
            return BuildStatus {
                success: false,
                log: format!("error: no compiled {} stage attached", missing.join(", ")),
            };
        }
        p.uniforms = p
            .attached
            .iter()
            .flat_map(|(_, _, u)| u.iter().cloned())
            .collect();
        p.linked = true;
        BuildStatus {
            success: true,
            log: String::new(),
        }
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().current_program = program;
    }

    fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    fn active_uniforms(&self, program: u32) -> Vec<String> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .filter(|p| p.linked)
            .map(|p| p.uniforms.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<(u32, String)> {
        let state = self.state.borrow();
        let p = state.programs.get(&program)?;
        (p.linked && p.uniforms.contains(name)).then(|| (program, name.to_string()))
    }

    fn set_uniform_i32(&self, location: &(u32, String), value: i32) {
        self.state
            .borrow_mut()
            .uniforms_i32
            .insert(location.1.clone(), value);
    }

    fn set_uniform_vec3(&self, _location: &(u32, String), _value: Vec3) {}

    fn set_uniform_mat3(&self, _location: &(u32, String), _value: &Mat3) {}

    fn set_uniform_mat4(&self, _location: &(u32, String), _value: &Mat4) {}

    fn max_texture_units(&self) -> u32 {
        MOCK_TEXTURE_UNITS
    }

    fn create_texture(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.textures.insert(id, TextureInfo::default());
        Ok(id)
    }

    fn upload_texture_bgr8(&self, texture: u32, width: u32, height: u32, pixels: &[u8]) {
        if let Some(info) = self.state.borrow_mut().textures.get_mut(&texture) {
            info.width = width;
            info.height = height;
            info.byte_len = pixels.len();
        }
    }

    fn set_texture_sampling(&self, texture: u32, filter: FilterMode, wrap: WrapMode) {
        if let Some(info) = self.state.borrow_mut().textures.get_mut(&texture) {
            info.filter = Some(filter);
            info.wrap = Some(wrap);
        }
    }

    fn generate_mipmaps(&self, texture: u32) {
        if let Some(info) = self.state.borrow_mut().textures.get_mut(&texture) {
            info.mipmapped = true;
        }
    }

    fn bind_texture_unit(&self, slot: u32, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match texture {
            Some(texture) => state.units.insert(slot, texture),
            None => state.units.remove(&slot),
        };
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.units.retain(|_, t| *t != texture);
    }

    fn create_vertex_array(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.vertex_arrays.insert(id);
        Ok(id)
    }

    fn create_buffer(&self) -> Result<u32, DeviceError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.buffers.insert(id, 0);
        Ok(id)
    }

    fn upload_vertex_attribute(
        &self,
        _vao: u32,
        buffer: u32,
        location: u32,
        components: u8,
        data: &[f32],
    ) {
        let mut state = self.state.borrow_mut();
        state.buffers.insert(buffer, data.len() * 4);
        state.attributes.insert(location, (components, data.len()));
    }

    fn upload_indices(&self, _vao: u32, buffer: u32, indices: &[u32]) {
        self.state
            .borrow_mut()
            .buffers
            .insert(buffer, indices.len() * 4);
    }

    fn draw_indexed(&self, _vao: u32, primitive: Primitive, count: u32) {
        self.state.borrow_mut().draws.push((primitive, count));
    }

    fn delete_buffer(&self, buffer: u32) {
        self.state.borrow_mut().buffers.remove(&buffer);
    }

    fn delete_vertex_array(&self, vao: u32) {
        self.state.borrow_mut().vertex_arrays.remove(&vao);
    }

    fn set_viewport(&self, _width: u32, _height: u32) {}

    fn clear(&self, _color: [f32; 4]) {}

    fn set_polygon_mode(&self, mode: PolygonMode) {
        self.state.borrow_mut().polygon_mode = mode;
    }
}

/// Scratch directory of shader sources, removed on drop.
pub struct SourceDir {
    dir: PathBuf,
}

impl SourceDir {
    pub fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "terrascape-shaders-{}-{}",
            std::process::id(),
            tag
        ));
        std::fs::create_dir_all(&dir).expect("create shader scratch dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write (or overwrite) `name` and return its path.
    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.join(name);
        std::fs::write(&path, contents).expect("write shader source");
        path
    }
}

impl Drop for SourceDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
