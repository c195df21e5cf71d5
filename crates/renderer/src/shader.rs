//! Shader program resource: compile stages from files, link, hot-reload.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use glam::{Mat3, Mat4, Vec3};

use crate::{
    device::{GraphicsDevice, ShaderStage},
    error::ShaderError,
};

/// Source file per stage. Vertex and fragment are required, tessellation stages
/// come as a pair, geometry is optional.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSources {
    vertex: PathBuf,
    fragment: PathBuf,
    tessellation: Option<(PathBuf, PathBuf)>,
    geometry: Option<PathBuf>,
}

impl ProgramSources {
    /// Plain vertex + fragment program.
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            tessellation: None,
            geometry: None,
        }
    }

    pub fn builder() -> ProgramSourcesBuilder {
        ProgramSourcesBuilder::default()
    }

    /// Stages in pipeline order.
    pub fn stages(&self) -> Vec<(ShaderStage, &Path)> {
        let mut stages = vec![(ShaderStage::Vertex, self.vertex.as_path())];
        if let Some((control, evaluation)) = &self.tessellation {
            stages.push((ShaderStage::TessControl, control.as_path()));
            stages.push((ShaderStage::TessEvaluation, evaluation.as_path()));
        }
        if let Some(geometry) = &self.geometry {
            stages.push((ShaderStage::Geometry, geometry.as_path()));
        }
        stages.push((ShaderStage::Fragment, self.fragment.as_path()));
        stages
    }

    pub fn has_tessellation(&self) -> bool {
        self.tessellation.is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProgramSourcesBuilder {
    vertex: Option<PathBuf>,
    fragment: Option<PathBuf>,
    tess_control: Option<PathBuf>,
    tess_evaluation: Option<PathBuf>,
    geometry: Option<PathBuf>,
}

impl ProgramSourcesBuilder {
    pub fn vertex(mut self, path: impl Into<PathBuf>) -> Self {
        self.vertex = Some(path.into());
        self
    }

    pub fn fragment(mut self, path: impl Into<PathBuf>) -> Self {
        self.fragment = Some(path.into());
        self
    }

    pub fn tess_control(mut self, path: impl Into<PathBuf>) -> Self {
        self.tess_control = Some(path.into());
        self
    }

    pub fn tess_evaluation(mut self, path: impl Into<PathBuf>) -> Self {
        self.tess_evaluation = Some(path.into());
        self
    }

    pub fn geometry(mut self, path: impl Into<PathBuf>) -> Self {
        self.geometry = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ProgramSources, ShaderError> {
        let vertex = self
            .vertex
            .ok_or(ShaderError::MissingStage(ShaderStage::Vertex))?;
        let fragment = self
            .fragment
            .ok_or(ShaderError::MissingStage(ShaderStage::Fragment))?;
        let tessellation = match (self.tess_control, self.tess_evaluation) {
            (Some(control), Some(evaluation)) => Some((control, evaluation)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ShaderError::UnpairedTessellation(ShaderStage::TessControl));
            }
            (None, Some(_)) => {
                return Err(ShaderError::UnpairedTessellation(
                    ShaderStage::TessEvaluation,
                ));
            }
        };
        Ok(ProgramSources {
            vertex,
            fragment,
            tessellation,
            geometry: self.geometry,
        })
    }
}

/// Outcome of compiling one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReport {
    pub stage: ShaderStage,
    pub path: PathBuf,
    pub compiled: bool,
    pub log: String,
}

/// A linked GPU program. Released when dropped.
pub struct ShaderProgram<D: GraphicsDevice> {
    device: Rc<D>,
    sources: ProgramSources,
    program: D::Program,
    stages: Vec<StageReport>,
    link_log: String,
}

impl<D: GraphicsDevice> ShaderProgram<D> {
    /// Compile every stage and link them. Stage failures are reported but only a
    /// failed link is an error.
    pub fn compile_and_link(device: Rc<D>, sources: ProgramSources) -> Result<Self, ShaderError> {
        let linked = link(&*device, &sources)?;
        Ok(Self {
            device,
            sources,
            program: linked.program,
            stages: linked.stages,
            link_log: linked.log,
        })
    }

    /// Rebuild from the same source files. On failure the current program is kept.
    pub fn reload(&mut self) -> Result<(), ShaderError> {
        let linked = link(&*self.device, &self.sources)?;
        self.replace(linked);
        Ok(())
    }

    /// Rebuild from new source files; they replace the stored ones on success.
    pub fn reload_with(&mut self, sources: ProgramSources) -> Result<(), ShaderError> {
        let linked = link(&*self.device, &sources)?;
        self.sources = sources;
        self.replace(linked);
        Ok(())
    }

    fn replace(&mut self, linked: Linked<D>) {
        self.unbind();
        let old = std::mem::replace(&mut self.program, linked.program);
        self.device.delete_program(old);
        self.stages = linked.stages;
        self.link_log = linked.log;
    }

    pub fn bind(&self) {
        self.device.use_program(Some(self.program));
    }

    /// Clear the current program, but only if it is this one.
    pub fn unbind(&self) {
        if self.is_bound() {
            self.device.use_program(None);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.device.current_program() == Some(self.program)
    }

    #[inline]
    pub fn id(&self) -> D::Program {
        self.program
    }

    pub fn sources(&self) -> &ProgramSources {
        &self.sources
    }

    /// Per-stage compile results of the latest successful build.
    pub fn stage_reports(&self) -> &[StageReport] {
        &self.stages
    }

    pub fn link_log(&self) -> &str {
        &self.link_log
    }

    /// Names of the uniforms the driver kept active after linking.
    pub fn uniform_names(&self) -> BTreeSet<String> {
        self.device.active_uniforms(self.program).into_iter().collect()
    }

    pub fn uniform_location(&self, name: &str) -> Option<D::UniformLocation> {
        let location = self.device.uniform_location(self.program, name);
        if location.is_none() {
            log::debug!("Uniform '{}' is not active in program {:?}", name, self.program);
        }
        location
    }

    /// Setters return `false` when the uniform is not active; the value is dropped.
    pub fn set_i32(&self, name: &str, value: i32) -> bool {
        self.uniform_location(name)
            .map(|loc| self.device.set_uniform_i32(&loc, value))
            .is_some()
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) -> bool {
        self.uniform_location(name)
            .map(|loc| self.device.set_uniform_vec3(&loc, value))
            .is_some()
    }

    pub fn set_mat3(&self, name: &str, value: &Mat3) -> bool {
        self.uniform_location(name)
            .map(|loc| self.device.set_uniform_mat3(&loc, value))
            .is_some()
    }

    pub fn set_mat4(&self, name: &str, value: &Mat4) -> bool {
        self.uniform_location(name)
            .map(|loc| self.device.set_uniform_mat4(&loc, value))
            .is_some()
    }
}

impl<D: GraphicsDevice> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        self.unbind();
        self.device.delete_program(self.program);
    }
}

struct Linked<D: GraphicsDevice> {
    program: D::Program,
    stages: Vec<StageReport>,
    log: String,
}

/// Compiled stage objects; released when the build finishes, whatever the outcome.
struct StageObjects<'a, D: GraphicsDevice> {
    device: &'a D,
    shaders: Vec<D::Shader>,
}

impl<D: GraphicsDevice> Drop for StageObjects<'_, D> {
    fn drop(&mut self) {
        for shader in self.shaders.drain(..) {
            self.device.delete_shader(shader);
        }
    }
}

fn link<D: GraphicsDevice>(device: &D, sources: &ProgramSources) -> Result<Linked<D>, ShaderError> {
    let mut compiled = StageObjects {
        device,
        shaders: Vec::new(),
    };
    let mut stages = Vec::new();

    for (stage, path) in sources.stages() {
        log::info!("Compiling {} shader: {}", stage, path.display());
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Could not read {}: {}", path.display(), e);
                stages.push(StageReport {
                    stage,
                    path: path.to_path_buf(),
                    compiled: false,
                    log: format!("could not read {}: {e}", path.display()),
                });
                continue;
            }
        };

        let shader = device.create_shader(stage)?;
        let status = device.compile_shader(shader, &source);
        if !status.log.trim().is_empty() {
            log::warn!("{}:\n{}", path.display(), status.log.trim_end());
        }
        log::info!(
            "Compilation of {}: {}",
            path.display(),
            if status.success { "Success" } else { "Failed!" }
        );
        if status.success {
            compiled.shaders.push(shader);
        } else {
            device.delete_shader(shader);
        }
        stages.push(StageReport {
            stage,
            path: path.to_path_buf(),
            compiled: status.success,
            log: status.log,
        });
    }

    let program = device.create_program()?;
    for &shader in &compiled.shaders {
        device.attach_shader(program, shader);
    }
    let status = device.link_program(program);
    drop(compiled);

    if !status.log.trim().is_empty() {
        log::warn!("Program link log:\n{}", status.log.trim_end());
    }
    log::info!(
        "Linking program: {}",
        if status.success { "Success" } else { "Failed!" }
    );

    if !status.success {
        device.delete_program(program);
        return Err(ShaderError::Link {
            log: status.log,
            stages,
        });
    }

    Ok(Linked {
        program,
        stages,
        log: status.log,
    })
}
