//! Per-frame transform set pushed to shader programs.

use crate::{Mat3, Mat4, camera::FlyCamera};

/// Matrices shared by every pass of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMatrices {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub mvp: Mat4,
    /// Upper-left 3x3 of model-view, for transforming normals/tangents.
    pub model_view_3x3: Mat3,
}

impl FrameMatrices {
    pub fn new(camera: &FlyCamera, model: Mat4) -> Self {
        let view = camera.view();
        let projection = camera.proj();
        Self {
            model,
            view,
            projection,
            mvp: projection * view * model,
            model_view_3x3: Mat3::from_mat4(view * model),
        }
    }
}
