//! Renderer error types.

use thiserror::Error;

use crate::{device::ShaderStage, shader::StageReport};

/// The driver refused to create an object.
#[derive(Debug, Error)]
#[error("failed to create {kind}: {message}")]
pub struct DeviceError {
    pub kind: &'static str,
    pub message: String,
}

impl DeviceError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("missing required {0} stage")]
    MissingStage(ShaderStage),

    #[error("tessellation stages must be supplied together; only {0} was given")]
    UnpairedTessellation(ShaderStage),

    #[error("program link failed: {log}")]
    Link {
        log: String,
        stages: Vec<StageReport>,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture slot {slot} out of range (device has {available} units)")]
    SlotOutOfRange { slot: u32, available: u32 },

    #[error("texture has not been activated on a slot")]
    NotActivated,

    #[error("no texture named '{0}'")]
    Unknown(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh data is empty or inconsistent")]
    Invalid,

    #[error("mesh has {0} vertices, more than a u32 index can address")]
    TooLarge(usize),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
