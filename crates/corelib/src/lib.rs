//! Core types: math re-exports, fly camera, frame matrices, frame timing.

pub use glam::{Mat3, Mat4, Vec2, Vec3, vec3};

pub mod camera;
pub mod frame;
pub mod timing;
