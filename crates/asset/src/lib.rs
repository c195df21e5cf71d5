//! Asset loading/parsers (meshes, bitmaps).
//! Minimal 24-bit BMP decoder and OBJ-style mesh decoder producing CPU-side data
//! that the renderer uploads and then drops.

pub mod bmp;
pub mod error;
pub mod mesh;
pub mod obj;
pub mod raster;

pub use error::DecodeError;
pub use mesh::{GridTopology, MeshData};
pub use raster::RasterImage;
