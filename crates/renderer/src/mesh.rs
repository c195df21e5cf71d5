//! GPU-resident mesh: one buffer per attribute plus a u32 index buffer.

use std::rc::Rc;

use asset::MeshData;

use crate::{
    device::{GraphicsDevice, Primitive},
    error::{DeviceError, MeshError},
};

/// Attribute locations shared with the shaders.
pub const POSITION_LOCATION: u32 = 0;
pub const TEXCOORD_LOCATION: u32 = 1;
pub const NORMAL_LOCATION: u32 = 2;

pub struct GpuMesh<D: GraphicsDevice> {
    device: Rc<D>,
    vao: D::VertexArray,
    positions: D::Buffer,
    texcoords: D::Buffer,
    normals: D::Buffer,
    indices: D::Buffer,
    index_count: u32,
    vertex_count: u32,
}

impl<D: GraphicsDevice> GpuMesh<D> {
    /// Copy `mesh` into GPU buffers; the caller may drop the host copy afterwards.
    pub fn upload(device: Rc<D>, mesh: &MeshData) -> Result<Self, MeshError> {
        if !mesh.is_valid() {
            return Err(MeshError::Invalid);
        }
        let vertex_count = u32::try_from(mesh.vertex_count())
            .map_err(|_| MeshError::TooLarge(mesh.vertex_count()))?;
        let index_count = u32::try_from(mesh.indices.len())
            .map_err(|_| MeshError::TooLarge(mesh.indices.len()))?;

        let vao = device.create_vertex_array()?;
        let [positions, texcoords, normals, indices] = match create_buffers::<D, 4>(&*device) {
            Ok(buffers) => buffers,
            Err(e) => {
                device.delete_vertex_array(vao);
                return Err(e.into());
            }
        };

        device.upload_vertex_attribute(
            vao,
            positions,
            POSITION_LOCATION,
            3,
            bytemuck::cast_slice(&mesh.positions),
        );
        device.upload_vertex_attribute(
            vao,
            texcoords,
            TEXCOORD_LOCATION,
            2,
            bytemuck::cast_slice(&mesh.texcoords),
        );
        device.upload_vertex_attribute(
            vao,
            normals,
            NORMAL_LOCATION,
            3,
            bytemuck::cast_slice(&mesh.normals),
        );
        device.upload_indices(vao, indices, &mesh.indices);

        log::info!(
            "Uploaded mesh: {} vertices, {} indices",
            vertex_count,
            index_count
        );

        Ok(Self {
            device,
            vao,
            positions,
            texcoords,
            normals,
            indices,
            index_count,
            vertex_count,
        })
    }

    pub fn draw(&self, primitive: Primitive) {
        self.device.draw_indexed(self.vao, primitive, self.index_count);
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl<D: GraphicsDevice> Drop for GpuMesh<D> {
    fn drop(&mut self) {
        for buffer in [self.positions, self.texcoords, self.normals, self.indices] {
            self.device.delete_buffer(buffer);
        }
        self.device.delete_vertex_array(self.vao);
    }
}

/// Create `N` buffers, releasing the ones already made if any creation fails.
fn create_buffers<D: GraphicsDevice, const N: usize>(
    device: &D,
) -> Result<[D::Buffer; N], DeviceError> {
    let mut created = Vec::with_capacity(N);
    for _ in 0..N {
        match device.create_buffer() {
            Ok(buffer) => created.push(buffer),
            Err(e) => {
                for buffer in created {
                    device.delete_buffer(buffer);
                }
                return Err(e);
            }
        }
    }
    created
        .try_into()
        .map_err(|_| DeviceError::new("buffer", "buffer count mismatch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDevice;
    use asset::{GridTopology, mesh::generate_grid};

    #[test]
    fn uploads_attribute_streams() {
        let device = Rc::new(MockDevice::new());
        let grid = generate_grid(4, 1.0, GridTopology::Patches);
        let mesh = GpuMesh::upload(device.clone(), &grid).expect("upload");

        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.index_count(), 9 * 4);
        assert_eq!(device.attribute_len(POSITION_LOCATION), Some((3, 16 * 3)));
        assert_eq!(device.attribute_len(TEXCOORD_LOCATION), Some((2, 16 * 2)));
        assert_eq!(device.attribute_len(NORMAL_LOCATION), Some((3, 16 * 3)));
        assert_eq!(device.live_buffers(), 4);
    }

    #[test]
    fn draw_uses_full_index_range() {
        let device = Rc::new(MockDevice::new());
        let grid = generate_grid(3, 1.0, GridTopology::Triangles);
        let mesh = GpuMesh::upload(device.clone(), &grid).expect("upload");

        mesh.draw(Primitive::Triangles);
        mesh.draw(Primitive::Patches { vertices: 4 });
        assert_eq!(
            device.draws(),
            vec![
                (Primitive::Triangles, 24),
                (Primitive::Patches { vertices: 4 }, 24)
            ]
        );
    }

    #[test]
    fn rejects_invalid_mesh() {
        let device = Rc::new(MockDevice::new());
        assert!(matches!(
            GpuMesh::upload(device.clone(), &MeshData::default()),
            Err(MeshError::Invalid)
        ));
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn drop_releases_buffers() {
        let device = Rc::new(MockDevice::new());
        let grid = generate_grid(2, 1.0, GridTopology::Triangles);
        drop(GpuMesh::upload(device.clone(), &grid).expect("upload"));
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_vertex_arrays(), 0);
    }
}
