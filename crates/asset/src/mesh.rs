//! CPU-side mesh representation used by loaders and the procedural grid.

/// Flattened vertex attribute streams plus an index list.
///
/// `positions`, `texcoords` and `normals` always have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// How [`generate_grid`] connects neighbouring grid points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridTopology {
    /// Two triangles per cell, 6 indices.
    Triangles,
    /// One quad patch per cell, 4 indices, for tessellation.
    Patches,
}

impl GridTopology {
    /// Indices emitted per grid cell.
    pub fn indices_per_cell(self) -> usize {
        match self {
            GridTopology::Triangles => 6,
            GridTopology::Patches => 4,
        }
    }
}

impl MeshData {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            texcoords: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Append one vertex; returns its index.
    pub fn push_vertex(&mut self, position: [f32; 3], texcoord: [f32; 2], normal: [f32; 3]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.texcoords.push(texcoord);
        self.normals.push(normal);
        index
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the attribute streams agree in length, every index is in
    /// range and there is something to draw.
    pub fn is_valid(&self) -> bool {
        let n = self.positions.len();
        n > 0
            && self.texcoords.len() == n
            && self.normals.len() == n
            && !self.indices.is_empty()
            && self.indices.iter().all(|&i| (i as usize) < n)
    }
}

/// Flat `points x points` grid on the XZ plane, centred on the origin, normals +Y.
///
/// Fewer than two points per side yields an empty mesh.
pub fn generate_grid(points: u32, spacing: f32, topology: GridTopology) -> MeshData {
    if points < 2 {
        return MeshData::default();
    }
    let n = points as usize;
    let cells = (n - 1) * (n - 1);
    let mut mesh = MeshData::with_capacity(n * n, cells * topology.indices_per_cell());

    let half_extent = spacing * points as f32 / 2.0;
    let uv_span = (points - 1) as f32;
    for i in 0..points {
        for j in 0..points {
            let x = spacing * i as f32 - half_extent;
            let z = spacing * j as f32 - half_extent;
            let uv = [(i as f32 + 0.5) / uv_span, (j as f32 + 0.5) / uv_span];
            mesh.push_vertex([x, 0.0, z], uv, [0.0, 1.0, 0.0]);
        }
    }

    for i in 0..points - 1 {
        for j in 0..points - 1 {
            let top_left = i * points + j;
            let top_right = top_left + 1;
            let bottom_left = top_left + points;
            let bottom_right = bottom_left + 1;
            match topology {
                GridTopology::Triangles => mesh.indices.extend_from_slice(&[
                    top_left,
                    top_right,
                    bottom_left,
                    bottom_left,
                    top_right,
                    bottom_right,
                ]),
                GridTopology::Patches => mesh.indices.extend_from_slice(&[
                    top_left,
                    top_right,
                    bottom_right,
                    bottom_left,
                ]),
            }
        }
    }

    log::debug!(
        "Generated {}x{} grid ({:?}): {} vertices, {} indices",
        points,
        points,
        topology,
        mesh.vertex_count(),
        mesh.indices.len()
    );
    mesh
}
