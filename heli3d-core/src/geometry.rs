/// Indexed triangle meshes
use nalgebra::Vector3;

use crate::error::GeometryError;

/// Identifies which of the built-in meshes a draw command refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshId {
    Body,
    TailFan,
}

/// An immutable triangle-list mesh with per-vertex normals
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
    indices: Vec<u16>,
}

impl Mesh {
    /// Validates that every index addresses a vertex, faces are complete
    /// triangles and each vertex has exactly one normal.
    pub fn new(
        vertices: Vec<Vector3<f32>>,
        normals: Vec<Vector3<f32>>,
        indices: Vec<u16>,
    ) -> Result<Self, GeometryError> {
        if vertices.len() > usize::from(u16::MAX) + 1 {
            return Err(GeometryError::TooManyVertices(vertices.len()));
        }
        if normals.len() != vertices.len() {
            return Err(GeometryError::NormalCount {
                vertices: vertices.len(),
                normals: normals.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| usize::from(i) >= vertices.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        Ok(Self {
            vertices,
            normals,
            indices,
        })
    }

    /// Build from flat `[x, y, z, ...]` arrays
    pub fn from_flat(positions: &[f32], normals: &[f32], indices: &[u16]) -> Result<Self, GeometryError> {
        for (name, flat) in [("position", positions), ("normal", normals)] {
            if flat.len() % 3 != 0 {
                return Err(GeometryError::FlatLength(name, flat.len()));
            }
        }
        Self::new(to_vectors(positions), to_vectors(normals), indices.to_vec())
    }

    pub fn vertices(&self) -> &[Vector3<f32>] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of each triangle
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [usize::from(t[0]), usize::from(t[1]), usize::from(t[2])])
    }

    /// Positions packed as `[x, y, z, x, y, z, ...]` for buffer upload
    pub fn flat_positions(&self) -> Vec<f32> {
        flatten(&self.vertices)
    }

    pub fn flat_normals(&self) -> Vec<f32> {
        flatten(&self.normals)
    }

    /// The helicopter fuselage: a tapered box
    pub fn helicopter_body() -> Self {
        #[rustfmt::skip]
        const POSITIONS: [f32; 24] = [
            -0.5, -0.4,  3.0,
            -0.5, -0.5,  1.0,
             1.0, -0.5,  1.0,
             1.0, -0.5, -1.0,
            -1.0,  0.5, -1.0,
            -1.0,  0.5,  1.0,
             1.0,  0.5,  1.0,
             1.0,  0.5, -1.0,
        ];
        #[rustfmt::skip]
        const NORMALS: [f32; 24] = [
            0.0, -1.0, 0.0,
            0.0, -1.0, 0.0,
            0.0, -1.0, 0.0,
            0.0, -1.0, 0.0,
            0.0,  1.0, 0.0,
            0.0,  1.0, 0.0,
            0.0,  1.0, 0.0,
            0.0,  1.0, 0.0,
        ];
        #[rustfmt::skip]
        const INDICES: [u16; 36] = [
            0, 1, 2,  0, 2, 3,
            0, 3, 7,  0, 7, 4,
            1, 5, 6,  1, 6, 2,
            4, 5, 1,  4, 1, 0,
            3, 2, 6,  3, 6, 7,
            5, 4, 7,  5, 7, 6,
        ];
        Self::builtin(&POSITIONS, &NORMALS, &INDICES)
    }

    /// Tail plate plus four fan blades
    pub fn tail_fan() -> Self {
        #[rustfmt::skip]
        const POSITIONS: [f32; 48] = [
            // tail plate
            -0.1, -0.5, 0.0,
            -0.1,  0.5, 0.0,
             0.1,  0.5, 0.0,
             0.1, -0.5, 0.0,
            // blades
            -0.5,  0.0,  0.5,   0.5,  0.0,  0.5,   0.0,  0.0,  1.0,
            -0.5,  0.0, -0.5,   0.5,  0.0, -0.5,   0.0,  0.0, -1.0,
             0.0,  0.5,  0.5,   0.0,  0.5, -0.5,   0.5,  0.5,  0.0,
             0.0, -0.5,  0.5,   0.0, -0.5, -0.5,  -0.5, -0.5,  0.0,
        ];
        #[rustfmt::skip]
        const NORMALS: [f32; 48] = [
            -1.0, 0.0, 0.0,
            -1.0, 0.0, 0.0,
             1.0, 0.0, 0.0,
             1.0, 0.0, 0.0,
            0.0, 0.0,  1.0,   0.0, 0.0,  1.0,   0.0, 0.0,  1.0,
            0.0, 0.0, -1.0,   0.0, 0.0, -1.0,   0.0, 0.0, -1.0,
            0.0,  1.0, 0.0,   0.0,  1.0, 0.0,   0.0,  1.0, 0.0,
            0.0, -1.0, 0.0,   0.0, -1.0, 0.0,   0.0, -1.0, 0.0,
        ];
        #[rustfmt::skip]
        const INDICES: [u16; 18] = [
            0, 1, 2,  0, 2, 3,
            4, 5, 6,
            7, 8, 9,
            10, 11, 12,
            13, 14, 15,
        ];
        Self::builtin(&POSITIONS, &NORMALS, &INDICES)
    }

    pub fn builtin_for(id: MeshId) -> Self {
        match id {
            MeshId::Body => Self::helicopter_body(),
            MeshId::TailFan => Self::tail_fan(),
        }
    }

    // Built-in data is fixed and covered by tests, so it is constructed
    // without going through validation.
    fn builtin(positions: &[f32], normals: &[f32], indices: &[u16]) -> Self {
        Self {
            vertices: to_vectors(positions),
            normals: to_vectors(normals),
            indices: indices.to_vec(),
        }
    }
}

fn to_vectors(flat: &[f32]) -> Vec<Vector3<f32>> {
    flat.chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect()
}

fn flatten(vectors: &[Vector3<f32>]) -> Vec<f32> {
    vectors.iter().flat_map(|v| [v.x, v.y, v.z]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_meshes_are_valid() {
        for id in [MeshId::Body, MeshId::TailFan] {
            let mesh = Mesh::builtin_for(id);
            let rebuilt = Mesh::new(
                mesh.vertices().to_vec(),
                mesh.normals().to_vec(),
                mesh.indices().to_vec(),
            );
            assert_eq!(rebuilt.as_ref(), Ok(&mesh));
        }
    }

    #[test]
    fn test_builtin_mesh_sizes() {
        let body = Mesh::helicopter_body();
        assert_eq!(body.vertices().len(), 8);
        assert_eq!(body.triangle_count(), 12);

        let fan = Mesh::tail_fan();
        assert_eq!(fan.vertices().len(), 16);
        assert_eq!(fan.triangle_count(), 6);
        assert_eq!(fan.flat_positions().len(), 48);
    }

    #[test]
    fn test_triangles_iterator() {
        let fan = Mesh::tail_fan();
        let triangles: Vec<_> = fan.triangles().collect();
        assert_eq!(triangles[0], [0, 1, 2]);
        assert_eq!(triangles[5], [13, 14, 15]);
    }

    #[test]
    fn test_rejects_bad_indices() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

        assert!(Mesh::from_flat(&positions, &normals, &[0, 1, 2]).is_ok());
        assert_eq!(
            Mesh::from_flat(&positions, &normals, &[0, 1]),
            Err(GeometryError::IndexCount(2))
        );
        assert_eq!(
            Mesh::from_flat(&positions, &normals, &[0, 1, 3]),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
        assert_eq!(
            Mesh::from_flat(&positions, &normals[..6], &[0, 1, 2]),
            Err(GeometryError::NormalCount {
                vertices: 3,
                normals: 2
            })
        );
    }

    #[test]
    fn test_partial_flat_vertex_rejected() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        assert_eq!(
            Mesh::from_flat(&[&positions[..], &[2.0]].concat(), &normals, &[0, 1, 2]),
            Err(GeometryError::FlatLength("position", 10))
        );
        assert_eq!(
            Mesh::from_flat(&positions, &normals[..8], &[0, 1, 2]),
            Err(GeometryError::FlatLength("normal", 8))
        );
    }
}
