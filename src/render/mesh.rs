//! Polygon meshes as geometry sources.
//!
//! [`MeshSource`] splits a [`MeshData`] into the four primitive groups: every
//! vertex as a point, every unique edge as a line, and the fan-triangulated
//! faces twice, once per winding, so both sides survive back-face culling.

use std::path::Path;

use glam::Vec3;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{GeometryData, GeometrySource};

/// Vertices and polygonal faces, loadable from JSON:
/// `{"vertices": [[0,0,0], ...], "faces": [[0,1,2,3], ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<Vec<u32>>,
}

impl MeshData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// An axis-aligned unit cube centred on the origin, faces wound outwards.
    pub fn cube() -> Self {
        Self {
            vertices: vec![
                [-0.5, -0.5, -0.5],
                [0.5, -0.5, -0.5],
                [0.5, 0.5, -0.5],
                [-0.5, 0.5, -0.5],
                [-0.5, -0.5, 0.5],
                [0.5, -0.5, 0.5],
                [0.5, 0.5, 0.5],
                [-0.5, 0.5, 0.5],
            ],
            faces: vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![1, 2, 6, 5],
                vec![2, 3, 7, 6],
                vec![3, 0, 4, 7],
            ],
        }
    }

    fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().copied().map(Vec3::from).collect()
    }

    /// Unique undirected edges in order of first appearance.
    fn edges(&self) -> IndexSet<(u32, u32)> {
        let mut edges = IndexSet::new();
        for face in &self.faces {
            if face.len() < 2 {
                continue;
            }
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
        edges
    }

    /// Fan triangulation of every face with at least three corners.
    fn triangles(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::new();
        for face in self.faces.iter().filter(|face| face.len() >= 3) {
            for i in 1..face.len() - 1 {
                triangles.push([face[0], face[i], face[i + 1]]);
            }
        }
        triangles
    }
}

/// Per-group colors of a [`MeshSource`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshColors {
    pub points: [f32; 3],
    pub lines: [f32; 3],
    pub frontfaces: [f32; 3],
    pub backfaces: [f32; 3],
}

impl Default for MeshColors {
    fn default() -> Self {
        Self {
            points: [0.2, 0.2, 0.2],
            lines: [0.4, 0.4, 0.4],
            frontfaces: [0.8, 0.8, 0.8],
            backfaces: [0.8, 0.8, 0.8],
        }
    }
}

/// Geometry source backed by a polygon mesh.
#[derive(Debug, Clone)]
pub struct MeshSource {
    mesh: MeshData,
    colors: MeshColors,
}

impl MeshSource {
    pub fn new(mesh: MeshData) -> Self {
        Self::with_colors(mesh, MeshColors::default())
    }

    pub fn with_colors(mesh: MeshData, colors: MeshColors) -> Self {
        Self { mesh, colors }
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    fn faces(&self, color: [f32; 3], flip: bool) -> Option<GeometryData> {
        let triangles = self.mesh.triangles();
        if triangles.is_empty() {
            return None;
        }
        let elements = triangles
            .into_iter()
            .flat_map(|[a, b, c]| if flip { [a, c, b] } else { [a, b, c] })
            .collect();
        Some(GeometryData::uniform(
            self.mesh.positions(),
            Vec3::from(color),
            elements,
        ))
    }
}

impl GeometrySource for MeshSource {
    fn points_data(&self) -> Option<GeometryData> {
        if self.mesh.vertices.is_empty() {
            return None;
        }
        let positions = self.mesh.positions();
        let elements = (0..positions.len() as u32).collect();
        Some(GeometryData::uniform(
            positions,
            Vec3::from(self.colors.points),
            elements,
        ))
    }

    fn lines_data(&self) -> Option<GeometryData> {
        let edges = self.mesh.edges();
        if edges.is_empty() {
            return None;
        }
        let elements = edges.into_iter().flat_map(|(a, b)| [a, b]).collect();
        Some(GeometryData::uniform(
            self.mesh.positions(),
            Vec3::from(self.colors.lines),
            elements,
        ))
    }

    fn frontfaces_data(&self) -> Option<GeometryData> {
        self.faces(self.colors.frontfaces, false)
    }

    fn backfaces_data(&self) -> Option<GeometryData> {
        self.faces(self.colors.backfaces, true)
    }
}
