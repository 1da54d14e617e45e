//! Geometry triples and the GPU buffers built from them.

use glam::Vec3;

use crate::error::{Result, ViewerError};

use super::BufferAllocator;

/// A flat `(positions, colors, elements)` triple as produced by a geometry source.
///
/// `elements` groups positions into primitives: one index per point, two per
/// line and three per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub elements: Vec<u32>,
}

impl GeometryData {
    pub fn new(positions: Vec<Vec3>, colors: Vec<Vec3>, elements: Vec<u32>) -> Self {
        Self {
            positions,
            colors,
            elements,
        }
    }

    /// Builds a triple where every position shares the same color.
    pub fn uniform(positions: Vec<Vec3>, color: Vec3, elements: Vec<u32>) -> Self {
        let colors = vec![color; positions.len()];
        Self::new(positions, colors, elements)
    }

    /// Checks that there is one color per position and that every element
    /// indexes an existing position.
    pub fn validate(&self) -> Result<()> {
        if self.colors.len() != self.positions.len() {
            return Err(ViewerError::InvalidGeometry(format!(
                "{} colors for {} positions",
                self.colors.len(),
                self.positions.len()
            )));
        }

        let count = self.positions.len();
        if let Some(bad) = self.elements.iter().find(|&&i| i as usize >= count) {
            return Err(ViewerError::InvalidGeometry(format!(
                "element index {bad} out of range for {count} positions"
            )));
        }

        Ok(())
    }

    fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }

    fn flat_colors(&self) -> Vec<f32> {
        self.colors.iter().flat_map(|c| c.to_array()).collect()
    }
}

/// An index buffer together with the number of indices it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementBuffer<B> {
    pub handle: B,
    pub len: usize,
}

/// GPU-resident positions, colors and elements of one primitive group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBuffer<B> {
    pub positions: B,
    pub colors: B,
    pub elements: ElementBuffer<B>,
    /// Number of positions.
    pub n: usize,
}

impl<B: Copy> GeometryBuffer<B> {
    /// Validates `data` and uploads it through `allocator`.
    ///
    /// Nothing is allocated when validation fails. If an upload fails halfway,
    /// the buffers created so far are freed before the error is returned.
    pub fn build<A>(allocator: &mut A, data: &GeometryData) -> Result<Self>
    where
        A: BufferAllocator<Buffer = B>,
    {
        data.validate()?;

        let positions = allocator.make_vertex_buffer(&data.flat_positions())?;
        let colors = match allocator.make_vertex_buffer(&data.flat_colors()) {
            Ok(buffer) => buffer,
            Err(err) => {
                allocator.delete_buffer(positions);
                return Err(err);
            }
        };
        let elements = match allocator.make_index_buffer(&data.elements) {
            Ok(buffer) => buffer,
            Err(err) => {
                allocator.delete_buffer(positions);
                allocator.delete_buffer(colors);
                return Err(err);
            }
        };

        Ok(Self {
            positions,
            colors,
            elements: ElementBuffer {
                handle: elements,
                len: data.elements.len(),
            },
            n: data.positions.len(),
        })
    }

    /// Frees all three buffers.
    pub fn release<A>(self, allocator: &mut A)
    where
        A: BufferAllocator<Buffer = B>,
    {
        allocator.delete_buffer(self.positions);
        allocator.delete_buffer(self.colors);
        allocator.delete_buffer(self.elements.handle);
    }
}
