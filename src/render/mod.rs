//! Backend-neutral rendering.
//!
//! Drawable objects never talk to OpenGL directly. They allocate through a
//! [`BufferAllocator`] and draw through a [`Shader`], both of which are
//! implemented for glow in [`crate::abs`] and by recording fakes in tests.

use std::fmt;

use glam::{Mat4, Vec3};

use crate::error::Result;

pub mod buffer;
pub mod mesh;
pub mod object;

pub use buffer::*;
pub use mesh::*;
pub use object::*;

/// One of the four renderable subsets of an object's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveGroup {
    Points,
    Lines,
    FrontFaces,
    BackFaces,
}

impl PrimitiveGroup {
    /// All groups in draw order.
    pub const ALL: [PrimitiveGroup; 4] = [
        PrimitiveGroup::Points,
        PrimitiveGroup::Lines,
        PrimitiveGroup::FrontFaces,
        PrimitiveGroup::BackFaces,
    ];
}

impl fmt::Display for PrimitiveGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveGroup::Points => "points",
            PrimitiveGroup::Lines => "lines",
            PrimitiveGroup::FrontFaces => "frontfaces",
            PrimitiveGroup::BackFaces => "backfaces",
        };
        f.write_str(name)
    }
}

/// Allocates GPU-resident buffers.
pub trait BufferAllocator {
    /// Handle to a buffer living on the GPU.
    type Buffer: Copy + fmt::Debug;

    /// Uploads a flat float array as a vertex attribute buffer.
    fn make_vertex_buffer(&mut self, data: &[f32]) -> Result<Self::Buffer>;

    /// Uploads a flat index array as an element buffer.
    fn make_index_buffer(&mut self, data: &[u32]) -> Result<Self::Buffer>;

    /// Frees a buffer previously returned by this allocator.
    fn delete_buffer(&mut self, buffer: Self::Buffer);
}

/// The shader program surface drawable objects render through.
///
/// Attribute and uniform names are the ones declared in the bundled mesh
/// shader: `position`, `color`, `is_selected`, `is_instance_mask`,
/// `instance_color`, `opacity`, `selection_color`, `projection` and
/// `viewworld`.
pub trait Shader {
    type Buffer: Copy + fmt::Debug;

    /// Makes the program current.
    fn bind(&mut self);
    /// Unbinds the program.
    fn release(&mut self);

    fn enable_attribute(&mut self, name: &str);
    fn disable_attribute(&mut self, name: &str);
    /// Points the named 3-float attribute at `buffer`.
    fn bind_attribute(&mut self, name: &str, buffer: Self::Buffer);

    fn uniform1i(&mut self, name: &str, value: i32);
    fn uniform1f(&mut self, name: &str, value: f32);
    fn uniform3f(&mut self, name: &str, value: Vec3);
    fn uniform4x4(&mut self, name: &str, value: &Mat4);

    /// Draws `elements` as points of the given pixel size. `n` is the vertex count.
    fn draw_points(&mut self, elements: ElementBuffer<Self::Buffer>, n: usize, size: f32);
    /// Draws `elements` as line pairs of the given width. `n` is the vertex count.
    fn draw_lines(&mut self, elements: ElementBuffer<Self::Buffer>, n: usize, width: f32);
    /// Draws `elements` as triangles. `n` is the vertex count.
    fn draw_triangles(&mut self, elements: ElementBuffer<Self::Buffer>, n: usize);
}
