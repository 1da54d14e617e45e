//! Recording fakes for the rendering traits.

use glam::{Mat4, Vec3, Vec4};

use crate::error::{Result, ViewerError};
use crate::render::{BufferAllocator, ElementBuffer, Shader};
use crate::view::{Application, Surface};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bind,
    Release,
    EnableAttribute(String),
    DisableAttribute(String),
    BindAttribute(String, u32),
    Uniform1i(String, i32),
    Uniform1f(String, f32),
    Uniform3f(String, Vec3),
    Uniform4x4(String, Mat4),
    DrawPoints {
        elements: ElementBuffer<u32>,
        n: usize,
        size: f32,
    },
    DrawLines {
        elements: ElementBuffer<u32>,
        n: usize,
        width: f32,
    },
    DrawTriangles {
        elements: ElementBuffer<u32>,
        n: usize,
    },
}

impl Call {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Call::DrawPoints { .. } | Call::DrawLines { .. } | Call::DrawTriangles { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct RecordingShader {
    pub calls: Vec<Call>,
}

impl RecordingShader {
    pub fn draws(&self) -> Vec<&Call> {
        self.calls.iter().filter(|call| call.is_draw()).collect()
    }

    /// Every value uploaded to the named float uniform, in order.
    pub fn uniform1f_values(&self, name: &str) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Uniform1f(n, value) if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl Shader for RecordingShader {
    type Buffer = u32;

    fn bind(&mut self) {
        self.calls.push(Call::Bind);
    }

    fn release(&mut self) {
        self.calls.push(Call::Release);
    }

    fn enable_attribute(&mut self, name: &str) {
        self.calls.push(Call::EnableAttribute(name.to_string()));
    }

    fn disable_attribute(&mut self, name: &str) {
        self.calls.push(Call::DisableAttribute(name.to_string()));
    }

    fn bind_attribute(&mut self, name: &str, buffer: u32) {
        self.calls.push(Call::BindAttribute(name.to_string(), buffer));
    }

    fn uniform1i(&mut self, name: &str, value: i32) {
        self.calls.push(Call::Uniform1i(name.to_string(), value));
    }

    fn uniform1f(&mut self, name: &str, value: f32) {
        self.calls.push(Call::Uniform1f(name.to_string(), value));
    }

    fn uniform3f(&mut self, name: &str, value: Vec3) {
        self.calls.push(Call::Uniform3f(name.to_string(), value));
    }

    fn uniform4x4(&mut self, name: &str, value: &Mat4) {
        self.calls.push(Call::Uniform4x4(name.to_string(), *value));
    }

    fn draw_points(&mut self, elements: ElementBuffer<u32>, n: usize, size: f32) {
        self.calls.push(Call::DrawPoints { elements, n, size });
    }

    fn draw_lines(&mut self, elements: ElementBuffer<u32>, n: usize, width: f32) {
        self.calls.push(Call::DrawLines { elements, n, width });
    }

    fn draw_triangles(&mut self, elements: ElementBuffer<u32>, n: usize) {
        self.calls.push(Call::DrawTriangles { elements, n });
    }
}

#[derive(Debug, Clone)]
enum Upload {
    Vertex(Vec<f32>),
    Index(Vec<u32>),
}

/// Hands out increasing integer handles and remembers what was uploaded.
#[derive(Debug, Default)]
pub struct RecordingAllocator {
    uploads: Vec<Upload>,
    pub deleted: Vec<u32>,
    pub fail_index_buffers: bool,
}

impl RecordingAllocator {
    /// An allocator whose index buffer uploads always fail.
    pub fn failing_index_buffers() -> Self {
        Self {
            fail_index_buffers: true,
            ..Default::default()
        }
    }

    /// Number of buffers allocated and not yet deleted.
    pub fn live(&self) -> usize {
        self.uploads.len() - self.deleted.len()
    }

    pub fn vertex_data(&self, handle: u32) -> &[f32] {
        match &self.uploads[handle as usize - 1] {
            Upload::Vertex(data) => data.as_slice(),
            Upload::Index(_) => panic!("buffer {handle} is an index buffer"),
        }
    }

    pub fn index_data(&self, handle: u32) -> &[u32] {
        match &self.uploads[handle as usize - 1] {
            Upload::Index(data) => data.as_slice(),
            Upload::Vertex(_) => panic!("buffer {handle} is a vertex buffer"),
        }
    }
}

impl BufferAllocator for RecordingAllocator {
    type Buffer = u32;

    fn make_vertex_buffer(&mut self, data: &[f32]) -> Result<u32> {
        self.uploads.push(Upload::Vertex(data.to_vec()));
        Ok(self.uploads.len() as u32)
    }

    fn make_index_buffer(&mut self, data: &[u32]) -> Result<u32> {
        if self.fail_index_buffers {
            return Err(ViewerError::Gl("out of memory".to_string()));
        }
        self.uploads.push(Upload::Index(data.to_vec()));
        Ok(self.uploads.len() as u32)
    }

    fn delete_buffer(&mut self, buffer: u32) {
        assert!(!self.deleted.contains(&buffer), "buffer {buffer} freed twice");
        self.deleted.push(buffer);
    }
}

/// A surface that records state changes and serves a fixed pixel on read-back.
#[derive(Debug)]
pub struct FakeSurface {
    pub allocator: RecordingAllocator,
    pub active: bool,
    pub under_mouse: bool,
    pub redraws: usize,
    pub initialized_with: Option<Vec4>,
    pub viewport: Option<(u32, u32)>,
    pub clears: usize,
    pub pixel: [u8; 4],
    pub reads: Vec<(u32, u32, u32, u32)>,
    pub instance_pass: bool,
    pub instance_passes: usize,
    /// Reads served while the instance pass was active.
    pub masked_reads: usize,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self {
            allocator: RecordingAllocator::default(),
            active: true,
            under_mouse: true,
            redraws: 0,
            initialized_with: None,
            viewport: None,
            clears: 0,
            pixel: [255, 255, 255, 255],
            reads: Vec::new(),
            instance_pass: false,
            instance_passes: 0,
            masked_reads: 0,
        }
    }
}

impl BufferAllocator for FakeSurface {
    type Buffer = u32;

    fn make_vertex_buffer(&mut self, data: &[f32]) -> Result<u32> {
        self.allocator.make_vertex_buffer(data)
    }

    fn make_index_buffer(&mut self, data: &[u32]) -> Result<u32> {
        self.allocator.make_index_buffer(data)
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.allocator.delete_buffer(buffer);
    }
}

impl Surface for FakeSurface {
    fn is_active_window(&self) -> bool {
        self.active
    }

    fn is_under_mouse(&self) -> bool {
        self.under_mouse
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn initialize(&mut self, clear_color: Vec4) -> Result<()> {
        self.initialized_with = Some(clear_color);
        Ok(())
    }

    fn begin_instance_pass(&mut self) {
        assert!(!self.instance_pass, "instance pass started twice");
        self.instance_pass = true;
        self.instance_passes += 1;
    }

    fn end_instance_pass(&mut self) {
        assert!(self.instance_pass, "instance pass ended without starting");
        self.instance_pass = false;
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn read_pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
        self.reads.push((x, y, width, height));
        if self.instance_pass {
            self.masked_reads += 1;
        }
        Ok(self.pixel.repeat((width * height) as usize))
    }
}

#[derive(Debug, Default)]
pub struct RecordingApp {
    pub width: u32,
    pub height: u32,
}

impl Application for RecordingApp {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}
