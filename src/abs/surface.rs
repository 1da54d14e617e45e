//! The OpenGL rendering surface.
//!
//! [`GlSurface`] allocates vertex and index buffers on the GPU, sets up the
//! fixed GL state and tracks the focus and hover state of its window.

use std::sync::Arc;

use glam::Vec4;
use glow::HasContext;
use sdl2::event::WindowEvent;

use crate::{
    error::{Result, ViewerError},
    render::BufferAllocator,
    view::Surface,
};

/// Reinterprets a slice of plain numbers as bytes for upload.
fn as_bytes<T: Copy>(data: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data)) }
}

pub struct GlSurface {
    gl: Arc<glow::Context>,
    focused: bool,
    hovered: bool,
    needs_redraw: bool,
}

impl GlSurface {
    pub fn new(gl: &Arc<glow::Context>) -> Self {
        Self {
            gl: Arc::clone(gl),
            focused: true,
            hovered: true,
            needs_redraw: true,
        }
    }

    /// Updates focus and hover tracking from an SDL window event.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::FocusGained => self.focused = true,
            WindowEvent::FocusLost => self.focused = false,
            WindowEvent::Enter => self.hovered = true,
            WindowEvent::Leave => self.hovered = false,
            WindowEvent::Exposed => self.needs_redraw = true,
            _ => {}
        }
    }

    /// Returns whether a repaint was requested since the last call, and resets the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    fn upload(&self, target: u32, bytes: &[u8]) -> Result<glow::Buffer> {
        unsafe {
            let buffer = self.gl.create_buffer().map_err(ViewerError::Gl)?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, bytes, glow::STATIC_DRAW);
            self.gl.bind_buffer(target, None);
            Ok(buffer)
        }
    }

    /// Toggles blending, multisampling and line/polygon smoothing together.
    ///
    /// The instance pass turns them off so every covered pixel holds one
    /// exact instance color.
    fn set_smoothing(&self, enabled: bool) {
        for cap in [
            glow::BLEND,
            glow::MULTISAMPLE,
            glow::LINE_SMOOTH,
            glow::POLYGON_SMOOTH,
        ] {
            unsafe {
                if enabled {
                    self.gl.enable(cap);
                } else {
                    self.gl.disable(cap);
                }
            }
        }

        // smoothing is optional on some core-profile drivers
        let code = unsafe { self.gl.get_error() };
        if code != glow::NO_ERROR {
            log::debug!("toggling smoothing reported error 0x{code:X}");
        }
    }
}

impl BufferAllocator for GlSurface {
    type Buffer = glow::Buffer;

    fn make_vertex_buffer(&mut self, data: &[f32]) -> Result<glow::Buffer> {
        self.upload(glow::ARRAY_BUFFER, as_bytes(data))
    }

    fn make_index_buffer(&mut self, data: &[u32]) -> Result<glow::Buffer> {
        self.upload(glow::ELEMENT_ARRAY_BUFFER, as_bytes(data))
    }

    fn delete_buffer(&mut self, buffer: glow::Buffer) {
        unsafe {
            self.gl.delete_buffer(buffer);
        }
    }
}

impl Surface for GlSurface {
    fn is_active_window(&self) -> bool {
        self.focused
    }

    fn is_under_mouse(&self) -> bool {
        self.hovered
    }

    fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    fn initialize(&mut self, clear_color: Vec4) -> Result<()> {
        unsafe {
            let gl = &self.gl;
            gl.clear_color(clear_color.x, clear_color.y, clear_color.z, clear_color.w);
            gl.polygon_offset(1.0, 1.0);
            gl.enable(glow::POLYGON_OFFSET_FILL);
            gl.enable(glow::CULL_FACE);
            gl.cull_face(glow::BACK);
            gl.front_face(glow::CCW);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.enable(glow::PROGRAM_POINT_SIZE);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            self.set_smoothing(true);

            let code = gl.get_error();
            if code != glow::NO_ERROR {
                log::warn!("GL state setup reported error 0x{code:X}");
            }
        }
        Ok(())
    }

    fn begin_instance_pass(&mut self) {
        self.set_smoothing(false);
    }

    fn end_instance_pass(&mut self) {
        self.set_smoothing(true);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    fn clear(&mut self) {
        unsafe {
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn read_pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                x as i32,
                y as i32,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(pixels.as_mut_slice())),
            );
            match self.gl.get_error() {
                glow::NO_ERROR => Ok(pixels),
                code => Err(ViewerError::Gl(format!("read_pixels failed with error 0x{code:X}"))),
            }
        }
    }
}
