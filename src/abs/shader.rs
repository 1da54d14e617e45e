//! OpenGL Shaders
//!
//! This module defines the [`ShaderStage`] and [`GlProgram`] structs for managing OpenGL shaders.
//! [`GlProgram`] implements the renderer's [`Shader`] trait. The [`Uniform`] trait sets
//! uniform variables in shader programs.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use glow::HasContext;

use crate::{
    error::{Result, ViewerError},
    render::{ElementBuffer, Shader},
};

/// Represents an individual compiled OpenGL shader.
pub struct ShaderStage {
    gl: Arc<glow::Context>,
    id: glow::Shader,
}

impl ShaderStage {
    /// Compiles a new shader of the given type (`glow::VERTEX_SHADER`, ...) from source.
    pub fn new(gl: &Arc<glow::Context>, shader_type: u32, source: &str) -> Result<Self> {
        unsafe {
            let shader = gl.create_shader(shader_type).map_err(ViewerError::Shader)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(ViewerError::Shader(log));
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
            })
        }
    }
}

impl Drop for ShaderStage {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Sets the value of the uniform variable in the given shader program.
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str);
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_1_i32(Some(&loc), *self);
            }
        }
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_1_f32(Some(&loc), *self);
            }
        }
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_3_f32(Some(&loc), self.x, self.y, self.z);
            }
        }
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        unsafe {
            let location = gl.get_uniform_location(program, name);
            if let Some(loc) = location {
                gl.uniform_matrix_4_f32_slice(Some(&loc), false, self.as_ref());
            }
        }
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        (*self).set_uniform(gl, program, name);
    }
}

/// A linked OpenGL program with its own vertex array object.
///
/// Attributes are looked up by name on every call. Names the program does
/// not declare (or that the driver optimized away) are skipped.
pub struct GlProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
    vao: glow::VertexArray,
}

impl GlProgram {
    /// Links a new shader program from the given stages.
    pub fn new(gl: &Arc<glow::Context>, stages: &[&ShaderStage]) -> Result<Self> {
        unsafe {
            let program = gl.create_program().map_err(ViewerError::Shader)?;

            for stage in stages {
                gl.attach_shader(program, stage.id);
            }

            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(ViewerError::Shader(log));
            }

            for stage in stages {
                gl.detach_shader(program, stage.id);
            }

            let vao = match gl.create_vertex_array() {
                Ok(vao) => vao,
                Err(err) => {
                    gl.delete_program(program);
                    return Err(ViewerError::Gl(err));
                }
            };

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
                vao,
            })
        }
    }

    /// Sets a uniform variable in the shader program. The program must be bound.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        value.set_uniform(&self.gl, self.id, name);
    }

    fn attribute(&self, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(self.id, name) }
    }

    fn draw_elements(&self, mode: u32, elements: ElementBuffer<glow::Buffer>) {
        unsafe {
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(elements.handle));
            self.gl
                .draw_elements(mode, elements.len as i32, glow::UNSIGNED_INT, 0);
        }
    }
}

impl Shader for GlProgram {
    type Buffer = glow::Buffer;

    fn bind(&mut self) {
        unsafe {
            self.gl.use_program(Some(self.id));
            self.gl.bind_vertex_array(Some(self.vao));
        }
    }

    fn release(&mut self) {
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.use_program(None);
        }
    }

    fn enable_attribute(&mut self, name: &str) {
        if let Some(location) = self.attribute(name) {
            unsafe {
                self.gl.enable_vertex_attrib_array(location);
            }
        }
    }

    fn disable_attribute(&mut self, name: &str) {
        if let Some(location) = self.attribute(name) {
            unsafe {
                self.gl.disable_vertex_attrib_array(location);
            }
        }
    }

    fn bind_attribute(&mut self, name: &str, buffer: glow::Buffer) {
        if let Some(location) = self.attribute(name) {
            unsafe {
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                self.gl
                    .vertex_attrib_pointer_f32(location, 3, glow::FLOAT, false, 0, 0);
            }
        }
    }

    fn uniform1i(&mut self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    fn uniform1f(&mut self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    fn uniform3f(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, value);
    }

    fn uniform4x4(&mut self, name: &str, value: &Mat4) {
        self.set_uniform(name, value);
    }

    fn draw_points(&mut self, elements: ElementBuffer<glow::Buffer>, _n: usize, size: f32) {
        // core profile: the vertex shader writes gl_PointSize
        self.set_uniform("point_size", size);
        self.draw_elements(glow::POINTS, elements);
    }

    fn draw_lines(&mut self, elements: ElementBuffer<glow::Buffer>, _n: usize, width: f32) {
        unsafe {
            self.gl.line_width(width);
        }
        self.draw_elements(glow::LINES, elements);
    }

    fn draw_triangles(&mut self, elements: ElementBuffer<glow::Buffer>, _n: usize) {
        self.draw_elements(glow::TRIANGLES, elements);
    }
}

impl Drop for GlProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_program(self.id);
        }
    }
}
