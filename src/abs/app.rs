//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2
//! and OpenGL context necessary for creating a windowed application,
//! and the conversions from SDL input to the view's input events.

use std::sync::Arc;

use sdl2::mouse::{MouseButton, MouseState};

use crate::{
    config::ViewerConfig,
    error::{Result, ViewerError},
    mouse::MouseButtons,
    view::Application,
};

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Opens a resizable window with a GL 3.3 core context, sized and titled from `config`.
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let sdl = sdl2::init().map_err(ViewerError::Window)?;
        let video_subsystem = sdl.video().map_err(ViewerError::Window)?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_depth_size(24);
        gl_attr.set_multisample_buffers(1);
        gl_attr.set_multisample_samples(4);

        let window = video_subsystem
            .window(&config.title, config.width, config.height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| ViewerError::Window(e.to_string()))?;

        let gl_context = window.gl_create_context().map_err(ViewerError::Window)?;
        window
            .gl_make_current(&gl_context)
            .map_err(ViewerError::Window)?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump().map_err(ViewerError::Window)?;

        log::info!(
            "opened {}x{} window '{}'",
            config.width,
            config.height,
            config.title
        );

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
        })
    }
}

/// Window dimensions as last reported by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Application for WindowSize {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// Buttons held according to an SDL motion event.
pub fn held_buttons(state: &MouseState) -> MouseButtons {
    MouseButtons {
        left: state.left(),
        right: state.right(),
        middle: state.middle(),
    }
}

/// The single button of an SDL press or release event.
pub fn pressed_button(button: MouseButton) -> MouseButtons {
    MouseButtons {
        left: button == MouseButton::Left,
        right: button == MouseButton::Right,
        middle: button == MouseButton::Middle,
    }
}

/// Converts SDL wheel notches into eighths of a degree.
pub fn wheel_delta(notches: f32) -> f32 {
    notches * 120.0
}
