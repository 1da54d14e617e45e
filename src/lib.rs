//! A small OpenGL viewer for polygon meshes.
//!
//! The interaction core ([`view::View`], [`camera::Camera`], [`mouse::Mouse`])
//! and the drawable objects in [`render`] are backend-neutral. The SDL2 and
//! glow implementations of the rendering traits live in [`abs`].

pub mod abs;
pub mod camera;
pub mod config;
pub mod error;
pub mod logging;
pub mod mouse;
pub mod render;
pub mod view;

#[cfg(test)]
mod testing;

pub use error::{Result, ViewerError};
