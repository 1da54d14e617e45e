//! SDL2 and OpenGL implementations of the rendering traits,
//! including window setup, the GL surface and shader programs.

pub mod app;
pub mod shader;
pub mod surface;

pub use app::*;
pub use shader::*;
pub use surface::*;
