//! Error types for the viewer.

use thiserror::Error;

use crate::render::PrimitiveGroup;

/// Main error type for viewer operations.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Object '{object}' has no {group} buffer; call make_buffers first")]
    MissingBuffer { object: String, group: PrimitiveGroup },

    #[error("An object named '{0}' already exists")]
    DuplicateObject(String),

    #[error("No instance color left for object '{0}'")]
    InstancesExhausted(String),

    #[error("OpenGL error: {0}")]
    Gl(String),

    #[error("Shader error: {0}")]
    Shader(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
