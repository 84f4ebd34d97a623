// src/lib.rs
//! Embeddable 3D model viewer core.
//!
//! This library renders a mesh+material scene under an orbit camera on a
//! GL ES 2 class context. The host owns the window and event loop; it feeds
//! model bytes, material properties and pointer gestures into a [`Viewer`]
//! and calls [`Viewer::draw_frame`] once per frame.

pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod material;
pub mod model;
pub mod platform;
pub mod renderer;
pub mod viewer;

pub use camera::OrbitCamera;
pub use config::{CameraConfig, ViewerConfig};
pub use error::{ConfigError, LoadError, ShaderError};
pub use gpu::Gpu;
pub use material::{MaterialProperty, MaterialStore};
pub use model::{GpuModel, ModelDecoder, ModelLoader};
pub use platform::{FsPlatform, PlatformAdapter};
pub use viewer::Viewer;
