//! Per-frame camera and projection math.

use crate::camera::OrbitCamera;
use crate::config::ViewerConfig;
use glam::{Mat3, Mat4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

/// Near/far planes hugging the bounding sphere as seen from `camera_dist`.
///
/// The near plane never reaches zero, even with the eye inside the sphere.
pub fn clip_planes(camera_dist: f32, bounding_radius: f32, config: &ViewerConfig) -> ClipPlanes {
    let mut near = camera_dist - bounding_radius * config.near_factor;
    if !(near > 0.0) {
        near = config.near_epsilon;
    }
    let mut far = camera_dist + bounding_radius * config.far_factor;
    if !(far > near) {
        far = near + config.near_epsilon;
    }
    ClipPlanes { near, far }
}

/// Matrices shared by every chunk of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub projection: Mat4,
    pub view: Mat4,
    /// Equal to `view`: models are drawn at their local origin.
    pub model_view: Mat4,
    pub normal_matrix: Mat3,
    pub clip: ClipPlanes,
}

impl FrameTransforms {
    pub fn new(camera: &OrbitCamera, width: u32, height: u32, config: &ViewerConfig) -> Self {
        let clip = clip_planes(camera.camera_dist(), camera.bounding_radius(), config);
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let projection =
            Mat4::perspective_rh_gl(config.field_of_view_deg.to_radians(), aspect, clip.near, clip.far);

        let view = camera.view_matrix();
        let model_view = view;
        let normal_matrix = Mat3::from_mat4(model_view).inverse().transpose();

        Self {
            projection,
            view,
            model_view,
            normal_matrix,
            clip,
        }
    }
}
