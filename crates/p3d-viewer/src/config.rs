use serde::Deserialize;

use crate::error::ConfigError;

/// Orbit camera tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees of rotation per gesture unit.
    pub rotate_speed_deg: f32,
    /// Reset distance as a multiple of the bounding radius.
    ///
    /// Slightly above `1 / sin(fov / 2)` for the default 25° field of view,
    /// so the whole bounding sphere fits vertically.
    pub reset_distance_factor: f32,
    /// Distance used when there is no usable bounding radius.
    pub min_distance: f32,
    pub default_azimuth_deg: f32,
    pub default_elevation_deg: f32,
    /// Elevation is kept inside `(-max, max)`.
    pub max_elevation_deg: f32,
    /// Closest zoom, as a multiple of the bounding radius.
    pub min_zoom_factor: f32,
    /// Farthest zoom, as a multiple of the bounding radius.
    pub max_zoom_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotate_speed_deg: 0.5,
            reset_distance_factor: 4.7,
            min_distance: 1.0,
            default_azimuth_deg: 30.0,
            default_elevation_deg: 20.0,
            max_elevation_deg: 89.0,
            min_zoom_factor: 1.2,
            max_zoom_factor: 50.0,
        }
    }
}

/// Viewer-wide settings. Every field has a default, so a partial JSON
/// document only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical field of view of the projection, in degrees.
    pub field_of_view_deg: f32,
    /// Lower bound for the near plane.
    pub near_epsilon: f32,
    /// `near = distance - radius * near_factor`.
    pub near_factor: f32,
    /// `far = distance + radius * far_factor`.
    pub far_factor: f32,
    pub clear_color: [f32; 4],
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub camera: CameraConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            field_of_view_deg: 25.0,
            near_epsilon: 0.01,
            near_factor: 1.1,
            far_factor: 2.2,
            clear_color: [0.2, 0.2, 0.2, 0.0],
            vertex_shader: "shaders/vertex.glsl".to_owned(),
            fragment_shader: "shaders/fragment.glsl".to_owned(),
            camera: CameraConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.field_of_view_deg > 0.0 && self.field_of_view_deg < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field_of_view_deg must be in (0, 180), got {}",
                self.field_of_view_deg
            )));
        }
        if self.near_epsilon <= 0.0 {
            return Err(ConfigError::Invalid("near_epsilon must be > 0".into()));
        }
        if self.camera.min_distance <= 0.0 {
            return Err(ConfigError::Invalid("camera.min_distance must be > 0".into()));
        }
        let max_el = self.camera.max_elevation_deg;
        if !(max_el > 0.0 && max_el < 90.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.max_elevation_deg must be in (0, 90), got {}",
                max_el
            )));
        }
        Ok(())
    }
}
