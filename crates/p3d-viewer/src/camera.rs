use crate::config::CameraConfig;
use glam::{Mat4, Vec2, Vec3};

/// Orbit camera around the model's local origin.
///
/// Pure math: no GPU calls. Gesture coordinates are in whatever units the
/// host uses, as long as it is consistent between `start_rotate` and
/// `rotate`.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    // --- Orbital Parameters (Primary State) ---
    /// Distance from the eye to the target.
    distance: f32,
    /// Azimuth around world up, in radians, kept in `[0, 2π)`.
    azimuth_rad: f32,
    /// Elevation above the horizontal plane, in radians, kept off the poles.
    elevation_rad: f32,
    /// Radius of the sphere containing the loaded model.
    bounding_radius: f32,

    /// Last gesture point; `None` until a rotation gesture starts.
    anchor: Option<Vec2>,

    config: CameraConfig,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            distance: config.min_distance,
            azimuth_rad: 0.0,
            elevation_rad: 0.0,
            bounding_radius: 0.0,
            anchor: None,
            config,
        };
        camera.reset();
        camera
    }

    pub fn set_bounding_radius(&mut self, radius: f32) {
        self.bounding_radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
    }

    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Returns to the canonical view, far enough to see the whole bounding
    /// sphere. Without a radius the distance falls back to `min_distance`.
    pub fn reset(&mut self) {
        self.azimuth_rad = wrap_angle(self.config.default_azimuth_deg.to_radians());
        self.elevation_rad = self.clamp_elevation(self.config.default_elevation_deg.to_radians());
        self.distance = if self.bounding_radius > 0.0 {
            self.bounding_radius * self.config.reset_distance_factor
        } else {
            self.config.min_distance
        };
        self.anchor = None;
    }

    pub fn start_rotate(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.anchor = Some(Vec2::new(x, y));
        }
    }

    /// Rotates by the delta from the previous gesture point, then re-anchors.
    pub fn rotate(&mut self, x: f32, y: f32) {
        let point = Vec2::new(x, y);
        if !point.is_finite() {
            return;
        }
        if let Some(last) = self.anchor {
            let delta = (point - last) * self.config.rotate_speed_deg.to_radians();

            self.azimuth_rad = wrap_angle(self.azimuth_rad - delta.x);
            // Clamp elevation to prevent flipping over the poles.
            self.elevation_rad = self.clamp_elevation(self.elevation_rad + delta.y);
        }
        self.anchor = Some(point);
    }

    /// Scales the orbit distance by `factor` (< 1 zooms in). The eye never
    /// enters the bounding sphere.
    pub fn zoom(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) || self.bounding_radius <= 0.0 {
            return;
        }
        let min = self.bounding_radius * self.config.min_zoom_factor;
        let max = (self.bounding_radius * self.config.max_zoom_factor).max(min);
        self.distance = (self.distance * factor).clamp(min, max);
    }

    pub fn camera_dist(&self) -> f32 {
        self.distance
    }

    pub fn azimuth_deg(&self) -> f32 {
        self.azimuth_rad.to_degrees()
    }

    pub fn elevation_deg(&self) -> f32 {
        self.elevation_rad.to_degrees()
    }

    /// Eye position relative to the target.
    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    /// Right-handed look-at from the orbit parameters towards the origin,
    /// with world +Y as up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    fn clamp_elevation(&self, elevation_rad: f32) -> f32 {
        let limit = self.config.max_elevation_deg.to_radians();
        elevation_rad.clamp(-limit, limit)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

fn wrap_angle(rad: f32) -> f32 {
    rad.rem_euclid(std::f32::consts::TAU)
}
