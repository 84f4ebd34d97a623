//! The fixed directional light rig.

use glam::{Mat3, Vec3};

pub const MAX_DIR_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB, already scaled by intensity.
    pub color: Vec3,
    /// World-space direction towards the light.
    pub direction: Vec3,
}

impl DirectionalLight {
    fn new(rgb: u32, intensity: f32, direction: Vec3) -> Self {
        let scale = intensity / 255.0;
        Self {
            color: Vec3::new(
                ((rgb >> 16) & 0xff) as f32 * scale,
                ((rgb >> 8) & 0xff) as f32 * scale,
                (rgb & 0xff) as f32 * scale,
            ),
            direction,
        }
    }
}

/// Key light from the upper front right, three cooler fill lights.
pub fn light_rig() -> [DirectionalLight; MAX_DIR_LIGHTS] {
    [
        DirectionalLight::new(0xfffaf0, 1.15, Vec3::new(10.0, 10.0, 10.0)),
        DirectionalLight::new(0xb3e5ff, 0.55, Vec3::new(-5.0, 10.0, 5.0)),
        DirectionalLight::new(0xfdffcc, 0.55, Vec3::new(0.0, -10.0, 5.0)),
        DirectionalLight::new(0xb3e5ff, 0.55, Vec3::new(0.0, 0.0, -10.0)),
    ]
}

/// Flattened `vec3[MAX_DIR_LIGHTS]` uniform arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct LightUniforms {
    pub colors: [f32; 3 * MAX_DIR_LIGHTS],
    pub directions: [f32; 3 * MAX_DIR_LIGHTS],
}

impl LightUniforms {
    /// The rig with its directions taken into view space.
    pub fn in_view_space(normal_matrix: &Mat3) -> Self {
        let mut colors = [0.0; 3 * MAX_DIR_LIGHTS];
        let mut directions = [0.0; 3 * MAX_DIR_LIGHTS];
        for (i, light) in light_rig().iter().enumerate() {
            let dir = (*normal_matrix * light.direction).normalize_or_zero();
            colors[i * 3..i * 3 + 3].copy_from_slice(&light.color.to_array());
            directions[i * 3..i * 3 + 3].copy_from_slice(&dir.to_array());
        }
        Self { colors, directions }
    }
}
