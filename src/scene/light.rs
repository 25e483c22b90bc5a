//! Light sources placed in the scene.

use serde::Deserialize;

/// The light types the renderer can shade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    /// Omnidirectional, falls off with the squared distance.
    Point,
    /// Directional light at infinity. Its energy is irradiance in W/m².
    Sun,
    /// Point light restricted to a cone around its direction.
    Spot,
}

impl LightKind {
    pub(crate) fn shader_id(self) -> u32 {
        match self {
            LightKind::Point => 0,
            LightKind::Sun => 1,
            LightKind::Spot => 2,
        }
    }
}

/// Spot cone size, full angle in degrees.
pub const SPOT_SIZE_DEG: f32 = 45.0;
/// Fraction of the cone used for the soft edge.
pub const SPOT_BLEND: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpec {
    pub kind: LightKind,
    pub position: [f32; 3],
    /// Linear RGB.
    pub color: [f32; 3],
    pub energy: f32,
    /// Point the light is aimed at. Only sun and spot lights use it.
    pub target: [f32; 3],
}

impl LightSpec {
    pub fn point(position: [f32; 3], color: [f32; 3], energy: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            color,
            energy,
            target: [0.0; 3],
        }
    }

    /// Unit vector from the light towards its target. Lights sitting on
    /// their target point straight down.
    pub fn direction(&self) -> [f32; 3] {
        let d = [
            self.target[0] - self.position[0],
            self.target[1] - self.position[1],
            self.target[2] - self.position[2],
        ];
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        if len <= f32::EPSILON {
            [0.0, 0.0, -1.0]
        } else {
            [d[0] / len, d[1] / len, d[2] / len]
        }
    }
}
