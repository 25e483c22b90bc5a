//! Scene and render parameters.
//!
//! [`SceneConfig`] carries everything the fixed scene needs, [`RenderSettings`]
//! describes a single render request. Defaults reproduce the reference scene:
//! a mug on a table, camera at `(2, 0, 1)`, one point light at `(5, -5, 5)`.

use std::path::PathBuf;

/// Where the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CameraAim {
    /// Face the object's origin with world +Z as up.
    #[default]
    LookAtObject,
    /// Reuse the object's Euler rotation, as the reference scripts do.
    MatchObject,
    /// Explicit Euler rotation in degrees (XYZ order).
    Euler([f32; 3]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub object_path: PathBuf,
    pub support_path: PathBuf,
    pub texture_image: PathBuf,
    pub object_position: [f32; 3],
    /// Euler angles in degrees.
    pub object_orientation: [f32; 3],
    pub camera_position: [f32; 3],
    pub camera_aim: CameraAim,
    /// Support location relative to the object.
    pub support_offset: [f32; 3],
    pub ground_scale: f32,
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    /// Watts, as in Blender's point lights.
    pub light_energy: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            object_path: PathBuf::from("data/examples/meshes/Mug/10f6e09036350e92b3f21f1137c3c347.obj"),
            support_path: PathBuf::from("data/examples/meshes/Table/99cf659ae2fe4b87b72437fd995483b.obj"),
            texture_image: PathBuf::from("data/examples/textures/porous_0045.jpg"),
            object_position: [0.0, 0.0, 0.0],
            object_orientation: [0.0, 0.0, 0.0],
            camera_position: [2.0, 0.0, 1.0],
            camera_aim: CameraAim::LookAtObject,
            support_offset: [0.0, 0.0, -1.0],
            ground_scale: 10.0,
            light_position: [5.0, -5.0, 5.0],
            light_color: [1.0, 1.0, 1.0],
            light_energy: 1000.0,
        }
    }
}

/// Which adapter class the renderer asks wgpu for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ComputeDevice {
    #[default]
    Gpu,
    /// Software rasterizer (lavapipe, WARP, ...).
    Cpu,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub output: PathBuf,
    pub resolution_x: u32,
    pub resolution_y: u32,
    /// Jittered passes averaged per pixel.
    pub samples: u32,
    pub device: ComputeDevice,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("render.png"),
            resolution_x: 1920,
            resolution_y: 1080,
            samples: 128,
            device: ComputeDevice::Gpu,
        }
    }
}

impl RenderSettings {
    /// Sample count with zero clamped to one.
    pub fn effective_samples(&self) -> u32 {
        if self.samples == 0 {
            log::warn!("A sample count of 0 was requested, rendering a single sample instead");
            1
        } else {
            self.samples
        }
    }
}
