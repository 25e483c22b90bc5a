//! Camera placement, lens and the uniform uploaded to the shaders.
//!
//! World space is right-handed with +Z up. A camera looks down its local -Z
//! axis with local +Y as up, so a camera with zero rotation looks straight
//! down onto the ground plane.

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Point3, Rad, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Rotation for Euler angles in degrees, applied X first, then Y, then Z.
pub fn euler_xyz(degrees: [f32; 3]) -> Matrix3<f32> {
    let [x, y, z] = degrees.map(|d| Rad(d.to_radians()));
    Matrix3::from_angle_z(z) * Matrix3::from_angle_y(y) * Matrix3::from_angle_x(x)
}

/// Position and orientation of the scene camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub rotation: Matrix3<f32>,
}

impl CameraPose {
    pub fn from_euler(position: [f32; 3], degrees: [f32; 3]) -> Self {
        Self {
            position: position.into(),
            rotation: euler_xyz(degrees),
        }
    }

    /// Orients the camera so that its -Z axis points at `target`, keeping
    /// world +Z up. Looking straight up or down falls back to +Y as up.
    pub fn look_at(position: [f32; 3], target: [f32; 3]) -> Self {
        let eye: Point3<f32> = position.into();
        let target: Point3<f32> = target.into();
        let to_target = target - eye;
        let forward = if to_target.magnitude2() > f32::EPSILON {
            to_target.normalize()
        } else {
            -Vector3::unit_z()
        };
        let up = if forward.cross(Vector3::unit_z()).magnitude2() < 1e-6 {
            Vector3::unit_y()
        } else {
            Vector3::unit_z()
        };
        let right = forward.cross(up).normalize();
        let cam_up = right.cross(forward);
        Self {
            position: eye,
            rotation: Matrix3::from_cols(right, cam_up, -forward),
        }
    }

    /// The direction the camera is looking at in world space.
    pub fn forward(&self) -> Vector3<f32> {
        -self.rotation.z
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position - Point3::new(0.0, 0.0, 0.0))
            * Matrix4::from(self.rotation)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        // Rotations are orthonormal so the inverse is the transpose
        let inverse_rotation = Matrix4::from(self.rotation.transpose());
        inverse_rotation
            * Matrix4::from_translation(Point3::new(0.0, 0.0, 0.0) - self.position)
    }
}

/// Pinhole lens described like a Blender camera: focal length
/// and sensor width in millimetres, with the sensor fitted to the larger
/// image side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub width: u32,
    pub height: u32,
    pub lens_mm: f32,
    pub sensor_mm: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            lens_mm: 50.0,
            sensor_mm: 36.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Vertical field of view.
    pub fn fov_y(&self) -> Rad<f32> {
        let half_sensor = (self.sensor_mm * 0.5 / self.lens_mm).atan();
        if self.width >= self.height {
            Rad(2.0 * (half_sensor.tan() / self.aspect()).atan())
        } else {
            Rad(2.0 * half_sensor)
        }
    }

    /// Projection matrix shifted by `jitter` pixels for sub-pixel sampling.
    pub fn matrix(&self, jitter: [f32; 2]) -> Matrix4<f32> {
        let shift = Matrix4::from_translation(Vector3::new(
            2.0 * jitter[0] / self.width as f32,
            2.0 * jitter[1] / self.height as f32,
            0.0,
        ));
        shift
            * OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(self.fov_y(), self.aspect(), self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, pose: &CameraPose, projection: &Projection, jitter: [f32; 2]) {
        self.view_position = pose.position.to_homogeneous().into();
        self.view_proj = (projection.matrix(jitter) * pose.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Halton low-discrepancy sequence, used for sub-pixel sample offsets.
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut f = 1.0;
    let mut r = 0.0;
    while index > 0 {
        f /= base as f32;
        r += f * (index % base) as f32;
        index /= base;
    }
    r
}

/// Pixel offset in `[-0.5, 0.5)` for sample `i`. A single sample stays centred.
pub fn sample_jitter(i: u32, samples: u32) -> [f32; 2] {
    if samples <= 1 {
        return [0.0, 0.0];
    }
    [halton(i + 1, 2) - 0.5, halton(i + 1, 3) - 0.5]
}
