//! Scene composition: a grasp target resting above a support, a textured
//! ground plane, one camera and a handful of lights.
//!
//! Composition happens in two steps. [`SceneDescription`] resolves every
//! transform, the camera and the lights without touching the GPU. [`Scene`]
//! then imports the meshes, builds the ground material and uploads
//! everything to a [`Context`] so it can be rendered.

use std::path::PathBuf;

use anyhow::Context as _;
use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    camera::CameraPose,
    config::{CameraAim, RenderSettings, SceneConfig},
    context::Context,
    data_structures::{model::Model, transform::Transform},
    pipelines::light::{LightResources, LightUniform},
    render::{self, RenderOutput},
    resources::{load_ground_plane, load_model_obj},
    scene::light::LightSpec,
};

pub mod light;
pub mod randomize;

/// Fully resolved scene, independent of any GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub object_path: PathBuf,
    pub support_path: PathBuf,
    pub texture_image: PathBuf,
    pub object: Transform,
    pub support: Transform,
    pub ground: Transform,
    pub camera: CameraPose,
    pub lights: Vec<LightSpec>,
}

impl SceneDescription {
    /// The deterministic layout: support right below the object, ground
    /// plane at the origin, camera at the configured position and a single
    /// point light.
    pub fn fixed(config: &SceneConfig) -> Self {
        let p = config.object_position;
        let support_position = [
            p[0] + config.support_offset[0],
            p[1] + config.support_offset[1],
            p[2] + config.support_offset[2],
        ];
        let camera = match config.camera_aim {
            CameraAim::LookAtObject => CameraPose::look_at(config.camera_position, p),
            CameraAim::MatchObject => {
                CameraPose::from_euler(config.camera_position, config.object_orientation)
            }
            CameraAim::Euler(degrees) => CameraPose::from_euler(config.camera_position, degrees),
        };
        Self {
            object_path: config.object_path.clone(),
            support_path: config.support_path.clone(),
            texture_image: config.texture_image.clone(),
            object: Transform::from_position_euler(p, config.object_orientation),
            support: Transform::from_position(support_position),
            ground: Transform::new().with_uniform_scale(config.ground_scale),
            camera,
            lights: vec![LightSpec::point(
                config.light_position,
                config.light_color,
                config.light_energy,
            )],
        }
    }

    pub fn object_pose(&self) -> Matrix4<f32> {
        self.object.to_matrix()
    }

    pub fn camera_pose(&self) -> Matrix4<f32> {
        self.camera.world_matrix()
    }
}

/// A mesh together with the GPU buffer holding its transform.
pub struct Placed {
    pub model: Model,
    pub transform: wgpu::Buffer,
}

impl Placed {
    fn new(ctx: &Context, model: Model, transform: &Transform, label: &str) -> Self {
        let transform = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Transform Buffer")),
                contents: bytemuck::cast_slice(&[transform.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Self { model, transform }
    }
}

/// A composed scene, uploaded and ready to render.
pub struct Scene {
    description: SceneDescription,
    pub(crate) objects: Vec<Placed>,
    pub(crate) light: LightResources,
}

impl Scene {
    pub async fn compose(ctx: &Context, description: SceneDescription) -> anyhow::Result<Self> {
        let layout = &ctx.layouts.material;
        let (object, support, ground) = futures::try_join!(
            async {
                load_model_obj(&description.object_path, &ctx.device, &ctx.queue, layout)
                    .await
                    .with_context(|| format!("import object {}", description.object_path.display()))
            },
            async {
                load_model_obj(&description.support_path, &ctx.device, &ctx.queue, layout)
                    .await
                    .with_context(|| {
                        format!("import support {}", description.support_path.display())
                    })
            },
            load_ground_plane(&description.texture_image, &ctx.device, &ctx.queue, layout),
        )?;

        let light_uniform = LightUniform::from_specs(&description.lights)?;
        let light = LightResources::new(light_uniform, &ctx.device, &ctx.layouts.light);

        let objects = vec![
            Placed::new(ctx, ground, &description.ground, "Ground"),
            Placed::new(ctx, support, &description.support, "Support"),
            Placed::new(ctx, object, &description.object, "Object"),
        ];
        log::info!(
            "Composed scene with {} and {} under {} light(s)",
            description.object_path.display(),
            description.support_path.display(),
            description.lights.len()
        );

        Ok(Self {
            description,
            objects,
            light,
        })
    }

    pub fn description(&self) -> &SceneDescription {
        &self.description
    }

    pub fn object_pose(&self) -> Matrix4<f32> {
        self.description.object_pose()
    }

    pub fn camera_pose(&self) -> Matrix4<f32> {
        self.description.camera_pose()
    }

    /// Renders the scene and writes the result to `settings.output` as PNG.
    pub async fn render(
        &self,
        ctx: &Context,
        settings: &RenderSettings,
    ) -> anyhow::Result<RenderOutput> {
        let samples = settings.effective_samples();
        let image =
            render::render_image(ctx, self, [settings.resolution_x, settings.resolution_y], samples)
                .await?;
        render::write_png(&image, &settings.output)?;
        log::info!(
            "Wrote {}x{} render to {}",
            image.width(),
            image.height(),
            settings.output.display()
        );
        Ok(RenderOutput {
            path: settings.output.clone(),
            width: image.width(),
            height: image.height(),
            samples,
        })
    }
}
