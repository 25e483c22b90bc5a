//! Composes a grasp scene and renders it to an image.

use std::path::PathBuf;

use clap::Parser;
use grasp_synth::{
    Matrix4,
    config::{CameraAim, ComputeDevice, RenderSettings, SceneConfig},
    context::Context,
    scene::{
        Scene, SceneDescription,
        randomize::{RandomizationConfig, SceneSampler},
    },
};

#[derive(Parser, Debug)]
#[command(name = "render-scene")]
#[command(about = "Render an object resting on a support above a textured ground plane", long_about = None)]
struct Args {
    /// OBJ mesh of the object to grasp
    #[arg(long, value_name = "OBJ")]
    object: Option<PathBuf>,

    /// OBJ mesh of the support surface
    #[arg(long, value_name = "OBJ")]
    support: Option<PathBuf>,

    /// Image applied to the ground plane
    #[arg(long, value_name = "IMAGE")]
    texture: Option<PathBuf>,

    /// Object location, pass negative values as `--object-position=-1,0,0`
    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',')]
    object_position: Option<Vec<f32>>,

    /// Euler angles in degrees
    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',')]
    object_orientation: Option<Vec<f32>>,

    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',')]
    camera_position: Option<Vec<f32>>,

    /// Camera Euler angles in degrees. Without it the camera looks at the object
    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',')]
    camera_rotation: Option<Vec<f32>>,

    /// Give the camera the object's orientation instead of aiming at it
    #[arg(long, conflicts_with = "camera_rotation")]
    match_object_rotation: bool,

    /// Output PNG
    #[arg(long, short, default_value = "render.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 1920)]
    resolution_x: u32,

    #[arg(long, default_value_t = 1080)]
    resolution_y: u32,

    /// Jittered samples averaged per pixel
    #[arg(long, default_value_t = 128)]
    samples: u32,

    #[arg(long, value_enum, default_value_t = ComputeDevice::Gpu)]
    device: ComputeDevice,

    /// TOML file with camera and light sampling ranges
    #[arg(long, value_name = "TOML")]
    randomize: Option<PathBuf>,

    /// Overrides the seed of the randomization file
    #[arg(long, requires = "randomize")]
    seed: Option<u64>,
}

fn triple(flag: &str, values: &Option<Vec<f32>>, default: [f32; 3]) -> anyhow::Result<[f32; 3]> {
    match values.as_deref() {
        None => Ok(default),
        Some([x, y, z]) => Ok([*x, *y, *z]),
        Some(other) => anyhow::bail!("--{flag} expects three values, got {}", other.len()),
    }
}

impl Args {
    fn camera_aim(&self) -> anyhow::Result<CameraAim> {
        if self.match_object_rotation {
            return Ok(CameraAim::MatchObject);
        }
        Ok(match &self.camera_rotation {
            Some(_) => CameraAim::Euler(triple("camera-rotation", &self.camera_rotation, [0.0; 3])?),
            None => CameraAim::LookAtObject,
        })
    }

    fn scene_config(&self) -> anyhow::Result<SceneConfig> {
        let defaults = SceneConfig::default();
        Ok(SceneConfig {
            object_path: self.object.clone().unwrap_or(defaults.object_path),
            support_path: self.support.clone().unwrap_or(defaults.support_path),
            texture_image: self.texture.clone().unwrap_or(defaults.texture_image),
            object_position: triple(
                "object-position",
                &self.object_position,
                defaults.object_position,
            )?,
            object_orientation: triple(
                "object-orientation",
                &self.object_orientation,
                defaults.object_orientation,
            )?,
            camera_position: triple(
                "camera-position",
                &self.camera_position,
                defaults.camera_position,
            )?,
            camera_aim: self.camera_aim()?,
            ..defaults
        })
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            output: self.output.clone(),
            resolution_x: self.resolution_x,
            resolution_y: self.resolution_y,
            samples: self.samples,
            device: self.device,
        }
    }

    fn description(&self) -> anyhow::Result<SceneDescription> {
        let config = self.scene_config()?;
        let Some(path) = &self.randomize else {
            return Ok(SceneDescription::fixed(&config));
        };
        let randomization = RandomizationConfig::load(path)?;
        let mut sampler = match self.seed {
            Some(seed) => SceneSampler::with_seed(randomization, seed),
            None => SceneSampler::new(randomization),
        };
        Ok(sampler.sample(&config))
    }
}

fn format_matrix(m: &Matrix4<f32>) -> String {
    // cgmath stores columns, print rows
    (0..4)
        .map(|r| {
            format!(
                "[{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
                m.x[r], m.y[r], m.z[r], m.w[r]
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> anyhow::Result<()> {
    if let Err(e) =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()
    {
        eprintln!("Warning: Could not initialize logger: {}", e);
    }
    let args = Args::parse();
    let description = args.description()?;
    let settings = args.render_settings();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let ctx = Context::new(settings.device).await?;
        let scene = Scene::compose(&ctx, description).await?;
        println!("object pose:\n{}", format_matrix(&scene.object_pose()));
        println!("camera pose:\n{}", format_matrix(&scene.camera_pose()));
        scene.render(&ctx, &settings).await?;
        Ok::<_, anyhow::Error>(())
    })
}
