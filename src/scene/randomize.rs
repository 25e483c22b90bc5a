//! Randomised camera and light placement.
//!
//! A [`RandomizationConfig`] is read from TOML and describes closed ranges
//! for every sampled quantity. [`SceneSampler`] draws each value uniformly
//! from its range, so every sampled value lies within `[min, max]`.
//!
//! ```toml
//! seed = 42
//! [camera]
//! location = { min = [-3.0, -3.0, 1.0], max = [3.0, 3.0, 3.0] }
//! [lighting]
//! mode = "random"
//! count = { min = 1, max = 3 }
//! types = ["point", "spot"]
//! ```

use std::path::Path;

use anyhow::{Context, bail, ensure};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::{
    camera::CameraPose,
    config::SceneConfig,
    pipelines::light::MAX_LIGHTS,
    scene::{
        SceneDescription,
        light::{LightKind, LightSpec},
    },
};

/// Closed interval `[min, max]`, scalar or per component.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T> Range<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl Range<f32> {
    fn validate(&self, key: &str) -> anyhow::Result<()> {
        ensure!(
            self.min.is_finite() && self.max.is_finite(),
            "{key}: bounds must be finite"
        );
        ensure!(
            self.min <= self.max,
            "{key}: min {} is greater than max {}",
            self.min,
            self.max
        );
        Ok(())
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn sample(&self, rng: &mut impl Rng) -> f32 {
        rng.gen_range(self.min..=self.max)
    }
}

impl Range<[f32; 3]> {
    fn axis(&self, i: usize) -> Range<f32> {
        Range::new(self.min[i], self.max[i])
    }

    fn validate(&self, key: &str) -> anyhow::Result<()> {
        for (i, name) in ["x", "y", "z"].iter().enumerate() {
            self.axis(i).validate(&format!("{key}.{name}"))?;
        }
        Ok(())
    }

    pub fn contains(&self, value: [f32; 3]) -> bool {
        (0..3).all(|i| self.axis(i).contains(value[i]))
    }

    fn sample(&self, rng: &mut impl Rng) -> [f32; 3] {
        [0, 1, 2].map(|i| self.axis(i).sample(rng))
    }
}

impl Range<u32> {
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraRandomization {
    #[serde(default = "default_camera_location")]
    pub location: Range<[f32; 3]>,
    /// Euler degrees. Without it the camera looks at the object.
    #[serde(default)]
    pub rotation: Option<Range<[f32; 3]>>,
}

fn default_camera_location() -> Range<[f32; 3]> {
    Range::new([-3.0, -3.0, 0.5], [3.0, 3.0, 3.0])
}

impl Default for CameraRandomization {
    fn default() -> Self {
        Self {
            location: default_camera_location(),
            rotation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightingMode {
    /// Replace the fixed light with sampled ones.
    #[default]
    Random,
    /// Keep the fixed scene's single point light.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LightingRandomization {
    pub mode: LightingMode,
    pub count: Range<u32>,
    pub types: Vec<LightKind>,
    /// Linear RGB per component.
    pub color: Range<[f32; 3]>,
    /// Watts, used by point and spot lights.
    pub energy: Range<f32>,
    /// Irradiance in W/m², used by sun lights.
    pub sun_energy: Range<f32>,
    pub location: Range<[f32; 3]>,
}

impl Default for LightingRandomization {
    fn default() -> Self {
        Self {
            mode: LightingMode::Random,
            count: Range::new(1, 3),
            types: vec![LightKind::Point, LightKind::Sun, LightKind::Spot],
            color: Range::new([0.8, 0.8, 0.8], [1.0, 1.0, 1.0]),
            energy: Range::new(200.0, 1500.0),
            sun_energy: Range::new(1.0, 5.0),
            location: Range::new([-5.0, -5.0, 3.0], [5.0, 5.0, 8.0]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomizationConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub camera: CameraRandomization,
    #[serde(default)]
    pub lighting: LightingRandomization,
}

impl RandomizationConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&txt).with_context(|| format!("load {}", path.display()))
    }

    pub fn from_toml_str(txt: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(txt).context("parse randomization TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.camera.location.validate("camera.location")?;
        if let Some(rotation) = &self.camera.rotation {
            rotation.validate("camera.rotation")?;
        }

        let lighting = &self.lighting;
        if lighting.mode == LightingMode::Fixed {
            return Ok(());
        }
        ensure!(
            lighting.count.min <= lighting.count.max,
            "lighting.count: min {} is greater than max {}",
            lighting.count.min,
            lighting.count.max
        );
        ensure!(
            lighting.count.min >= 1,
            "lighting.count: at least one light is required"
        );
        if lighting.count.max as usize > MAX_LIGHTS {
            bail!(
                "lighting.count: max {} exceeds the supported {} lights",
                lighting.count.max,
                MAX_LIGHTS
            );
        }
        ensure!(!lighting.types.is_empty(), "lighting.types must not be empty");
        lighting.color.validate("lighting.color")?;
        ensure!(
            lighting.color.min.iter().all(|c| *c >= 0.0),
            "lighting.color: components must not be negative"
        );
        lighting.energy.validate("lighting.energy")?;
        lighting.sun_energy.validate("lighting.sun_energy")?;
        ensure!(
            lighting.energy.min >= 0.0 && lighting.sun_energy.min >= 0.0,
            "lighting energies must not be negative"
        );
        lighting.location.validate("lighting.location")?;
        Ok(())
    }
}

/// Draws randomised scene descriptions from a [`RandomizationConfig`].
pub struct SceneSampler {
    config: RandomizationConfig,
    rng: StdRng,
}

impl SceneSampler {
    /// Seeds from the configuration, or from entropy when it has no seed.
    pub fn new(config: RandomizationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn with_seed(config: RandomizationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, base: &SceneConfig) -> SceneDescription {
        let mut description = SceneDescription::fixed(base);
        description.camera = self.sample_camera(base.object_position);
        if self.config.lighting.mode == LightingMode::Random {
            description.lights = self.sample_lights(base.object_position);
        }
        description
    }

    pub fn sample_camera(&mut self, target: [f32; 3]) -> CameraPose {
        let location = self.config.camera.location.sample(&mut self.rng);
        match self.config.camera.rotation {
            Some(rotation) => CameraPose::from_euler(location, rotation.sample(&mut self.rng)),
            None => CameraPose::look_at(location, target),
        }
    }

    pub fn sample_lights(&mut self, target: [f32; 3]) -> Vec<LightSpec> {
        let lighting = &self.config.lighting;
        let count = self.rng.gen_range(lighting.count.min..=lighting.count.max);
        (0..count)
            .map(|_| {
                let kind = lighting.types[self.rng.gen_range(0..lighting.types.len())];
                let energy = match kind {
                    LightKind::Sun => lighting.sun_energy.sample(&mut self.rng),
                    LightKind::Point | LightKind::Spot => lighting.energy.sample(&mut self.rng),
                };
                LightSpec {
                    kind,
                    position: lighting.location.sample(&mut self.rng),
                    color: lighting.color.sample(&mut self.rng),
                    energy,
                    target,
                }
            })
            .collect()
    }
}
