use cgmath::InnerSpace;
use grasp_synth::{
    camera::euler_xyz,
    config::SceneConfig,
    scene::{
        light::LightKind,
        randomize::{LightingMode, RandomizationConfig, SceneSampler},
    },
};

use crate::common::test_utils::{assert_close, write_file};

mod common;

const FULL_CONFIG: &str = r#"
seed = 7

[camera]
location = { min = [-2.0, -2.0, 1.0], max = [2.0, 2.0, 2.5] }

[lighting]
mode = "random"
count = { min = 2, max = 4 }
types = ["point", "spot"]
color = { min = [0.5, 0.6, 0.7], max = [0.9, 1.0, 1.0] }
energy = { min = 100.0, max = 300.0 }
sun_energy = { min = 2.0, max = 3.0 }
location = { min = [-1.0, -1.0, 4.0], max = [1.0, 1.0, 6.0] }
"#;

#[test]
fn empty_document_uses_defaults() {
    let cfg = RandomizationConfig::from_toml_str("").unwrap();
    assert_eq!(cfg, RandomizationConfig::default());
    assert_eq!(cfg.seed, None);
    assert_eq!(cfg.lighting.mode, LightingMode::Random);
    assert_eq!(cfg.lighting.types.len(), 3);
}

#[test]
fn full_document_is_parsed() {
    let cfg = RandomizationConfig::from_toml_str(FULL_CONFIG).unwrap();
    assert_eq!(cfg.seed, Some(7));
    assert_eq!(cfg.camera.location.min, [-2.0, -2.0, 1.0]);
    assert!(cfg.camera.rotation.is_none());
    assert_eq!(cfg.lighting.count.min, 2);
    assert_eq!(cfg.lighting.types, vec![LightKind::Point, LightKind::Spot]);
}

#[test]
fn config_is_loaded_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "random.toml", FULL_CONFIG);
    let cfg = RandomizationConfig::load(&path).unwrap();
    assert_eq!(cfg.seed, Some(7));
    assert!(RandomizationConfig::load(dir.path().join("absent.toml")).is_err());
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(RandomizationConfig::from_toml_str("[camera]\nfov = 3").is_err());
    assert!(RandomizationConfig::from_toml_str("speed = 1").is_err());
    assert!(RandomizationConfig::from_toml_str("[lighting]\nmode = \"disco\"").is_err());
    assert!(RandomizationConfig::from_toml_str("[lighting]\ntypes = [\"area\"]").is_err());
}

#[test]
fn inverted_or_invalid_ranges_are_rejected() {
    let cases = [
        "[camera]\nlocation = { min = [0.0, 0.0, 3.0], max = [1.0, 1.0, 2.0] }",
        "[camera]\nrotation = { min = [10.0, 0.0, 0.0], max = [0.0, 0.0, 0.0] }",
        "[lighting]\ncount = { min = 3, max = 1 }",
        "[lighting]\ncount = { min = 0, max = 1 }",
        "[lighting]\ncount = { min = 1, max = 9 }",
        "[lighting]\ntypes = []",
        "[lighting]\nenergy = { min = 10.0, max = 1.0 }",
        "[lighting]\nenergy = { min = -1.0, max = 1.0 }",
        "[lighting]\ncolor = { min = [-0.1, 0.0, 0.0], max = [1.0, 1.0, 1.0] }",
    ];
    for case in cases {
        let err = RandomizationConfig::from_toml_str(case);
        assert!(err.is_err(), "accepted {case:?}");
    }
}

#[test]
fn fixed_lighting_skips_light_validation() {
    let cfg = RandomizationConfig::from_toml_str(
        "[lighting]\nmode = \"fixed\"\ncount = { min = 0, max = 0 }",
    )
    .unwrap();
    assert_eq!(cfg.lighting.mode, LightingMode::Fixed);
}

#[test]
fn sampled_values_stay_within_their_ranges() {
    let cfg = RandomizationConfig::from_toml_str(FULL_CONFIG).unwrap();
    let base = SceneConfig::default();
    for seed in 0..200 {
        let mut sampler = SceneSampler::with_seed(cfg.clone(), seed);
        let scene = sampler.sample(&base);

        let camera: [f32; 3] = scene.camera.position.into();
        assert!(cfg.camera.location.contains(camera), "seed {seed}: {camera:?}");

        assert!(cfg.lighting.count.contains(scene.lights.len() as u32));
        for light in &scene.lights {
            assert!(cfg.lighting.types.contains(&light.kind));
            assert!(cfg.lighting.location.contains(light.position));
            assert!(cfg.lighting.color.contains(light.color));
            assert!(cfg.lighting.energy.contains(light.energy));
            assert_eq!(light.target, base.object_position);
        }
    }
}

#[test]
fn sun_lights_use_the_irradiance_range() {
    let cfg = RandomizationConfig::from_toml_str(
        "[lighting]\ntypes = [\"sun\"]\nsun_energy = { min = 2.0, max = 3.0 }",
    )
    .unwrap();
    let mut sampler = SceneSampler::with_seed(cfg, 1);
    for _ in 0..50 {
        for light in sampler.sample_lights([0.0; 3]) {
            assert_eq!(light.kind, LightKind::Sun);
            assert!((2.0..=3.0).contains(&light.energy));
        }
    }
}

#[test]
fn same_seed_reproduces_the_scene() {
    let cfg = RandomizationConfig::from_toml_str(FULL_CONFIG).unwrap();
    let base = SceneConfig::default();
    let a = SceneSampler::new(cfg.clone()).sample(&base);
    let b = SceneSampler::new(cfg.clone()).sample(&base);
    let c = SceneSampler::with_seed(cfg, 8).sample(&base);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn fixed_lighting_keeps_the_single_point_light() {
    let cfg = RandomizationConfig::from_toml_str("seed = 3\n[lighting]\nmode = \"fixed\"").unwrap();
    let base = SceneConfig::default();
    let scene = SceneSampler::new(cfg).sample(&base);
    assert_eq!(scene.lights.len(), 1);
    assert_eq!(scene.lights[0].kind, LightKind::Point);
    assert_eq!(scene.lights[0].position, base.light_position);
    assert_close(scene.lights[0].energy, base.light_energy);
}

#[test]
fn randomisation_leaves_object_and_support_alone() {
    let base = SceneConfig::default();
    let fixed = grasp_synth::scene::SceneDescription::fixed(&base);
    let sampled = SceneSampler::with_seed(RandomizationConfig::default(), 11).sample(&base);
    assert_eq!(sampled.object, fixed.object);
    assert_eq!(sampled.support, fixed.support);
    assert_eq!(sampled.ground, fixed.ground);
}

#[test]
fn camera_without_rotation_range_looks_at_the_object() {
    let mut base = SceneConfig::default();
    base.object_position = [0.5, -0.5, 0.2];
    let mut sampler = SceneSampler::with_seed(RandomizationConfig::default(), 5);
    for _ in 0..20 {
        let pose = sampler.sample(&base).camera;
        let target: cgmath::Point3<f32> = base.object_position.into();
        let expected = (target - pose.position).normalize();
        assert!(pose.forward().dot(expected) > 0.9999);
    }
}

#[test]
fn camera_rotation_range_is_applied_as_euler_angles() {
    let cfg = RandomizationConfig::from_toml_str(
        "[camera]\nrotation = { min = [60.0, 0.0, 90.0], max = [60.0, 0.0, 90.0] }",
    )
    .unwrap();
    let mut sampler = SceneSampler::with_seed(cfg, 0);
    let pose = sampler.sample_camera([0.0; 3]);
    assert_eq!(pose.rotation, euler_xyz([60.0, 0.0, 90.0]));
}
