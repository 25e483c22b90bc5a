use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};
use grasp_synth::{
    camera::{CameraPose, Projection, euler_xyz},
    config::{CameraAim, SceneConfig},
    data_structures::model::ModelVertex,
    pipelines::light::{LightUniform, MAX_LIGHTS},
    resources::{
        load_obj_data,
        mesh::{generate_normals, ground_plane, to_mesh_data, y_up_to_z_up},
    },
    scene::{
        SceneDescription,
        light::{LightKind, LightSpec},
    },
};

use crate::common::test_utils::{CUBE_OBJ, assert_close, assert_close3, write_file};

mod common;

fn apply(m: Matrix4<f32>, p: [f32; 3]) -> [f32; 3] {
    let v = m * Vector4::new(p[0], p[1], p[2], 1.0);
    [v.x, v.y, v.z]
}

fn column(m: Matrix4<f32>, i: usize) -> [f32; 3] {
    [m[i][0], m[i][1], m[i][2]]
}

#[test]
fn support_sits_one_unit_below_the_object() {
    let mut cfg = SceneConfig::default();
    cfg.object_position = [0.3, -0.2, 0.5];
    let scene = SceneDescription::fixed(&cfg);
    assert_close3(
        scene.support.position.into(),
        [0.3, -0.2, -0.5],
    );
    assert_close3(column(scene.object_pose(), 3), [0.3, -0.2, 0.5]);
}

#[test]
fn ground_plane_spans_ten_units_at_the_origin() {
    let scene = SceneDescription::fixed(&SceneConfig::default());
    let m = scene.ground.to_matrix();
    let plane = ground_plane(0);
    let corners: Vec<[f32; 3]> = plane.vertices.iter().map(|v| apply(m, v.position)).collect();
    assert_eq!(corners.len(), 4);
    for c in &corners {
        assert_close(c[0].abs(), 5.0);
        assert_close(c[1].abs(), 5.0);
        assert_close(c[2], 0.0);
    }
    assert_eq!(plane.indices, vec![0, 1, 2, 0, 2, 3]);
    assert!(plane.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
}

#[test]
fn object_orientation_is_applied_as_xyz_euler() {
    let mut cfg = SceneConfig::default();
    cfg.object_orientation = [0.0, 0.0, 90.0];
    let pose = SceneDescription::fixed(&cfg).object_pose();
    // +X of the object now points along world +Y
    assert_close3(column(pose, 0), [0.0, 1.0, 0.0]);
    assert_close3(column(pose, 2), [0.0, 0.0, 1.0]);

    // X is applied before Z
    let r = euler_xyz([90.0, 0.0, 90.0]);
    let y = r * Vector3::unit_y();
    assert_close3(y.into(), [0.0, 0.0, 1.0]);
}

#[test]
fn default_camera_faces_the_object() {
    let scene = SceneDescription::fixed(&SceneConfig::default());
    let forward = scene.camera.forward();
    let expected = Vector3::new(-2.0, 0.0, -1.0).normalize();
    assert!(forward.dot(expected) > 0.9999, "{forward:?}");

    let pose = scene.camera_pose();
    assert_close3(column(pose, 3), [2.0, 0.0, 1.0]);
    // Camera up stays on the world +Z side
    assert!(pose[1][2] > 0.0);
    // The camera looks down its local -Z axis
    assert_close3(column(pose, 2), (-forward).into());
}

#[test]
fn euler_camera_overrides_look_at() {
    let mut cfg = SceneConfig::default();
    cfg.camera_aim = CameraAim::Euler([90.0, 0.0, 90.0]);
    let camera = SceneDescription::fixed(&cfg).camera;
    // Rotating -Z by 90° around X gives +Y, then around Z gives -X
    assert_close3(camera.forward().into(), [-1.0, 0.0, 0.0]);

    let straight_down = CameraPose::from_euler([0.0, 0.0, 3.0], [0.0; 3]);
    assert_close3(straight_down.forward().into(), [0.0, 0.0, -1.0]);
}

#[test]
fn camera_can_copy_the_object_rotation() {
    let mut cfg = SceneConfig::default();
    cfg.camera_aim = CameraAim::MatchObject;
    let scene = SceneDescription::fixed(&cfg);
    assert_eq!(scene.camera.rotation, euler_xyz([0.0; 3]));
    assert_close3(scene.camera.position.into(), cfg.camera_position);

    cfg.object_orientation = [30.0, 0.0, 120.0];
    let scene = SceneDescription::fixed(&cfg);
    assert_eq!(scene.camera.rotation, euler_xyz(cfg.object_orientation));
    assert_eq!(scene.camera.rotation, scene.object.rotation);
}

#[test]
fn look_at_straight_down_stays_finite() {
    let pose = CameraPose::look_at([0.0, 0.0, 5.0], [0.0, 0.0, 0.0]);
    assert_close3(pose.forward().into(), [0.0, 0.0, -1.0]);
    assert!(pose.world_matrix().determinant().is_finite());
}

#[test]
fn view_matrix_inverts_the_camera_pose() {
    let pose = CameraPose::look_at([1.5, -2.0, 0.7], [0.1, 0.2, 0.0]);
    let product = pose.view_matrix() * pose.world_matrix();
    let identity = Matrix4::<f32>::identity();
    for c in 0..4 {
        for r in 0..4 {
            assert_close(product[c][r], identity[c][r]);
        }
    }
}

#[test]
fn lens_matches_a_50mm_full_frame_camera() {
    let landscape = Projection::new(1920, 1080);
    let portrait = Projection::new(1080, 1920);
    let horizontal = 2.0 * (18.0f32 / 50.0).atan();
    // The sensor covers the wider side
    assert_close(2.0 * ((landscape.fov_y().0 / 2.0).tan() * landscape.aspect()).atan(), horizontal);
    assert_close(portrait.fov_y().0, horizontal);
}

#[test]
fn y_up_meshes_are_rotated_to_z_up() {
    assert_eq!(y_up_to_z_up([0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    assert_eq!(y_up_to_z_up([0.0, 0.0, 1.0]), [0.0, -1.0, 0.0]);
    assert_eq!(y_up_to_z_up([1.0, 0.0, 0.0]), [1.0, 0.0, 0.0]);
}

#[test]
fn generated_normals_follow_winding() {
    let mut vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        .map(|position| ModelVertex {
            position,
            tex_coords: [0.0; 2],
            normal: [0.0; 3],
        })
        .to_vec();
    generate_normals(&mut vertices, &[0, 1, 2]);
    for v in &vertices {
        assert_close3(v.normal, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn mesh_conversion_rejects_broken_geometry() {
    let model = |positions: Vec<f32>, indices: Vec<u32>| {
        tobj::Model::new(
            tobj::Mesh {
                positions,
                indices,
                ..Default::default()
            },
            "broken".to_string(),
        )
    };
    assert!(to_mesh_data(&model(vec![], vec![]), 0).is_err());
    assert!(to_mesh_data(&model(vec![0.0; 9], vec![0, 1]), 0).is_err());
    assert!(to_mesh_data(&model(vec![0.0; 9], vec![0, 1, 3]), 0).is_err());

    let ok = to_mesh_data(
        &model(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0], vec![0, 1, 2]),
        4,
    )
    .unwrap();
    assert_eq!(ok.material, 4);
    // -Z forward in OBJ space becomes +Y in the scene
    assert_eq!(ok.vertices[2].position, [0.0, 1.0, 0.0]);
    assert_close3(ok.vertices[0].normal, [0.0, 0.0, 1.0]);
}

#[tokio::test]
async fn obj_without_normals_or_materials_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "cube.obj", CUBE_OBJ);

    let (meshes, materials) = load_obj_data(&path).await.unwrap();

    assert!(materials.is_empty());
    assert_eq!(meshes.len(), 1);
    let cube = &meshes[0];
    // Default material comes right after the file's own
    assert_eq!(cube.material, 0);
    assert_eq!(cube.indices.len(), 36);
    for v in &cube.vertices {
        assert_close(Vector3::from(v.normal).magnitude(), 1.0);
        // Normals of a centred cube point away from its centre
        assert!(Vector3::from(v.normal).dot(Vector3::from(v.position)) > 0.0);
    }
}

#[tokio::test]
async fn obj_without_geometry_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "empty.obj", "# nothing here\n");
    assert!(load_obj_data(&path).await.is_err());
    assert!(load_obj_data(&dir.path().join("absent.obj")).await.is_err());
}

#[test]
fn light_uniform_holds_at_most_eight_lights() {
    let light = LightSpec::point([0.0, 0.0, 5.0], [1.0; 3], 100.0);
    let full = LightUniform::from_specs(&vec![light; MAX_LIGHTS]).unwrap();
    assert_eq!(full.count(), MAX_LIGHTS);
    assert!(LightUniform::from_specs(&vec![light; MAX_LIGHTS + 1]).is_err());

    let sun = LightSpec {
        kind: LightKind::Sun,
        ..light
    };
    let mixed = LightUniform::from_specs(&[light, sun]).unwrap();
    assert_eq!(mixed.kinds().collect::<Vec<_>>(), vec![LightKind::Point, LightKind::Sun]);
}

#[test]
fn light_direction_points_at_the_target() {
    let mut spot = LightSpec::point([0.0, 0.0, 4.0], [1.0; 3], 500.0);
    spot.kind = LightKind::Spot;
    spot.target = [0.0, 0.0, 0.0];
    assert_close3(spot.direction(), [0.0, 0.0, -1.0]);

    spot.target = spot.position;
    assert_close3(spot.direction(), [0.0, 0.0, -1.0]);
}
