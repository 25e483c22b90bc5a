use anyhow::ensure;
use cgmath::InnerSpace;

use crate::data_structures::model::{MeshData, ModelVertex};

/// OBJ files are written Y-up with -Z forward. The scene is Z-up, so every
/// position and normal is rotated the same way Blender's OBJ
/// importer does it.
pub fn y_up_to_z_up(v: [f32; 3]) -> [f32; 3] {
    [v[0], -v[2], v[1]]
}

/**
 * Converts one triangulated, single-indexed tobj model to vertex data.
 *
 * ShapeNet meshes frequently come without normals. Missing normals are
 * generated by accumulating area-weighted face normals per vertex.
 */
pub fn to_mesh_data(m: &tobj::Model, material: usize) -> anyhow::Result<MeshData> {
    let mesh = &m.mesh;
    let vertex_count = mesh.positions.len() / 3;
    ensure!(vertex_count > 0, "mesh {:?} has no vertices", m.name);
    ensure!(
        mesh.indices.len() % 3 == 0,
        "mesh {:?} is not triangulated",
        m.name
    );
    if let Some(idx) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        anyhow::bail!(
            "mesh {:?} references vertex {} but only has {}",
            m.name,
            idx,
            vertex_count
        );
    }
    let has_normals = mesh.normals.len() == mesh.positions.len();

    let mut vertices = (0..vertex_count)
        .map(|i| ModelVertex {
            position: y_up_to_z_up([
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ]),
            tex_coords: [
                mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: if has_normals {
                y_up_to_z_up([
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ])
            } else {
                [0.0; 3]
            },
        })
        .collect::<Vec<_>>();

    if !has_normals {
        generate_normals(&mut vertices, &mesh.indices);
    }

    Ok(MeshData {
        name: m.name.clone(),
        vertices,
        indices: mesh.indices.clone(),
        material,
    })
}

/// Smooth vertex normals from the triangles referencing each vertex.
pub fn generate_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut sums = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for c in indices.chunks_exact(3) {
        let p0: cgmath::Vector3<f32> = vertices[c[0] as usize].position.into();
        let p1: cgmath::Vector3<f32> = vertices[c[1] as usize].position.into();
        let p2: cgmath::Vector3<f32> = vertices[c[2] as usize].position.into();
        // The cross product's length is twice the triangle area, which weights
        // large faces more
        let face = (p1 - p0).cross(p2 - p0);
        for &i in c {
            sums[i as usize] += face;
        }
    }
    for (v, n) in vertices.iter_mut().zip(sums) {
        v.normal = if n.magnitude2() > 0.0 {
            n.normalize().into()
        } else {
            [0.0, 0.0, 1.0]
        };
    }
}

/// A unit plane in the XY plane centred at the origin, facing +Z.
pub fn ground_plane(material: usize) -> MeshData {
    let corners = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let vertices = corners
        .iter()
        .zip(uvs.iter())
        .map(|(c, uv)| ModelVertex {
            position: [c[0], c[1], 0.0],
            tex_coords: [uv[0], 1.0 - uv[1]],
            normal: [0.0, 0.0, 1.0],
        })
        .collect();
    MeshData {
        name: "Ground".to_string(),
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
        material,
    }
}
