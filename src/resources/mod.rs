use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use anyhow::Context;

use crate::{
    data_structures::{
        model::{self, MeshData},
        texture::Texture,
    },
    resources::{
        mesh::{ground_plane, to_mesh_data},
        texture::{load_string, load_texture},
    },
};

/**
 * This module contains all logic for loading meshes and textures from external files.
 */
pub mod mesh;
pub mod texture;

/// Base colour of imported meshes whose material could not be resolved.
pub const DEFAULT_BASE_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Parses an OBJ file into CPU meshes plus the material descriptions it references.
///
/// A missing or broken `.mtl` is not fatal: the meshes are kept and will use
/// the default material.
pub async fn load_obj_data(path: &Path) -> anyhow::Result<(Vec<MeshData>, Vec<tobj::Material>)> {
    let obj_text = load_string(path).await?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = base_dir.join(p);
            async move {
                match tokio::fs::read_to_string(&mtl_path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(_) => Err(tobj::LoadError::OpenFileFailed),
                }
            }
        },
    )
    .await
    .with_context(|| format!("parse OBJ {}", path.display()))?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!(
            "Materials of {} could not be loaded ({}), using the default material.",
            path.display(),
            e
        );
        Vec::new()
    });
    // The default material always sits right after the file's own materials
    let default_material = obj_materials.len();

    let meshes = models
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| {
            let material = m.mesh.material_id.unwrap_or(default_material);
            match to_mesh_data(m, material) {
                Ok(mesh) => Some(mesh),
                Err(e) => {
                    log::warn!(
                        "Mesh at index {} in file {} could not be loaded: {}",
                        idx,
                        path.display(),
                        e
                    );
                    None
                }
            }
        })
        .collect::<Vec<_>>();
    anyhow::ensure!(
        !meshes.is_empty(),
        "OBJ {} contains no usable geometry",
        path.display()
    );
    Ok((meshes, obj_materials))
}

pub async fn load_model_obj(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let (meshes, obj_materials) = load_obj_data(path).await?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut materials = Vec::with_capacity(obj_materials.len() + 1);
    for m in &obj_materials {
        let base_color = m.diffuse.unwrap_or(DEFAULT_BASE_COLOR);
        let diffuse_texture = match &m.diffuse_texture {
            Some(file) => match load_texture(&base_dir.join(file), device, queue).await {
                Ok(texture) => texture,
                Err(e) => {
                    log::warn!("Texture {file} of material {} is unusable: {e:#}", m.name);
                    Texture::create_solid([255; 4], device, queue)
                }
            },
            None => Texture::create_solid([255; 4], device, queue),
        };
        materials.push(model::Material::new(
            device,
            &m.name,
            base_color,
            diffuse_texture,
            layout,
        ));
    }
    materials.push(model::Material::new(
        device,
        "Default",
        DEFAULT_BASE_COLOR,
        Texture::create_solid([255; 4], device, queue),
        layout,
    ));

    let meshes = meshes.iter().map(|mesh| mesh.upload(device)).collect();
    Ok(model::Model { meshes, materials })
}

/// Builds the ground plane with `texture_image` wired into its base colour.
pub async fn load_ground_plane(
    texture_image: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let texture = load_texture(texture_image, device, queue)
        .await
        .with_context(|| format!("load ground texture {}", texture_image.display()))?;
    let material = model::Material::new(device, "TexMat", [1.0, 1.0, 1.0], texture, layout);
    Ok(model::Model {
        meshes: vec![ground_plane(0).upload(device)],
        materials: vec![material],
    })
}
