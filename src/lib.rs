//! grasp-synth
//!
//! Tooling for synthetic grasp-training imagery. The crate has two
//! independent halves:
//!
//! - `dataset`: reorganises a flat ShapeNet OBJ dump into the
//!   `<category>/<identifier>.obj` layout expected by ACRONYM grasp annotations
//! - `scene`: composes an object on a support above a textured ground plane,
//!   places a camera and lights (fixed or randomised) and renders an image
//!   headlessly with wgpu
//!
//! Supporting modules
//! - `camera`: camera poses, lens model and the camera uniform
//! - `config`: scene and render parameters with their defaults
//! - `context`: headless GPU context that owns device, queue and pipeline
//! - `data_structures`: meshes, materials, textures and transforms
//! - `pipelines`: the scene render pipeline and light uniforms
//! - `resources`: OBJ and texture loading
//! - `render`: offscreen rendering, sample accumulation and PNG output
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod dataset;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::Matrix4;
