//! Engine data structures: models, textures and transforms.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `transform` holds per-object placement and its GPU layout

pub mod model;
pub mod texture;
pub mod transform;
