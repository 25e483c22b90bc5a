//! Render pipeline definitions.
//!
//! - `basic`: the opaque, lit pipeline used for every scene object
//! - `light`: light uniform packing and its bind group

pub mod basic;
pub mod light;
