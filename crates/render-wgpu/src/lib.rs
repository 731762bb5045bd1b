//! wgpu render backend for chartspace.
//!
//! Draws the grid floor, bar outlines and translucent lit bars of a
//! [`chartspace_render::Scene`]. Bars are a single instanced cube draw;
//! labels are not drawn here, hosts overlay them from projected
//! placements.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - Per-scene buffers live in [`GpuScene`] and are destroyed by
//!   [`GpuScene::dispose`], never reused across datasets.
//! - Pipelines and the depth target outlive scenes; only the depth target
//!   is recreated on resize.

mod backend;
mod gpu;
mod shaders;

pub use backend::WgpuBackend;
pub use gpu::{ChartRenderer, GpuScene, srgb_to_linear};
