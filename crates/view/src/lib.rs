//! Chart View: lifecycle of the interactive 3D bar chart.
//!
//! # Invariants
//! - A dataset in error state gets a placeholder; no scene, resources,
//!   listeners or render loop are ever created for it.
//! - Unmount stops the loop, removes every listener it registered and
//!   releases every scene resource.
//! - A dataset or column change is a full unmount followed by a mount.

mod backend;
mod config;
mod render_loop;
mod resize;
mod view;

pub use backend::{Frame, GraphicsBackend};
pub use config::{ConfigError, ViewerConfig};
pub use render_loop::RenderLoop;
pub use resize::ResizeAdapter;
pub use view::{ActiveChart, ChartView, LabelPlacement, MountRequest, PlaceholderReason};
