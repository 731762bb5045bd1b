use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Straight-alpha sRGB color.
pub type Rgba = [f32; 4];

/// Build an [`Rgba`] from a `0xRRGGBB` literal.
pub const fn hex(rgb: u32, alpha: f32) -> Rgba {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        alpha,
    ]
}

/// Chart colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Rgba,
    pub bar: Rgba,
    pub outline: Rgba,
    pub category_label: Rgba,
    pub value_label: Rgba,
    pub grid_center: Rgba,
    pub grid_line: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: hex(0x2d3748, 1.0),
            bar: hex(0x4fd1c5, 0.8),
            outline: hex(0x38b2ac, 1.0),
            category_label: hex(0xe2e8f0, 1.0),
            value_label: hex(0x4fd1c5, 1.0),
            grid_center: hex(0x4a5568, 1.0),
            grid_line: hex(0x374151, 1.0),
        }
    }
}

/// Ambient plus one directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Position of the directional light; it shines toward the origin.
    pub direction_from: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.6,
            directional: 0.8,
            direction_from: Vec3::new(10.0, 10.0, 5.0),
        }
    }
}

/// Fixed visual constants for scene construction. None of these come from
/// user input; bar heights are always normalized into `height_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub bar_width: f32,
    pub bar_depth: f32,
    /// Distance between neighbouring bar centers along x.
    pub bar_spacing: f32,
    /// Height of the tallest bar.
    pub height_scale: f32,
    pub floor_label_y: f32,
    pub floor_label_size: Vec2,
    /// Gap between a bar's top and its value label.
    pub value_label_gap: f32,
    pub value_label_size: Vec2,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub grid_y: f32,
    pub palette: Palette,
    pub lighting: Lighting,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bar_width: 0.8,
            bar_depth: 0.8,
            bar_spacing: 1.5,
            height_scale: 5.0,
            floor_label_y: -1.0,
            floor_label_size: Vec2::new(2.0, 0.5),
            value_label_gap: 0.5,
            value_label_size: Vec2::new(1.5, 0.4),
            grid_size: 20.0,
            grid_divisions: 20,
            grid_y: -0.1,
            palette: Palette::default(),
            lighting: Lighting::default(),
        }
    }
}
