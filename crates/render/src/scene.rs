use chartspace_common::CategoryAggregate;
use glam::{EulerRot, Mat4, Vec2, Vec3};

use crate::layout::{LayoutConfig, Lighting, Palette, Rgba};

/// Edge contour of one bar, as line segments in chart space.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub segments: Vec<[Vec3; 2]>,
    pub color: Rgba,
}

/// One box-shaped bar. `center.y` is half the height so the base sits on
/// `y = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarNode {
    pub category: usize,
    pub label: String,
    pub total: f64,
    pub height: f32,
    pub center: Vec3,
    pub size: Vec3,
    pub color: Rgba,
    pub outline: Outline,
}

impl BarNode {
    /// Model matrix scaling a unit cube into this bar.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.size, glam::Quat::IDENTITY, self.center)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Category name on the floor in front of the bar.
    Category,
    /// Rounded total above the bar.
    Value,
}

/// Camera-facing text sprite anchored in chart space.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSprite {
    pub category: usize,
    pub kind: LabelKind,
    pub text: String,
    pub anchor: Vec3,
    /// World-space width and height of the sprite.
    pub size: Vec2,
    pub color: Rgba,
}

/// Stationary floor grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFloor {
    pub size: f32,
    pub divisions: u32,
    pub y: f32,
    pub center_color: Rgba,
    pub line_color: Rgba,
}

/// Rotation applied to the chart group: pitch about x, then yaw about y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChartRotation {
    pub pitch: f32,
    pub yaw: f32,
}

impl ChartRotation {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.pitch, self.yaw, 0.0)
    }
}

/// Complete bar-chart scene graph, keyed by category index.
///
/// The scene is plain data. Graphics resources derived from it are owned by
/// whichever backend uploaded it and must be released before the scene is
/// rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    bars: Vec<BarNode>,
    labels: Vec<LabelSprite>,
    grid: GridFloor,
    palette: Palette,
    lighting: Lighting,
    rotation: ChartRotation,
}

impl Scene {
    /// Lay out one bar per aggregate, in aggregate order.
    pub fn build(aggregates: &[CategoryAggregate], layout: &LayoutConfig) -> Self {
        let _span = tracing::info_span!("scene_build", bars = aggregates.len()).entered();

        let heights = bar_heights(aggregates, layout.height_scale);
        let n = aggregates.len() as f32;
        let palette = layout.palette;

        let mut bars = Vec::with_capacity(aggregates.len());
        let mut labels = Vec::with_capacity(aggregates.len() * 2);

        for (i, (agg, &height)) in aggregates.iter().zip(&heights).enumerate() {
            let x = (i as f32 - n / 2.0) * layout.bar_spacing;
            let center = Vec3::new(x, height / 2.0, 0.0);
            let size = Vec3::new(layout.bar_width, height, layout.bar_depth);

            bars.push(BarNode {
                category: i,
                label: agg.label.clone(),
                total: agg.total,
                height,
                center,
                size,
                color: palette.bar,
                outline: Outline {
                    segments: box_edges(center, size),
                    color: palette.outline,
                },
            });

            labels.push(LabelSprite {
                category: i,
                kind: LabelKind::Category,
                text: agg.label.clone(),
                anchor: Vec3::new(x, layout.floor_label_y, 0.0),
                size: layout.floor_label_size,
                color: palette.category_label,
            });
            labels.push(LabelSprite {
                category: i,
                kind: LabelKind::Value,
                text: value_text(agg.total),
                anchor: Vec3::new(x, height + layout.value_label_gap, 0.0),
                size: layout.value_label_size,
                color: palette.value_label,
            });
        }

        tracing::debug!(bars = bars.len(), labels = labels.len(), "scene built");

        Self {
            bars,
            labels,
            grid: GridFloor {
                size: layout.grid_size,
                divisions: layout.grid_divisions,
                y: layout.grid_y,
                center_color: palette.grid_center,
                line_color: palette.grid_line,
            },
            palette,
            lighting: layout.lighting,
            rotation: ChartRotation::default(),
        }
    }

    pub fn bars(&self) -> &[BarNode] {
        &self.bars
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn labels(&self) -> &[LabelSprite] {
        &self.labels
    }

    /// Labels belonging to one category.
    pub fn labels_for(&self, category: usize) -> impl Iterator<Item = &LabelSprite> {
        self.labels.iter().filter(move |l| l.category == category)
    }

    pub fn grid(&self) -> &GridFloor {
        &self.grid
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn rotation(&self) -> ChartRotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: ChartRotation) {
        self.rotation = rotation;
    }

    /// Transform of the chart group (bars, outlines, labels).
    pub fn chart_transform(&self) -> Mat4 {
        self.rotation.matrix()
    }
}

/// Bar heights normalized so the largest total reaches `scale`.
///
/// Totals are saturated to the finite range first, so a category whose sum
/// overflowed to infinity still gets the full height. When the largest total
/// is zero every height is zero; the division is skipped rather than
/// producing NaN or infinity.
pub fn bar_heights(aggregates: &[CategoryAggregate], scale: f32) -> Vec<f32> {
    let totals: Vec<f64> = aggregates.iter().map(|a| saturate(a.total)).collect();
    let Some(max_total) = totals.iter().copied().reduce(f64::max) else {
        return Vec::new();
    };
    if max_total == 0.0 {
        return vec![0.0; aggregates.len()];
    }
    let limit = f64::from(f32::MAX);
    totals
        .iter()
        .map(|t| ((t / max_total) * f64::from(scale)).clamp(-limit, limit) as f32)
        .collect()
}

/// Clamp to the finite range; NaN (from `inf - inf`) counts as zero.
fn saturate(total: f64) -> f64 {
    if total.is_nan() {
        0.0
    } else {
        total.clamp(-f64::MAX, f64::MAX)
    }
}

/// Total rounded to an integer for display.
pub fn value_text(total: f64) -> String {
    let rounded = total.round();
    // Avoid printing "-0" for small negative totals.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.0}")
}

/// The 12 edges of an axis-aligned box.
fn box_edges(center: Vec3, size: Vec3) -> Vec<[Vec3; 2]> {
    let h = size / 2.0;
    let corner = |sx: f32, sy: f32, sz: f32| center + Vec3::new(sx * h.x, sy * h.y, sz * h.z);

    let mut edges = Vec::with_capacity(12);
    for &sy in &[-1.0, 1.0] {
        // Bottom and top rings
        edges.push([corner(-1.0, sy, -1.0), corner(1.0, sy, -1.0)]);
        edges.push([corner(1.0, sy, -1.0), corner(1.0, sy, 1.0)]);
        edges.push([corner(1.0, sy, 1.0), corner(-1.0, sy, 1.0)]);
        edges.push([corner(-1.0, sy, 1.0), corner(-1.0, sy, -1.0)]);
    }
    for &(sx, sz) in &[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        edges.push([corner(sx, -1.0, sz), corner(sx, 1.0, sz)]);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggs(values: &[(&str, f64)]) -> Vec<CategoryAggregate> {
        values
            .iter()
            .map(|(l, t)| CategoryAggregate::new(*l, *t))
            .collect()
    }

    #[test]
    fn one_bar_per_aggregate() {
        let scene = Scene::build(&aggs(&[("a", 5.0), ("b", 5.0), ("c", 1.0)]), &LayoutConfig::default());
        assert_eq!(scene.bar_count(), 3);
        assert_eq!(scene.labels().len(), 6);
        for (i, bar) in scene.bars().iter().enumerate() {
            assert_eq!(bar.category, i);
            assert_eq!(scene.labels_for(i).count(), 2);
        }
    }

    #[test]
    fn heights_scale_to_largest_total() {
        let heights = bar_heights(&aggs(&[("a", 10.0), ("b", 5.0), ("c", 0.0)]), 5.0);
        assert_eq!(heights, vec![5.0, 2.5, 0.0]);
    }

    #[test]
    fn all_zero_totals_give_zero_heights() {
        let scene = Scene::build(&aggs(&[("a", 0.0), ("b", 0.0)]), &LayoutConfig::default());
        for bar in scene.bars() {
            assert_eq!(bar.height, 0.0);
            assert!(bar.center.is_finite());
        }
        let single = bar_heights(&aggs(&[("only", 0.0)]), 5.0);
        assert_eq!(single, vec![0.0]);
    }

    #[test]
    fn overflowing_total_still_gets_finite_full_height() {
        let overflowed: f64 = [1e308, 1e308].iter().sum();
        assert!(overflowed.is_infinite());
        let scale = LayoutConfig::default().height_scale;
        let scene = Scene::build(
            &aggs(&[("a", overflowed), ("b", 1.0)]),
            &LayoutConfig::default(),
        );
        let heights: Vec<f32> = scene.bars().iter().map(|b| b.height).collect();
        assert_eq!(heights[0], scale);
        for bar in scene.bars() {
            assert!(bar.height.is_finite());
            assert!((0.0..=scale).contains(&bar.height));
            assert!(bar.center.is_finite());
            assert!(bar.outline.segments.iter().flatten().all(|p| p.is_finite()));
        }
        for label in scene.labels() {
            assert!(label.anchor.is_finite());
        }

        // +inf and -inf rows in one category sum to NaN.
        let cancelled = bar_heights(&aggs(&[("a", f64::NAN), ("b", 2.0)]), 5.0);
        assert_eq!(cancelled, vec![0.0, 5.0]);
    }

    #[test]
    fn empty_aggregates_build_empty_scene() {
        let scene = Scene::build(&[], &LayoutConfig::default());
        assert!(scene.is_empty());
        assert!(scene.labels().is_empty());
    }

    #[test]
    fn bars_are_centered_around_origin_on_x() {
        let layout = LayoutConfig::default();
        let scene = Scene::build(&aggs(&[("a", 1.0), ("b", 2.0)]), &layout);
        let xs: Vec<f32> = scene.bars().iter().map(|b| b.center.x).collect();
        // n = 2: positions (0 - 1) * 1.5 and (1 - 1) * 1.5
        assert_eq!(xs, vec![-1.5, 0.0]);
    }

    #[test]
    fn bar_base_sits_on_floor() {
        let scene = Scene::build(&aggs(&[("a", 4.0), ("b", 2.0)]), &LayoutConfig::default());
        for bar in scene.bars() {
            assert!((bar.center.y - bar.height / 2.0).abs() < 1e-6);
            let bottom = bar.center.y - bar.size.y / 2.0;
            assert!(bottom.abs() < 1e-6);
        }
    }

    #[test]
    fn labels_carry_name_and_rounded_total() {
        let layout = LayoutConfig::default();
        let scene = Scene::build(&aggs(&[("north", 12.6)]), &layout);
        let category = scene.labels_for(0).find(|l| l.kind == LabelKind::Category).unwrap();
        let value = scene.labels_for(0).find(|l| l.kind == LabelKind::Value).unwrap();
        assert_eq!(category.text, "north");
        assert_eq!(category.anchor.y, layout.floor_label_y);
        assert_eq!(value.text, "13");
        assert_eq!(value.anchor.y, layout.height_scale + layout.value_label_gap);
    }

    #[test]
    fn value_text_never_shows_negative_zero() {
        assert_eq!(value_text(-0.2), "0");
        assert_eq!(value_text(2.5), "3");
        assert_eq!(value_text(-7.6), "-8");
    }

    #[test]
    fn outline_has_twelve_edges_on_bar_bounds() {
        let scene = Scene::build(&aggs(&[("a", 2.0)]), &LayoutConfig::default());
        let bar = &scene.bars()[0];
        assert_eq!(bar.outline.segments.len(), 12);
        let max_y = bar
            .outline
            .segments
            .iter()
            .flatten()
            .map(|p| p.y)
            .fold(f32::MIN, f32::max);
        assert!((max_y - bar.height).abs() < 1e-6);
    }

    #[test]
    fn rotation_defaults_to_identity() {
        let mut scene = Scene::build(&aggs(&[("a", 1.0)]), &LayoutConfig::default());
        assert_eq!(scene.chart_transform(), Mat4::IDENTITY);
        scene.set_rotation(ChartRotation { pitch: 0.0, yaw: std::f32::consts::FRAC_PI_2 });
        let p = scene.chart_transform().transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
