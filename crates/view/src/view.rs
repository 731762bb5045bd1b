use chartspace_aggregate::{AggregateError, aggregate};
use chartspace_common::TabularDataset;
use chartspace_input::{InputEvent, ListenerId, ListenerKind, ListenerRegistry, OrbitController};
use chartspace_render::{LabelKind, OrbitCamera, Rgba, Scene};
use glam::Vec2;

use crate::backend::{Frame, GraphicsBackend};
use crate::config::ViewerConfig;
use crate::render_loop::RenderLoop;
use crate::resize::ResizeAdapter;

/// Why a view shows a placeholder instead of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderReason {
    InvalidColumns(String),
    InsufficientData,
}

impl PlaceholderReason {
    pub fn message(&self) -> &'static str {
        match self {
            PlaceholderReason::InvalidColumns(_) => "Invalid column selection",
            PlaceholderReason::InsufficientData => "Insufficient data for 3D chart",
        }
    }
}

impl From<AggregateError> for PlaceholderReason {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::ColumnNotFound(name) => PlaceholderReason::InvalidColumns(name),
            AggregateError::InsufficientData => PlaceholderReason::InsufficientData,
        }
    }
}

/// The dataset and column pair a view is mounted for.
#[derive(Debug, Clone, Copy)]
pub struct MountRequest<'a> {
    pub dataset: &'a TabularDataset,
    pub x_column: &'a str,
    pub y_column: &'a str,
}

/// A label projected onto the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub category: usize,
    pub kind: LabelKind,
    pub text: String,
    /// Surface pixels, origin top-left.
    pub position: Vec2,
    /// On-screen height of the sprite in pixels.
    pub pixel_height: f32,
    pub depth: f32,
    pub color: Rgba,
}

/// A mounted chart and everything it owns.
pub struct ActiveChart<R> {
    scene: Scene,
    resources: Option<R>,
    orbit: OrbitController,
    camera: OrbitCamera,
    render_loop: RenderLoop,
    resize: ResizeAdapter,
    listeners: Vec<ListenerId>,
}

impl<R> ActiveChart<R> {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn resources(&self) -> Option<&R> {
        self.resources.as_ref()
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.resize.size()
    }

    fn teardown<B: GraphicsBackend<Resources = R>>(
        &mut self,
        backend: &mut B,
        listeners: &mut ListenerRegistry,
    ) {
        self.render_loop.stop();
        for id in self.listeners.drain(..) {
            listeners.remove(id);
        }
        if let Some(resources) = self.resources.take() {
            backend.release(resources);
        }
    }
}

impl<R> Drop for ActiveChart<R> {
    fn drop(&mut self) {
        if self.resources.is_some() || !self.listeners.is_empty() {
            tracing::warn!(
                listeners = self.listeners.len(),
                "chart dropped without unmount"
            );
        }
    }
}

/// The 3D bar chart surface: either a live chart or an inert placeholder.
///
/// Lifecycle is explicit: [`ChartView::mount`] allocates, and
/// [`ChartView::unmount`] must run before the view is discarded or
/// retargeted. A column or dataset change always tears down and rebuilds.
pub enum ChartView<R> {
    Placeholder(PlaceholderReason),
    Active(Box<ActiveChart<R>>),
}

impl<R> ChartView<R> {
    /// Aggregate, build the scene, allocate its resources, subscribe to
    /// input and start the render loop. Aggregation errors produce a
    /// placeholder and nothing else.
    pub fn mount<B: GraphicsBackend<Resources = R>>(
        request: MountRequest<'_>,
        config: &ViewerConfig,
        surface: (u32, u32),
        backend: &mut B,
        listeners: &mut ListenerRegistry,
    ) -> Self {
        let _span = tracing::info_span!(
            "chart_mount",
            x = request.x_column,
            y = request.y_column
        )
        .entered();

        let aggregates = match aggregate(request.dataset, request.x_column, request.y_column) {
            Ok(aggregates) => aggregates,
            Err(err) => {
                tracing::warn!("showing placeholder: {err}");
                return ChartView::Placeholder(err.into());
            }
        };

        let scene = Scene::build(&aggregates, &config.layout);
        let resources = backend.allocate(&scene);

        let registrations: Vec<ListenerId> = ListenerKind::ALL
            .iter()
            .map(|kind| listeners.register(*kind))
            .collect();

        let orbit = OrbitController::new(config.orbit);
        let mut camera = OrbitCamera::with_distance(orbit.state().camera_distance());
        let mut resize = ResizeAdapter::new();
        if let Some((w, h)) = resize.apply(surface.0, surface.1, &mut camera) {
            backend.resize_surface(w, h);
        }

        tracing::info!(bars = scene.bar_count(), "chart mounted");

        ChartView::Active(Box::new(ActiveChart {
            scene,
            resources: Some(resources),
            orbit,
            camera,
            render_loop: RenderLoop::start(),
            resize,
            listeners: registrations,
        }))
    }

    /// Stop the loop, drop every listener registration and release every
    /// scene resource.
    pub fn unmount<B: GraphicsBackend<Resources = R>>(
        self,
        backend: &mut B,
        listeners: &mut ListenerRegistry,
    ) {
        if let ChartView::Active(mut chart) = self {
            chart.teardown(backend, listeners);
            tracing::info!(frames = chart.render_loop.frames(), "chart unmounted");
        }
    }

    /// Tear down and mount again for a new dataset or column selection.
    /// `surface` is the container's current size; a placeholder does not
    /// track one.
    pub fn retarget<B: GraphicsBackend<Resources = R>>(
        self,
        request: MountRequest<'_>,
        config: &ViewerConfig,
        surface: (u32, u32),
        backend: &mut B,
        listeners: &mut ListenerRegistry,
    ) -> Self {
        self.unmount(backend, listeners);
        Self::mount(request, config, surface, backend, listeners)
    }

    pub fn placeholder(&self) -> Option<&PlaceholderReason> {
        match self {
            ChartView::Placeholder(reason) => Some(reason),
            ChartView::Active(_) => None,
        }
    }

    pub fn active(&self) -> Option<&ActiveChart<R>> {
        match self {
            ChartView::Placeholder(_) => None,
            ChartView::Active(chart) => Some(&**chart),
        }
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.active().and_then(ActiveChart::surface_size)
    }

    /// Whether the host should schedule another frame.
    pub fn wants_frame(&self) -> bool {
        self.active().is_some_and(|c| c.render_loop.is_running())
    }

    /// Route one input event: pointer and wheel to the orbit controller,
    /// resize to the resize adapter. Placeholders ignore input.
    pub fn handle_input<B: GraphicsBackend<Resources = R>>(
        &mut self,
        event: &InputEvent,
        backend: &mut B,
    ) {
        let ChartView::Active(chart) = self else {
            return;
        };
        match *event {
            InputEvent::Resize { width, height } => {
                if let Some((w, h)) = chart.resize.apply(width, height, &mut chart.camera) {
                    backend.resize_surface(w, h);
                }
            }
            _ => {
                chart.orbit.handle(event);
                chart.camera.distance = chart.orbit.state().camera_distance();
            }
        }
    }

    /// One render-loop tick. Returns false when nothing was drawn.
    pub fn frame<B: GraphicsBackend<Resources = R>>(&mut self, backend: &mut B) -> bool {
        let ChartView::Active(chart) = self else {
            return false;
        };
        let ActiveChart {
            scene,
            resources,
            orbit,
            camera,
            render_loop,
            ..
        } = &mut **chart;
        let Some(resources) = resources.as_ref() else {
            return false;
        };
        let camera = &*camera;
        render_loop.tick(orbit, scene, |scene| {
            backend.draw(Frame {
                scene,
                resources,
                camera,
            });
        })
    }

    /// Project every label through the chart rotation and camera onto a
    /// surface of the given size. Labels behind the camera are skipped.
    pub fn label_placements(&self, width: u32, height: u32) -> Vec<LabelPlacement> {
        let Some(chart) = self.active() else {
            return Vec::new();
        };
        let transform = chart.scene.chart_transform();
        chart
            .scene
            .labels()
            .iter()
            .filter_map(|label| {
                let world = transform.transform_point3(label.anchor);
                let (position, depth) = chart.camera.project(world, width, height)?;
                Some(LabelPlacement {
                    category: label.category,
                    kind: label.kind,
                    text: label.text.clone(),
                    position,
                    pixel_height: chart.camera.pixel_height(label.size.y, depth, height),
                    depth,
                    color: label.color,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartspace_common::CellValue;
    use chartspace_input::OrbitMode;

    /// Backend that only counts what it is asked to do.
    #[derive(Default)]
    struct CountingBackend {
        next: usize,
        live: Vec<usize>,
        released: Vec<usize>,
        draws: Vec<(usize, usize)>,
        surface: Option<(u32, u32)>,
    }

    impl GraphicsBackend for CountingBackend {
        type Resources = usize;

        fn allocate(&mut self, _scene: &Scene) -> usize {
            self.next += 1;
            self.live.push(self.next);
            self.next
        }

        fn release(&mut self, resources: usize) {
            self.live.retain(|r| *r != resources);
            self.released.push(resources);
        }

        fn resize_surface(&mut self, width: u32, height: u32) {
            self.surface = Some((width, height));
        }

        fn draw(&mut self, frame: Frame<'_, usize>) {
            self.draws.push((*frame.resources, frame.scene.bar_count()));
        }
    }

    fn dataset() -> TabularDataset {
        TabularDataset::from_grid(vec![
            vec!["X".into(), "Y".into()],
            vec!["a".into(), 3.into()],
            vec!["b".into(), 5.into()],
            vec!["a".into(), 2.into()],
        ])
    }

    fn request<'a>(ds: &'a TabularDataset, x: &'a str, y: &'a str) -> MountRequest<'a> {
        MountRequest {
            dataset: ds,
            x_column: x,
            y_column: y,
        }
    }

    fn mount(
        ds: &TabularDataset,
        x: &str,
        y: &str,
        backend: &mut CountingBackend,
        listeners: &mut ListenerRegistry,
    ) -> ChartView<usize> {
        ChartView::mount(
            request(ds, x, y),
            &ViewerConfig::default(),
            (800, 600),
            backend,
            listeners,
        )
    }

    #[test]
    fn mount_builds_scene_and_subscribes() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        let chart = view.active().unwrap();
        assert_eq!(chart.scene().bar_count(), 2);
        assert_eq!(backend.live, vec![1]);
        assert_eq!(backend.surface, Some((800, 600)));
        assert_eq!(listeners.count(), ListenerKind::ALL.len());
        for kind in ListenerKind::ALL {
            assert!(listeners.is_listening(kind));
        }
        assert!(view.wants_frame());

        view.unmount(&mut backend, &mut listeners);
    }

    #[test]
    fn mount_unmount_leaves_no_listeners_or_resources() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let before = listeners.count();

        let view = mount(&ds, "X", "Y", &mut backend, &mut listeners);
        view.unmount(&mut backend, &mut listeners);

        assert_eq!(listeners.count(), before);
        assert!(backend.live.is_empty());
        assert_eq!(backend.released, vec![1]);
    }

    #[test]
    fn missing_column_gives_placeholder_without_side_effects() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let view = mount(&ds, "X", "Nope", &mut backend, &mut listeners);

        assert_eq!(
            view.placeholder(),
            Some(&PlaceholderReason::InvalidColumns("Nope".into()))
        );
        assert_eq!(view.placeholder().unwrap().message(), "Invalid column selection");
        assert_eq!(backend.next, 0);
        assert_eq!(listeners.count(), 0);
        assert!(!view.wants_frame());
        view.unmount(&mut backend, &mut listeners);
        assert!(backend.released.is_empty());
    }

    #[test]
    fn header_only_dataset_gives_placeholder() {
        let ds = TabularDataset::from_grid(vec![vec!["X".into(), "Y".into()]]);
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        assert_eq!(view.placeholder(), Some(&PlaceholderReason::InsufficientData));
        assert!(!view.frame(&mut backend));
        assert!(backend.draws.is_empty());
        assert!(view.label_placements(800, 600).is_empty());
    }

    #[test]
    fn retarget_releases_before_allocating() {
        let ds = TabularDataset::from_grid(vec![
            vec!["X".into(), "Y".into(), "Z".into()],
            vec!["a".into(), 3.into(), "p".into()],
            vec!["b".into(), 5.into(), "q".into()],
        ]);
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        for x in ["Z", "X", "Z"] {
            view = view.retarget(
                request(&ds, x, "Y"),
                &ViewerConfig::default(),
                (800, 600),
                &mut backend,
                &mut listeners,
            );
            assert_eq!(backend.live.len(), 1);
            assert_eq!(listeners.count(), ListenerKind::ALL.len());
        }
        assert_eq!(backend.released, vec![1, 2, 3]);
        assert_eq!(view.surface_size(), Some((800, 600)));

        view.unmount(&mut backend, &mut listeners);
        assert!(backend.live.is_empty());
        assert_eq!(listeners.count(), 0);
    }

    #[test]
    fn retarget_into_placeholder_still_tears_down() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let view = mount(&ds, "X", "Y", &mut backend, &mut listeners);
        let view = view.retarget(
            request(&ds, "X", "Missing"),
            &ViewerConfig::default(),
            (800, 600),
            &mut backend,
            &mut listeners,
        );
        assert!(view.placeholder().is_some());
        assert!(backend.live.is_empty());
        assert_eq!(listeners.count(), 0);
    }

    #[test]
    fn frames_apply_damped_rotation() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        view.handle_input(&InputEvent::PointerDown(Vec2::ZERO), &mut backend);
        view.handle_input(&InputEvent::PointerMove(Vec2::new(100.0, 50.0)), &mut backend);
        assert_eq!(view.active().unwrap().scene().rotation().yaw, 0.0);

        assert!(view.frame(&mut backend));
        let rot = view.active().unwrap().scene().rotation();
        assert!((rot.yaw - 0.1).abs() < 1e-6);
        assert!((rot.pitch - 0.05).abs() < 1e-6);
        assert_eq!(backend.draws, vec![(1, 2)]);

        view.handle_input(&InputEvent::PointerUp, &mut backend);
        assert_eq!(view.active().unwrap().orbit().state().mode(), OrbitMode::Idle);
        view.unmount(&mut backend, &mut listeners);
    }

    #[test]
    fn wheel_moves_camera() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        let before = view.active().unwrap().camera().distance;
        view.handle_input(&InputEvent::Wheel { delta_y: -100.0 }, &mut backend);
        let after = view.active().unwrap().camera().distance;
        assert!(after < before);
        view.unmount(&mut backend, &mut listeners);
    }

    #[test]
    fn zoom_onto_target_hides_labels_instead_of_nan() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        view.handle_input(&InputEvent::Wheel { delta_y: -1000.0 }, &mut backend);
        for p in view.label_placements(800, 600) {
            assert!(p.position.is_finite());
            assert!(p.pixel_height.is_finite());
            assert!(p.depth.is_finite());
        }
        view.unmount(&mut backend, &mut listeners);
    }

    #[test]
    fn resize_is_idempotent() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        let resize = InputEvent::Resize {
            width: 1000,
            height: 500,
        };
        view.handle_input(&resize, &mut backend);
        assert_eq!(backend.surface, Some((1000, 500)));
        assert_eq!(view.active().unwrap().camera().aspect, 2.0);

        backend.surface = None;
        view.handle_input(&resize, &mut backend);
        assert_eq!(backend.surface, None);
        view.unmount(&mut backend, &mut listeners);
    }

    #[test]
    fn labels_project_onto_surface() {
        let ds = dataset();
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let view = mount(&ds, "X", "Y", &mut backend, &mut listeners);

        let placements = view.label_placements(800, 600);
        assert_eq!(placements.len(), 4);
        for p in &placements {
            assert!(p.position.x >= 0.0 && p.position.x <= 800.0);
            assert!(p.position.y >= 0.0 && p.position.y <= 600.0);
            assert!(p.pixel_height > 0.0);
        }
        // Value labels sit above their category labels on screen.
        let cat = placements
            .iter()
            .find(|p| p.category == 1 && p.kind == LabelKind::Category)
            .unwrap();
        let val = placements
            .iter()
            .find(|p| p.category == 1 && p.kind == LabelKind::Value)
            .unwrap();
        assert!(val.position.y < cat.position.y);
        assert_eq!(val.text, "5");
        view.unmount(&mut backend, &mut listeners);
    }

    #[test]
    fn stray_values_do_not_fault() {
        let ds = TabularDataset::from_grid(vec![
            vec!["X".into(), "Y".into()],
            vec![CellValue::Empty, "oops".into()],
        ]);
        let mut backend = CountingBackend::default();
        let mut listeners = ListenerRegistry::new();
        let mut view = mount(&ds, "X", "Y", &mut backend, &mut listeners);
        assert!(view.frame(&mut backend));
        let bar = &view.active().unwrap().scene().bars()[0];
        assert_eq!(bar.label, "Unknown");
        assert_eq!(bar.height, 0.0);
        view.unmount(&mut backend, &mut listeners);
    }
}
