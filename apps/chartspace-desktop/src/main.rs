use anyhow::{Context as _, Result};
use chartspace_common::{CellValue, TabularDataset};
use chartspace_input::{InputEvent, ListenerRegistry};
use chartspace_render::Rgba;
use chartspace_render_wgpu::{ChartRenderer, GpuScene, WgpuBackend};
use chartspace_view::{ChartView, GraphicsBackend, LabelPlacement, MountRequest, ViewerConfig};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Pixels per wheel line, matching browser line-mode scrolling.
const LINE_DELTA_PX: f32 = 100.0;
/// Share of a label sprite's height taken by its glyphs.
const LABEL_FILL: f32 = 0.6;

#[derive(Parser)]
#[command(name = "chartspace-desktop", about = "Interactive 3D bar chart viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Dataset JSON (a row grid or {headers, rows}); a sample is used if omitted
    #[arg(long)]
    data: Option<PathBuf>,

    /// Category column (defaults to the first header)
    #[arg(long)]
    x: Option<String>,

    /// Value column (defaults to the first numeric column)
    #[arg(long)]
    y: Option<String>,

    /// Viewer configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

fn sample_dataset() -> TabularDataset {
    let row = |product: &str, region: &str, sales: f64, units: i32| {
        vec![
            CellValue::from(product),
            CellValue::from(region),
            CellValue::from(sales),
            CellValue::from(units),
        ]
    };
    TabularDataset::new(
        vec!["Product".into(), "Region".into(), "Sales".into(), "Units".into()],
        vec![
            row("Laptop", "North", 1200.0, 4),
            row("Phone", "South", 800.0, 10),
            row("Laptop", "East", 950.0, 3),
            row("Tablet", "North", 430.0, 6),
            row("Phone", "West", 610.0, 7),
            row("Monitor", "East", 300.0, 2),
            row("Tablet", "South", 520.0, 5),
        ],
    )
}

/// Dataset, column selection and the mounted chart.
struct AppState {
    dataset: TabularDataset,
    x_column: String,
    y_column: String,
    config: ViewerConfig,
    view: Option<ChartView<GpuScene>>,
    listeners: ListenerRegistry,
    cursor: Vec2,
    show_panel: bool,
}

impl AppState {
    fn new(dataset: TabularDataset, x: Option<String>, y: Option<String>, config: ViewerConfig) -> Self {
        let x_column = x
            .or_else(|| dataset.headers().first().cloned())
            .unwrap_or_default();
        let y_column = y
            .or_else(|| dataset.numeric_columns().first().map(|c| c.to_string()))
            .unwrap_or_default();
        Self {
            dataset,
            x_column,
            y_column,
            config,
            view: None,
            listeners: ListenerRegistry::new(),
            cursor: Vec2::ZERO,
            show_panel: true,
        }
    }

    /// Column pickers. Returns true when the selection changed.
    fn draw_ui(&mut self, ctx: &EguiContext) -> bool {
        if !self.show_panel {
            return false;
        }
        let before = (self.x_column.clone(), self.y_column.clone());

        egui::SidePanel::left("columns")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Chartspace");
                ui.separator();
                ui.label(format!(
                    "Rows: {}  Columns: {}",
                    self.dataset.row_count(),
                    self.dataset.headers().len()
                ));
                ui.separator();

                egui::ComboBox::from_label("X axis")
                    .selected_text(self.x_column.as_str())
                    .show_ui(ui, |ui| {
                        for header in self.dataset.headers() {
                            ui.selectable_value(&mut self.x_column, header.clone(), header);
                        }
                    });
                egui::ComboBox::from_label("Y axis")
                    .selected_text(self.y_column.as_str())
                    .show_ui(ui, |ui| {
                        for column in self.dataset.numeric_columns() {
                            ui.selectable_value(&mut self.y_column, column.to_string(), column);
                        }
                    });

                if let Some(chart) = self.view.as_ref().and_then(ChartView::active) {
                    ui.separator();
                    ui.label(format!("Bars: {}", chart.scene().bar_count()));
                    let rotation = chart.scene().rotation();
                    ui.label(format!(
                        "Pitch: {:.2}  Yaw: {:.2}",
                        rotation.pitch, rotation.yaw
                    ));
                    ui.label(format!("Distance: {:.2}", chart.camera().distance));
                }

                ui.separator();
                ui.small("Drag: rotate | Wheel: zoom | F1: toggle panel");
            });

        before != (self.x_column.clone(), self.y_column.clone())
    }

    /// Paint projected labels, far to near, or the placeholder message.
    fn draw_overlay(&self, ctx: &EguiContext, surface: (u32, u32)) {
        let Some(view) = &self.view else {
            return;
        };
        if let Some(reason) = view.placeholder() {
            egui::Area::new(egui::Id::new("placeholder"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(reason.message()).size(18.0));
                });
            return;
        }

        let ppp = ctx.pixels_per_point();
        let mut labels: Vec<LabelPlacement> = view.label_placements(surface.0, surface.1);
        labels.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("chart_labels"),
        ));
        for label in &labels {
            let size = label.pixel_height * LABEL_FILL / ppp;
            if !size.is_finite() || size < 4.0 || !label.position.is_finite() {
                continue;
            }
            painter.text(
                egui::pos2(label.position.x / ppp, label.position.y / ppp),
                egui::Align2::CENTER_CENTER,
                &label.text,
                egui::FontId::proportional(size),
                color32(label.color),
            );
        }
    }
}

/// Unmount whatever chart occupies `slot`, leaving it empty.
fn close_view<B: GraphicsBackend>(
    slot: &mut Option<ChartView<B::Resources>>,
    backend: &mut B,
    listeners: &mut ListenerRegistry,
) {
    if let Some(view) = slot.take() {
        view.unmount(backend, listeners);
    }
}

fn color32(c: Rgba) -> egui::Color32 {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(byte(c[0]), byte(c[1]), byte(c[2]), byte(c[3]))
}

/// Device, surface and pipelines, created once the window exists.
struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: ChartRenderer,
}

impl Gpu {
    fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("chartspace_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = ChartRenderer::new(&device, surface_format, config.width, config.height);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn backend<'a>(&'a mut self, target: Option<&'a wgpu::TextureView>) -> WgpuBackend<'a> {
        WgpuBackend {
            device: &self.device,
            queue: &self.queue,
            renderer: &mut self.renderer,
            surface: &self.surface,
            config: &mut self.config,
            target,
        }
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    /// Deliver an event to the chart if it is listening for it. Without a
    /// resize listener the surface still has to follow the window.
    fn dispatch(&mut self, event: InputEvent) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let listening = self.state.listeners.is_listening(event.kind());
        match (&mut self.state.view, event) {
            (Some(view), _) if listening => view.handle_input(&event, &mut gpu.backend(None)),
            (_, InputEvent::Resize { width, height }) => {
                gpu.backend(None).resize_surface(width, height);
            }
            _ => {}
        }
    }

    fn retarget(&mut self) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let Some(view) = self.state.view.take() else {
            return;
        };
        let state = &mut self.state;
        let request = MountRequest {
            dataset: &state.dataset,
            x_column: &state.x_column,
            y_column: &state.y_column,
        };
        let surface = gpu.size();
        let view = view.retarget(
            request,
            &state.config,
            surface,
            &mut gpu.backend(None),
            &mut state.listeners,
        );
        self.state.view = Some(view);
    }

    /// Release the chart. Runs on close and again when the loop exits; the
    /// second call finds the slot empty.
    fn shutdown(&mut self) {
        if let Some(gpu) = &mut self.gpu {
            close_view(
                &mut self.state.view,
                &mut gpu.backend(None),
                &mut self.state.listeners,
            );
        }
        tracing::info!(
            residual_listeners = self.state.listeners.count(),
            "chart view closed"
        );
    }

    fn redraw(&mut self) {
        let (Some(window), Some(gpu)) = (self.window.clone(), &mut self.gpu) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let drew = match &mut self.state.view {
            Some(chart) => chart.frame(&mut gpu.backend(Some(&view))),
            None => false,
        };
        if !drew {
            gpu.renderer.clear(
                &gpu.device,
                &gpu.queue,
                &view,
                self.state.config.layout.palette.background,
            );
        }

        let Some(egui_winit) = self.egui_winit.as_mut() else {
            return;
        };
        let raw_input = egui_winit.take_egui_input(&window);
        let surface = gpu.size();
        let mut selection_changed = false;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            selection_changed = self.state.draw_ui(ctx);
            self.state.draw_overlay(ctx, surface);
        });
        egui_winit.handle_platform_output(&window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [surface.0, surface.1],
            pixels_per_point: full_output.pixels_per_point,
        };

        if let Some(egui_renderer) = self.egui_renderer.as_mut() {
            for (id, image_delta) in &full_output.textures_delta.set {
                egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
            }
            let mut encoder = gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("egui_encoder"),
                });
            egui_renderer.update_buffers(
                &gpu.device,
                &gpu.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            gpu.queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                egui_renderer.free_texture(id);
            }
        }

        output.present();

        if selection_changed {
            tracing::info!(
                x = %self.state.x_column,
                y = %self.state.y_column,
                "column selection changed"
            );
            self.retarget();
        }

        let egui_repaint = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero());
        if selection_changed || egui_repaint {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Chartspace")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut gpu = match Gpu::new(window.clone()) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        let surface = gpu.size();
        let state = &mut self.state;
        let request = MountRequest {
            dataset: &state.dataset,
            x_column: &state.x_column,
            y_column: &state.y_column,
        };
        let view = ChartView::mount(
            request,
            &state.config,
            surface,
            &mut gpu.backend(None),
            &mut state.listeners,
        );
        self.state.view = Some(view);

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.repaint {
                window.request_redraw();
            }
            // Releases always reach the chart so a drag never sticks.
            let release = matches!(
                event,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    ..
                }
            );
            if response.consumed && !release {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.dispatch(InputEvent::Resize {
                    width: new_size.width,
                    height: new_size.height,
                });
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.dispatch(InputEvent::PointerMove(self.state.cursor));
            }
            WindowEvent::CursorLeft { .. } => self.dispatch(InputEvent::PointerLeave),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => self.dispatch(InputEvent::PointerDown(self.state.cursor)),
                ElementState::Released => self.dispatch(InputEvent::PointerUp),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scroll-up as positive; the chart expects
                // positive delta for scrolling down.
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_DELTA_PX,
                    MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
                };
                self.dispatch(InputEvent::Wheel { delta_y });
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key
                        == winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::F1) =>
            {
                self.state.show_panel = !self.state.show_panel;
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let wants_frame = self
            .state
            .view
            .as_ref()
            .is_some_and(ChartView::wants_frame);
        if let (true, Some(window)) = (wants_frame, &self.window) {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("chartspace-desktop starting");

    let dataset = match &cli.data {
        Some(path) => TabularDataset::load(path)
            .with_context(|| format!("loading dataset {}", path.display()))?,
        None => sample_dataset(),
    };
    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GpuApp::new(AppState::new(dataset, cli.x, cli.y, config));
    event_loop.run_app(&mut app)?;

    Ok(())
}
