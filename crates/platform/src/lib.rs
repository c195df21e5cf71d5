//! Platform layer: window, OpenGL context and the per-frame loop.
//!
//! The window owns a GL 4.5 core context created through glutin; the renderer
//! talks to it through `GlDevice`. Input is sampled into `InputState` and
//! drained once per redraw.

pub mod config;
mod input;
pub mod scene;

use std::{num::NonZeroU32, rc::Rc, time::Instant};

use anyhow::{Context, Result, anyhow};
use corelib::{Mat4, camera::FlyCamera, frame::FrameMatrices, timing::FrameCounter};
use glutin::{
    config::{ConfigTemplateBuilder, GlConfig},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext,
        PossiblyCurrentContext, Version,
    },
    display::{GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use renderer::{GlDevice, PolygonMode, TerrainRenderer};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

pub use config::DemoConfig;
use input::InputState;

/// Open the window and run until it is closed or Escape is pressed.
pub fn run(config: DemoConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Everything tied to a live GL context. Field order is drop order: GPU
/// resources go before the context that owns them.
struct Graphics {
    renderer: TerrainRenderer<GlDevice>,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl Graphics {
    fn create(event_loop: &ActiveEventLoop, config: &DemoConfig) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title("Terrascape")
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let template = ConfigTemplateBuilder::new().with_depth_size(24);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, template, |configs| {
                configs
                    .max_by_key(|c| c.depth_size())
                    .expect("display offered no GL configs")
            })
            .map_err(|e| anyhow!("creating GL display: {e}"))?;
        let window = window.context("display builder did not create a window")?;

        let raw_handle = window.window_handle().ok().map(|h| h.as_raw());
        let display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 5))))
            .build(raw_handle);
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .context("creating OpenGL 4.5 core context")?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .context("building surface attributes")?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .context("creating window surface")?;
        let context = not_current
            .make_current(&surface)
            .context("making GL context current")?;
        if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::warn!("VSync unavailable: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name).cast())
        };
        let device = Rc::new(unsafe { GlDevice::new(gl) });

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let renderer = scene::build_scene(device, config)?;
        renderer.resize(size.width, size.height);

        grab_cursor(&window);

        Ok(Self {
            renderer,
            surface,
            context,
            window,
        })
    }

    fn resize(&self, size: PhysicalSize<u32>) {
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return;
        };
        self.surface.resize(&self.context, w, h);
        self.renderer.resize(size.width, size.height);
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("Cursor grab unavailable: {e}");
    }
    window.set_cursor_visible(false);
}

struct DemoApp {
    config: DemoConfig,
    graphics: Option<Graphics>,
    input: InputState,
    camera: FlyCamera,
    frames: FrameCounter,
    last_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl DemoApp {
    fn new(config: DemoConfig) -> Self {
        let camera =
            FlyCamera::new(config.camera_position, std::f32::consts::PI, -0.2).with_aspect(config.aspect());
        Self {
            config,
            graphics: None,
            input: InputState::default(),
            camera,
            frames: FrameCounter::new(),
            last_frame: Instant::now(),
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(graphics) = self.graphics.as_mut() else {
            return Ok(());
        };

        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        if let Some(ms) = self.frames.tick(dt) {
            log::info!("{ms:.3} ms/frame");
        }

        if self.input.take_reload_request() {
            let failed = graphics.renderer.reload_shaders();
            if !failed.is_empty() {
                log::warn!("Kept previous shaders for: {}", failed.join(", "));
            }
        }

        let camera_input = self.input.take_camera_input();
        self.camera.update(&camera_input, dt.as_secs_f32());

        let polygon_mode = if self.input.wireframe() {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        };
        let matrices = FrameMatrices::new(&self.camera, Mat4::IDENTITY);
        graphics
            .renderer
            .render(&matrices, self.config.light_position, polygon_mode)?;

        graphics.window.pre_present_notify();
        graphics
            .surface
            .swap_buffers(&graphics.context)
            .context("swapping buffers")?;
        Ok(())
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match Graphics::create(event_loop, &self.config) {
            Ok(graphics) => {
                self.last_frame = Instant::now();
                self.graphics = Some(graphics);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(graphics) = &self.graphics {
                    graphics.resize(size);
                }
                if size.width > 0 && size.height > 0 {
                    self.camera.aspect = size.width as f32 / size.height as f32;
                }
            }
            WindowEvent::Focused(false) => self.input.clear(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape && state == ElementState::Pressed {
                    log::info!("Escape pressed. Exiting event loop.");
                    event_loop.exit();
                } else if !repeat {
                    self.input.key(code, state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.mouse_motion(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GL objects must be released while the context is still current.
        self.graphics = None;
    }
}
