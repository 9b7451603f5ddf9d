use anyhow::{anyhow, Context, Result};
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::GetGlDisplay,
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn};
use raw_window_handle::HasRawWindowHandle;
use simple_logger::SimpleLogger;
use std::{ffi::CString, num::NonZeroU32, path::PathBuf, ptr, time::Instant};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use glharness::{config::HarnessConfig, GlContext, Scene};

struct App {
    window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    gl: GlContext,
    scene: Scene,
    started: Instant,
}

impl App {
    fn new(config: &HarnessConfig, event_loop: &EventLoop<()>) -> Result<Self> {
        let window_builder = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("glutin offers at least one config")
            })
            .map_err(|e| anyhow!("Failed to create window: {e}"))?;
        let window = window.context("Display builder returned no window")?;
        let raw_window_handle = window.raw_window_handle();

        let profile = if config.context.core_profile {
            GlProfile::Core
        } else {
            GlProfile::Compatibility
        };
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                config.context.major,
                config.context.minor,
            ))))
            .with_profile(profile)
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("Failed to create OpenGL context")?;

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .context("Failed to create GL surface")?;

        let gl_context = not_current
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        if config.window.vsync {
            if let Err(e) = gl_surface
                .set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                warn!("Failed to enable vsync: {}", e);
            }
        }

        // The context stays current on this thread for the lifetime of the app.
        let gl = unsafe {
            GlContext::load_with(|symbol| {
                CString::new(symbol)
                    .map(|symbol| gl_display.get_proc_address(&symbol))
                    .unwrap_or(ptr::null())
            })
        };
        info!("OpenGL {}", gl.version());

        let size = window.inner_size();
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            gl.viewport(width, height);
        }

        let scene = Scene::new(&gl, config)?;

        Ok(Self {
            window,
            gl_context,
            gl_surface,
            gl,
            scene,
            started: Instant::now(),
        })
    }

    /// Returns true when the window should close.
    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => true,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => true,
            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    self.gl_surface.resize(&self.gl_context, width, height);
                    self.gl.viewport(width, height);
                }
                false
            }
            WindowEvent::RedrawRequested => {
                self.render();
                false
            }
            _ => false,
        }
    }

    fn render(&mut self) {
        self.scene.draw(&self.gl, self.started.elapsed());

        if let Err(e) = self.gl_surface.swap_buffers(&self.gl_context) {
            error!("Failed to swap buffers: {}", e);
        }
    }

    fn shutdown(&mut self) {
        info!("Shutting down, releasing GPU objects");
        self.scene.destroy(&self.gl);
    }
}

fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, config_source) = HarnessConfig::locate(config_path.as_deref())?;

    SimpleLogger::new()
        .with_level(config.level_filter())
        .env()
        .init()?;
    match &config_source {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No configuration file found, using defaults"),
    }

    let event_loop =
        EventLoop::new().map_err(|e| anyhow!("Failed to create event loop: {e}"))?;
    let mut app = App::new(&config, &event_loop)?;

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => {
                if app.handle_window_event(&event) {
                    elwt.exit();
                }
            }
            Event::AboutToWait => app.window.request_redraw(),
            Event::LoopExiting => app.shutdown(),
            _ => {}
        })
        .map_err(|e| anyhow!("Event loop error: {e}"))?;

    Ok(())
}
