//! Standalone window hosting one gallery.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::Configuration;
use crate::engine::{Gallery, create_gallery};
use crate::gpu::{GpuRenderer, RenderOptions};
use crate::host::WindowHost;
use crate::input::{InputEvent, PointerPhase};
use crate::loader::MediaItem;

/// Open a window and run the gallery until it is closed.
pub fn run_gallery(items: Vec<MediaItem>, cfg: Configuration) -> Result<()> {
    info!(count = items.len(), "starting gallery");
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = GalleryApp::new(items, cfg);
    event_loop
        .run_app(&mut app)
        .context("gallery event loop failed")
}

struct GalleryApp {
    items: Vec<MediaItem>,
    cfg: Configuration,
    gallery: Option<Gallery<WindowHost, GpuRenderer>>,
    cursor_x: f64,
    pressed: bool,
}

impl GalleryApp {
    fn new(items: Vec<MediaItem>, cfg: Configuration) -> Self {
        Self {
            items,
            cfg,
            gallery: None,
            cursor_x: 0.0,
            pressed: false,
        }
    }

    fn window(&self) -> Option<&Arc<Window>> {
        self.gallery.as_ref().map(|g| g.host().window())
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = WindowAttributes::default()
            .with_title(self.cfg.window_title.clone())
            .with_inner_size(PhysicalSize::new(1280, 800));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let options = RenderOptions {
            background: self.cfg.background,
            max_texture_dim: self.cfg.max_texture_dim,
        };
        let gallery = create_gallery(window, &self.items, self.cfg.gallery, options)?;
        self.gallery = Some(gallery);
        Ok(())
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gallery) = self.gallery.take() {
            gallery.destroy();
        }
        event_loop.exit();
    }

    fn forward(&mut self, event: InputEvent) {
        if let Some(gallery) = self.gallery.as_mut()
            && gallery.host().accepts_input()
        {
            gallery.handle_input(event, Instant::now());
        }
    }
}

impl ApplicationHandler for GalleryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gallery.is_some() {
            return;
        }
        if let Err(err) = self.mount(event_loop) {
            error!("failed to start gallery: {err:#}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Released
                    && let PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) = event.physical_key
                {
                    self.close(event_loop);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width > 0 && height > 0 {
                    self.forward(InputEvent::Resize { width, height });
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_x = position.x;
                if self.pressed {
                    self.forward(InputEvent::Pointer {
                        x: position.x,
                        phase: PointerPhase::Move,
                    });
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let phase = match state {
                    ElementState::Pressed => PointerPhase::Down,
                    ElementState::Released => PointerPhase::Up,
                };
                self.pressed = state == ElementState::Pressed;
                self.forward(InputEvent::Pointer {
                    x: self.cursor_x,
                    phase,
                });
            }
            WindowEvent::Touch(touch) => {
                let phase = match touch.phase {
                    TouchPhase::Started => PointerPhase::Down,
                    TouchPhase::Moved => PointerPhase::Move,
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerPhase::Up,
                };
                self.forward(InputEvent::Pointer {
                    x: touch.location.x,
                    phase,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Wheel down scrolls forward.
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -f64::from(y),
                    MouseScrollDelta::PixelDelta(pos) => -pos.y,
                };
                self.forward(InputEvent::Wheel { delta });
            }
            WindowEvent::RedrawRequested => {
                let Some(gallery) = self.gallery.as_mut() else {
                    return;
                };
                let Some(frame) = gallery.host_mut().take_due_frame() else {
                    return;
                };
                if let Err(err) = gallery.on_frame(frame, Instant::now()) {
                    warn!("frame failed: {err:#}");
                    self.close(event_loop);
                }
            }
            _ => {}
        }
    }
}
