//! The gallery engine: tiles, scroll integration and the frame loop.
//!
//! Lifecycle is `Uninitialized -> Running -> Destroyed`. While running the
//! engine always holds exactly one armed frame callback; each tick consumes
//! it and arms the next. Teardown cancels that callback, so nothing can
//! re-enter a destroyed engine.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossbeam_channel::Receiver;
use glam::Mat4;
use tracing::{debug, info, trace};
use winit::window::Window;

use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::gpu::{GpuRenderer, RenderOptions};
use crate::host::{FrameId, Host, WindowHost};
use crate::input::{InputEvent, InteractionAdapter, PointerPhase};
use crate::loader::{LoadedImage, MediaItem, spawn_loader};
use crate::scroll::ScrollState;
use crate::geometry;
use crate::tile::{self, Tile};
use crate::viewport::{Camera, ScreenSize, ViewportMetrics, ViewportSize};

/// Everything a renderer needs to draw one frame.
pub struct SceneFrame<'a> {
    pub view_projection: Mat4,
    pub border_radius: f32,
    pub tiles: &'a [Tile],
}

/// GPU side of the engine. Tiles are addressed by their index.
pub trait SceneRenderer {
    /// (Re)allocate per-tile resources. `media[i]` is the playlist entry tile
    /// `i` shows; images already uploaded stay bound.
    fn prepare_tiles(&mut self, media: &[usize]);

    /// Upload a decoded playlist entry and bind it to every tile showing it.
    /// A no-op once released.
    fn upload_image(&mut self, image: &LoadedImage);

    fn resize(&mut self, width: u32, height: u32);

    /// Draw every tile in one submission.
    fn render(&mut self, frame: &SceneFrame<'_>) -> Result<()>;

    /// Drop the surface and all GPU resources.
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Running { frame: FrameId },
    Destroyed,
}

pub struct Gallery<H: Host, R: SceneRenderer> {
    host: H,
    renderer: R,
    config: GalleryConfig,
    camera: Camera,
    metrics: ViewportMetrics,
    scroll: ScrollState,
    media_count: usize,
    tiles: Vec<Tile>,
    image_sizes: Vec<Option<[u32; 2]>>,
    input: InteractionAdapter,
    images: Receiver<LoadedImage>,
    state: EngineState,
}

/// Mount a gallery into `window`, decoding `items` in the background.
///
/// Fails once, up front, if the configuration is invalid, the playlist is
/// empty or the GPU cannot be initialised.
pub fn create_gallery(
    window: Arc<Window>,
    items: &[MediaItem],
    config: GalleryConfig,
    options: RenderOptions,
) -> Result<Gallery<WindowHost, GpuRenderer>, GalleryError> {
    let config = config.validated()?;
    if items.is_empty() {
        return Err(GalleryError::EmptyPlaylist);
    }
    let renderer = GpuRenderer::new(window.clone(), &options).map_err(GalleryError::Init)?;
    let images = spawn_loader(items, options.max_texture_dim);
    Gallery::new(WindowHost::new(window), renderer, items.len(), config, images)
}

impl<H: Host, R: SceneRenderer> Gallery<H, R> {
    /// Build tiles for the repeated playlist and start the frame loop.
    pub fn new(
        mut host: H,
        mut renderer: R,
        media_count: usize,
        config: GalleryConfig,
        images: Receiver<LoadedImage>,
    ) -> Result<Self, GalleryError> {
        let config = config.validated()?;
        if media_count == 0 {
            return Err(GalleryError::EmptyPlaylist);
        }

        let (width, height) = host.surface_size();
        let screen = ScreenSize::new(width, height);
        let camera = Camera::new(screen.aspect());
        let metrics = ViewportMetrics::new(screen, &camera);

        let tiles = build_tiles(media_count, &config, screen, metrics.viewport, 0.0);
        renderer.prepare_tiles(&media_of(&tiles));
        let tile_count = tiles.len();

        let mut gallery = Self {
            input: InteractionAdapter::new(config.scroll_speed, config.snap_delay),
            host,
            renderer,
            config,
            camera,
            metrics,
            scroll: ScrollState::default(),
            media_count,
            tiles,
            image_sizes: vec![None; media_count],
            images,
            state: EngineState::Uninitialized,
        };

        gallery.host.attach_input();
        let frame = gallery.host.request_frame();
        gallery.state = EngineState::Running { frame };
        info!(
            media = media_count,
            tiles = tile_count,
            width,
            height,
            "gallery running"
        );
        Ok(gallery)
    }

    /// Host callback for frame `id`. Stale or cancelled frames are ignored.
    pub fn on_frame(&mut self, id: FrameId, now: Instant) -> Result<()> {
        match self.state {
            EngineState::Running { frame } if frame == id => self.tick(now),
            _ => {
                trace!(frame = id, state = ?self.state, "ignoring stale frame");
                Ok(())
            }
        }
    }

    fn tick(&mut self, now: Instant) -> Result<()> {
        self.bind_loaded_images();

        let tile_width = self.tile_width();
        if self.input.poll_snap(now, &mut self.scroll.target, tile_width) {
            debug!(scroll_target = self.scroll.target, "wheel settled; snapped");
        }

        let direction = self.scroll.integrate(self.config.scroll_ease);
        for tile in &mut self.tiles {
            tile.update(&self.scroll, direction);
        }

        let frame = SceneFrame {
            view_projection: self.camera.view_projection(),
            border_radius: self.config.border_radius as f32,
            tiles: &self.tiles,
        };
        let rendered = self.renderer.render(&frame);

        self.scroll.end_frame();
        let next = self.host.request_frame();
        self.state = EngineState::Running { frame: next };
        rendered
    }

    fn bind_loaded_images(&mut self) {
        while let Ok(image) = self.images.try_recv() {
            let Some(size) = self.image_sizes.get_mut(image.media_index) else {
                continue;
            };
            *size = Some([image.width, image.height]);
            self.renderer.upload_image(&image);
            for tile in self
                .tiles
                .iter_mut()
                .filter(|t| t.media_index() == image.media_index)
            {
                tile.set_image_size(image.width, image.height);
            }
            debug!(
                media = image.media_index,
                width = image.width,
                height = image.height,
                "image bound"
            );
        }
    }

    /// Route normalised input. Only the scroll target is written.
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        if !matches!(self.state, EngineState::Running { .. }) {
            return;
        }
        match event {
            InputEvent::Pointer {
                x,
                phase: PointerPhase::Down,
            } => self.input.pointer_down(x, self.scroll.current),
            InputEvent::Pointer {
                x,
                phase: PointerPhase::Move,
            } => self.input.pointer_move(x, &mut self.scroll.target),
            InputEvent::Pointer {
                phase: PointerPhase::Up,
                ..
            } => {
                let tile_width = self.tile_width();
                self.input.pointer_up(&mut self.scroll.target, tile_width);
            }
            InputEvent::Wheel { delta } => self.input.wheel(delta, &mut self.scroll.target, now),
            InputEvent::Resize { width, height } => self.resize(width, height),
        }
    }

    /// Recompute viewport metrics and rescale every tile.
    ///
    /// A wider viewport can need more repeats of the playlist to keep the
    /// loop seamless; the tile set then grows and is rebuilt on the current
    /// lap. It never shrinks.
    pub fn resize(&mut self, width: u32, height: u32) {
        let screen = ScreenSize::new(width, height);
        self.camera.set_aspect(screen.aspect());
        self.metrics = ViewportMetrics::new(screen, &self.camera);

        let needed = tile_count_for(self.media_count, &self.config, screen, self.metrics.viewport);
        if needed > self.tiles.len() {
            self.tiles = build_tiles(
                self.media_count,
                &self.config,
                screen,
                self.metrics.viewport,
                self.scroll.current,
            );
            for tile in &mut self.tiles {
                if let Some(Some([w, h])) = self.image_sizes.get(tile.media_index()) {
                    tile.set_image_size(*w, *h);
                }
            }
            self.renderer.prepare_tiles(&media_of(&self.tiles));
            info!(tiles = self.tiles.len(), "gallery tile set grown for wider viewport");
        } else {
            for tile in &mut self.tiles {
                tile.on_resize(screen, self.metrics.viewport);
                tile.settle(self.scroll.current);
            }
        }
        self.renderer.resize(width, height);
        debug!(
            width,
            height,
            viewport_width = self.metrics.viewport.width,
            viewport_height = self.metrics.viewport.height,
            "gallery resized"
        );
    }

    /// Move the scroll target programmatically.
    pub fn scroll_target_by(&mut self, delta: f64) {
        self.scroll.target += delta;
    }

    /// Tear down: cancel the armed frame, detach input, release the surface.
    pub fn destroy(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let EngineState::Running { frame } = self.state {
            self.host.cancel_frame(frame);
        }
        if self.state != EngineState::Destroyed {
            self.host.detach_input();
            self.renderer.release();
            self.host.unmount();
            self.state = EngineState::Destroyed;
            info!("gallery destroyed");
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn metrics(&self) -> ViewportMetrics {
        self.metrics
    }

    pub fn tile_width(&self) -> f64 {
        self.tiles
            .first()
            .map(|t| t.layout().tile_width)
            .unwrap_or_default()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

fn tile_count_for(
    media_count: usize,
    config: &GalleryConfig,
    screen: ScreenSize,
    viewport: ViewportSize,
) -> usize {
    let (plane_width, _) = tile::plane_scale(screen, viewport);
    media_count * geometry::loop_repeats(media_count, plane_width + config.padding, viewport.width)
}

/// Tiles for the playlist repeated around the loop, each settled on the lap
/// that scroll offset `current` implies.
fn build_tiles(
    media_count: usize,
    config: &GalleryConfig,
    screen: ScreenSize,
    viewport: ViewportSize,
    current: f64,
) -> Vec<Tile> {
    let tile_count = tile_count_for(media_count, config, screen, viewport);
    (0..tile_count)
        .map(|index| {
            let mut tile = Tile::new(
                index,
                index % media_count,
                tile_count,
                config.bend,
                config.padding,
                screen,
                viewport,
            );
            tile.settle(current);
            tile
        })
        .collect()
}

fn media_of(tiles: &[Tile]) -> Vec<usize> {
    tiles.iter().map(Tile::media_index).collect()
}

impl<H: Host, R: SceneRenderer> Drop for Gallery<H, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
