//! Per-image state of the carousel: layout slot, loop wrap and pose.
//!
//! The GPU half of a tile (uniform buffer, bind group, texture) lives in
//! [`crate::gpu`]; this side is plain data so the engine can be driven
//! without a device.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};

use crate::geometry::{self, TileLayout};
use crate::scroll::{ScrollDirection, ScrollState};
use crate::viewport::{ScreenSize, ViewportSize};

/// Tile size in pixels on a reference-height screen.
const BASE_WIDTH_PX: f64 = 700.0;
const BASE_HEIGHT_PX: f64 = 900.0;
const REFERENCE_SCREEN_HEIGHT_PX: f64 = 1500.0;

/// Ripple clock advance per frame. Tied to frame count, not wall time.
pub const RIPPLE_TIME_STEP: f32 = 0.04;

/// World size of a tile plane for the given screen.
///
/// Works out to a fixed share of the viewport height, so the width only
/// depends on the camera, not on the pixel size of the window.
pub fn plane_scale(screen: ScreenSize, viewport: ViewportSize) -> (f64, f64) {
    let scale = screen.height / REFERENCE_SCREEN_HEIGHT_PX;
    let x = viewport.width * (BASE_WIDTH_PX * scale) / screen.width;
    let y = viewport.height * (BASE_HEIGHT_PX * scale) / screen.height;
    (x, y)
}

/// Resolved placement of a tile in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TilePose {
    pub x: f64,
    pub y: f64,
    pub rotation_z: f64,
}

/// Values the tile shader needs besides the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParams {
    pub time: f32,
    pub speed: f32,
    pub plane_size: [f32; 2],
    pub image_size: [f32; 2],
    pub loaded: bool,
}

#[derive(Debug, Clone)]
pub struct Tile {
    index: usize,
    media_index: usize,
    tile_count: usize,
    bend: f64,
    padding: f64,
    scale_x: f64,
    scale_y: f64,
    layout: TileLayout,
    base_x: f64,
    extra_offset: f64,
    viewport: ViewportSize,
    pose: TilePose,
    time: f32,
    speed: f32,
    image_size: Option<[u32; 2]>,
}

impl Tile {
    /// Build tile `index` of `tile_count`, showing playlist entry `media_index`.
    pub fn new(
        index: usize,
        media_index: usize,
        tile_count: usize,
        bend: f64,
        padding: f64,
        screen: ScreenSize,
        viewport: ViewportSize,
    ) -> Self {
        let mut tile = Self {
            index,
            media_index,
            tile_count,
            bend,
            padding,
            scale_x: 0.0,
            scale_y: 0.0,
            layout: TileLayout {
                tile_width: 0.0,
                total_width: 0.0,
            },
            base_x: 0.0,
            extra_offset: 0.0,
            viewport,
            pose: TilePose::default(),
            time: 0.0,
            speed: 0.0,
            image_size: None,
        };
        tile.on_resize(screen, viewport);
        tile
    }

    /// Rescale so the tile keeps the same share of the window at any size.
    pub fn on_resize(&mut self, screen: ScreenSize, viewport: ViewportSize) {
        self.viewport = viewport;
        (self.scale_x, self.scale_y) = plane_scale(screen, viewport);
        self.layout = geometry::layout_widths(self.scale_x, self.padding, self.tile_count);
        self.base_x = self.layout.tile_width * self.index as f64;
    }

    /// Advance one frame: place on the arc, feed the ripple and wrap if the
    /// tile has left the visible band on the trailing side.
    pub fn update(&mut self, scroll: &ScrollState, direction: ScrollDirection) {
        let x = self.base_x - scroll.current - self.extra_offset;
        let half_viewport = self.viewport.width / 2.0;
        let arc = geometry::place_on_arc(x, half_viewport, self.bend);
        self.pose = TilePose {
            x,
            y: arc.y,
            rotation_z: arc.rotation_z,
        };

        self.speed = scroll.speed() as f32;
        // Both ripple terms repeat every 2π, so wrap before f32 loses the step.
        self.time = (self.time + RIPPLE_TIME_STEP) % TAU;

        let half_plane = self.scale_x / 2.0;
        let is_before = x + half_plane < -half_viewport;
        let is_after = x - half_plane > half_viewport;
        match direction {
            ScrollDirection::Forward if is_before => {
                self.extra_offset -= self.layout.total_width;
            }
            ScrollDirection::Backward if is_after => {
                self.extra_offset += self.layout.total_width;
            }
            _ => {}
        }
    }

    /// Choose the loop offset that puts the tile at or left of the trailing
    /// edge of the visible band, within one loop of it.
    ///
    /// Used whenever the tile set is (re)built so that every tile starts on
    /// the same lap regardless of how far the strip has already scrolled.
    pub fn settle(&mut self, current: f64) {
        let total = self.layout.total_width;
        if !(total > 0.0) {
            return;
        }
        let edge = (self.viewport.width + self.scale_x) / 2.0;
        let x = self.base_x - current;
        self.extra_offset = ((x - edge) / total).ceil() * total;
    }

    /// Record the native size of the image now bound to this tile.
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.image_size = Some([width.max(1), height.max(1)]);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.scale_x as f32, self.scale_y as f32, 1.0),
            Quat::from_rotation_z(self.pose.rotation_z as f32),
            Vec3::new(self.pose.x as f32, self.pose.y as f32, 0.0),
        )
    }

    pub fn shader_params(&self) -> ShaderParams {
        let [w, h] = self.image_size.unwrap_or([1, 1]);
        ShaderParams {
            time: self.time,
            speed: self.speed,
            plane_size: [self.scale_x as f32, self.scale_y as f32],
            image_size: [w as f32, h as f32],
            loaded: self.image_size.is_some(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn media_index(&self) -> usize {
        self.media_index
    }

    pub fn layout(&self) -> TileLayout {
        self.layout
    }

    pub fn base_x(&self) -> f64 {
        self.base_x
    }

    pub fn extra_offset(&self) -> f64 {
        self.extra_offset
    }

    pub fn pose(&self) -> TilePose {
        self.pose
    }

    pub fn plane_width(&self) -> f64 {
        self.scale_x
    }

    pub fn is_loaded(&self) -> bool {
        self.image_size.is_some()
    }
}
