//! Closed-form layout math for the bent carousel.
//!
//! Everything here is pure and runs in `f64`, so the same inputs always
//! produce the same bits regardless of frame timing.

/// Vertical offset and roll of a tile placed on the bend arc.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcPose {
    pub y: f64,
    pub rotation_z: f64,
}

/// Horizontal spacing of tiles laid end to end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileLayout {
    /// Width of one tile slot (plane width plus padding).
    pub tile_width: f64,
    /// Width of one full loop of all tiles.
    pub total_width: f64,
}

/// Place a tile whose centre sits at `x` on the arc through the viewport edges.
///
/// `half_width` is half the viewport width in world units. A positive `bend`
/// bows the arc away from the camera, a negative one towards it, and zero
/// keeps the strip flat. Tiles beyond the viewport edge are pinned to the
/// edge pose so `asin` never sees an argument above one.
pub fn place_on_arc(x: f64, half_width: f64, bend: f64) -> ArcPose {
    if bend == 0.0 {
        return ArcPose::default();
    }

    let bend_abs = bend.abs();
    let radius = (half_width * half_width + bend_abs * bend_abs) / (2.0 * bend_abs);
    let effective_x = x.abs().min(half_width);
    // Rounding can push these a hair past the domain edge when |bend| == half_width.
    let arc = radius - (radius * radius - effective_x * effective_x).max(0.0).sqrt();
    let tilt = (effective_x / radius).min(1.0).asin();

    if bend > 0.0 {
        ArcPose {
            y: -arc,
            rotation_z: -sign(x) * tilt,
        }
    } else {
        ArcPose {
            y: arc,
            rotation_z: sign(x) * tilt,
        }
    }
}

/// Slot and loop widths for `tile_count` planes of width `tile_scale_x`.
pub fn layout_widths(tile_scale_x: f64, padding: f64, tile_count: usize) -> TileLayout {
    let tile_width = tile_scale_x + padding;
    TileLayout {
        tile_width,
        total_width: tile_width * tile_count as f64,
    }
}

/// How many times the playlist is repeated around the loop.
///
/// One loop must span the viewport plus one slot, otherwise a tile still
/// inside the visible band would be needed at the opposite edge as well.
/// Never fewer than two repeats.
pub fn loop_repeats(item_count: usize, tile_width: f64, viewport_width: f64) -> usize {
    if item_count == 0 || !(tile_width > 0.0) || !viewport_width.is_finite() {
        return 2;
    }
    let slots = (viewport_width.max(0.0) / tile_width).ceil() as usize + 1;
    slots.div_ceil(item_count).max(2)
}

// Zero maps to zero, unlike `f64::signum`.
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
