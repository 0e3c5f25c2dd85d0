//! Pointer, wheel and resize handling.
//!
//! Handlers only ever write the scroll *target*; integration of `current`
//! happens in the frame tick.

use std::time::{Duration, Instant};

/// Drag distance (pixels) to world offset, before `scroll_speed`.
pub const DRAG_SCALE: f64 = 0.025;
/// World offset per wheel notch, before `scroll_speed`.
pub const WHEEL_SCALE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Host input normalised to one shape, whatever device produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer { x: f64, phase: PointerPhase },
    /// Positive means "scroll forward" (content moves left).
    Wheel { delta: f64 },
    Resize { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    origin: f64,
    start_x: f64,
}

#[derive(Debug)]
pub struct InteractionAdapter {
    scroll_speed: f64,
    snap_delay: Duration,
    drag: Option<Drag>,
    snap_due: Option<Instant>,
}

impl InteractionAdapter {
    pub fn new(scroll_speed: f64, snap_delay: Duration) -> Self {
        Self {
            scroll_speed,
            snap_delay,
            drag: None,
            snap_due: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(&mut self, x: f64, current: f64) {
        self.drag = Some(Drag {
            origin: current,
            start_x: x,
        });
    }

    /// Only the net displacement from the press point matters.
    pub fn pointer_move(&mut self, x: f64, target: &mut f64) {
        if let Some(drag) = self.drag {
            let distance = (drag.start_x - x) * (self.scroll_speed * DRAG_SCALE);
            *target = drag.origin + distance;
        }
    }

    /// Ends a drag and snaps straight away.
    pub fn pointer_up(&mut self, target: &mut f64, tile_width: f64) {
        if self.drag.take().is_some() {
            *target = snap(*target, tile_width);
        }
    }

    pub fn wheel(&mut self, delta: f64, target: &mut f64, now: Instant) {
        if delta == 0.0 || !delta.is_finite() {
            return;
        }
        let step = self.scroll_speed * WHEEL_SCALE;
        *target += if delta > 0.0 { step } else { -step };
        self.snap_due = Some(now + self.snap_delay);
    }

    /// Fire the debounced wheel snap once the quiet period has passed.
    pub fn poll_snap(&mut self, now: Instant, target: &mut f64, tile_width: f64) -> bool {
        match self.snap_due {
            Some(due) if now >= due => {
                self.snap_due = None;
                *target = snap(*target, tile_width);
                true
            }
            _ => false,
        }
    }

    pub fn snap_pending(&self) -> bool {
        self.snap_due.is_some()
    }
}

/// Round `target` to the nearest whole tile, symmetric around zero.
pub fn snap(target: f64, tile_width: f64) -> f64 {
    if !(tile_width > 0.0) {
        return target;
    }
    let item = (target.abs() / tile_width).round() * tile_width;
    if target < 0.0 { -item } else { item }
}
