/// Which way the strip moved during the last integration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// Scalar world offset of the strip.
///
/// Input only ever writes `target`; `current` and `last` are advanced by the
/// frame tick alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    pub current: f64,
    pub target: f64,
    pub last: f64,
}

impl ScrollState {
    /// Ease `current` a fraction `ease` of the remaining way toward `target`.
    pub fn integrate(&mut self, ease: f64) -> ScrollDirection {
        self.current = lerp(self.current, self.target, ease);
        if self.current > self.last {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        }
    }

    /// Offset travelled since the previous frame.
    pub fn speed(&self) -> f64 {
        self.current - self.last
    }

    pub fn end_frame(&mut self) {
        self.last = self.current;
    }
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
