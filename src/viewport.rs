use glam::{Mat4, Vec3};

/// Pixel size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    /// Zero-sized surfaces (minimised windows) are treated as one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: f64::from(width.max(1)),
            height: f64::from(height.max(1)),
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Size of the visible plane at the scene origin, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub screen: ScreenSize,
    pub viewport: ViewportSize,
}

impl ViewportMetrics {
    pub fn new(screen: ScreenSize, camera: &Camera) -> Self {
        Self {
            screen,
            viewport: camera.visible_size(),
        }
    }
}

/// Perspective camera on the +z axis looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f64,
    pub distance: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    pub const FOV_Y_DEGREES: f64 = 45.0;
    pub const DISTANCE: f64 = 20.0;

    pub fn new(aspect: f64) -> Self {
        Self {
            fov_y_degrees: Self::FOV_Y_DEGREES,
            distance: Self::DISTANCE,
            aspect,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        self.aspect = aspect;
    }

    /// World-space size of the frustum slice through the origin.
    pub fn visible_size(&self) -> ViewportSize {
        let fov = self.fov_y_degrees.to_radians();
        let height = 2.0 * (fov / 2.0).tan() * self.distance;
        ViewportSize {
            width: height * self.aspect,
            height,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians() as f32,
            self.aspect as f32,
            self.near as f32,
            self.far as f32,
        );
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, self.distance as f32), Vec3::ZERO, Vec3::Y);
        proj * view
    }
}
