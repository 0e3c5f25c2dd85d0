//! The seam between the gallery engine and the window it lives in.
//!
//! A host schedules frame callbacks, gates input delivery and owns the
//! drawing surface's mount point. The engine only talks to this trait, so
//! its lifecycle can be checked against a recording double.

use std::sync::Arc;

use winit::window::Window;

/// Identifies one scheduled frame callback.
pub type FrameId = u64;

pub trait Host {
    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Arm a callback for the next display refresh.
    fn request_frame(&mut self) -> FrameId;

    /// Disarm a callback previously returned by [`Host::request_frame`].
    fn cancel_frame(&mut self, id: FrameId);

    /// Start delivering pointer, wheel and resize events to the engine.
    fn attach_input(&mut self);

    fn detach_input(&mut self);

    /// Last teardown step, after the renderer has released the surface.
    /// The host stops treating the gallery as mounted; closing the container
    /// is left to whoever owns it.
    fn unmount(&mut self);
}

/// [`Host`] backed by a winit window. Frames are redraw requests.
///
/// Unmounting only marks the host; the window closes when the application
/// drops its last handle.
#[derive(Debug)]
pub struct WindowHost {
    window: Arc<Window>,
    next_frame: FrameId,
    pending: Option<FrameId>,
    input_attached: bool,
    mounted: bool,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_frame: 1,
            pending: None,
            input_attached: false,
            mounted: true,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Called on `RedrawRequested`: hands out the armed frame, if any.
    pub fn take_due_frame(&mut self) -> Option<FrameId> {
        self.pending.take()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    pub fn accepts_input(&self) -> bool {
        self.input_attached
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl Host for WindowHost {
    fn surface_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn request_frame(&mut self) -> FrameId {
        let id = self.next_frame;
        self.next_frame += 1;
        self.pending = Some(id);
        self.window.request_redraw();
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }

    fn attach_input(&mut self) {
        self.input_attached = true;
    }

    fn detach_input(&mut self) {
        self.input_attached = false;
    }

    fn unmount(&mut self) {
        self.mounted = false;
        tracing::debug!(window = ?self.window.id(), "gallery unmounted");
    }
}
