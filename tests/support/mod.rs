//! Recording doubles for driving a gallery without a window or GPU.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use circular_gallery::config::GalleryConfig;
use circular_gallery::engine::{EngineState, Gallery, SceneFrame, SceneRenderer};
use circular_gallery::host::{FrameId, Host};
use circular_gallery::loader::LoadedImage;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Teardown-relevant calls from both doubles, in the order they happened.
pub type CallTrail = Rc<RefCell<Vec<&'static str>>>;

#[derive(Debug, Default)]
pub struct HostLog {
    pub calls: CallTrail,
    pub size: (u32, u32),
    pub next_frame: FrameId,
    pub pending: BTreeSet<FrameId>,
    pub input_attached: bool,
    pub attach_calls: usize,
    pub unmounts: usize,
}

pub struct RecordingHost(pub Rc<RefCell<HostLog>>);

impl Host for RecordingHost {
    fn surface_size(&self) -> (u32, u32) {
        self.0.borrow().size
    }

    fn request_frame(&mut self) -> FrameId {
        let mut log = self.0.borrow_mut();
        log.next_frame += 1;
        let id = log.next_frame;
        log.pending.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let mut log = self.0.borrow_mut();
        log.pending.remove(&id);
        log.calls.borrow_mut().push("cancel_frame");
    }

    fn attach_input(&mut self) {
        let mut log = self.0.borrow_mut();
        log.input_attached = true;
        log.attach_calls += 1;
    }

    fn detach_input(&mut self) {
        let mut log = self.0.borrow_mut();
        log.input_attached = false;
        log.calls.borrow_mut().push("detach_input");
    }

    fn unmount(&mut self) {
        let mut log = self.0.borrow_mut();
        log.unmounts += 1;
        log.calls.borrow_mut().push("unmount");
    }
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub calls: CallTrail,
    /// Playlist entry per tile, from the latest `prepare_tiles`.
    pub prepared: Vec<usize>,
    pub prepare_calls: usize,
    pub uploads: Vec<usize>,
    pub frames: usize,
    pub drawn_tiles: usize,
    pub resizes: Vec<(u32, u32)>,
    pub released: usize,
}

pub struct RecordingRenderer(pub Rc<RefCell<RenderLog>>);

impl SceneRenderer for RecordingRenderer {
    fn prepare_tiles(&mut self, media: &[usize]) {
        let mut log = self.0.borrow_mut();
        log.prepared = media.to_vec();
        log.prepare_calls += 1;
    }

    fn upload_image(&mut self, image: &LoadedImage) {
        self.0.borrow_mut().uploads.push(image.media_index);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.0.borrow_mut().resizes.push((width, height));
    }

    fn render(&mut self, frame: &SceneFrame<'_>) -> anyhow::Result<()> {
        let mut log = self.0.borrow_mut();
        log.frames += 1;
        log.drawn_tiles = frame.tiles.len();
        Ok(())
    }

    fn release(&mut self) {
        let mut log = self.0.borrow_mut();
        log.released += 1;
        log.calls.borrow_mut().push("release");
    }
}

pub type TestGallery = Gallery<RecordingHost, RecordingRenderer>;

pub struct Harness {
    pub gallery: TestGallery,
    pub host: Rc<RefCell<HostLog>>,
    pub renderer: Rc<RefCell<RenderLog>>,
    pub images: Sender<LoadedImage>,
    pub clock: Instant,
}

pub fn harness(media_count: usize, config: GalleryConfig, size: (u32, u32)) -> Harness {
    let calls = CallTrail::default();
    let host = Rc::new(RefCell::new(HostLog {
        size,
        calls: calls.clone(),
        ..Default::default()
    }));
    let renderer = Rc::new(RefCell::new(RenderLog {
        calls,
        ..Default::default()
    }));
    let (images, rx): (Sender<LoadedImage>, Receiver<LoadedImage>) = unbounded();
    let gallery = Gallery::new(
        RecordingHost(host.clone()),
        RecordingRenderer(renderer.clone()),
        media_count,
        config,
        rx,
    )
    .unwrap();
    Harness {
        gallery,
        host,
        renderer,
        images,
        clock: Instant::now(),
    }
}

impl Harness {
    /// Dispatch the currently armed frame, advancing the clock by one 60 Hz step.
    pub fn tick(&mut self) {
        self.clock += Duration::from_micros(16_667);
        let EngineState::Running { frame } = self.gallery.state() else {
            panic!("gallery is not running");
        };
        self.host.borrow_mut().pending.remove(&frame);
        self.gallery.on_frame(frame, self.clock).unwrap();
    }

    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }
}

pub fn image(media_index: usize, width: u32, height: u32) -> LoadedImage {
    LoadedImage {
        media_index,
        width,
        height,
        pixels: vec![255; (width * height * 4) as usize],
    }
}
