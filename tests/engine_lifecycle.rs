mod support;

use circular_gallery::GalleryError;
use circular_gallery::config::GalleryConfig;
use circular_gallery::engine::{EngineState, Gallery};
use crossbeam_channel::unbounded;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use support::{RecordingHost, RecordingRenderer, harness, image};

#[test]
fn new_gallery_doubles_playlist_and_arms_one_frame() {
    let h = harness(3, GalleryConfig::default(), (1000, 600));
    assert_eq!(h.gallery.tiles().len(), 6);
    assert_eq!(h.renderer.borrow().prepared, vec![0, 1, 2, 0, 1, 2]);
    let media: Vec<usize> = h.gallery.tiles().iter().map(|t| t.media_index()).collect();
    assert_eq!(media, vec![0, 1, 2, 0, 1, 2]);

    let host = h.host.borrow();
    assert_eq!(host.pending.len(), 1);
    assert!(host.input_attached);
    assert!(matches!(h.gallery.state(), EngineState::Running { .. }));
}

#[test]
fn each_tick_rearms_exactly_one_frame() {
    let mut h = harness(2, GalleryConfig::default(), (1000, 600));
    h.ticks(10);
    assert_eq!(h.renderer.borrow().frames, 10);
    assert_eq!(h.renderer.borrow().drawn_tiles, 4);
    assert_eq!(h.host.borrow().pending.len(), 1);
}

#[test]
fn stale_frame_ids_are_ignored() {
    let mut h = harness(2, GalleryConfig::default(), (1000, 600));
    let EngineState::Running { frame: first } = h.gallery.state() else {
        panic!("not running");
    };
    h.tick();
    h.gallery.on_frame(first, Instant::now()).unwrap();
    h.gallery.on_frame(first + 1000, Instant::now()).unwrap();
    assert_eq!(h.renderer.borrow().frames, 1);
}

#[test]
fn destroy_leaves_nothing_scheduled() {
    let h = harness(3, GalleryConfig::default(), (1000, 600));
    let (host, renderer) = (h.host.clone(), h.renderer.clone());
    let armed: Vec<_> = host.borrow().pending.iter().copied().collect();
    assert_eq!(armed.len(), 1);

    h.gallery.destroy();

    let host = host.borrow();
    assert!(host.pending.is_empty());
    assert!(!host.input_attached);
    assert_eq!(host.unmounts, 1);
    assert_eq!(renderer.borrow().released, 1);
}

#[test]
fn destroy_after_ticking_cancels_the_latest_frame() {
    let mut h = harness(3, GalleryConfig::default(), (1000, 600));
    h.ticks(5);
    let latest = *h.host.borrow().pending.iter().max().unwrap();
    let host = h.host.clone();
    h.gallery.destroy();
    assert!(!host.borrow().pending.contains(&latest));
}

#[test]
fn teardown_releases_the_surface_before_unmounting() {
    let h = harness(2, GalleryConfig::default(), (1000, 600));
    let calls = h.host.borrow().calls.clone();
    h.gallery.destroy();
    assert_eq!(
        *calls.borrow(),
        vec!["cancel_frame", "detach_input", "release", "unmount"]
    );
}

#[test]
fn dropping_the_gallery_tears_down_once() {
    let host = Rc::new(RefCell::new(support::HostLog {
        size: (800, 600),
        ..Default::default()
    }));
    let renderer = Rc::new(RefCell::new(support::RenderLog::default()));
    {
        let (_tx, rx) = unbounded();
        let _gallery = Gallery::new(
            RecordingHost(host.clone()),
            RecordingRenderer(renderer.clone()),
            1,
            GalleryConfig::default(),
            rx,
        )
        .unwrap();
    }
    assert!(host.borrow().pending.is_empty());
    assert_eq!(host.borrow().unmounts, 1);
    assert_eq!(renderer.borrow().released, 1);
}

#[test]
fn loader_sees_closed_channel_after_destroy() {
    let h = harness(2, GalleryConfig::default(), (1000, 600));
    let tx = h.images.clone();
    h.gallery.destroy();
    assert!(tx.send(image(0, 4, 4)).is_err());
}

#[test]
fn empty_playlist_is_rejected() {
    let (_tx, rx) = unbounded();
    let host = Rc::new(RefCell::new(support::HostLog::default()));
    let renderer = Rc::new(RefCell::new(support::RenderLog::default()));
    let result = Gallery::new(
        RecordingHost(host.clone()),
        RecordingRenderer(renderer),
        0,
        GalleryConfig::default(),
        rx,
    );
    assert!(matches!(result, Err(GalleryError::EmptyPlaylist)));
    assert!(host.borrow().pending.is_empty());
    assert_eq!(host.borrow().attach_calls, 0);
}

#[test]
fn invalid_config_is_rejected_before_mounting() {
    let (_tx, rx) = unbounded();
    let host = Rc::new(RefCell::new(support::HostLog::default()));
    let config = GalleryConfig {
        scroll_ease: 0.0,
        ..Default::default()
    };
    let result = Gallery::new(
        RecordingHost(host.clone()),
        RecordingRenderer(Rc::new(RefCell::new(support::RenderLog::default()))),
        2,
        config,
        rx,
    );
    assert!(matches!(result, Err(GalleryError::InvalidConfig(_))));
    assert_eq!(host.borrow().attach_calls, 0);
}

#[test]
fn loaded_image_binds_to_every_repeat() {
    let mut h = harness(3, GalleryConfig::default(), (1000, 600));
    h.images.send(image(1, 40, 30)).unwrap();
    assert!(h.gallery.tiles().iter().all(|t| !t.is_loaded()));

    h.tick();

    assert_eq!(h.renderer.borrow().uploads, vec![1]);
    let loaded: Vec<usize> = h
        .gallery
        .tiles()
        .iter()
        .filter(|t| t.is_loaded())
        .map(|t| t.index())
        .collect();
    assert_eq!(loaded, vec![1, 4]);
    let params = h.gallery.tiles()[4].shader_params();
    assert_eq!(params.image_size, [40.0, 30.0]);
}

#[test]
fn single_image_is_repeated_until_the_loop_covers_the_viewport() {
    let h = harness(1, GalleryConfig::default(), (1000, 600));
    let tiles = h.gallery.tiles();
    assert_eq!(tiles.len(), 4);
    assert!(tiles.iter().all(|t| t.media_index() == 0));
    let total = tiles[0].layout().total_width;
    let slot = tiles[0].layout().tile_width;
    assert!(total >= h.gallery.metrics().viewport.width + slot);
}

#[test]
fn unknown_media_index_is_ignored() {
    let mut h = harness(2, GalleryConfig::default(), (1000, 600));
    h.images.send(image(7, 4, 4)).unwrap();
    h.tick();
    assert!(h.renderer.borrow().uploads.is_empty());
    assert!(h.gallery.tiles().iter().all(|t| !t.is_loaded()));
}

#[test]
fn unloaded_tiles_report_zero_opacity_state() {
    let h = harness(2, GalleryConfig::default(), (1000, 600));
    assert!(h.gallery.tiles().iter().all(|t| !t.shader_params().loaded));
}
