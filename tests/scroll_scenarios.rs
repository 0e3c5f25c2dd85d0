mod support;

use circular_gallery::config::GalleryConfig;
use circular_gallery::input::{DRAG_SCALE, InputEvent, PointerPhase, WHEEL_SCALE, snap};
use std::time::Duration;

use support::harness;

fn pointer(x: f64, phase: PointerPhase) -> InputEvent {
    InputEvent::Pointer { x, phase }
}

#[test]
fn one_wheel_notch_moves_target_by_speed_step() {
    let config = GalleryConfig {
        bend: 0.0,
        ..Default::default()
    };
    let mut h = harness(3, config, (1000, 600));
    h.gallery.handle_input(InputEvent::Wheel { delta: 100.0 }, h.clock);
    assert!((h.gallery.scroll().target - 2.0 * WHEEL_SCALE).abs() < 1e-12);
    assert_eq!(h.gallery.scroll().current, 0.0);

    h.gallery.handle_input(InputEvent::Wheel { delta: -1.0 }, h.clock);
    assert!(h.gallery.scroll().target.abs() < 1e-12);
}

#[test]
fn wheel_snaps_to_a_tile_after_quiet_period() {
    let mut h = harness(3, GalleryConfig::default(), (1000, 600));
    for _ in 0..30 {
        h.gallery.handle_input(InputEvent::Wheel { delta: 1.0 }, h.clock);
    }
    let unsnapped = h.gallery.scroll().target;
    assert!((unsnapped - 12.0).abs() < 1e-9);

    h.ticks(6);
    assert_eq!(h.gallery.scroll().target, unsnapped);

    h.ticks(14);
    let tile_width = h.gallery.tile_width();
    assert_eq!(h.gallery.scroll().target, snap(unsnapped, tile_width));
    assert_eq!(h.gallery.scroll().target, tile_width);
}

#[test]
fn current_eases_toward_target() {
    let mut h = harness(3, GalleryConfig::default(), (1000, 600));
    h.gallery.scroll_target_by(10.0);

    h.ticks(60);
    let gap = (h.gallery.scroll().target - h.gallery.scroll().current).abs();
    assert!(gap <= 0.05 * 10.0, "gap after 60 frames: {gap}");

    h.ticks(40);
    let gap = (h.gallery.scroll().target - h.gallery.scroll().current).abs();
    assert!(gap <= 0.01 * 10.0, "gap after 100 frames: {gap}");
}

#[test]
fn drag_release_depends_only_on_endpoints() {
    let mut direct = harness(3, GalleryConfig::default(), (1000, 600));
    let mut wobbly = harness(3, GalleryConfig::default(), (1000, 600));

    direct.gallery.handle_input(pointer(500.0, PointerPhase::Down), direct.clock);
    direct.gallery.handle_input(pointer(300.0, PointerPhase::Move), direct.clock);
    let before_release = direct.gallery.scroll().target;
    assert!((before_release - 200.0 * 2.0 * DRAG_SCALE).abs() < 1e-12);
    direct.gallery.handle_input(pointer(300.0, PointerPhase::Up), direct.clock);

    wobbly.gallery.handle_input(pointer(500.0, PointerPhase::Down), wobbly.clock);
    for x in [520.0, 410.0, 200.0, 350.0, 300.0] {
        wobbly.gallery.handle_input(pointer(x, PointerPhase::Move), wobbly.clock);
    }
    wobbly.gallery.handle_input(pointer(300.0, PointerPhase::Up), wobbly.clock);

    let tile_width = direct.gallery.tile_width();
    assert_eq!(direct.gallery.scroll().target, snap(before_release, tile_width));
    assert_eq!(direct.gallery.scroll().target, wobbly.gallery.scroll().target);
}

#[test]
fn drag_starts_from_current_offset() {
    let mut h = harness(3, GalleryConfig::default(), (1000, 600));
    h.gallery.scroll_target_by(5.0);
    h.ticks(3);
    let current = h.gallery.scroll().current;

    h.gallery.handle_input(pointer(100.0, PointerPhase::Down), h.clock);
    h.gallery.handle_input(pointer(100.0, PointerPhase::Move), h.clock);
    assert_eq!(h.gallery.scroll().target, current);
}

#[test]
fn scrolling_forward_moves_tiles_left() {
    let config = GalleryConfig {
        bend: 0.0,
        ..Default::default()
    };
    let mut h = harness(3, config, (1000, 600));
    h.tick();
    let before = h.gallery.tiles()[0].pose().x;
    h.gallery.scroll_target_by(1.0);
    h.tick();
    let after = h.gallery.tiles()[0].pose().x;
    assert!(after < before);
    assert_eq!(h.gallery.tiles()[0].pose().y, 0.0);
}

#[test]
fn ripple_speed_follows_scroll_velocity() {
    let mut h = harness(3, GalleryConfig::default(), (1000, 600));
    h.gallery.scroll_target_by(4.0);
    h.tick();
    let params = h.gallery.tiles()[0].shader_params();
    assert!((f64::from(params.speed) - 4.0 * 0.05).abs() < 1e-6);
    assert!(params.time > 0.0);
}

#[test]
fn snap_delay_is_configurable() {
    let config = GalleryConfig {
        snap_delay: Duration::from_millis(50),
        ..Default::default()
    };
    let mut h = harness(3, config, (1000, 600));
    for _ in 0..30 {
        h.gallery.handle_input(InputEvent::Wheel { delta: 1.0 }, h.clock);
    }
    h.ticks(4);
    assert_eq!(h.gallery.scroll().target, h.gallery.tile_width());
}
