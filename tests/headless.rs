//! Offscreen GPU tests.
//!
//! Each test skips itself when the machine has no usable adapter.

use glam::{UVec2, Vec2};
use liquid_ether::{ConfigError, EtherConfig, EtherError, GpuError, LiquidEther};

fn headless(width: u32, height: u32, config: EtherConfig) -> Option<LiquidEther> {
    match pollster::block_on(LiquidEther::headless(width, height, config)) {
        Ok(ether) => Some(ether),
        Err(EtherError::Gpu(GpuError::NoAdapter)) | Err(EtherError::Gpu(GpuError::DeviceCreation(_))) => {
            eprintln!("skipping: no GPU adapter");
            None
        }
        Err(e) => panic!("failed to create headless instance: {}", e),
    }
}

fn quiet() -> EtherConfig {
    EtherConfig::default()
        .with_auto_demo(false)
        .with_iterations(8, 8)
}

#[test]
fn test_still_fluid_renders_background() {
    let config = quiet().with_background("#102030");
    let Some(mut ether) = headless(64, 48, config) else {
        return;
    };

    for _ in 0..3 {
        ether.frame().unwrap();
    }
    let frame = ether.read_frame().unwrap();
    assert_eq!((frame.width, frame.height), (64, 48));
    assert!(frame.iter_pixels().all(|p| p == [0x10, 0x20, 0x30, 0xff]));
}

#[test]
fn test_red_palette_on_still_fluid_renders_background() {
    let Some(mut ether) = headless(32, 24, quiet().with_background("#204060")) else {
        return;
    };

    ether.update_palette(&["#ff0000"]).unwrap();
    ether.frame().unwrap();
    let frame = ether.read_frame().unwrap();
    assert!(frame.iter_pixels().all(|p| p == [0x20, 0x40, 0x60, 0xff]));
}

#[test]
fn test_pointer_motion_moves_fluid() {
    let Some(mut ether) = headless(64, 64, quiet().with_force(20.0, 4.0)) else {
        return;
    };

    ether.pointer_moved(Vec2::new(-0.2, 0.0));
    ether.frame().unwrap();
    ether.pointer_moved(Vec2::new(0.2, 0.0));
    ether.frame().unwrap();

    let velocity = ether.read_velocity().unwrap();
    assert_eq!(velocity.size(), UVec2::new(32, 32));
    assert!(velocity.max_magnitude() > 0.0);
}

#[test]
fn test_dispose_is_idempotent() {
    let Some(mut ether) = headless(32, 32, quiet()) else {
        return;
    };

    ether.frame().unwrap();
    ether.dispose();
    ether.dispose();

    assert!(ether.is_disposed());
    assert!(!ether.is_running());
    assert!(ether.layout().is_none());
    ether.frame().unwrap();
    ether.resize_to(10, 10).unwrap();
    ether.start();
    assert!(!ether.is_running());
    assert!(matches!(ether.read_frame(), Err(EtherError::Disposed)));
}

#[test]
fn test_resize_round_trip() {
    let Some(mut ether) = headless(200, 100, quiet()) else {
        return;
    };
    assert_eq!(ether.fbo_size(), Some(UVec2::new(100, 50)));

    ether.resize_to(400, 300).unwrap();
    ether.frame().unwrap();
    assert_eq!(ether.fbo_size(), Some(UVec2::new(200, 150)));
    let frame = ether.read_frame().unwrap();
    assert_eq!((frame.width, frame.height), (400, 300));

    ether.resize_to(200, 100).unwrap();
    ether.frame().unwrap();
    assert_eq!(ether.fbo_size(), Some(UVec2::new(100, 50)));
    assert_eq!(ether.cell_scale(), Some(Vec2::new(0.01, 0.02)));
}

#[test]
fn test_failed_resize_keeps_previous_size() {
    let Some(mut ether) = headless(64, 32, quiet()) else {
        return;
    };

    let err = ether.resize_to(1_000_000, 20).unwrap_err();
    assert!(matches!(err, EtherError::Gpu(GpuError::Allocation(_))));
    assert_eq!(ether.fbo_size(), Some(UVec2::new(32, 16)));

    ether.frame().unwrap();
    let frame = ether.read_frame().unwrap();
    assert_eq!((frame.width, frame.height), (64, 32));
}

#[test]
fn test_palette_updates() {
    let Some(mut ether) = headless(32, 32, quiet()) else {
        return;
    };
    assert_eq!(ether.palette_width(), Some(3));

    ether.update_palette(&["#ff0000"]).unwrap();
    assert_eq!(ether.palette_width(), Some(2));

    let err = ether.update_palette(&["not a color"]).unwrap_err();
    assert!(matches!(err, EtherError::Config(ConfigError::InvalidColor(_))));
    assert_eq!(ether.palette_width(), Some(2));

    let sender = ether.palette_sender();
    assert!(sender.send(&["#000000", "#ffffff", "#00ff00", "#0000ff"]).unwrap());
    assert!(sender.send(&["#000000", "#ffffff", "#00ff00", "#0000ff", "#ff00ff"]).unwrap());
    ether.frame().unwrap();
    assert_eq!(ether.palette_width(), Some(5));
}

#[test]
fn test_paused_instance_skips_frames() {
    let Some(mut ether) = headless(32, 32, quiet()) else {
        return;
    };

    ether.frame().unwrap();
    ether.pause();
    assert!(!ether.is_running());
    let before = ether.frame_count();
    ether.frame().unwrap();
    assert_eq!(ether.frame_count(), before);

    ether.start();
    ether.frame().unwrap();
    assert_eq!(ether.frame_count(), before + 1);
}
