//! Whole-pipeline properties checked on the host mirror of the solver.
//!
//! These run without a GPU and pin down the behavior the GPU passes share.

use glam::{UVec2, Vec2};
use liquid_ether::cpu::{self, HostField, HostSimulation};
use liquid_ether::{BoundaryMode, Color, EtherConfig, ForceInput, GridLayout, Palette};

// ============================================================================
// Helpers
// ============================================================================

fn push_right(scale: f32) -> ForceInput {
    ForceInput {
        force: Vec2::new(1.0, 0.0),
        center: Vec2::ZERO,
        scale: Vec2::splat(scale),
    }
}

fn run(config: &EtherConfig, container: UVec2, force: &ForceInput, steps: usize) -> HostSimulation {
    let mut sim = HostSimulation::new(config, container);
    for _ in 0..steps {
        sim.step(config, force);
    }
    sim
}

// ============================================================================
// Solver
// ============================================================================

#[test]
fn test_zero_force_stays_at_rest() {
    let config = EtherConfig::default();
    let idle = ForceInput {
        force: Vec2::ZERO,
        center: Vec2::ZERO,
        scale: Vec2::splat(config.cursor_size),
    };
    let sim = run(&config, UVec2::new(80, 60), &idle, 5);
    assert!(sim.velocity().is_at_rest());
}

#[test]
fn test_force_injects_motion_along_the_push() {
    let config = EtherConfig::default().with_iterations(8, 8);
    let sim = run(&config, UVec2::new(64, 64), &push_right(4.0), 1);
    let vel = sim.velocity();
    let layout = sim.layout();

    assert!(vel.max_magnitude() > 0.0);
    let center = vel.get(layout.width() / 2, layout.height() / 2);
    assert!(center.x > 0.0, "center velocity {:?}", center);
}

#[test]
fn test_viscosity_ignored_when_disabled() {
    let base = EtherConfig::default().with_viscosity(None).with_iterations(4, 8);
    let mut other = base.clone();
    other.viscosity = 5.0;
    other.viscous_iterations = 64;

    let container = UVec2::new(48, 32);
    let a = run(&base, container, &push_right(3.0), 3);
    let b = run(&other, container, &push_right(3.0), 3);
    assert_eq!(a.velocity(), b.velocity());
}

#[test]
fn test_viscous_diffusion_lowers_peak() {
    let container = UVec2::new(48, 48);
    let inviscid = run(
        &EtherConfig::default().with_viscosity(None).with_iterations(16, 16),
        container,
        &push_right(2.0),
        1,
    );
    let viscous = run(
        &EtherConfig::default().with_viscosity(Some(80.0)).with_iterations(16, 16),
        container,
        &push_right(2.0),
        1,
    );
    assert!(viscous.velocity().max_magnitude() < inviscid.velocity().max_magnitude());
}

#[test]
fn test_bounce_keeps_outer_ring_at_rest() {
    let config = EtherConfig::default()
        .with_boundary_mode(BoundaryMode::Bounce)
        .with_iterations(4, 8);
    let sim = run(&config, UVec2::new(40, 30), &push_right(6.0), 3);
    let vel = sim.velocity();
    let (w, h) = (vel.size().x, vel.size().y);

    assert!(vel.max_magnitude() > 0.0);
    for x in 0..w {
        assert_eq!(vel.get(x, 0), Vec2::ZERO);
        assert_eq!(vel.get(x, h - 1), Vec2::ZERO);
    }
    for y in 0..h {
        assert_eq!(vel.get(0, y), Vec2::ZERO);
        assert_eq!(vel.get(w - 1, y), Vec2::ZERO);
    }
}

#[test]
fn test_resize_restarts_at_rest() {
    let config = EtherConfig::default().with_iterations(4, 4);
    let mut sim = run(&config, UVec2::new(40, 40), &push_right(4.0), 2);
    assert!(!sim.velocity().is_at_rest());

    sim.resize(&config, UVec2::new(60, 20));
    assert_eq!(sim.layout().fbo_size, UVec2::new(30, 10));
    assert!(sim.velocity().is_at_rest());
}

// ============================================================================
// Grid and palette
// ============================================================================

#[test]
fn test_grid_from_container() {
    let layout = GridLayout::new(0.5, UVec2::new(800, 600));
    assert_eq!(layout.fbo_size, UVec2::new(400, 300));
    assert_eq!(layout.cell_scale, Vec2::new(1.0 / 400.0, 1.0 / 300.0));
}

#[test]
fn test_single_color_palette_is_two_texels() {
    let texels = Palette::parse(&["#ff0000"]).unwrap().lookup_texels();
    assert_eq!(texels.width, 2);
    assert_eq!(texels.texel(0), [255, 0, 0, 255]);
    assert_eq!(texels.texel(1), [255, 0, 0, 255]);
}

// ============================================================================
// Composite
// ============================================================================

#[test]
fn test_still_fluid_shows_background() {
    let background = Color::parse("#10203080").unwrap();
    let palette = Palette::default().lookup_texels();
    let still = HostField::<Vec2>::new(UVec2::new(5, 4));

    let pixels = cpu::composite(&still, &palette, background, UVec2::new(10, 8));
    assert_eq!(pixels.len(), 80);
    assert!(pixels.iter().all(|p| *p == [0x10, 0x20, 0x30, 0x80]));
}

#[test]
fn test_single_red_palette_still_fluid_shows_background() {
    let palette = Palette::parse(&["#ff0000"]).unwrap().lookup_texels();
    let background = Color::parse("#204060").unwrap();
    let still = HostField::<Vec2>::new(UVec2::new(6, 4));

    let pixels = cpu::composite(&still, &palette, background, UVec2::new(12, 8));
    assert!(pixels.iter().all(|p| *p == [0x20, 0x40, 0x60, 0xff]));
}

#[test]
fn test_fast_fluid_shows_palette_end() {
    let palette = Palette::parse(&["#000000", "#00ff00"]).unwrap().lookup_texels();
    let fast = HostField::new_filled(UVec2::new(4, 4), Vec2::new(3.0, 0.0));

    let pixels = cpu::composite(&fast, &palette, Color::parse("#ff0000").unwrap(), UVec2::new(2, 2));
    assert!(pixels.iter().all(|p| *p == [0, 255, 0, 255]));
}
