//! WGSL for the simulation stages and the compositor.
//!
//! All passes share one module: a prelude with the uniform block and
//! bindings, two vertex stages and one fragment entry point per stage.
//!
//! Coordinates: `uv` runs `(0, 0)` bottom-left to `(1, 1)` top-right, with +y
//! up like clip space and the pointer. Texture rows are stored top-down, so
//! every field lookup goes through `field_uv`, which flips `y`.
//!
//! Bindings (group 0):
//! - 0: [`PassUniforms`](super::pass::PassUniforms)
//! - 1: linear clamp-to-edge sampler
//! - 2, 3: input textures, in the order the stage documents

/// Uniform block, bindings and shared helpers.
pub const PRELUDE: &str = r#"
struct PassUniforms {
    px: vec2<f32>,
    boundary_space: vec2<f32>,
    fbo_size: vec2<f32>,
    force: vec2<f32>,
    center: vec2<f32>,
    scale: vec2<f32>,
    dt: f32,
    viscosity: f32,
    bfecc: u32,
    _pad: u32,
    bg_color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: PassUniforms;
@group(0) @binding(1) var field_sampler: sampler;
@group(0) @binding(2) var tex0: texture_2d<f32>;
@group(0) @binding(3) var tex1: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

fn quad_corner(i: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0)
    );
    return corners[i];
}

fn field_uv(uv: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(uv.x, 1.0 - uv.y);
}

fn sample0(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(tex0, field_sampler, field_uv(uv), 0.0);
}

fn sample1(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(tex1, field_sampler, field_uv(uv), 0.0);
}
"#;

/// `vs_face`: fullscreen quad inset by `boundary_space` on every side.
/// `vs_force`: quad of half-size `scale * px` around `center`, uv in `[0, 1]`.
pub const VERTEX: &str = r#"
@vertex
fn vs_face(@builtin(vertex_index) i: u32) -> VertexOutput {
    let inset = vec2<f32>(1.0) - u.boundary_space * 2.0;
    let pos = quad_corner(i) * inset;
    var out: VertexOutput;
    out.position = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(0.5) + pos * 0.5;
    return out;
}

@vertex
fn vs_force(@builtin(vertex_index) i: u32) -> VertexOutput {
    let corner = quad_corner(i) * 0.5;
    let pos = corner * u.scale * 2.0 * u.px + u.center;
    var out: VertexOutput;
    out.position = vec4<f32>(pos, 0.0, 1.0);
    out.uv = corner + vec2<f32>(0.5);
    return out;
}
"#;

/// tex0: velocity.
pub const ADVECT: &str = r#"
@fragment
fn fs_advect(in: VertexOutput) -> @location(0) vec4<f32> {
    let ratio = vec2<f32>(max(u.fbo_size.x, u.fbo_size.y)) / u.fbo_size;
    let spot_new = in.uv;
    let vel_old = sample0(spot_new).xy;
    let spot_old = spot_new - vel_old * u.dt * ratio;
    let vel_new1 = sample0(spot_old).xy;
    if (u.bfecc == 0u) {
        return vec4<f32>(vel_new1, 0.0, 0.0);
    }

    let spot_new2 = spot_old + vel_new1 * u.dt * ratio;
    let trace_error = spot_new2 - spot_new;
    let spot_new3 = spot_new - trace_error / 2.0;
    let vel_2 = sample0(spot_new3).xy;
    let spot_old2 = spot_new3 - vel_2 * u.dt * ratio;
    let vel_new2 = sample0(spot_old2).xy;
    return vec4<f32>(vel_new2, 0.0, 0.0);
}
"#;

/// No inputs; drawn with additive blending over the advected velocity.
pub const FORCE: &str = r#"
@fragment
fn fs_force(in: VertexOutput) -> @location(0) vec4<f32> {
    let circle = (in.uv - vec2<f32>(0.5)) * 2.0;
    var d = 1.0 - min(length(circle), 1.0);
    d = d * d;
    return vec4<f32>(u.force * d, 0.0, 1.0);
}
"#;

/// tex0: velocity before diffusion, tex1: current iterate.
pub const VISCOUS: &str = r#"
@fragment
fn fs_viscous(in: VertexOutput) -> @location(0) vec4<f32> {
    let dx = vec2<f32>(u.px.x * 2.0, 0.0);
    let dy = vec2<f32>(0.0, u.px.y * 2.0);
    let old = sample0(in.uv).xy;
    let new0 = sample1(in.uv + dx).xy;
    let new1 = sample1(in.uv - dx).xy;
    let new2 = sample1(in.uv + dy).xy;
    let new3 = sample1(in.uv - dy).xy;
    let vdt = u.viscosity * u.dt;
    var v = 4.0 * old + vdt * (new0 + new1 + new2 + new3);
    v = v / (4.0 * (1.0 + vdt));
    return vec4<f32>(v, 0.0, 0.0);
}
"#;

/// tex0: velocity.
pub const DIVERGENCE: &str = r#"
@fragment
fn fs_divergence(in: VertexOutput) -> @location(0) vec4<f32> {
    let x0 = sample0(in.uv - vec2<f32>(u.px.x, 0.0)).x;
    let x1 = sample0(in.uv + vec2<f32>(u.px.x, 0.0)).x;
    let y0 = sample0(in.uv - vec2<f32>(0.0, u.px.y)).y;
    let y1 = sample0(in.uv + vec2<f32>(0.0, u.px.y)).y;
    let divergence = (x1 - x0 + y1 - y0) / 2.0;
    return vec4<f32>(divergence / u.dt);
}
"#;

/// tex0: pressure iterate, tex1: divergence.
pub const POISSON: &str = r#"
@fragment
fn fs_poisson(in: VertexOutput) -> @location(0) vec4<f32> {
    let dx = vec2<f32>(u.px.x * 2.0, 0.0);
    let dy = vec2<f32>(0.0, u.px.y * 2.0);
    let p0 = sample0(in.uv + dx).r;
    let p1 = sample0(in.uv - dx).r;
    let p2 = sample0(in.uv + dy).r;
    let p3 = sample0(in.uv - dy).r;
    let div = sample1(in.uv).r;
    let p = (p0 + p1 + p2 + p3) / 4.0 - div;
    return vec4<f32>(p);
}
"#;

/// tex0: pressure, tex1: velocity.
pub const PRESSURE: &str = r#"
@fragment
fn fs_pressure(in: VertexOutput) -> @location(0) vec4<f32> {
    let p0 = sample0(in.uv + vec2<f32>(u.px.x, 0.0)).r;
    let p1 = sample0(in.uv - vec2<f32>(u.px.x, 0.0)).r;
    let p2 = sample0(in.uv + vec2<f32>(0.0, u.px.y)).r;
    let p3 = sample0(in.uv - vec2<f32>(0.0, u.px.y)).r;
    var v = sample1(in.uv).xy;
    let grad = vec2<f32>(p0 - p1, p2 - p3) * 0.5;
    v = v - grad * u.dt;
    return vec4<f32>(v, 0.0, 1.0);
}
"#;

/// tex0: velocity, tex1: palette lookup (`width x 1`, sampled directly).
pub const COMPOSITE: &str = r#"
@fragment
fn fs_color(in: VertexOutput) -> @location(0) vec4<f32> {
    let vel = sample0(in.uv).xy;
    let lenv = clamp(length(vel), 0.0, 1.0);
    let c = textureSampleLevel(tex1, field_sampler, vec2<f32>(lenv, 0.5), 0.0);
    let rgb = mix(u.bg_color.rgb, c.rgb, lenv);
    let a = mix(u.bg_color.a, c.a, lenv);
    return vec4<f32>(rgb, a);
}
"#;

/// The complete module source.
pub fn source() -> String {
    [PRELUDE, VERTEX, ADVECT, FORCE, VISCOUS, DIVERGENCE, POISSON, PRESSURE, COMPOSITE].concat()
}

/// Compile the shared module.
pub fn create_module(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("LiquidEther Shaders"),
        source: wgpu::ShaderSource::Wgsl(source().into()),
    })
}
