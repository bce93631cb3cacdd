//! WGSL compute shader sources for the wgpu engine.

/// Super-resolution kernel: Mitchell-Netravali bicubic reconstruction
/// with an optional unsharp term driven by the strength class.
///
/// Bindings: src/dst storage buffers, source and destination dimension
/// uniforms (`[w, h, channels, 0]`) and the tuning parameters.
pub const UPSCALE: &str = r#"
struct Params {
    sharpen: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> src_dims: vec4<u32>;  // sw, sh, c, 0
@group(0) @binding(3) var<uniform> dst_dims: vec4<u32>;  // dw, dh, 0, 0
@group(0) @binding(4) var<uniform> params: Params;

// Mitchell-Netravali, B = C = 1/3.
fn mitchell(x: f32) -> f32 {
    let b = 1.0 / 3.0;
    let c = 1.0 / 3.0;
    let ax = abs(x);
    if ax < 1.0 {
        return ((12.0 - 9.0 * b - 6.0 * c) * ax * ax * ax
            + (-18.0 + 12.0 * b + 6.0 * c) * ax * ax
            + (6.0 - 2.0 * b)) / 6.0;
    } else if ax < 2.0 {
        return ((-b - 6.0 * c) * ax * ax * ax
            + (6.0 * b + 30.0 * c) * ax * ax
            + (-12.0 * b - 48.0 * c) * ax
            + (8.0 * b + 24.0 * c)) / 6.0;
    }
    return 0.0;
}

// Clamp-to-edge source fetch.
fn fetch(x: i32, y: i32, ch: u32) -> f32 {
    let sw = i32(src_dims.x);
    let sh = i32(src_dims.y);
    let cx = clamp(x, 0, sw - 1);
    let cy = clamp(y, 0, sh - 1);
    return src[(u32(cy) * src_dims.x + u32(cx)) * src_dims.z + ch];
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let dx = id.x;
    let dy = id.y;
    let dw = dst_dims.x;
    let dh = dst_dims.y;
    if dx >= dw || dy >= dh { return; }

    let c = src_dims.z;
    let scale_x = f32(src_dims.x) / f32(dw);
    let scale_y = f32(src_dims.y) / f32(dh);

    let fx = (f32(dx) + 0.5) * scale_x - 0.5;
    let fy = (f32(dy) + 0.5) * scale_y - 0.5;
    let x0 = i32(floor(fx));
    let y0 = i32(floor(fy));

    let dst_base = (dy * dw + dx) * c;

    for (var ch = 0u; ch < c; ch = ch + 1u) {
        var acc = 0.0;
        var wsum = 0.0;
        for (var ky = -1; ky <= 2; ky = ky + 1) {
            for (var kx = -1; kx <= 2; kx = kx + 1) {
                let w = mitchell(f32(x0 + kx) - fx) * mitchell(f32(y0 + ky) - fy);
                acc = acc + fetch(x0 + kx, y0 + ky, ch) * w;
                wsum = wsum + w;
            }
        }
        var value = acc / wsum;

        // Unsharp against the local mean; color channels only.
        if ch < 3u && params.sharpen > 0.0 {
            let mean = (fetch(x0, y0, ch) + fetch(x0 + 1, y0, ch)
                + fetch(x0, y0 + 1, ch) + fetch(x0 + 1, y0 + 1, ch)) * 0.25;
            value = value + params.sharpen * (value - mean);
        }

        dst[dst_base + ch] = value;
    }
}
"#;
