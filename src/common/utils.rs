//! Shared helpers: smoothstep interpolation and path display.

use std::path::Path;

/// Hermite smoothstep weight `t²(3 − 2t)` for `t` clamped to `[0, 1]`.
///
/// The curve has zero slope at both ends, so a transition that starts or
/// finishes on a phase boundary never changes rate abruptly.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blend two scalars with a smoothstep weight.
///
/// Returns `a` exactly at `t = 0` and `b` exactly at `t = 1`.
pub fn interpolate_f64(a: f64, b: f64, t: f64) -> f64 {
    let s = smoothstep(t);
    if s <= 0.0 {
        a
    } else if s >= 1.0 {
        b
    } else {
        a + (b - a) * s
    }
}

/// Smoothstep blend for brightness values (continuous).
pub fn interpolate_f32(start: f32, end: f32, progress: f64) -> f32 {
    interpolate_f64(start as f64, end as f64, progress) as f32
}

/// Smoothstep blend for temperatures, rounded to the nearest Kelvin.
pub fn interpolate_u32(start: u32, end: u32, progress: f64) -> u32 {
    interpolate_f64(start as f64, end as f64, progress)
        .round()
        .clamp(0.0, u32::MAX as f64) as u32
}

/// Replace the home directory prefix of a path with `~` for display.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}
