/// Color of label 0 (background).
pub const UNLABELED_COLOR: [u8; 3] = [128, 128, 128];

/// Deterministic pseudo-color for a blob label.
///
/// The hue advances by 35 degrees per label and the saturation drops by 1%
/// per label, clamped at zero, with value fixed at 1.
pub fn label_color(label: u32) -> [u8; 3] {
    if label == 0 {
        return UNLABELED_COLOR;
    }
    let hue = (u64::from(label) * 35 % 360) as f32;
    let sat = (1.0 - label as f32 * 0.01).clamp(0.0, 1.0);

    let sector = (hue / 60.0).floor();
    let frac = hue / 60.0 - sector;
    let p = 1.0 - sat;
    let q = 1.0 - sat * frac;
    let t = 1.0 - sat * (1.0 - frac);

    let (r, g, b) = match sector as u32 {
        0 | 6 => (1.0, t, p),
        1 => (q, 1.0, p),
        2 => (p, 1.0, t),
        3 => (p, q, 1.0),
        4 => (t, p, 1.0),
        _ => (1.0, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0) as u8
}
