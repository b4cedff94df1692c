use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// An 8-bit sRGB colour.
pub type Rgb8 = Srgb<u8>;

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

/// `#rrggbb`
pub fn hex(color: Rgb8) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}
