//! Hex color parsing shared by the brush and text layers.

/// Parse a `#RRGGBB` or `#RGB` hex color into RGBA bytes (alpha 255).
///
/// Returns `None` for anything else; callers decide whether that is a
/// validation error or a fallback.
#[must_use]
pub fn parse_hex(value: &str) -> Option<[u8; 4]> {
    let hex = value.strip_prefix('#')?;
    // get() keeps non-ASCII input from panicking on a char boundary.
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
            let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
            let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
            Some([r, g, b, 255])
        }
        3 => {
            let r = u8::from_str_radix(hex.get(0..1)?, 16).ok()?;
            let g = u8::from_str_radix(hex.get(1..2)?, 16).ok()?;
            let b = u8::from_str_radix(hex.get(2..3)?, 16).ok()?;
            Some([r * 17, g * 17, b * 17, 255])
        }
        _ => None,
    }
}
