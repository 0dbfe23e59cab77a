//! RGBA colors used for node tints and material diffuse colors

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Opaque white, the neutral tint
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    /// Create a color from its components
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Modulate by another color, component-wise `self * other / 255`
    pub fn tint(self, other: Color) -> Color {
        let mul = |a: u8, b: u8| ((u16::from(a) * u16::from(b)) / 255) as u8;
        Color::new(
            mul(self.r, other.r),
            mul(self.g, other.g),
            mul(self.b, other.b),
            mul(self.a, other.a),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
