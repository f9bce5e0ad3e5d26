use std::io::Write;

/// A colour, expressed in RGB or CMYK colour spaces
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Colour {
    /// DeviceRGB colour; r, g, b, range from 0.0 to 1.0
    RGB { r: f32, g: f32, b: f32 },
    /// DeviceCMYK colour; c, m, y, and k range from 0.0 to 1.0
    CMYK { c: f32, m: f32, y: f32, k: f32 },
    /// DeviceGray colour; g ranges from 0.0 to 1.0
    Grey { g: f32 },
}

impl Colour {
    /// Create a new colour in the RGB space. r, g, and b range from 0.0 to 1.0
    pub fn new_rgb(r: f32, g: f32, b: f32) -> Colour {
        Colour::RGB { r, g, b }
    }

    /// Create a new colour in the RGB space. r, g, and b range from 0 to 255
    pub fn new_rgb_bytes(r: u8, g: u8, b: u8) -> Colour {
        Colour::RGB {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create a new colour in the CMYK space. c, m, y, and k range from 0.0 to 1.0
    pub fn new_cmyk(c: f32, m: f32, y: f32, k: f32) -> Colour {
        Colour::CMYK { c, m, y, k }
    }

    /// Create a new colour in the Gray space, g ranges from 0.0 to 1.0
    pub fn new_grey(g: f32) -> Colour {
        Colour::Grey { g }
    }

    /// Parse a `#rrggbb` (or `rrggbb`) hex string into an RGB colour
    pub fn from_hex(hex: &str) -> Option<Colour> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Colour::new_rgb_bytes(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Write the operator that sets this colour for filling
    #[allow(clippy::write_with_newline)]
    pub(crate) fn write_fill<W: Write>(&self, content: &mut W) -> std::io::Result<()> {
        match *self {
            Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} rg\n"),
            Colour::CMYK { c, m, y, k } => write!(content, "{c} {m} {y} {k} k\n"),
            Colour::Grey { g } => write!(content, "{g} g\n"),
        }
    }

    /// Write the operator that sets this colour for stroking
    #[allow(clippy::write_with_newline)]
    pub(crate) fn write_stroke<W: Write>(&self, content: &mut W) -> std::io::Result<()> {
        match *self {
            Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} RG\n"),
            Colour::CMYK { c, m, y, k } => write!(content, "{c} {m} {y} {k} K\n"),
            Colour::Grey { g } => write!(content, "{g} G\n"),
        }
    }
}

impl<T: Into<f32>> From<(T, T, T)> for Colour {
    fn from(c: (T, T, T)) -> Self {
        Colour::RGB {
            r: c.0.into(),
            g: c.1.into(),
            b: c.2.into(),
        }
    }
}

impl<T: Into<f32>> From<(T, T, T, T)> for Colour {
    fn from(c: (T, T, T, T)) -> Self {
        Colour::CMYK {
            c: c.0.into(),
            m: c.1.into(),
            y: c.2.into(),
            k: c.3.into(),
        }
    }
}

/// A list of pre-defined colour constants
pub mod colours {
    use super::*;

    pub const BLACK: Colour = Colour::Grey { g: 0.0 };
    pub const WHITE: Colour = Colour::Grey { g: 1.0 };
    pub const RED: Colour = Colour::RGB {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    pub const BLUE: Colour = Colour::RGB {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        assert_eq!(Colour::from_hex("#ff0000"), Some(colours::RED));
        assert_eq!(Colour::from_hex("0000ff"), Some(colours::BLUE));
        assert_eq!(Colour::from_hex("#fff"), None);
        assert_eq!(Colour::from_hex("zzzzzz"), None);
    }

    #[test]
    fn writes_fill_and_stroke_operators() {
        let mut fill = Vec::new();
        colours::RED.write_fill(&mut fill).unwrap();
        assert_eq!(fill, b"1 0 0 rg\n");

        let mut stroke = Vec::new();
        Colour::new_cmyk(0.0, 0.5, 1.0, 0.0)
            .write_stroke(&mut stroke)
            .unwrap();
        assert_eq!(stroke, b"0 0.5 1 0 K\n");

        let mut grey = Vec::new();
        colours::BLACK.write_stroke(&mut grey).unwrap();
        assert_eq!(grey, b"0 G\n");
    }
}
