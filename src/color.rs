use image::{Rgb, Rgba};
use num_derive::FromPrimitive;
use std::fmt;

/// How a codel with no exact palette match is treated by the black/white
/// tests. Classification itself (`Color::Other`) is lossless regardless of
/// this setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonStandardPolicy {
    White,
    Black,
}

impl Default for NonStandardPolicy {
    fn default() -> Self {
        NonStandardPolicy::White
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(FromPrimitive)]
pub(crate) enum Hue {
    Red = 0,
    Yellow = 1,
    Green = 2,
    Cyan = 3,
    Blue = 4,
    Magenta = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(FromPrimitive)]
pub(crate) enum Lightness {
    Light = 0,
    Normal = 1,
    Dark = 2,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Color(Hue, Lightness),
    Black,
    White,
    Other,
}

#[allow(non_upper_case_globals)]
impl Color {
    const LightRed: Color = Color::Color(Hue::Red, Lightness::Light);
    const LightYellow: Color = Color::Color(Hue::Yellow, Lightness::Light);
    const LightGreen: Color = Color::Color(Hue::Green, Lightness::Light);
    const LightCyan: Color = Color::Color(Hue::Cyan, Lightness::Light);
    const LightBlue: Color = Color::Color(Hue::Blue, Lightness::Light);
    const LightMagenta: Color = Color::Color(Hue::Magenta, Lightness::Light);

    const Red: Color = Color::Color(Hue::Red, Lightness::Normal);
    const Yellow: Color = Color::Color(Hue::Yellow, Lightness::Normal);
    const Green: Color = Color::Color(Hue::Green, Lightness::Normal);
    const Cyan: Color = Color::Color(Hue::Cyan, Lightness::Normal);
    const Blue: Color = Color::Color(Hue::Blue, Lightness::Normal);
    const Magenta: Color = Color::Color(Hue::Magenta, Lightness::Normal);

    const DarkRed: Color = Color::Color(Hue::Red, Lightness::Dark);
    const DarkYellow: Color = Color::Color(Hue::Yellow, Lightness::Dark);
    const DarkGreen: Color = Color::Color(Hue::Green, Lightness::Dark);
    const DarkCyan: Color = Color::Color(Hue::Cyan, Lightness::Dark);
    const DarkBlue: Color = Color::Color(Hue::Blue, Lightness::Dark);
    const DarkMagenta: Color = Color::Color(Hue::Magenta, Lightness::Dark);
}

impl Color {
    /// Instruction implied by stepping from `self` to `next` (Δhue, Δlight).
    /// `White` on either side yields `Command::Noop` — sliding emits nothing,
    /// and the traversal engine never calls this with `Black`/`Other`.
    pub(crate) fn step_to(self, next: Color) -> crate::Command {
        use num_traits::FromPrimitive;

        let (hue, lightness) = match self {
            Color::Color(h, l) => (h, l),
            Color::White => return crate::Command::Noop,
            Color::Black | Color::Other => panic!("step_to called on {self:?}"),
        };
        let (next_hue, next_lightness) = match next {
            Color::Color(h, l) => (h, l),
            Color::White => return crate::Command::Noop,
            Color::Black | Color::Other => panic!("step_to called on {next:?}"),
        };
        let hue_step = (next_hue as i32 - hue as i32).rem_euclid(6);
        let light_step = (next_lightness as i32 - lightness as i32).rem_euclid(3);
        FromPrimitive::from_i32(light_step + hue_step * 3).unwrap()
    }

    /// True if this codel is black, or `Other` under a `Black` nonstandard policy.
    pub(crate) fn is_black(self, nonstandard: NonStandardPolicy) -> bool {
        match self {
            Color::Black => true,
            Color::Other => matches!(nonstandard, NonStandardPolicy::Black),
            _ => false,
        }
    }

    /// True if this codel is white, or `Other` under a `White` nonstandard policy.
    pub(crate) fn is_white(self, nonstandard: NonStandardPolicy) -> bool {
        match self {
            Color::White => true,
            Color::Other => matches!(nonstandard, NonStandardPolicy::White),
            _ => false,
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match *self {
            Color::LightRed => "LightRed",
            Color::LightYellow => "LightYellow",
            Color::LightGreen => "LightGreen",
            Color::LightCyan => "LightCyan",
            Color::LightBlue => "LightBlue",
            Color::LightMagenta => "LightMagenta",
            Color::Red => "Red",
            Color::Yellow => "Yellow",
            Color::Green => "Green",
            Color::Cyan => "Cyan",
            Color::Blue => "Blue",
            Color::Magenta => "Magenta",
            Color::DarkRed => "DarkRed",
            Color::DarkYellow => "DarkYellow",
            Color::DarkGreen => "DarkGreen",
            Color::DarkCyan => "DarkCyan",
            Color::DarkBlue => "DarkBlue",
            Color::DarkMagenta => "DarkMagenta",
            Color::Black => "Black",
            Color::White => "White",
            Color::Other => "Other",
        })
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Color {
        match pixel {
            Rgb([0xFF, 0xFF, 0xFF]) => Color::White,
            Rgb([0x00, 0x00, 0x00]) => Color::Black,
            Rgb([0xFF, 0xC0, 0xC0]) => Color::LightRed,
            Rgb([0xFF, 0x00, 0x00]) => Color::Red,
            Rgb([0xC0, 0x00, 0x00]) => Color::DarkRed,
            Rgb([0xFF, 0xFF, 0xC0]) => Color::LightYellow,
            Rgb([0xFF, 0xFF, 0x00]) => Color::Yellow,
            Rgb([0xC0, 0xC0, 0x00]) => Color::DarkYellow,
            Rgb([0xC0, 0xFF, 0xC0]) => Color::LightGreen,
            Rgb([0x00, 0xFF, 0x00]) => Color::Green,
            Rgb([0x00, 0xC0, 0x00]) => Color::DarkGreen,
            Rgb([0xC0, 0xFF, 0xFF]) => Color::LightCyan,
            Rgb([0x00, 0xFF, 0xFF]) => Color::Cyan,
            Rgb([0x00, 0xC0, 0xC0]) => Color::DarkCyan,
            Rgb([0xC0, 0xC0, 0xFF]) => Color::LightBlue,
            Rgb([0x00, 0x00, 0xFF]) => Color::Blue,
            Rgb([0x00, 0x00, 0xC0]) => Color::DarkBlue,
            Rgb([0xFF, 0xC0, 0xFF]) => Color::LightMagenta,
            Rgb([0xFF, 0x00, 0xFF]) => Color::Magenta,
            Rgb([0xC0, 0x00, 0xC0]) => Color::DarkMagenta,
            _ => Color::Other,
        }
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Color {
        let Rgba([r, g, b, a]) = pixel;
        if a != 0xFF {
            return Color::Other;
        }
        Rgb([r, g, b]).into()
    }
}
