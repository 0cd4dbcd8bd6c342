//! Air Quality Index classification.
//!
//! The service reports an index from 1 (good) to 5 (very poor). Anything
//! else maps to [`AqiLevel::Unknown`] so rendering never has to special-case
//! a bad payload.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AqiLevel {
    pub fn from_index(aqi: i64) -> Self {
        match aqi {
            1 => AqiLevel::Good,
            2 => AqiLevel::Fair,
            3 => AqiLevel::Moderate,
            4 => AqiLevel::Poor,
            5 => AqiLevel::VeryPoor,
            _ => AqiLevel::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
            AqiLevel::Unknown => "Unknown",
        }
    }

    /// Colour as a CSS-style token ("green" or a hex triplet).
    pub fn color_token(&self) -> &'static str {
        match self {
            AqiLevel::Good => "green",
            AqiLevel::Fair => "#ff6f00",
            AqiLevel::Moderate => "#ffc400",
            AqiLevel::Poor => "#ff3d00",
            AqiLevel::VeryPoor => "#b71c1c",
            AqiLevel::Unknown => "#757575",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            AqiLevel::Good => Color::Green,
            AqiLevel::Fair => Color::Rgb(0xff, 0x6f, 0x00),
            AqiLevel::Moderate => Color::Rgb(0xff, 0xc4, 0x00),
            AqiLevel::Poor => Color::Rgb(0xff, 0x3d, 0x00),
            AqiLevel::VeryPoor => Color::Rgb(0xb7, 0x1c, 0x1c),
            AqiLevel::Unknown => Color::Rgb(0x75, 0x75, 0x75),
        }
    }
}

/// "2 (Fair)" style status text for the results panel.
pub fn status_text(aqi: i64) -> String {
    format!("{} ({})", aqi, AqiLevel::from_index(aqi).label())
}
