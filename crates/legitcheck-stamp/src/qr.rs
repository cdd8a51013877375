//! QR encoding of verification URLs.
//!
//! Two renderings exist. The stamper needs a raw RGB raster to embed as a PDF
//! image; the registry keeps an SVG data URL for display. Decoding camera
//! frames is someone else's job: see [`crate::scan`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write;

use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StampError};

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

/// Rendering options for a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Target raster width in pixels. The actual width is the largest whole
    /// multiple of the module count that fits, and never less than one pixel
    /// per module.
    pub width: u32,
    /// Quiet zone, in modules.
    pub margin: u32,
    /// Dark module color (RGB).
    pub dark: [u8; 3],
    /// Light module color (RGB).
    pub light: [u8; 3],
    pub error_correction: ErrorCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 100,
            margin: 1,
            dark: [0x00, 0x00, 0x00],
            light: [0xff, 0xff, 0xff],
            error_correction: ErrorCorrection::Medium,
        }
    }
}

/// Largest accepted target width, in pixels.
pub const MAX_WIDTH: u32 = 4096;

/// Largest accepted quiet zone, in modules.
pub const MAX_MARGIN: u32 = 64;

impl QrOptions {
    /// Reject widths and margins that would produce absurd rasters.
    pub fn validate(&self) -> Result<()> {
        if self.width > MAX_WIDTH {
            return Err(StampError::Options(format!(
                "width {} exceeds {}",
                self.width, MAX_WIDTH
            )));
        }
        if self.margin > MAX_MARGIN {
            return Err(StampError::Options(format!(
                "margin {} exceeds {}",
                self.margin, MAX_MARGIN
            )));
        }
        Ok(())
    }
}

/// An RGB raster, 8 bits per channel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl QrRaster {
    /// RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }
}

/// Module grid of a code, quiet zone included.
struct Grid {
    colors: Vec<Color>,
    modules: usize,
    margin: usize,
    /// Side length in modules, quiet zone included.
    total: usize,
}

impl Grid {
    fn new(data: &str, options: &QrOptions) -> Result<Self> {
        options.validate()?;
        let code = QrCode::with_error_correction_level(
            data.as_bytes(),
            options.error_correction.into(),
        )?;
        let modules = code.width();
        let margin = options.margin as usize;
        Ok(Self {
            colors: code.to_colors(),
            modules,
            margin,
            total: modules + 2 * margin,
        })
    }

    fn is_dark(&self, mx: usize, my: usize) -> bool {
        let inside = |m: usize| m >= self.margin && m < self.margin + self.modules;
        inside(mx)
            && inside(my)
            && self.colors[(my - self.margin) * self.modules + (mx - self.margin)] == Color::Dark
    }

    /// Pixels per module: the largest that fits `width`, at least one.
    fn scale(&self, width: u32) -> usize {
        (width as usize / self.total).max(1)
    }
}

/// Encode `data` into an RGB raster.
pub fn encode(data: &str, options: &QrOptions) -> Result<QrRaster> {
    let grid = Grid::new(data, options)?;
    let scale = grid.scale(options.width);
    let side = grid.total * scale;

    let mut pixels = Vec::with_capacity(side * side * 3);
    for py in 0..side {
        for px in 0..side {
            let dark = grid.is_dark(px / scale, py / scale);
            pixels.extend_from_slice(if dark { &options.dark } else { &options.light });
        }
    }

    Ok(QrRaster {
        width: side as u32,
        height: side as u32,
        pixels,
    })
}

/// Render `data` as an SVG QR code wrapped in a base64 data URL.
///
/// The SVG is sized like the raster from [`encode`] and keeps the same
/// quiet zone of `margin` modules.
pub fn svg_data_url(data: &str, options: &QrOptions) -> Result<String> {
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(render_svg(data, options)?.as_bytes())
    ))
}

fn render_svg(data: &str, options: &QrOptions) -> Result<String> {
    let grid = Grid::new(data, options)?;
    let side = grid.total * grid.scale(options.width);

    let mut path = String::new();
    for my in 0..grid.total {
        for mx in 0..grid.total {
            if grid.is_dark(mx, my) {
                let _ = write!(path, "M{mx} {my}h1v1h-1z");
            }
        }
    }

    Ok(format!(
        concat!(
            r#"<?xml version="1.0" standalone="yes"?>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{side}" height="{side}" "#,
            r#"viewBox="0 0 {total} {total}" shape-rendering="crispEdges">"#,
            r#"<rect width="{total}" height="{total}" fill="{light}"/>"#,
            r#"<path fill="{dark}" d="{path}"/></svg>"#,
        ),
        side = side,
        total = grid.total,
        light = hex_color(options.light),
        dark = hex_color(options.dark),
        path = path,
    ))
}

fn hex_color([r, g, b]: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}
