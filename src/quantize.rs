//! Grayscale to 1-bit conversion.

use std::str::FromStr;

use crate::{error::Error, grid::PixelGrid};

/// Intensity below which a pixel prints black.
pub const BLACK_THRESHOLD: u8 = 128;

/// How grayscale is reduced to black and white.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Floyd-Steinberg error diffusion. Suits photos and logos.
    Dither,
    /// Hard cut at [`BLACK_THRESHOLD`]. Suits text and line art.
    Threshold,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Dither
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dither" | "floyd-steinberg" => Ok(Mode::Dither),
            "threshold" => Ok(Mode::Threshold),
            _ => Err(Error::invalid("mode", s)),
        }
    }
}

/// One boolean per pixel, `true` meaning a printed dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPlane {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BitPlane {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &[bool] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.bits[start..start + w]
    }
}

/// Reduce `grid` to a [`BitPlane`] of the same dimensions.
pub fn quantize(grid: &PixelGrid, mode: Mode) -> BitPlane {
    let bits = match mode {
        Mode::Threshold => grid
            .samples()
            .iter()
            .map(|&v| v < BLACK_THRESHOLD)
            .collect(),
        Mode::Dither => floyd_steinberg(grid),
    };
    BitPlane {
        width: grid.width(),
        height: grid.height(),
        bits,
    }
}

/// Error diffusion with the classic 7/16, 3/16, 5/16, 1/16 kernel,
/// scanning every row left to right.
fn floyd_steinberg(grid: &PixelGrid) -> Vec<bool> {
    let width = grid.width() as usize;
    let height = grid.height() as usize;

    let mut buf: Vec<i32> = grid.samples().iter().map(|&v| v as i32).collect();
    let mut bits = vec![false; buf.len()];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = buf[idx].max(0).min(255);
            let black = old < BLACK_THRESHOLD as i32;
            let new = if black { 0 } else { 255 };
            let err = old - new;
            bits[idx] = black;

            if x + 1 < width {
                buf[idx + 1] += err * 7 / 16;
            }
            if y + 1 < height {
                let below = idx + width;
                if x > 0 {
                    buf[below - 1] += err * 3 / 16;
                }
                buf[below] += err * 5 / 16;
                if x + 1 < width {
                    buf[below + 1] += err / 16;
                }
            }
        }
    }

    bits
}
