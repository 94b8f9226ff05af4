//! Decoded grayscale pixels and the geometric preprocessing applied to them
//! before quantization.

use log::debug;

use crate::error::Error;

/// Intensity at or above which a pixel counts as paper rather than content.
pub const WHITE_THRESHOLD: u8 = 245;

/// Upper bound on the rows [`PixelGrid::trim_top_whitespace`] may remove.
pub const MAX_TOP_TRIM_PX: u32 = 80;

const WHITE: u8 = 255;

/// Row-major 8-bit grayscale samples, `0` black through `255` white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl PixelGrid {
    /// Wrap raw samples, checking that there are exactly `width * height`.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(Error::PixelCount {
                expected,
                actual: samples.len(),
            });
        }
        Ok(PixelGrid {
            width,
            height,
            samples,
        })
    }

    /// A canvas where every sample is `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        PixelGrid {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.samples[start..start + w]
    }

    /// Replace every sample `v` with `255 - v`.
    pub fn invert(mut self) -> Self {
        for v in self.samples.iter_mut() {
            *v = WHITE - *v;
        }
        self
    }

    /// Drop blank rows above the first content pixel.
    ///
    /// At most `max_trim` rows are removed even when content starts further
    /// down. A grid without any content is returned unchanged, and the
    /// width is never touched.
    pub fn trim_top_whitespace(self, max_trim: u32) -> Self {
        let w = self.width as usize;
        if w == 0 {
            return self;
        }
        let top = self
            .samples
            .chunks(w)
            .position(|row| row.iter().any(|&v| v < WHITE_THRESHOLD));

        let top = match top {
            Some(top) if top > 0 => top as u32,
            _ => return self,
        };

        let trim = top.min(max_trim);
        debug!("trim {} blank rows (content starts at row {})", trim, top);

        let PixelGrid {
            width,
            height,
            mut samples,
        } = self;
        samples.drain(..trim as usize * w);
        PixelGrid {
            width,
            height: height - trim,
            samples,
        }
    }

    /// Move content sideways by `delta` pixels, keeping the canvas size.
    ///
    /// Positive values move right. Columns pushed off the canvas are lost,
    /// the vacated ones become white; nothing wraps around.
    pub fn shift_horizontal(self, delta: i32) -> Self {
        if delta == 0 {
            return self;
        }
        let width = self.width as usize;
        let shift = delta.unsigned_abs() as usize;
        if shift >= width {
            return PixelGrid::filled(self.width, self.height, WHITE);
        }

        let mut out = vec![WHITE; self.samples.len()];
        for (src, dst) in self.samples.chunks(width).zip(out.chunks_mut(width)) {
            if delta > 0 {
                dst[shift..].copy_from_slice(&src[..width - shift]);
            } else {
                dst[..width - shift].copy_from_slice(&src[shift..]);
            }
        }
        PixelGrid {
            width: self.width,
            height: self.height,
            samples: out,
        }
    }
}

impl From<image::GrayImage> for PixelGrid {
    fn from(img: image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        PixelGrid {
            width,
            height,
            samples: img.into_raw(),
        }
    }
}
