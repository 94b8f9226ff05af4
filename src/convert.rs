//! The image print pipeline: preprocess, quantize, pack, wrap in a job.

use log::debug;

use crate::{
    bitmap::{pack, PackedBitmap},
    command::{CommandBuilder, CommandStream},
    geometry::LabelGeometry,
    grid::{PixelGrid, MAX_TOP_TRIM_PX},
    quantize::{quantize, Mode},
};

/// Conversion settings.
///
/// Whether the target printer needs inverted intensities depends on the
/// model, so `invert` defaults to off and is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    mode: Mode,
    invert: bool,
    trim: bool,
    max_trim: u32,
    shift_px: i32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            mode: Mode::Dither,
            invert: false,
            trim: true,
            max_trim: MAX_TOP_TRIM_PX,
            shift_px: 0,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(self, mode: Mode) -> Self {
        ConvertOptions { mode, ..self }
    }

    /// Flip intensities (`255 - v`) before quantizing.
    pub fn invert(self, invert: bool) -> Self {
        ConvertOptions { invert, ..self }
    }

    /// Remove leading blank rows, at most `max_trim` of them.
    pub fn trim(self, trim: bool) -> Self {
        ConvertOptions { trim, ..self }
    }

    pub fn max_trim(self, max_trim: u32) -> Self {
        ConvertOptions { max_trim, ..self }
    }

    /// Horizontal content shift in pixels, positive to the right.
    pub fn shift_px(self, shift_px: i32) -> Self {
        ConvertOptions { shift_px, ..self }
    }
}

/// Turn decoded pixels into packed printer rows.
pub fn convert(grid: PixelGrid, options: &ConvertOptions) -> PackedBitmap {
    let mut grid = grid;
    if options.trim {
        grid = grid.trim_top_whitespace(options.max_trim);
    }
    grid = grid.shift_horizontal(options.shift_px);
    if options.invert {
        grid = grid.invert();
    }

    let plane = quantize(&grid, options.mode);
    let packed = pack(&plane);
    debug!(
        "converted {}x{} image into {} bytes ({:?})",
        packed.width(),
        packed.height(),
        packed.data().len(),
        options.mode
    );
    packed
}

/// A full job printing `bitmap` once at the print origin.
pub fn image_job(geometry: &LabelGeometry, bitmap: &PackedBitmap) -> CommandStream {
    let mut job = CommandBuilder::for_label(geometry);
    job.bitmap(0, 0, bitmap);
    job.print_sets(1, 1)
}

/// [`convert`] followed by [`image_job`].
pub fn print_image(
    grid: PixelGrid,
    geometry: &LabelGeometry,
    options: &ConvertOptions,
) -> CommandStream {
    image_job(geometry, &convert(grid, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold() -> ConvertOptions {
        ConvertOptions::new().mode(Mode::Threshold)
    }

    #[test]
    fn test_black_16x8() {
        let packed = convert(PixelGrid::filled(16, 8, 0), &threshold());
        assert_eq!(packed.data(), &[0xFF; 16][..]);
    }

    #[test]
    fn test_white_16x8() {
        let packed = convert(PixelGrid::filled(16, 8, 255), &threshold().trim(false));
        assert_eq!(packed.height(), 8);
        assert_eq!(packed.data(), &[0x00; 16][..]);
    }

    #[test]
    fn test_invert_flips_output() {
        let packed = convert(PixelGrid::filled(8, 2, 0), &threshold().invert(true));
        assert_eq!(packed.data(), &[0x00, 0x00]);
    }

    #[test]
    fn test_length_for_any_size() {
        for &(w, h) in &[(1, 1), (5, 9), (17, 3), (100, 4)] {
            let samples: Vec<u8> = (0..w * h).map(|i| (i * 31 % 256) as u8).collect();
            let grid = PixelGrid::new(w, h, samples).unwrap();
            let packed = convert(grid, &threshold().trim(false));
            assert_eq!(packed.data().len(), ((w + 7) / 8 * h) as usize);
        }
    }

    #[test]
    fn test_trim_then_shift() {
        let mut samples = vec![255u8; 8 * 4];
        samples[2 * 8] = 0;
        let grid = PixelGrid::new(8, 4, samples).unwrap();
        let packed = convert(grid, &threshold().shift_px(3));
        assert_eq!(packed.height(), 2);
        assert_eq!(packed.row(0), &[0b0001_0000]);
        assert_eq!(packed.row(1), &[0x00]);
    }

    #[test]
    fn test_print_image_job() {
        let geometry = LabelGeometry {
            width_mm: 25.0,
            height_mm: 10.0,
            gap_mm: 2.0,
            x_offset: 4,
            y_offset: 0,
        };
        let job = print_image(PixelGrid::filled(9, 1, 0), &geometry, &threshold());
        let mut expected = b"SIZE 25 mm,10 mm\nGAP 2 mm,0 mm\nDENSITY 8\nSPEED 4\nDIRECTION 1\nCLS\n\
            BITMAP 4,0,2,1,0,"
            .to_vec();
        expected.extend_from_slice(&[0xFF, 0x80]);
        expected.extend_from_slice(b"\nPRINT 1,1\n");
        assert_eq!(job.as_bytes(), &expected[..]);
    }
}
