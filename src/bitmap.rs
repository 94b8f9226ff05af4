//! Packing 1-bit planes into the byte rows embedded by `BITMAP`.
//!
//! Eight pixels go into each byte, most significant bit first, so bit 7 of
//! a byte is the leftmost pixel of its group. Rows are byte aligned: when
//! the width is not a multiple of eight the unused low bits of the last
//! byte of every row are zero (no print).

use crate::{error::Error, quantize::BitPlane};

/// Packed rows ready to follow a `BITMAP` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitmap {
    width: u32,
    height: u32,
    width_bytes: u32,
    data: Vec<u8>,
}

impl PackedBitmap {
    /// Wrap already packed rows.
    ///
    /// `data` must hold exactly `ceil(width / 8) * height` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        let width_bytes = width_bytes(width);
        let expected = width_bytes as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BitmapLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(PackedBitmap {
            width,
            height,
            width_bytes,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row as declared to the printer.
    pub fn width_bytes(&self) -> u32 {
        self.width_bytes
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let wb = self.width_bytes as usize;
        let start = y as usize * wb;
        &self.data[start..start + wb]
    }
}

/// Number of bytes holding one row of `width` pixels.
pub fn width_bytes(width: u32) -> u32 {
    (width + 7) / 8
}

/// Pack every row of `plane`.
pub fn pack(plane: &BitPlane) -> PackedBitmap {
    let width = plane.width();
    let height = plane.height();
    let wb = width_bytes(width) as usize;
    let mut data: Vec<u8> = Vec::with_capacity(wb * height as usize);

    for y in 0..height {
        let row = plane.row(y);
        for chunk in row.chunks(8) {
            let mut tmp: u8 = 0x00;
            for (k, &black) in chunk.iter().enumerate() {
                if black {
                    tmp |= 0x80 >> k;
                }
            }
            data.push(tmp);
        }
    }

    PackedBitmap {
        width,
        height,
        width_bytes: wb as u32,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::PixelGrid,
        quantize::{quantize, Mode},
    };

    fn plane(width: u32, height: u32, value: u8) -> BitPlane {
        quantize(&PixelGrid::filled(width, height, value), Mode::Threshold)
    }

    fn single_dot(width: u32, x: u32) -> BitPlane {
        let mut samples = vec![255u8; width as usize];
        samples[x as usize] = 0;
        quantize(&PixelGrid::new(width, 1, samples).unwrap(), Mode::Threshold)
    }

    #[test]
    fn test_buffer_length() {
        for &(w, h) in &[(1, 1), (7, 3), (8, 2), (9, 5), (16, 8), (203, 11)] {
            let packed = pack(&plane(w, h, 0));
            assert_eq!(packed.data().len(), ((w + 7) / 8 * h) as usize);
            assert_eq!(packed.width_bytes(), (w + 7) / 8);
        }
    }

    #[test]
    fn test_bit_order() {
        assert_eq!(pack(&single_dot(8, 0)).data(), &[0b1000_0000]);
        assert_eq!(pack(&single_dot(8, 7)).data(), &[0b0000_0001]);
        assert_eq!(pack(&single_dot(16, 9)).data(), &[0x00, 0b0100_0000]);
    }

    #[test]
    fn test_padding_bits_are_zero() {
        for w in 1..24u32 {
            if w % 8 == 0 {
                continue;
            }
            let packed = pack(&plane(w, 3, 0));
            let pad = 8 * packed.width_bytes() - w;
            let mask = (1u16 << pad) as u8 - 1;
            for y in 0..3 {
                let last = *packed.row(y).last().unwrap();
                assert_eq!(last & mask, 0, "width {} row {}", w, y);
                assert_eq!(last | mask, 0xFF, "width {} row {}", w, y);
            }
        }
    }

    #[test]
    fn test_all_black_16x8() {
        let packed = pack(&plane(16, 8, 0));
        assert_eq!(packed.data().len(), 16);
        assert!(packed.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_all_white_16x8() {
        let packed = pack(&plane(16, 8, 255));
        assert_eq!(packed.data().len(), 16);
        assert!(packed.data().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(PackedBitmap::from_raw(10, 2, vec![0; 4]).is_ok());
        match PackedBitmap::from_raw(10, 2, vec![0; 3]) {
            Err(Error::BitmapLength { expected, actual }) => {
                assert_eq!((expected, actual), (4, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
