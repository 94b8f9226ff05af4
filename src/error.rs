//! Error types for label conversion and printing.
//!
//! Configuration faults, conversion faults and device link faults all
//! funnel into a single [`Error`] enum.

use thiserror::Error;

/// Main error type for label operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration field could not be parsed or is out of its domain.
    ///
    /// The whole update carrying this field is rejected; the previous
    /// geometry stays in effect.
    #[error("Invalid value {value:?} for field {field}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unknown axis {0:?}, expected 'x' or 'y'")]
    UnknownAxis(String),

    /// Pixel sample count does not match `width * height`.
    #[error("Pixel buffer holds {actual} samples, expected {expected}")]
    PixelCount { expected: usize, actual: usize },

    /// Packed buffer length does not match `width_bytes * height`.
    #[error("Bitmap buffer holds {actual} bytes, expected {expected}")]
    BitmapLength { expected: usize, actual: usize },

    #[error(transparent)]
    ImageError(#[from] image::ImageError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// Printer device is not connected or not responding.
    #[error("Device is offline")]
    DeviceOffline,

    #[error("Can't read device list, permission issue ?")]
    DeviceListNotReadable,

    #[error("Device is missing endpoint")]
    MissingEndpoint,

    /// The link accepted fewer bytes than the command stream holds.
    #[error("Short write: {written} of {expected} bytes reached the printer")]
    ShortWrite { written: usize, expected: usize },
}

impl Error {
    pub(crate) fn invalid(field: &'static str, value: impl ToString) -> Self {
        Error::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}
