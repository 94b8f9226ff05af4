//! TSPL Thermal Label Driver
//!
//! This crate turns decoded grayscale images and structured label fields
//! into TSPL command streams for 203 dpi thermal label printers, and sends
//! them over a device node or USB.
//!
//! # Example
//!
//! ```rust,no_run
//! use tspl_label::{
//!     print_image, ConvertOptions, GeometryState, LabelGeometry, PixelGrid, Printer,
//! };
//!
//! let geometry = GeometryState::new(LabelGeometry::default());
//! let grid = PixelGrid::filled(200, 100, 0);
//! let job = print_image(grid, &geometry.snapshot(), &ConvertOptions::new());
//! let printer = Printer::device(tspl_label::DEFAULT_DEVICE);
//! printer.send(&job).unwrap();
//! ```

mod bitmap;
mod command;
mod convert;
mod error;
mod geometry;
mod grid;
mod labels;
mod printer;
mod quantize;

pub use crate::{
    bitmap::{pack, width_bytes, PackedBitmap},
    command::{
        escape, feed_job, font, home_job, truncate, CommandBuilder, CommandStream,
        BARCODE_MAX_CHARS, DEFAULT_DENSITY, DEFAULT_DIRECTION, DEFAULT_SPEED,
    },
    convert::{convert, image_job, print_image, ConvertOptions},
    error::Error,
    geometry::{
        mm_to_dots, Axis, GeometryState, GeometryUpdate, LabelGeometry, DOTS_PER_MM, MAX_LABEL_MM,
        OFFSET_MAX, OFFSET_MIN,
    },
    grid::{PixelGrid, MAX_TOP_TRIM_PX, WHITE_THRESHOLD},
    labels::{
        address_lines, Calibration, PackingList, ShippingLabel, Template, TextLabel,
        ADDRESS_CHUNK_CHARS, ADDRESS_LINE_CHARS, ADDRESS_MAX_LINES, CUSTOMER_MAX_CHARS,
        ITEM_MAX_CHARS, LINE_MAX_CHARS, PACKING_MAX_ITEMS, TEXT_MAX_LINES,
    },
    printer::{Printer, DEFAULT_DEVICE},
    quantize::{quantize, BitPlane, Mode, BLACK_THRESHOLD},
};
