//! TSPL command synthesis.
//!
//! A [`CommandBuilder`] accumulates one job as newline-terminated text
//! commands, with the packed rows of a `BITMAP` command written inline as
//! raw bytes. Finishing the builder yields an immutable [`CommandStream`]
//! which is handed to the printer link in one piece.

use log::debug;

use crate::{bitmap::PackedBitmap, geometry::LabelGeometry};

/// Longest barcode payload placed on a label.
pub const BARCODE_MAX_CHARS: usize = 25;

/// Compositing mode of `BITMAP`: overwrite.
const BITMAP_MODE_OVERWRITE: u8 = 0;

/// Print darkness sent with every label header, 0 (light) to 15.
pub const DEFAULT_DENSITY: u8 = 8;

/// Print speed in inches per second sent with every label header.
pub const DEFAULT_SPEED: u8 = 4;

/// Feed orientation sent with every label header; 1 prints the label
/// head first.
pub const DEFAULT_DIRECTION: u8 = 1;

/// Printer-resident bitmap fonts, smallest to largest.
pub mod font {
    pub const MONO: &str = "0";
    pub const SMALL: &str = "1";
    pub const MEDIUM: &str = "2";
    pub const LARGE: &str = "3";
}

/// A finished print job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStream {
    bytes: Vec<u8>,
}

impl CommandStream {
    /// Pass caller-written TSPL through untouched, adding the final
    /// newline if it is missing.
    pub fn raw(text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        if !bytes.ends_with(b"\n") {
            bytes.push(b'\n');
        }
        CommandStream { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for CommandStream {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builds one TSPL job.
///
/// Coordinates given to content commands are relative to the print origin,
/// which [`CommandBuilder::for_label`] takes from the geometry offsets.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    buf: Vec<u8>,
    origin_x: i32,
    origin_y: i32,
}

impl CommandBuilder {
    /// An empty job with the origin at the top left corner.
    pub fn new() -> Self {
        Self::default()
    }

    /// A job for `geometry`: starts with the label prelude and places the
    /// origin at the configured offsets.
    pub fn for_label(geometry: &LabelGeometry) -> Self {
        let mut builder = CommandBuilder {
            buf: Vec::new(),
            origin_x: geometry.x_offset,
            origin_y: geometry.y_offset,
        };
        builder.header(geometry);
        builder
    }

    fn line(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(b'\n');
        self
    }

    fn at(&self, x: i32, y: i32) -> (i32, i32) {
        (
            self.origin_x.saturating_add(x),
            self.origin_y.saturating_add(y),
        )
    }

    /// Label size, gap sensing, print settings and buffer clear.
    pub fn header(&mut self, geometry: &LabelGeometry) -> &mut Self {
        self.size(geometry.width_mm, geometry.height_mm)
            .gap(geometry.gap_mm)
            .density(DEFAULT_DENSITY)
            .speed(DEFAULT_SPEED)
            .direction(DEFAULT_DIRECTION)
            .cls()
    }

    /// `SIZE w mm,h mm`
    pub fn size(&mut self, width_mm: f32, height_mm: f32) -> &mut Self {
        self.line(&format!("SIZE {} mm,{} mm", width_mm, height_mm))
    }

    /// `GAP g mm,0 mm`; lets the printer find the next label boundary.
    pub fn gap(&mut self, gap_mm: f32) -> &mut Self {
        self.line(&format!("GAP {} mm,0 mm", gap_mm))
    }

    /// `DENSITY n`
    pub fn density(&mut self, density: u8) -> &mut Self {
        self.line(&format!("DENSITY {}", density))
    }

    /// `SPEED n`
    pub fn speed(&mut self, speed: u8) -> &mut Self {
        self.line(&format!("SPEED {}", speed))
    }

    /// `DIRECTION n`
    pub fn direction(&mut self, direction: u8) -> &mut Self {
        self.line(&format!("DIRECTION {}", direction))
    }

    /// `CLS`: clear the image buffer.
    pub fn cls(&mut self) -> &mut Self {
        self.line("CLS")
    }

    /// `HOME`: feed until the next gap so printing starts at a label edge.
    pub fn home(&mut self) -> &mut Self {
        self.line("HOME")
    }

    /// `FEED n`: advance the media by `dots`.
    pub fn feed(&mut self, dots: u32) -> &mut Self {
        self.line(&format!("FEED {}", dots))
    }

    /// `TEXT` with a printer font. Quotes and backslashes are escaped and
    /// line breaks flattened so the value cannot end the command early.
    pub fn text(&mut self, x: i32, y: i32, font: &str, s: &str) -> &mut Self {
        let (x, y) = self.at(x, y);
        self.line(&format!(
            "TEXT {},{},\"{}\",0,1,1,\"{}\"",
            x,
            y,
            font,
            escape(s)
        ))
    }

    /// `BAR`: a filled rectangle `width` x `height` dots.
    pub fn bar(&mut self, x: i32, y: i32, width: i32, height: i32) -> &mut Self {
        let (x, y) = self.at(x, y);
        self.line(&format!("BAR {},{},{},{}", x, y, width, height))
    }

    /// `BOX`: a rectangle outline between two corners.
    pub fn rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32) -> &mut Self {
        let (x0, y0) = self.at(x0, y0);
        let (x1, y1) = self.at(x1, y1);
        self.line(&format!(
            "BOX {},{},{},{},{}",
            x0, y0, x1, y1, thickness
        ))
    }

    /// Code 128 barcode with human readable text, at most
    /// [`BARCODE_MAX_CHARS`] characters of `data`.
    pub fn barcode128(&mut self, x: i32, y: i32, height: u32, data: &str) -> &mut Self {
        let (x, y) = self.at(x, y);
        let data = truncate(data, BARCODE_MAX_CHARS);
        self.line(&format!(
            "BARCODE {},{},\"128\",{},1,0,2,2,\"{}\"",
            x,
            y,
            height,
            escape(&data)
        ))
    }

    /// `BITMAP` followed by the packed rows as raw bytes.
    pub fn bitmap(&mut self, x: i32, y: i32, bitmap: &PackedBitmap) -> &mut Self {
        let expected = bitmap.width_bytes() as usize * bitmap.height() as usize;
        assert_eq!(
            bitmap.data().len(),
            expected,
            "bitmap payload does not match its declared size"
        );

        let (x, y) = self.at(x, y);
        let header = format!(
            "BITMAP {},{},{},{},{},",
            x,
            y,
            bitmap.width_bytes(),
            bitmap.height(),
            BITMAP_MODE_OVERWRITE
        );
        debug!("{}<{} bytes>", header, bitmap.data().len());
        self.buf.extend_from_slice(header.as_bytes());
        self.buf.extend_from_slice(bitmap.data());
        self.buf.push(b'\n');
        self
    }

    /// Finish with `PRINT copies`.
    pub fn print(mut self, copies: u32) -> CommandStream {
        self.line(&format!("PRINT {}", copies));
        CommandStream { bytes: self.buf }
    }

    /// Finish with `PRINT copies,sets`.
    pub fn print_sets(mut self, copies: u32, sets: u32) -> CommandStream {
        self.line(&format!("PRINT {},{}", copies, sets));
        CommandStream { bytes: self.buf }
    }

    /// Finish a job that only moves media and prints nothing.
    pub fn build(self) -> CommandStream {
        CommandStream { bytes: self.buf }
    }
}

/// Advance the media by one label length without printing.
pub fn feed_job(geometry: &LabelGeometry) -> CommandStream {
    let mut job = CommandBuilder::new();
    job.size(geometry.width_mm, geometry.height_mm)
        .gap(geometry.gap_mm)
        .feed(geometry.height_dots().max(0) as u32);
    job.build()
}

/// Return the media to the start of the next label and leave the buffer
/// clear.
pub fn home_job(geometry: &LabelGeometry) -> CommandStream {
    let mut job = CommandBuilder::new();
    job.size(geometry.width_mm, geometry.height_mm)
        .gap(geometry.gap_mm)
        .home()
        .cls();
    job.print(1)
}

/// Make `s` safe inside a quoted TSPL argument.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' | '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// First `max` characters of `s`.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
