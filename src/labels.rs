//! Ready-made label layouts.
//!
//! Every layout renders against a [`LabelGeometry`] snapshot. Field values
//! are untrusted: each one is cut to its character budget and escaped
//! before it reaches the command stream, never wrapped or rejected.

use std::str::FromStr;

use crate::{
    command::{font, truncate, CommandBuilder, CommandStream},
    error::Error,
    geometry::LabelGeometry,
};

/// Characters kept per text line.
pub const LINE_MAX_CHARS: usize = 40;

/// Body lines kept on a plain text label.
pub const TEXT_MAX_LINES: usize = 8;

/// Address lines kept on a shipping label.
pub const ADDRESS_MAX_LINES: usize = 3;

/// Characters kept per address line.
pub const ADDRESS_LINE_CHARS: usize = 35;

/// Chunk width used when an address carries no `,` separators.
pub const ADDRESS_CHUNK_CHARS: usize = 30;

/// Items kept on a packing list.
pub const PACKING_MAX_ITEMS: usize = 6;

/// Characters kept per packing list item.
pub const ITEM_MAX_CHARS: usize = 35;

/// Characters kept of the customer name on a packing list.
pub const CUSTOMER_MAX_CHARS: usize = 30;

pub const DEFAULT_TITLE: &str = "ATK FABRICATION";
pub const DEFAULT_COMPANY: &str = "ATK FABRICATION CO.";
pub const DEFAULT_TAGLINE: &str = "Quality Fabrication & Design";

/// A layout that turns its fields into one print job.
pub trait Template {
    fn render(&self, geometry: &LabelGeometry) -> CommandStream;
}

/// A title over a few lines of free text.
#[derive(Debug, Clone)]
pub struct TextLabel {
    pub title: String,
    pub lines: Vec<String>,
}

impl TextLabel {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        TextLabel {
            title: DEFAULT_TITLE.to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        TextLabel {
            title: title.into(),
            ..self
        }
    }
}

impl Template for TextLabel {
    fn render(&self, geometry: &LabelGeometry) -> CommandStream {
        let mut job = CommandBuilder::for_label(geometry);
        job.text(50, 30, font::LARGE, &truncate(&self.title, LINE_MAX_CHARS))
            .bar(50, 80, 400, 4);

        let mut y = 110;
        for line in self.lines.iter().take(TEXT_MAX_LINES) {
            job.text(50, y, font::MEDIUM, &truncate(line, LINE_MAX_CHARS));
            y += 55;
        }
        job.print_sets(1, 1)
    }
}

/// Boxed company header, order details, address block and a Code 128
/// barcode of the order.
#[derive(Debug, Clone)]
pub struct ShippingLabel {
    pub order: String,
    pub customer: String,
    pub address: String,
    /// Barcode payload, the order id when `None`.
    pub barcode: Option<String>,
    /// Printed as is, e.g. `2024-05-01`.
    pub date: String,
    pub company: String,
    pub tagline: String,
}

impl ShippingLabel {
    pub fn new(
        order: impl Into<String>,
        customer: impl Into<String>,
        address: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        ShippingLabel {
            order: order.into(),
            customer: customer.into(),
            address: address.into(),
            barcode: None,
            date: date.into(),
            company: DEFAULT_COMPANY.to_string(),
            tagline: DEFAULT_TAGLINE.to_string(),
        }
    }

    pub fn barcode(self, barcode: impl Into<String>) -> Self {
        ShippingLabel {
            barcode: Some(barcode.into()),
            ..self
        }
    }

    fn barcode_data(&self) -> &str {
        match &self.barcode {
            Some(bc) if !bc.is_empty() => bc,
            _ => &self.order,
        }
    }
}

/// Split an address into printable lines.
///
/// Commas mark line breaks when present, otherwise the text is cut into
/// fixed-width chunks.
pub fn address_lines(address: &str) -> Vec<String> {
    let lines: Vec<String> = if address.contains(',') {
        address.split(',').map(|l| l.trim().to_string()).collect()
    } else {
        let chars: Vec<char> = address.chars().collect();
        chars
            .chunks(ADDRESS_CHUNK_CHARS)
            .map(|c| c.iter().collect::<String>().trim().to_string())
            .collect()
    };
    lines
        .into_iter()
        .take(ADDRESS_MAX_LINES)
        .map(|l| truncate(&l, ADDRESS_LINE_CHARS))
        .collect()
}

impl Template for ShippingLabel {
    fn render(&self, geometry: &LabelGeometry) -> CommandStream {
        let mut job = CommandBuilder::for_label(geometry);
        job.rect(40, 20, 400, 100, 4)
            .text(50, 35, font::LARGE, &truncate(&self.company, LINE_MAX_CHARS))
            .text(50, 75, font::SMALL, &truncate(&self.tagline, LINE_MAX_CHARS))
            .bar(40, 110, 360, 3)
            .text(
                50,
                130,
                font::MEDIUM,
                &truncate(&format!("Order: #{}", self.order), LINE_MAX_CHARS),
            )
            .text(
                50,
                180,
                font::MEDIUM,
                &truncate(&format!("Date: {}", self.date), LINE_MAX_CHARS),
            )
            .bar(40, 230, 360, 2)
            .text(50, 250, font::MEDIUM, "SHIP TO:")
            .text(70, 290, font::MEDIUM, &truncate(&self.customer, ADDRESS_LINE_CHARS));

        let mut y = 330;
        for line in address_lines(&self.address) {
            job.text(70, y, font::MEDIUM, &line);
            y += 50;
        }

        let barcode = self.barcode_data();
        job.bar(40, 500, 360, 2)
            .barcode128(80, 520, 80, barcode)
            .text(
                80,
                620,
                font::SMALL,
                &truncate(barcode, crate::command::BARCODE_MAX_CHARS),
            );
        job.print_sets(1, 1)
    }
}

/// Internal packing slip with a numbered item list.
#[derive(Debug, Clone)]
pub struct PackingList {
    pub order: String,
    pub customer: String,
    pub items: Vec<String>,
}

impl PackingList {
    pub fn new<S: Into<String>>(
        order: impl Into<String>,
        customer: impl Into<String>,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        PackingList {
            order: order.into(),
            customer: customer.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl Template for PackingList {
    fn render(&self, geometry: &LabelGeometry) -> CommandStream {
        let mut job = CommandBuilder::for_label(geometry);
        job.text(50, 30, font::LARGE, "PACKING LIST")
            .text(
                50,
                90,
                font::MEDIUM,
                &truncate(&format!("Order: #{}", self.order), LINE_MAX_CHARS),
            )
            .text(
                50,
                140,
                font::MEDIUM,
                &format!("Customer: {}", truncate(&self.customer, CUSTOMER_MAX_CHARS)),
            )
            .bar(50, 190, 400, 3)
            .text(50, 210, font::MEDIUM, "ITEMS:");

        let mut y = 260;
        for (i, item) in self.items.iter().take(PACKING_MAX_ITEMS).enumerate() {
            let item = truncate(item, ITEM_MAX_CHARS);
            job.text(70, y, font::MEDIUM, &format!("{}. {}", i + 1, item));
            y += 50;
        }
        job.print_sets(1, 1)
    }
}

/// Test patterns for checking geometry and offsets on real media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calibration {
    /// Outline of the full label.
    Border,
    /// Crosshair and squares around the label center.
    Center,
    /// Edge names and rules near every side, to see feed orientation.
    Direction,
}

impl FromStr for Calibration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "border" => Ok(Calibration::Border),
            "center" => Ok(Calibration::Center),
            "direction" => Ok(Calibration::Direction),
            _ => Err(Error::invalid("test", s)),
        }
    }
}

impl Template for Calibration {
    fn render(&self, geometry: &LabelGeometry) -> CommandStream {
        let w = geometry.width_dots();
        let h = geometry.height_dots();
        let mut job = CommandBuilder::for_label(geometry);

        match self {
            Calibration::Border => {
                job.rect(0, 0, w.saturating_sub(1), h.saturating_sub(1), 2)
                    .text(10, 10, font::MONO, "BORDER TEST");
            }
            Calibration::Center => {
                let (cx, cy) = (w / 2, h / 2);
                job.bar(cx - 20, cy - 1, 40, 2)
                    .bar(cx - 1, cy - 20, 2, 40)
                    .rect(cx - 32, cy - 32, cx + 32, cy + 32, 1)
                    .rect(cx - 16, cy - 16, cx + 16, cy + 16, 1)
                    .text(10, 10, font::MONO, "CENTER CAL");
            }
            Calibration::Direction => {
                // anchored to the far edges, pinned at 0 on small labels
                let right = w.saturating_sub(213).max(0);
                let bottom = h.saturating_sub(119).max(0);
                let middle = fraction(w, 3, 8);
                job.text(10, 10, font::MEDIUM, "<<< LEFT EDGE")
                    .text(right, 10, font::MEDIUM, "RIGHT EDGE >>>")
                    .text(10, bottom, font::MEDIUM, "<<< LEFT EDGE")
                    .text(right, bottom, font::MEDIUM, "RIGHT EDGE >>>")
                    .text(middle, fraction(h, 9, 20), font::LARGE, "^ TOP ^")
                    .text(middle, h.saturating_sub(169).max(0), font::LARGE, "v BOTTOM v")
                    .bar(10, 50, w.saturating_sub(13).max(1), 2)
                    .bar(10, h.saturating_sub(69).max(0), w.saturating_sub(13).max(1), 2)
                    .bar(50, 10, 2, h.saturating_sub(19).max(1))
                    .bar(w.saturating_sub(63).max(0), 10, 2, h.saturating_sub(19).max(1));
            }
        }
        job.print(1)
    }
}

/// `dots * num / den` without overflow.
fn fraction(dots: i32, num: i64, den: i64) -> i32 {
    (i64::from(dots) * num / den) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(stream: &CommandStream) -> Vec<String> {
        String::from_utf8_lossy(stream.as_bytes())
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn origin() -> LabelGeometry {
        LabelGeometry {
            x_offset: 0,
            y_offset: 0,
            ..LabelGeometry::default()
        }
    }

    #[test]
    fn test_text_label_truncates_lines() {
        let long = "x".repeat(100);
        let stream = TextLabel::new(vec![long]).render(&origin());
        let out = lines(&stream);
        let expected = format!("TEXT 50,110,\"2\",0,1,1,\"{}\"", "x".repeat(LINE_MAX_CHARS));
        assert!(out.contains(&expected), "{:?}", out);
    }

    #[test]
    fn test_text_label_drops_extra_lines() {
        let body: Vec<String> = (0..12).map(|i| format!("line {}", i)).collect();
        let stream = TextLabel::new(body).title("T").render(&origin());
        let out = lines(&stream);
        let text_lines = out.iter().filter(|l| l.starts_with("TEXT")).count();
        assert_eq!(text_lines, 1 + TEXT_MAX_LINES);
        assert!(out.iter().any(|l| l.contains("line 7")));
        assert!(!out.iter().any(|l| l.contains("line 8")));
        assert_eq!(out.last().unwrap(), "PRINT 1,1");
    }

    #[test]
    fn test_text_label_escapes_quotes() {
        let stream = TextLabel::new(vec!["12\" pipe"]).render(&origin());
        assert!(lines(&stream).contains(&"TEXT 50,110,\"2\",0,1,1,\"12\\\" pipe\"".to_string()));
    }

    #[test]
    fn test_text_label_uses_offsets() {
        let geometry = LabelGeometry {
            x_offset: 8,
            y_offset: 16,
            ..LabelGeometry::default()
        };
        let out = lines(&TextLabel::new(vec!["a"]).render(&geometry));
        assert_eq!(out[0], "SIZE 101.6 mm,152.4 mm");
        assert_eq!(out[1], "GAP 2.5 mm,0 mm");
        assert_eq!(out[2], "DENSITY 8");
        assert_eq!(out[3], "SPEED 4");
        assert_eq!(out[4], "DIRECTION 1");
        assert_eq!(out[5], "CLS");
        assert_eq!(out[6], "TEXT 58,46,\"3\",0,1,1,\"ATK FABRICATION\"");
        assert_eq!(out[7], "BAR 58,96,400,4");
    }

    #[test]
    fn test_backslash_cut_at_budget_stays_inside_quotes() {
        let line = format!("{}\\tail", "a".repeat(LINE_MAX_CHARS - 1));
        let out = lines(&TextLabel::new(vec![line]).render(&origin()));
        let expected = format!(
            "TEXT 50,110,\"2\",0,1,1,\"{}\\\\\"",
            "a".repeat(LINE_MAX_CHARS - 1)
        );
        assert!(out.contains(&expected), "{:?}", out);
    }

    #[test]
    fn test_address_split_on_commas() {
        assert_eq!(
            address_lines("123 Oak Ave, Detroit, MI 48201, USA"),
            vec!["123 Oak Ave", "Detroit", "MI 48201"]
        );
    }

    #[test]
    fn test_address_chunked_without_commas() {
        let address = "a".repeat(100);
        let out = address_lines(&address);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|l| l.chars().count() == ADDRESS_CHUNK_CHARS));
    }

    #[test]
    fn test_address_line_budget() {
        let out = address_lines(&format!("{},x", "b".repeat(50)));
        assert_eq!(out[0].chars().count(), ADDRESS_LINE_CHARS);
    }

    #[test]
    fn test_shipping_barcode_defaults_to_order() {
        let label = ShippingLabel::new("54321", "Jane Doe", "123 Oak Ave, Detroit", "2024-05-01");
        let out = lines(&label.render(&origin()));
        assert!(out.contains(&"BARCODE 80,520,\"128\",80,1,0,2,2,\"54321\"".to_string()));
        assert!(out.contains(&"TEXT 80,620,\"1\",0,1,1,\"54321\"".to_string()));
        assert!(out.contains(&"TEXT 50,180,\"2\",0,1,1,\"Date: 2024-05-01\"".to_string()));
        assert!(out.contains(&"TEXT 70,290,\"2\",0,1,1,\"Jane Doe\"".to_string()));
        assert!(out.contains(&"TEXT 70,380,\"2\",0,1,1,\"Detroit\"".to_string()));
        assert_eq!(out.last().unwrap(), "PRINT 1,1");
    }

    #[test]
    fn test_shipping_explicit_barcode() {
        let label = ShippingLabel::new("1", "C", "A", "D").barcode("ORDER54321");
        let out = lines(&label.render(&origin()));
        assert!(out.iter().any(|l| l.ends_with("\"ORDER54321\"") && l.starts_with("BARCODE")));
    }

    #[test]
    fn test_packing_list_numbers_items() {
        let items: Vec<String> = (1..=9).map(|i| format!("Widget {}", i)).collect();
        let list = PackingList::new("99999", "John Smith", items);
        let out = lines(&list.render(&origin()));
        assert!(out.contains(&"TEXT 70,260,\"2\",0,1,1,\"1. Widget 1\"".to_string()));
        assert!(out.contains(&"TEXT 70,510,\"2\",0,1,1,\"6. Widget 6\"".to_string()));
        assert!(!out.iter().any(|l| l.contains("Widget 7")));
        assert!(out.contains(&"TEXT 50,140,\"2\",0,1,1,\"Customer: John Smith\"".to_string()));
    }

    #[test]
    fn test_border_calibration() {
        let out = lines(&Calibration::Border.render(&origin()));
        assert!(out.contains(&"BOX 0,0,812,1218,2".to_string()));
        assert_eq!(out.last().unwrap(), "PRINT 1");
    }

    #[test]
    fn test_center_calibration() {
        let out = lines(&Calibration::Center.render(&origin()));
        assert!(out.contains(&"BAR 386,608,40,2".to_string()));
        assert!(out.contains(&"BAR 405,589,2,40".to_string()));
        assert!(out.contains(&"BOX 374,577,438,641,1".to_string()));
    }

    #[test]
    fn test_direction_calibration_follows_geometry() {
        let out = lines(&Calibration::Direction.render(&origin()));
        assert!(out.contains(&"TEXT 600,10,\"2\",0,1,1,\"RIGHT EDGE >>>\"".to_string()));
        assert!(out.contains(&"TEXT 10,1100,\"2\",0,1,1,\"<<< LEFT EDGE\"".to_string()));
        assert!(out.contains(&"BAR 750,10,2,1200".to_string()));
    }

    #[test]
    fn test_direction_calibration_on_small_label() {
        let geometry = LabelGeometry {
            width_mm: 20.0,
            height_mm: 15.0,
            ..origin()
        };
        let out = lines(&Calibration::Direction.render(&geometry));
        assert!(!out.iter().any(|l| l.contains('-')), "{:?}", out);
        assert!(out.contains(&"TEXT 0,10,\"2\",0,1,1,\"RIGHT EDGE >>>\"".to_string()));
        for bar in out.iter().filter(|l| l.starts_with("BAR ")) {
            let sizes: Vec<i32> = bar[4..].split(',').map(|n| n.parse().unwrap()).collect();
            assert!(sizes[2] > 0 && sizes[3] > 0, "{}", bar);
        }
    }

    #[test]
    fn test_calibration_on_huge_label() {
        let geometry = LabelGeometry {
            width_mm: 1e9,
            height_mm: 1e9,
            gap_mm: 0.0,
            x_offset: 300,
            y_offset: 300,
        };
        for pattern in &[Calibration::Border, Calibration::Center, Calibration::Direction] {
            let out = lines(&pattern.render(&geometry));
            assert_eq!(out.last().unwrap(), "PRINT 1");
        }
        let out = lines(&Calibration::Border.render(&geometry));
        assert!(out.contains(&format!("BOX 300,300,{},{},2", i32::MAX, i32::MAX)));
    }

    #[test]
    fn test_calibration_from_str() {
        assert_eq!("center".parse::<Calibration>().unwrap(), Calibration::Center);
        assert!("diagonal".parse::<Calibration>().is_err());
    }
}
