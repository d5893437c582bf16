//! Drawing surface.
//!
//! Items are recorded in plot coordinates and only mapped to pixels when
//! the figure is serialized, so the visible range can be fixed after all
//! layers have drawn. Document order is draw order: later items paint
//! over earlier ones.

use crate::layout::Point;

pub mod palette {
    use anyhow::{bail, Result};

    /// 8-bit RGB color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rgb {
        pub r: u8,
        pub g: u8,
        pub b: u8,
    }

    impl Rgb {
        pub const fn new(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b }
        }

        /// Parse `#rrggbb` (the leading `#` is optional).
        pub fn from_hex(hex: &str) -> Result<Self> {
            let digits = hex.trim().trim_start_matches('#');
            if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                bail!("invalid color {:?}, expected #rrggbb", hex);
            }
            let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
            Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
        }

        pub fn to_hex(self) -> String {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }
    }

    /// Orange, used for the half of an edge nearest its source
    pub const SOURCE: Rgb = Rgb::new(255, 139, 87);
    /// Blue, used for the half of an edge nearest its target
    pub const TARGET: Rgb = Rgb::new(87, 181, 255);

    pub const BACKGROUND: Rgb = Rgb::new(0, 0, 0);

    /// RGBA with every channel in [0, 1].
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Rgba {
        pub r: f64,
        pub g: f64,
        pub b: f64,
        pub a: f64,
    }

    impl Rgba {
        pub fn from_rgb(rgb: Rgb, alpha: f64) -> Self {
            Self {
                r: rgb.r as f64 / 255.0,
                g: rgb.g as f64 / 255.0,
                b: rgb.b as f64 / 255.0,
                a: alpha,
            }
        }

        pub fn rgb(&self) -> Rgb {
            let to_u8 = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgb::new(to_u8(self.r), to_u8(self.g), to_u8(self.b))
        }
    }
}

use palette::{Rgb, Rgba};

/// A straight line piece in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub color: Rgba,
    /// Line width in points
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Rgb,
    /// Font size in points
    pub size: f64,
    pub family: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Centered horizontally and vertically on the point
    Center,
    /// Right edge on the point, sitting on the baseline
    BaselineEnd,
}

#[derive(Debug, Clone)]
enum Item {
    Lines(Vec<Segment>),
    Text {
        at: Point,
        text: String,
        style: TextStyle,
        anchor: Anchor,
    },
    /// Text positioned in figure fractions from the bottom-left corner
    FigureText {
        at: Point,
        text: String,
        style: TextStyle,
        anchor: Anchor,
    },
}

/// A figure backed by an SVG document.
#[derive(Debug, Clone)]
pub struct Canvas {
    width_in: f64,
    height_in: f64,
    dpi: f64,
    x_limits: (f64, f64),
    y_limits: (f64, f64),
    items: Vec<Item>,
}

impl Canvas {
    pub fn new(width_in: f64, height_in: f64, dpi: f64) -> Self {
        Self {
            width_in,
            height_in,
            dpi,
            x_limits: (0.0, 1.0),
            y_limits: (0.0, 1.0),
            items: Vec::new(),
        }
    }

    pub fn width_px(&self) -> u32 {
        (self.width_in * self.dpi).round().max(1.0) as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height_in * self.dpi).round().max(1.0) as u32
    }

    /// Pixels per typographic point.
    fn scale(&self) -> f64 {
        self.dpi / 72.0
    }

    pub fn set_limits(&mut self, x: (f64, f64), y: (f64, f64)) {
        self.x_limits = x;
        self.y_limits = y;
    }

    pub fn limits(&self) -> ((f64, f64), (f64, f64)) {
        (self.x_limits, self.y_limits)
    }

    /// Map a plot coordinate to pixels, y pointing down.
    pub fn to_pixels(&self, p: Point) -> (f64, f64) {
        let (x0, x1) = self.x_limits;
        let (y0, y1) = self.y_limits;
        let px = (p.x - x0) / (x1 - x0) * self.width_px() as f64;
        let py = (y1 - p.y) / (y1 - y0) * self.height_px() as f64;
        (px, py)
    }

    /// Add one batched line collection.
    pub fn add_lines(&mut self, segments: Vec<Segment>) {
        if !segments.is_empty() {
            self.items.push(Item::Lines(segments));
        }
    }

    pub fn add_text(&mut self, at: Point, text: &str, style: &TextStyle, anchor: Anchor) {
        self.items.push(Item::Text {
            at,
            text: text.to_string(),
            style: style.clone(),
            anchor,
        });
    }

    pub fn add_figure_text(&mut self, at: Point, text: &str, style: &TextStyle, anchor: Anchor) {
        self.items.push(Item::FigureText {
            at,
            text: text.to_string(),
            style: style.clone(),
            anchor,
        });
    }

    pub fn segment_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                Item::Lines(segments) => segments.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn text_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, Item::Text { .. } | Item::FigureText { .. }))
            .count()
    }

    fn draw_lines(&self, segments: &[Segment]) -> String {
        let scale = self.scale();
        let mut group = String::from("<g>\n");
        for segment in segments {
            let (x1, y1) = self.to_pixels(segment.start);
            let (x2, y2) = self.to_pixels(segment.end);
            group.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-opacity="{:.4}" stroke-width="{:.2}"/>"#,
                x1,
                y1,
                x2,
                y2,
                segment.color.rgb().to_hex(),
                segment.color.a,
                segment.width * scale
            ));
            group.push('\n');
        }
        group.push_str("</g>");
        group
    }

    fn draw_text(&self, (x, y): (f64, f64), text: &str, style: &TextStyle, anchor: Anchor) -> String {
        let (text_anchor, baseline) = match anchor {
            Anchor::Center => ("middle", "central"),
            Anchor::BaselineEnd => ("end", "auto"),
        };
        format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}" text-anchor="{}" dominant-baseline="{}">{}</text>"#,
            x,
            y,
            escape_xml(&style.family),
            style.size * self.scale(),
            style.color.to_hex(),
            text_anchor,
            baseline,
            escape_xml(text)
        )
    }

    fn render_item(&self, item: &Item) -> String {
        match item {
            Item::Lines(segments) => self.draw_lines(segments),
            Item::Text {
                at,
                text,
                style,
                anchor,
            } => self.draw_text(self.to_pixels(*at), text, style, *anchor),
            Item::FigureText {
                at,
                text,
                style,
                anchor,
            } => {
                let x = at.x * self.width_px() as f64;
                let y = (1.0 - at.y) * self.height_px() as f64;
                self.draw_text((x, y), text, style, *anchor)
            }
        }
    }

    /// Serialize the figure to an SVG document over a solid background.
    pub fn to_svg(&self, background: Rgb) -> String {
        let (width, height) = (self.width_px(), self.height_px());
        let content: Vec<String> = self.items.iter().map(|item| self.render_item(item)).collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">
  <rect width="100%" height="100%" fill="{}"/>
  {}
</svg>"#,
            width,
            height,
            width,
            height,
            background.to_hex(),
            content.join("\n")
        )
    }
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::palette::*;
    use super::*;

    #[test]
    fn test_hex_round_trip_and_errors() {
        assert_eq!(Rgb::from_hex("#ff8b57").unwrap(), SOURCE);
        assert_eq!(Rgb::from_hex("57B5FF").unwrap(), TARGET);
        assert_eq!(TARGET.to_hex(), "#57b5ff");
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#gggggg").is_err());
    }

    #[test]
    fn test_rgba_channels_are_normalized() {
        let color = Rgba::from_rgb(SOURCE, 0.5);
        assert_eq!(color.r, 1.0);
        assert!((color.g - 139.0 / 255.0).abs() < 1e-12);
        assert_eq!(color.rgb(), SOURCE);
    }

    #[test]
    fn test_pixel_mapping_flips_y() {
        let mut canvas = Canvas::new(6.4, 4.8, 100.0);
        assert_eq!((canvas.width_px(), canvas.height_px()), (640, 480));

        assert_eq!(canvas.to_pixels(Point::new(0.0, 0.0)), (0.0, 480.0));
        assert_eq!(canvas.to_pixels(Point::new(1.0, 1.0)), (640.0, 0.0));

        canvas.set_limits((-0.05, 1.05), (-0.05, 1.05));
        let (x, y) = canvas.to_pixels(Point::new(0.5, 0.5));
        assert!((x - 320.0).abs() < 1e-9);
        assert!((y - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_svg_keeps_draw_order_and_escapes_text() {
        let mut canvas = Canvas::new(1.0, 1.0, 72.0);
        canvas.add_lines(vec![Segment {
            start: Point::new(0.0, 0.0),
            end: Point::new(1.0, 1.0),
            color: Rgba::from_rgb(SOURCE, 0.25),
            width: 0.2,
        }]);
        canvas.add_lines(Vec::new());
        let style = TextStyle {
            color: Rgb::new(255, 255, 255),
            size: 1.0,
            family: "monospace".to_string(),
        };
        canvas.add_text(Point::new(0.5, 0.5), "r/<a&b>", &style, Anchor::Center);

        assert_eq!(canvas.segment_count(), 1);
        assert_eq!(canvas.text_count(), 1);

        let svg = canvas.to_svg(BACKGROUND);
        let line_at = svg.find("<line").unwrap();
        let text_at = svg.find("<text").unwrap();
        assert!(line_at < text_at);
        assert!(svg.contains("r/&lt;a&amp;b&gt;"));
        assert!(svg.contains(r##"fill="#000000""##));
        assert!(svg.contains(r#"stroke-opacity="0.2500""#));
        assert_eq!(svg.matches("<g>").count(), 1);
    }
}
