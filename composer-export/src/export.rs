//! Document export to image formats.
//!
//! Renders a [`DocumentState`] to SVG in paint order, then rasterizes it with
//! resvg/tiny-skia for PNG and JPEG.

use std::fmt::Write;
use std::path::PathBuf;

use composer_core::{DocumentState, FontStyle, Layer, LayerKind, ShapeKind, TextAlign};
use image::ImageEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.16;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    Jpg,
    /// SVG vector graphics (the SVG XML as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
        }
    }

    /// MIME type of the output.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

/// Options for a single export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output format.
    pub format: ExportFormat,
    /// JPEG quality 0-100 (ignored by PNG and SVG).
    pub quality: u8,
    /// Export area width (with `height`; default: document width).
    pub width: Option<u32>,
    /// Export area height (with `width`; default: document height).
    pub height: Option<u32>,
    /// Pixel multiplier (e.g. 2.0 for retina).
    pub scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: DEFAULT_QUALITY,
            width: None,
            height: None,
            scale: 1.0,
        }
    }
}

/// File name for an export taken at `timestamp_ms`.
#[must_use]
pub fn export_file_name(format: ExportFormat, timestamp_ms: u64) -> String {
    format!("canvas-export-{timestamp_ms}.{}", format.extension())
}

/// Renders documents according to [`ExportOptions`].
#[derive(Debug, Clone, Default)]
pub struct DocumentExporter {
    options: ExportOptions,
    resources_dir: Option<PathBuf>,
}

impl DocumentExporter {
    /// Create an exporter with the given options.
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            resources_dir: None,
        }
    }

    /// Create an exporter with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportOptions::default())
    }

    /// Resolve relative image sources against `dir`.
    #[must_use]
    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = Some(dir.into());
        self
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export a document in the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or rendering fails.
    pub fn export(&self, document: &DocumentState) -> ExportResult<Vec<u8>> {
        let bytes = match self.options.format {
            ExportFormat::Png => self.render_to_png(document)?,
            ExportFormat::Jpg => self.render_to_jpeg(document)?,
            ExportFormat::Svg => self.render_to_svg(document)?.into_bytes(),
        };
        tracing::debug!(
            format = self.options.format.extension(),
            bytes = bytes.len(),
            "Exported document"
        );
        Ok(bytes)
    }

    /// Export the document to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, document: &DocumentState) -> ExportResult<Vec<u8>> {
        let pixmap = self.rasterize(document)?;
        pixmap.encode_png().map_err(|e| ExportError::Encode {
            format: "PNG",
            reason: e.to_string(),
        })
    }

    /// Export the document to JPEG bytes, flattened onto its background.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, document: &DocumentState) -> ExportResult<Vec<u8>> {
        let pixmap = self.rasterize(document)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = parse_hex_color(&document.background_color).unwrap_or([255, 255, 255, 255]);

        // tiny-skia pixels are premultiplied.
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for (&src, &back) in pixel[..3].iter().zip(&bg[..3]) {
                let value = f32::from(back).mul_add(inv, f32::from(src));
                rgb.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }

        let quality = self.options.quality.clamp(1, 100);
        let mut buf = std::io::Cursor::new(Vec::new());
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
            .write_image(&rgb, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| ExportError::Encode {
                format: "JPEG",
                reason: e.to_string(),
            })?;
        Ok(buf.into_inner())
    }

    /// Export the document to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn render_to_svg(&self, document: &DocumentState) -> ExportResult<String> {
        let (view_w, view_h) = self.export_area(document)?;
        let (out_w, out_h) = self.output_dimensions(document)?;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&document.background_color),
        );
        for layer in document.paint_order() {
            render_layer_svg(&mut svg, layer);
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Output size in pixels: the export area times the scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the scale is not a positive finite number.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn output_dimensions(&self, document: &DocumentState) -> ExportResult<(u32, u32)> {
        let scale = self.options.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ExportError::InvalidOptions(format!("scale must be positive, got {scale}")));
        }
        let (w, h) = self.export_area(document)?;
        let out_w = (w as f32 * scale).round() as u32;
        let out_h = (h as f32 * scale).round() as u32;
        Ok((out_w.max(1), out_h.max(1)))
    }

    /// Export area in document units.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn export_area(&self, document: &DocumentState) -> ExportResult<(u32, u32)> {
        match (self.options.width, self.options.height) {
            (Some(0), _) | (_, Some(0)) => Err(ExportError::InvalidOptions(
                "width and height must be non-zero".to_string(),
            )),
            (Some(w), Some(h)) => Ok((w, h)),
            _ => {
                let dim = |v: f32| if v.is_finite() { v.max(1.0).round() as u32 } else { 1 };
                Ok((dim(document.width), dim(document.height)))
            }
        }
    }

    fn rasterize(&self, document: &DocumentState) -> ExportResult<tiny_skia::Pixmap> {
        let svg = self.render_to_svg(document)?;
        let mut options = usvg::Options {
            resources_dir: self.resources_dir.clone(),
            ..usvg::Options::default()
        };
        options.fontdb_mut().load_system_fonts();

        let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| ExportError::Svg(e.to_string()))?;
        let (out_w, out_h) = self.output_dimensions(document)?;
        let mut pixmap =
            tiny_skia::Pixmap::new(out_w, out_h).ok_or(ExportError::Pixmap(out_w, out_h))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Render a single layer to SVG.
#[allow(clippy::too_many_lines)]
fn render_layer_svg(svg: &mut String, layer: &Layer) {
    let g = layer.geometry();
    let _ = write!(svg, "<g opacity=\"{}\"", layer.opacity);
    if g.rotation.abs() > f32::EPSILON {
        let cx = g.x + g.width / 2.0;
        let cy = g.y + g.height / 2.0;
        let _ = write!(svg, " transform=\"rotate({} {cx} {cy})\"", g.rotation);
    }
    svg.push('>');

    match &layer.kind {
        LayerKind::Text(style) => {
            let (anchor, ax) = match style.text_align {
                TextAlign::Left | TextAlign::Justify => ("start", g.x),
                TextAlign::Center => ("middle", g.x + g.width / 2.0),
                TextAlign::Right => ("end", g.x + g.width),
            };
            let slant = match style.font_style {
                FontStyle::Normal => "normal",
                FontStyle::Italic => "italic",
            };
            let _ = write!(
                svg,
                "<text x=\"{ax}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{slant}\" fill=\"{}\" text-anchor=\"{anchor}\"",
                g.y + style.font_size,
                escape_xml(&style.font_family),
                style.font_size,
                escape_xml(&style.font_weight),
                escape_xml(&style.color),
            );
            let decoration: Vec<&str> = [
                (style.underline, "underline"),
                (style.strikethrough, "line-through"),
            ]
            .into_iter()
            .filter_map(|(on, name)| on.then_some(name))
            .collect();
            if !decoration.is_empty() {
                let _ = write!(svg, " text-decoration=\"{}\"", decoration.join(" "));
            }
            svg.push('>');
            for (i, line) in style.text.lines().enumerate() {
                let dy = if i == 0 { 0.0 } else { style.font_size * LINE_HEIGHT };
                let _ = write!(
                    svg,
                    "<tspan x=\"{ax}\" dy=\"{dy}\">{}</tspan>",
                    escape_xml(line)
                );
            }
            svg.push_str("</text>");
        }

        LayerKind::Image(image) => {
            let _ = write!(
                svg,
                "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                g.x,
                g.y,
                g.width,
                g.height,
                escape_xml(&image.src),
            );
        }

        LayerKind::Shape(style) => {
            let paint = if style.stroke_width > 0.0 {
                format!(
                    "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
                    escape_xml(&style.fill),
                    escape_xml(&style.stroke),
                    style.stroke_width,
                )
            } else {
                format!("fill=\"{}\" stroke=\"none\"", escape_xml(&style.fill))
            };
            match style.shape_type {
                ShapeKind::Rectangle => {
                    let _ = write!(
                        svg,
                        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {paint}/>",
                        g.x, g.y, g.width, g.height,
                    );
                }
                ShapeKind::Circle => {
                    let _ = write!(
                        svg,
                        "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {paint}/>",
                        g.x + g.width / 2.0,
                        g.y + g.height / 2.0,
                        g.width / 2.0,
                        g.height / 2.0,
                    );
                }
                ShapeKind::Triangle => {
                    let _ = write!(
                        svg,
                        "<polygon points=\"{},{} {},{} {},{}\" {paint}/>",
                        g.x + g.width / 2.0,
                        g.y,
                        g.x + g.width,
                        g.y + g.height,
                        g.x,
                        g.y + g.height,
                    );
                }
            }
        }
    }

    svg.push_str("</g>");
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into RGBA bytes.
#[must_use]
pub fn parse_hex_color(color: &str) -> Option<[u8; 4]> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut out = [255; 4];
            for (i, c) in hex.chars().enumerate() {
                out[i] = u8::try_from(c.to_digit(16)? * 17).ok()?;
            }
            Some(out)
        }
        6 => Some([byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255]),
        8 => Some([
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        ]),
        _ => None,
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
