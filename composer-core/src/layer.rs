//! Layers - the building blocks of a composition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default font family for new text layers.
pub const DEFAULT_FONT_FAMILY: &str = "Arial, sans-serif";

/// Default font size for new text layers.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Default text color for new text layers.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Unique identifier for a layer.
///
/// Opaque to the editor: ids loaded from saved documents are kept verbatim,
/// fresh ids are generated from a v4 UUID and are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("layer_{}", Uuid::new_v4().simple()))
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Discriminant of a [`LayerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Text layer.
    Text,
    /// Image layer.
    Image,
    /// Shape layer.
    Shape,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center each line.
    Center,
    /// Align to the right edge.
    Right,
    /// Stretch lines to both edges.
    Justify,
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Geometric primitive drawn by a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle filling the layer box.
    #[default]
    Rectangle,
    /// Circle inscribed in the layer box.
    Circle,
    /// Isosceles triangle with its apex at the top center.
    Triangle,
}

/// Styling and content of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    /// Text content.
    pub text: String,
    /// CSS font family list.
    pub font_family: String,
    /// Font size in document units.
    pub font_size: f32,
    /// CSS font weight (`normal`, `bold`, `100`..`900`).
    pub font_weight: String,
    /// Font slant.
    pub font_style: FontStyle,
    /// Fill color as hex.
    pub color: String,
    /// Horizontal alignment.
    pub text_align: TextAlign,
    /// Underline decoration.
    pub underline: bool,
    /// Strikethrough decoration.
    #[serde(alias = "linethrough")]
    pub strikethrough: bool,
}

impl TextStyle {
    /// Text styled with the editor defaults.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: "normal".to_string(),
            font_style: FontStyle::Normal,
            color: DEFAULT_TEXT_COLOR.to_string(),
            text_align: TextAlign::Left,
            underline: false,
            strikethrough: false,
        }
    }
}

/// Content of an image layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Image source URL or `data:` URI.
    pub src: String,
}

impl ImageContent {
    /// Image content from a source reference.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }
}

/// Styling of a shape layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeStyle {
    /// Which primitive to draw.
    pub shape_type: ShapeKind,
    /// Fill color as hex.
    pub fill: String,
    /// Stroke color as hex.
    pub stroke: String,
    /// Stroke width in document units.
    pub stroke_width: f32,
}

impl ShapeStyle {
    /// Shape with the default palette.
    #[must_use]
    pub fn new(shape_type: ShapeKind) -> Self {
        Self {
            shape_type,
            ..Self::default()
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            shape_type: ShapeKind::Rectangle,
            fill: "#3b82f6".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
        }
    }
}

/// Type-specific content of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// A text block.
    Text(TextStyle),
    /// A raster or vector image.
    Image(ImageContent),
    /// A filled geometric shape.
    Shape(ShapeStyle),
}

impl LayerKind {
    /// The discriminant of this kind.
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        match self {
            Self::Text(_) => LayerType::Text,
            Self::Image(_) => LayerType::Image,
            Self::Shape(_) => LayerType::Shape,
        }
    }

    /// Whether this is a text layer.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Image source, for image layers.
    #[must_use]
    pub fn image_source(&self) -> Option<&str> {
        match self {
            Self::Image(image) => Some(&image.src),
            _ => None,
        }
    }
}

/// Position, size and rotation of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge in document coordinates.
    pub x: f32,
    /// Top edge in document coordinates.
    pub y: f32,
    /// Width in document units.
    pub width: f32,
    /// Height in document units.
    pub height: f32,
    /// Rotation in degrees, about the layer center.
    pub rotation: f32,
}

/// A single field change applied to a live visual object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the text content.
    Text(String),
    /// Change the font family.
    FontFamily(String),
    /// Change the font size.
    FontSize(f32),
    /// Change the font weight.
    FontWeight(String),
    /// Change the font slant.
    FontStyle(FontStyle),
    /// Change the fill color (text color or shape fill).
    Fill(String),
    /// Change text alignment.
    TextAlign(TextAlign),
    /// Toggle underline.
    Underline(bool),
    /// Toggle strikethrough.
    Strikethrough(bool),
    /// Point an image at a new source.
    Source(String),
    /// Change the stroke color.
    Stroke(String),
    /// Change the stroke width.
    StrokeWidth(f32),
    /// Change opacity.
    Opacity(f32),
    /// Move/resize/rotate the object.
    Geometry(Geometry),
}

/// The non-geometric visual state of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProps {
    /// Type-specific content.
    pub kind: LayerKind,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

/// What it takes to bring one visual state to another.
#[derive(Debug, Clone, PartialEq)]
pub enum StylePatch {
    /// Apply these field updates in order (possibly none).
    Fields(Vec<FieldUpdate>),
    /// The object type differs; it must be replaced.
    Rebuild,
}

impl VisualProps {
    /// Compute the field updates turning `self` into `desired`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn diff(&self, desired: &Self) -> StylePatch {
        let mut updates = Vec::new();
        match (&self.kind, &desired.kind) {
            (LayerKind::Text(cur), LayerKind::Text(want)) => {
                if cur.text != want.text {
                    updates.push(FieldUpdate::Text(want.text.clone()));
                }
                if cur.font_family != want.font_family {
                    updates.push(FieldUpdate::FontFamily(want.font_family.clone()));
                }
                if cur.font_size != want.font_size {
                    updates.push(FieldUpdate::FontSize(want.font_size));
                }
                if cur.font_weight != want.font_weight {
                    updates.push(FieldUpdate::FontWeight(want.font_weight.clone()));
                }
                if cur.font_style != want.font_style {
                    updates.push(FieldUpdate::FontStyle(want.font_style));
                }
                if cur.color != want.color {
                    updates.push(FieldUpdate::Fill(want.color.clone()));
                }
                if cur.text_align != want.text_align {
                    updates.push(FieldUpdate::TextAlign(want.text_align));
                }
                if cur.underline != want.underline {
                    updates.push(FieldUpdate::Underline(want.underline));
                }
                if cur.strikethrough != want.strikethrough {
                    updates.push(FieldUpdate::Strikethrough(want.strikethrough));
                }
            }
            (LayerKind::Image(cur), LayerKind::Image(want)) => {
                if cur.src != want.src {
                    updates.push(FieldUpdate::Source(want.src.clone()));
                }
            }
            (LayerKind::Shape(cur), LayerKind::Shape(want)) => {
                if cur.shape_type != want.shape_type {
                    return StylePatch::Rebuild;
                }
                if cur.fill != want.fill {
                    updates.push(FieldUpdate::Fill(want.fill.clone()));
                }
                if cur.stroke != want.stroke {
                    updates.push(FieldUpdate::Stroke(want.stroke.clone()));
                }
                if cur.stroke_width != want.stroke_width {
                    updates.push(FieldUpdate::StrokeWidth(want.stroke_width));
                }
            }
            _ => return StylePatch::Rebuild,
        }
        if self.opacity != desired.opacity {
            updates.push(FieldUpdate::Opacity(desired.opacity));
        }
        StylePatch::Fields(updates)
    }
}

/// A layer in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Unique identifier.
    pub id: LayerId,
    /// Left edge in document coordinates.
    pub x: f32,
    /// Top edge in document coordinates.
    pub y: f32,
    /// Width in document units (never negative).
    pub width: f32,
    /// Height in document units (never negative).
    pub height: f32,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    #[serde(default = "Layer::default_opacity")]
    pub opacity: f32,
    /// Locked layers stay selectable but cannot be dragged, resized or rotated.
    #[serde(default)]
    pub locked: bool,
    /// Type-specific content.
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    const fn default_opacity() -> f32 {
        1.0
    }

    /// Create a new layer with the given kind and a fresh id.
    #[must_use]
    pub fn new(kind: LayerKind) -> Self {
        Self {
            id: LayerId::new(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            kind,
        }
    }

    /// Create a text layer.
    #[must_use]
    pub fn text(style: TextStyle) -> Self {
        Self::new(LayerKind::Text(style)).with_size(200.0, 50.0)
    }

    /// Create an image layer.
    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        Self::new(LayerKind::Image(ImageContent::new(src)))
    }

    /// Create a shape layer.
    #[must_use]
    pub fn shape(style: ShapeStyle) -> Self {
        Self::new(LayerKind::Shape(style))
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<LayerId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the top-left position.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self.normalize();
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the opacity (clamped to `[0, 1]`).
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.normalize();
        self
    }

    /// Whether this is a text layer.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    /// The layer's type discriminant.
    #[must_use]
    pub const fn layer_type(&self) -> LayerType {
        self.kind.layer_type()
    }

    /// Current geometry.
    #[must_use]
    pub const fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }

    /// Replace the geometry, keeping size non-negative.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.x = geometry.x;
        self.y = geometry.y;
        self.width = geometry.width;
        self.height = geometry.height;
        self.rotation = geometry.rotation;
        self.normalize();
    }

    /// Non-geometric visual state.
    #[must_use]
    pub fn visual(&self) -> VisualProps {
        VisualProps {
            kind: self.kind.clone(),
            opacity: self.opacity,
        }
    }

    /// Enforce the size and opacity invariants.
    pub fn normalize(&mut self) {
        self.width = non_negative(self.width);
        self.height = non_negative(self.height);
        self.opacity = if self.opacity.is_nan() {
            1.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        };
        if !self.x.is_finite() {
            self.x = 0.0;
        }
        if !self.y.is_finite() {
            self.y = 0.0;
        }
        if !self.rotation.is_finite() {
            self.rotation = 0.0;
        }
    }

    /// Check if a point (in document coordinates) lies within the layer's
    /// rotated bounding box.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        crate::geometry::Rect::bounding(&self.geometry()).contains(x, y)
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
