use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize};
use tiny_skia::{FillRule, Paint, Path, Pixmap, Shader, Stroke, StrokeDash, Transform};

use parspective_core::{ChipXY, ConstraintId, Link, NetId, VertexId};

/// An RGBA colour with components in `0.0..=1.0`, written `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub f32, pub f32, pub f32, pub f32);

impl Rgba {
    pub const BLACK: Rgba = Rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba(1.0, 1.0, 1.0, 1.0);

    pub fn with_alpha(self, alpha: f32) -> Self {
        Rgba(self.0, self.1, self.2, alpha)
    }

    pub fn to_color(self) -> tiny_skia::Color {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        tiny_skia::Color::from_rgba(c(self.0), c(self.1), c(self.2), c(self.3))
            .unwrap_or(tiny_skia::Color::TRANSPARENT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// How to fill and outline a shape. Unset fields are not drawn (fill,
/// stroke) or left at the rasteriser's defaults (everything else).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonStyle {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub line_width: Option<f64>,
    pub dash: Option<Vec<f64>>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
}

fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Per-object changes to a [`PolygonStyle`].
///
/// `None` inherits the default; `Some(None)` clears the field for this object
/// only (written as `null` in JSON).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "explicit")]
    pub fill: Option<Option<Rgba>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "explicit")]
    pub stroke: Option<Option<Rgba>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "explicit")]
    pub line_width: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "explicit")]
    pub dash: Option<Option<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "explicit")]
    pub line_cap: Option<Option<LineCap>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "explicit")]
    pub line_join: Option<Option<LineJoin>>,
}

impl StyleOverride {
    pub fn apply(&self, base: &PolygonStyle) -> PolygonStyle {
        fn pick<T: Clone>(over: &Option<Option<T>>, base: &Option<T>) -> Option<T> {
            match over {
                Some(value) => value.clone(),
                None => base.clone(),
            }
        }
        PolygonStyle {
            fill: pick(&self.fill, &base.fill),
            stroke: pick(&self.stroke, &base.stroke),
            line_width: pick(&self.line_width, &base.line_width),
            dash: pick(&self.dash, &base.dash),
            line_cap: pick(&self.line_cap, &base.line_cap),
            line_join: pick(&self.line_join, &base.line_join),
        }
    }
}

impl PolygonStyle {
    pub fn filled(fill: Rgba) -> Self {
        Self {
            fill: Some(fill),
            ..Default::default()
        }
    }

    pub fn stroked(stroke: Rgba, line_width: f64) -> Self {
        Self {
            stroke: Some(stroke),
            line_width: Some(line_width),
            ..Default::default()
        }
    }

    /// Whether painting with this style would draw anything at all.
    pub fn is_visible(&self) -> bool {
        self.fill.is_some() || (self.stroke.is_some() && self.line_width.map_or(true, |w| w > 0.0))
    }

    /// Stroke settings for the given width. Width 0 is a one pixel hairline.
    pub fn to_stroke(&self, width: f64) -> Stroke {
        let mut stroke = Stroke {
            width: width as f32,
            ..Default::default()
        };
        if let Some(cap) = self.line_cap {
            stroke.line_cap = match cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            };
        }
        if let Some(join) = self.line_join {
            stroke.line_join = match join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            };
        }
        if let Some(dash) = &self.dash {
            // An odd-length pattern repeats to alternate on and off.
            let mut pattern: Vec<f32> = dash.iter().map(|&d| d as f32).collect();
            if pattern.len() % 2 == 1 {
                pattern.extend_from_within(..);
            }
            stroke.dash = StrokeDash::new(pattern, 0.0);
        }
        stroke
    }

    /// Fill `path` with this style's fill colour, shaded by `shade`.
    /// Returns whether anything was drawn.
    pub fn fill_path(
        &self,
        pixmap: &mut Pixmap,
        path: &Path,
        transform: Transform,
        shade: &dyn Fn(Rgba) -> Shader<'static>,
    ) -> bool {
        let Some(fill) = self.fill else {
            return false;
        };
        let paint = Paint {
            shader: shade(fill),
            anti_alias: true,
            ..Default::default()
        };
        pixmap.fill_path(path, &paint, FillRule::Winding, transform, None);
        true
    }

    /// Outline `path` with this style's stroke colour and line width.
    pub fn stroke_path(
        &self,
        pixmap: &mut Pixmap,
        path: &Path,
        transform: Transform,
        shade: &dyn Fn(Rgba) -> Shader<'static>,
    ) -> bool {
        let width = self.line_width.unwrap_or(0.0);
        if self.line_width.is_some() && width <= 0.0 {
            return false;
        }
        self.stroke_path_with_width(pixmap, path, transform, width, shade)
    }

    /// Outline `path` with this style's stroke colour but an explicit width.
    /// Non-positive widths draw nothing.
    pub fn stroke_path_with_width(
        &self,
        pixmap: &mut Pixmap,
        path: &Path,
        transform: Transform,
        width: f64,
        shade: &dyn Fn(Rgba) -> Shader<'static>,
    ) -> bool {
        let Some(colour) = self.stroke else {
            return false;
        };
        if width < 0.0 || (width == 0.0 && self.line_width.is_some()) {
            return false;
        }
        let paint = Paint {
            shader: shade(colour),
            anti_alias: true,
            ..Default::default()
        };
        pixmap.stroke_path(path, &paint, &self.to_stroke(width), transform, None);
        true
    }

    /// Fill then stroke `path` in solid colours.
    pub fn paint(&self, pixmap: &mut Pixmap, path: &Path, transform: Transform) -> bool {
        let filled = self.fill_path(pixmap, path, transform, &solid);
        let stroked = self.stroke_path(pixmap, path, transform, &solid);
        filled || stroked
    }
}

/// Shade with a flat colour.
pub fn solid(colour: Rgba) -> Shader<'static> {
    Shader::SolidColor(colour.to_color())
}

/// A default [`PolygonStyle`] plus per-object overrides keyed by `K`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    from = "StyleRepr<K>",
    into = "StyleRepr<K>",
    bound(
        serialize = "K: Serialize + Clone + Eq + Hash",
        deserialize = "K: Deserialize<'de> + Eq + Hash"
    )
)]
pub struct Style<K> {
    defaults: PolygonStyle,
    exceptions: HashMap<K, StyleOverride>,
}

impl<K> Default for Style<K> {
    fn default() -> Self {
        Self {
            defaults: PolygonStyle::default(),
            exceptions: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Style<K> {
    pub fn new(defaults: PolygonStyle) -> Self {
        Self {
            defaults,
            exceptions: HashMap::new(),
        }
    }

    pub fn defaults(&self) -> &PolygonStyle {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut PolygonStyle {
        &mut self.defaults
    }

    pub fn set_default(&mut self, defaults: PolygonStyle) {
        self.defaults = defaults;
    }

    /// The style to draw `key` with.
    pub fn get(&self, key: &K) -> PolygonStyle {
        match self.exceptions.get(key) {
            Some(over) => over.apply(&self.defaults),
            None => self.defaults.clone(),
        }
    }

    pub fn exception(&self, key: &K) -> Option<&StyleOverride> {
        self.exceptions.get(key)
    }

    /// The override for `key`, created empty if absent.
    pub fn exception_mut(&mut self, key: K) -> &mut StyleOverride {
        self.exceptions.entry(key).or_default()
    }

    pub fn has_exception(&self, key: &K) -> bool {
        self.exceptions.contains_key(key)
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }
}

#[derive(Serialize, Deserialize)]
struct ExceptionRepr<K> {
    key: K,
    #[serde(flatten)]
    style: StyleOverride,
}

#[derive(Serialize, Deserialize)]
struct StyleRepr<K> {
    #[serde(default)]
    defaults: PolygonStyle,
    #[serde(default = "Vec::new")]
    exceptions: Vec<ExceptionRepr<K>>,
}

impl<K: Eq + Hash> From<StyleRepr<K>> for Style<K> {
    fn from(repr: StyleRepr<K>) -> Self {
        Self {
            defaults: repr.defaults,
            exceptions: repr
                .exceptions
                .into_iter()
                .map(|e| (e.key, e.style))
                .collect(),
        }
    }
}

impl<K> From<Style<K>> for StyleRepr<K> {
    fn from(style: Style<K>) -> Self {
        Self {
            defaults: style.defaults,
            exceptions: style
                .exceptions
                .into_iter()
                .map(|(key, style)| ExceptionRepr { key, style })
                .collect(),
        }
    }
}

// ── Style keys ───────────────────────────────────────────────────────

/// What a core is being used for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreOwner {
    Vertex(VertexId),
    Constraint(ConstraintId),
}

/// Chips are styled by position.
pub type ChipStyle = Style<ChipXY>;
/// Links are styled by the chip they leave and their direction.
pub type LinkStyle = Style<(u32, u32, Link)>;
/// Cores are styled by owner; `None` styles unused cores.
pub type CoreStyle = Style<Option<CoreOwner>>;
/// Nets are styled by index.
pub type NetStyle = Style<NetId>;

pub fn default_chip_style() -> ChipStyle {
    Style::new(PolygonStyle::stroked(Rgba::BLACK, 0.05))
}

pub fn default_link_style() -> LinkStyle {
    Style::new(PolygonStyle {
        fill: Some(Rgba(0.5, 0.5, 0.5, 0.2)),
        stroke: Some(Rgba(0.5, 0.5, 0.5, 0.25)),
        line_width: Some(0.025),
        ..Default::default()
    })
}

pub fn default_core_style() -> CoreStyle {
    let mut style = Style::new(PolygonStyle::filled(Rgba(0.0, 0.0, 1.0, 1.0)));
    style.exception_mut(None).fill = Some(Some(Rgba(0.85, 0.85, 0.85, 1.0)));
    style
}

/// Net widths come from their weights, so only the colour is set here.
pub fn default_net_style() -> NetStyle {
    Style::new(PolygonStyle {
        stroke: Some(Rgba(1.0, 0.0, 0.0, 1.0)),
        ..Default::default()
    })
}
