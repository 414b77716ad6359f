//! Property values
//!
//! Everything stored in a [`DependencyObject`](crate::DependencyObject) property slot
//! is a [`Value`]. Animatable payloads (`Double`, `Color`, `Point`) sit next to
//! the structural ones (`Object`, `String`, `Null`) so that a single storage map
//! can hold both leaf values and references to sub-objects.

use std::fmt;
use std::sync::Arc;

use crate::object::ObjectRef;

// ============================================================================
// Color
// ============================================================================

/// RGBA color with components in the 0.0 to 1.0 range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Linear interpolation between two colors
    ///
    /// `t` is not clamped: animations with overshooting easing may extrapolate,
    /// and the result is clamped per channel instead.
    pub fn lerp(a: &Color, b: &Color, t: f64) -> Color {
        let t = t as f32;
        Color {
            r: (a.r + (b.r - a.r) * t).clamp(0.0, 1.0),
            g: (a.g + (b.g - a.g) * t).clamp(0.0, 1.0),
            b: (a.b + (b.b - a.b) * t).clamp(0.0, 1.0),
            a: (a.a + (b.a - a.a) * t).clamp(0.0, 1.0),
        }
    }

    /// Channel-wise sum, saturating at 1.0
    pub fn saturating_add(&self, other: &Color) -> Color {
        Color {
            r: (self.r + other.r).min(1.0),
            g: (self.g + other.g).min(1.0),
            b: (self.b + other.b).min(1.0),
            a: (self.a + other.a).min(1.0),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02X}{:02X}{:02X}{:02X}",
            channel(self.a),
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

// ============================================================================
// Point
// ============================================================================

/// 2D point in logical units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Value
// ============================================================================

/// The kind of payload a property accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Double,
    Color,
    Point,
    String,
    Object,
}

impl ValueKind {
    /// Whether `Value::Null` is a legal value for this kind
    pub fn is_nullable(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Object)
    }
}

/// A property value
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Double(f64),
    Color(Color),
    Point(Point),
    String(String),
    Object(ObjectRef),
}

impl Value {
    /// The kind of this value, `None` for `Null`
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Double(_) => Some(ValueKind::Double),
            Value::Color(_) => Some(ValueKind::Color),
            Value::Point(_) => Some(ValueKind::Point),
            Value::String(_) => Some(ValueKind::String),
            Value::Object(_) => Some(ValueKind::Object),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::Point(a), Value::Point(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Value::Object(Arc::clone(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_lerp_clamps_channels() {
        let mid = Color::lerp(&Color::BLACK, &Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);

        let over = Color::lerp(&Color::BLACK, &Color::WHITE, 1.5);
        assert_eq!(over, Color::WHITE);
    }

    #[test]
    fn test_color_display_is_argb_hex() {
        assert_eq!(Color::BLUE.to_string(), "#FF0000FF");
        assert_eq!(Color::from_hex(0xFF8000).to_string(), "#FFFF8000");
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::from(1.0).kind(), Some(ValueKind::Double));
        assert_eq!(Value::from(Color::RED).kind(), Some(ValueKind::Color));
        assert_eq!(Value::Null.kind(), None);
        assert!(ValueKind::Object.is_nullable());
        assert!(!ValueKind::Double.is_nullable());
    }
}
