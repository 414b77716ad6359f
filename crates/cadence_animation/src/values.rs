//! Animatable value types
//!
//! Provides traits and implementations for values that can be animated,
//! including linear interpolation for points and colors.

use cadence_core::{Color, Point, Value, ValueKind};
use std::fmt::Debug;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

/// A value an [`Animation`](crate::Animation) can drive
///
/// On top of interpolation, an animatable value can be added (for `By`
/// animations) and converted to and from the [`Value`] stored in a property.
pub trait Animatable: Interpolate + Debug + Send + Sync + 'static {
    /// The property kind this type is stored as
    const KIND: ValueKind;

    fn add(&self, other: &Self) -> Self;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

// ============================================================================
// f64 Implementation
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Animatable for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_double()
    }
}

// ============================================================================
// Point Implementation
// ============================================================================

impl Interpolate for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Animatable for Point {
    const KIND: ValueKind = ValueKind::Point;

    fn add(&self, other: &Self) -> Self {
        Point::new(self.x + other.x, self.y + other.y)
    }

    fn to_value(&self) -> Value {
        Value::Point(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_point()
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Color::lerp(self, other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        let epsilon = epsilon as f32;
        (self.r - other.r).abs() < epsilon
            && (self.g - other.g).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
    }
}

impl Animatable for Color {
    const KIND: ValueKind = ValueKind::Color;

    fn add(&self, other: &Self) -> Self {
        self.saturating_add(other)
    }

    fn to_value(&self) -> Value {
        Value::Color(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_color()
    }
}
