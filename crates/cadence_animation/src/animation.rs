//! From/To/By animations
//!
//! An [`Animation`] describes how one property value moves over a single
//! iteration. It becomes part of a timeline tree through
//! [`Animation::into_timeline`] and is sampled by its clock on every tick.
//!
//! | From | To | By | Start | End |
//! |------|----|----|-------|-----|
//! | set  | set | - | from  | to |
//! | set  | -  | set | from | from + by |
//! | set  | -  | -  | from  | base |
//! | -    | set | - | base  | to |
//! | -    | -  | set | base | base + by |
//! | -    | -  | -  | base  | base |
//!
//! `base` is the property's value captured when the timeline begins. `To`
//! takes precedence over `By` when both are set.

use cadence_core::{Color, Point, Value, ValueKind};
use std::fmt::Debug;
use std::sync::Arc;

use crate::easing::Easing;
use crate::timeline::Timeline;
use crate::values::Animatable;

/// Type-erased sampling interface used by animation clocks
pub(crate) trait AnimationCurve: Debug + Send + Sync {
    fn value_kind(&self) -> ValueKind;

    /// Value at `progress` (0.0 to 1.0) given the captured base value
    ///
    /// Returns `None` when the base cannot be read as this animation's type.
    fn sample(&self, base: &Value, progress: f64) -> Option<Value>;
}

/// Interpolating animation for a value of type `T`
#[derive(Clone, Debug, Default)]
pub struct Animation<T: Animatable> {
    from: Option<T>,
    to: Option<T>,
    by: Option<T>,
    easing: Easing,
}

/// Animates `Double` properties
pub type DoubleAnimation = Animation<f64>;

/// Animates `Color` properties
pub type ColorAnimation = Animation<Color>;

/// Animates `Point` properties
pub type PointAnimation = Animation<Point>;

impl<T: Animatable> Animation<T> {
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            by: None,
            easing: Easing::Linear,
        }
    }

    pub fn from(mut self, value: T) -> Self {
        self.from = Some(value);
        self
    }

    pub fn to(mut self, value: T) -> Self {
        self.to = Some(value);
        self
    }

    pub fn by(mut self, value: T) -> Self {
        self.by = Some(value);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn from_value(&self) -> Option<&T> {
        self.from.as_ref()
    }

    pub fn to_value(&self) -> Option<&T> {
        self.to.as_ref()
    }

    pub fn by_value(&self) -> Option<&T> {
        self.by.as_ref()
    }

    pub fn easing_function(&self) -> Easing {
        self.easing
    }

    /// Wrap the animation in a leaf timeline
    pub fn into_timeline(self) -> Timeline {
        Timeline::animation(Arc::new(self))
    }

    fn endpoints(&self, base: &T) -> (T, T) {
        let start = self.from.clone().unwrap_or_else(|| base.clone());
        let end = match (&self.to, &self.by) {
            (Some(to), _) => to.clone(),
            (None, Some(by)) => start.add(by),
            (None, None) if self.from.is_some() => base.clone(),
            (None, None) => start.clone(),
        };
        (start, end)
    }

    /// Value at `progress` given a base value
    pub fn sample_at(&self, base: &T, progress: f64) -> T {
        let (start, end) = self.endpoints(base);
        start.lerp(&end, self.easing.apply(progress))
    }
}

impl<T: Animatable> AnimationCurve for Animation<T> {
    fn value_kind(&self) -> ValueKind {
        T::KIND
    }

    fn sample(&self, base: &Value, progress: f64) -> Option<Value> {
        let base = match (T::from_value(base), &self.from) {
            (Some(base), _) => base,
            // An unset nullable base still animates when From is explicit
            (None, Some(from)) => from.clone(),
            (None, None) => return None,
        };
        Some(self.sample_at(&base, progress).to_value())
    }
}

impl<T: Animatable> From<Animation<T>> for Timeline {
    fn from(animation: Animation<T>) -> Self {
        animation.into_timeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Interpolate;

    #[test]
    fn test_from_to() {
        let anim = DoubleAnimation::new().from(5.0).to(100.0);
        assert_eq!(anim.sample_at(&0.0, 0.0), 5.0);
        assert_eq!(anim.sample_at(&0.0, 1.0), 100.0);
        assert!(anim.sample_at(&0.0, 0.5).approx_eq(&52.5, 1e-9));
    }

    #[test]
    fn test_by_starts_from_base() {
        let anim = DoubleAnimation::new().by(10.0);
        assert_eq!(anim.sample_at(&40.0, 0.0), 40.0);
        assert_eq!(anim.sample_at(&40.0, 1.0), 50.0);
    }

    #[test]
    fn test_from_by() {
        let anim = DoubleAnimation::new().from(5.0).by(10.0);
        assert_eq!(anim.sample_at(&100.0, 1.0), 15.0);
    }

    #[test]
    fn test_from_only_returns_to_base() {
        let anim = DoubleAnimation::new().from(20.0);
        assert_eq!(anim.sample_at(&0.0, 0.0), 20.0);
        assert_eq!(anim.sample_at(&0.0, 1.0), 0.0);
    }

    #[test]
    fn test_to_only_and_to_wins_over_by() {
        let anim = DoubleAnimation::new().to(50.0);
        assert_eq!(anim.sample_at(&10.0, 0.0), 10.0);
        assert_eq!(anim.sample_at(&10.0, 1.0), 50.0);

        let anim = DoubleAnimation::new().to(50.0).by(1000.0);
        assert_eq!(anim.sample_at(&10.0, 1.0), 50.0);
    }

    #[test]
    fn test_empty_animation_holds_base() {
        let anim = DoubleAnimation::new();
        assert_eq!(anim.sample_at(&7.0, 0.3), 7.0);
    }

    #[test]
    fn test_easing_is_applied() {
        let anim = DoubleAnimation::new()
            .from(0.0)
            .to(100.0)
            .easing(Easing::QuadraticIn);
        assert!(anim.sample_at(&0.0, 0.5).approx_eq(&25.0, 1e-9));
    }

    #[test]
    fn test_curve_sampling_checks_kind() {
        let anim = ColorAnimation::new().to(Color::BLUE);
        assert_eq!(anim.value_kind(), ValueKind::Color);
        assert_eq!(
            anim.sample(&Value::Color(Color::BLACK), 1.0),
            Some(Value::Color(Color::BLUE))
        );
        assert_eq!(anim.sample(&Value::Double(1.0), 1.0), None);

        let point = PointAnimation::new()
            .from(Point::new(0.0, 0.0))
            .to(Point::new(2.0, 4.0));
        assert_eq!(
            point.sample(&Value::Null, 0.5),
            Some(Value::Point(Point::new(1.0, 2.0)))
        );
    }
}
