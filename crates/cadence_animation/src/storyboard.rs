//! Storyboards
//!
//! A [`Storyboard`] is a group timeline: it runs its children in parallel and
//! is the unit that applications begin, stop, pause and seek. Storyboards can
//! be nested; only the outermost one is controllable.
//!
//! Target metadata (`Target`, `TargetName`, `TargetProperty`) is attached to
//! any timeline through the static accessors on [`Storyboard`] and inherited by
//! descendants that do not set their own.
//!
//! ```
//! use cadence_animation::{DoubleAnimation, Storyboard};
//! use cadence_core::DependencyObject;
//!
//! let rect = DependencyObject::create("Rectangle").unwrap();
//! let sb = Storyboard::new();
//! let width = DoubleAnimation::new().from(10.0).to(100.0).into_timeline();
//! Storyboard::set_target(&width, &rect);
//! Storyboard::set_target_property(&width, "Width").unwrap();
//! sb.add_child(width).unwrap();
//! assert_eq!(sb.children().len(), 1);
//! ```

use cadence_core::{ObjectRef, Resource};
use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{AnimationError, Result};
use crate::property_path::PropertyPath;
use crate::timeline::{Timeline, TimelineCollection};

/// A controllable group of timelines
#[derive(Clone, Debug)]
pub struct Storyboard {
    timeline: Timeline,
}

impl Storyboard {
    pub fn new() -> Self {
        Self {
            timeline: Timeline::group(),
        }
    }

    /// View a group timeline as a storyboard
    pub fn from_timeline(timeline: Timeline) -> Option<Self> {
        timeline.is_group().then_some(Self { timeline })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    pub fn children(&self) -> &TimelineCollection {
        match self.timeline.children() {
            Some(children) => children,
            None => unreachable!("storyboard timelines are always groups"),
        }
    }

    pub fn add_child(&self, child: impl Into<Timeline>) -> Result<()> {
        self.children().add(child)
    }

    // =========================================================================
    // Target metadata
    // =========================================================================

    /// Set the object `timeline` (and descendants without their own target)
    /// animates
    ///
    /// The timeline does not keep the target alive.
    pub fn set_target(timeline: &Timeline, target: &ObjectRef) {
        timeline.set_target_object(Some(target));
    }

    pub fn get_target(timeline: &Timeline) -> Option<ObjectRef> {
        timeline.metadata().target
    }

    pub fn clear_target(timeline: &Timeline) {
        timeline.set_target_object(None);
    }

    /// Set the name resolved to a target object when the timeline begins
    pub fn set_target_name(timeline: &Timeline, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(AnimationError::InvalidArgument(
                "target name cannot be empty".to_string(),
            ));
        }
        timeline.set_target_name_value(Some(name));
        Ok(())
    }

    pub fn get_target_name(timeline: &Timeline) -> Option<String> {
        timeline.metadata().target_name
    }

    pub fn clear_target_name(timeline: &Timeline) {
        timeline.set_target_name_value(None);
    }

    /// Set the property path animated on the resolved target
    pub fn set_target_property(timeline: &Timeline, path: impl Into<PropertyPath>) -> Result<()> {
        let path = path.into();
        if path.is_empty() {
            return Err(AnimationError::InvalidArgument(
                "target property path cannot be empty".to_string(),
            ));
        }
        timeline.set_target_property_value(Some(path));
        Ok(())
    }

    pub fn get_target_property(timeline: &Timeline) -> Option<PropertyPath> {
        timeline.metadata().target_property
    }

    pub fn clear_target_property(timeline: &Timeline) {
        timeline.set_target_property_value(None);
    }
}

impl Default for Storyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Storyboard {
    type Target = Timeline;

    fn deref(&self) -> &Timeline {
        &self.timeline
    }
}

impl From<Storyboard> for Timeline {
    fn from(storyboard: Storyboard) -> Self {
        storyboard.timeline
    }
}

impl PartialEq for Storyboard {
    fn eq(&self, other: &Self) -> bool {
        self.timeline == other.timeline
    }
}

impl Eq for Storyboard {}

/// Stored in a resource dictionary, a storyboard resolves `TargetName`
/// against the dictionary's owner.
impl Resource for Storyboard {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn resource_name(&self) -> Option<String> {
        self.timeline.name()
    }

    fn on_attached(&self, owner: &ObjectRef) {
        self.timeline.set_scope(Some(owner));
    }

    fn on_detached(&self, owner: Option<&ObjectRef>) {
        let Some(owner) = owner else {
            return;
        };
        let is_scope = self
            .timeline
            .scope()
            .is_some_and(|scope| Arc::ptr_eq(&scope, owner));
        // Still stored under another key
        let still_held = owner.resources().values().iter().any(|resource| {
            resource
                .as_any()
                .downcast_ref::<Storyboard>()
                .is_some_and(|other| other == self)
        });
        if is_scope && !still_held {
            self.timeline.set_scope(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::DoubleAnimation;
    use cadence_core::DependencyObject;
    use std::sync::Arc;

    #[test]
    fn test_target_accessors() {
        let rect = DependencyObject::create("Rectangle").unwrap();
        let anim = DoubleAnimation::new().to(1.0).into_timeline();

        assert!(Storyboard::get_target(&anim).is_none());
        Storyboard::set_target(&anim, &rect);
        assert!(Arc::ptr_eq(&Storyboard::get_target(&anim).unwrap(), &rect));
        Storyboard::clear_target(&anim);
        assert!(Storyboard::get_target(&anim).is_none());

        Storyboard::set_target_name(&anim, "A").unwrap();
        assert_eq!(Storyboard::get_target_name(&anim).as_deref(), Some("A"));
        Storyboard::clear_target_name(&anim);
        assert_eq!(Storyboard::get_target_name(&anim), None);

        Storyboard::set_target_property(&anim, "Width").unwrap();
        assert_eq!(
            Storyboard::get_target_property(&anim).unwrap().text(),
            Some("Width")
        );
    }

    #[test]
    fn test_empty_metadata_is_rejected() {
        let anim = DoubleAnimation::new().into_timeline();
        assert!(matches!(
            Storyboard::set_target_name(&anim, ""),
            Err(AnimationError::InvalidArgument(_))
        ));
        assert!(matches!(
            Storyboard::set_target_property(&anim, " "),
            Err(AnimationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_target_is_held_weakly() {
        let anim = DoubleAnimation::new().into_timeline();
        let rect = DependencyObject::create("Rectangle").unwrap();
        Storyboard::set_target(&anim, &rect);
        drop(rect);
        assert!(Storyboard::get_target(&anim).is_none());
    }

    #[test]
    fn test_timeline_round_trip() {
        let sb = Storyboard::new();
        let timeline: Timeline = sb.clone().into();
        assert_eq!(Storyboard::from_timeline(timeline), Some(sb));
        assert!(Storyboard::from_timeline(DoubleAnimation::new().into_timeline()).is_none());
    }

    #[test]
    fn test_resource_scope_follows_dictionary() {
        let canvas = DependencyObject::create("Canvas").unwrap();
        let sb = Storyboard::new();
        sb.set_name("intro");

        canvas
            .resources()
            .insert("Storyboard", Arc::new(sb.clone()));
        assert!(Arc::ptr_eq(&sb.scope().unwrap(), &canvas));
        assert_eq!(sb.resource_name().as_deref(), Some("intro"));

        canvas.resources().remove("Storyboard");
        assert!(sb.scope().is_none());
    }

    #[test]
    fn test_detach_keeps_newer_scope() {
        let canvas = DependencyObject::create("Canvas").unwrap();
        let panel = DependencyObject::create("Canvas").unwrap();
        let sb = Storyboard::new();

        canvas.resources().insert("first", Arc::new(sb.clone()));
        canvas.resources().insert("second", Arc::new(sb.clone()));
        canvas.resources().remove("first");
        assert!(Arc::ptr_eq(&sb.scope().unwrap(), &canvas));

        panel.resources().insert("moved", Arc::new(sb.clone()));
        canvas.resources().clear();
        assert!(Arc::ptr_eq(&sb.scope().unwrap(), &panel));

        panel.resources().remove("moved");
        assert!(sb.scope().is_none());
    }
}
