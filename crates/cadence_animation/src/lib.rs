//! Cadence Animation System
//!
//! Declarative storyboards driven by a frame-ticked clock scheduler.
//!
//! # Features
//!
//! - **Timelines**: leaf animations and nested storyboards with durations and repeat counts
//! - **Typed Animations**: From/To/By animations for doubles, colors and points, with easing
//! - **Targeting**: attached `Target`, `TargetName` and `TargetProperty` metadata, inherited down the tree
//! - **Property Paths**: `(Type.Member)` traversal, indexers and attached properties
//! - **Clocks**: per-timeline runtime state (`Stopped`, `Active`, `Filling`) with repeat and fill
//! - **Scheduler**: one tick advances every running tree; `Completed` fires child-before-parent
//!
//! # Example
//!
//! ```rust
//! use cadence_animation::{AnimationScheduler, ClockState, DoubleAnimation, Storyboard};
//! use cadence_core::DependencyObject;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let canvas = DependencyObject::create("Canvas").unwrap();
//! let rect = DependencyObject::create("Rectangle").unwrap().with_name("A");
//! canvas.add_item(rect.clone()).unwrap();
//!
//! let sb = Storyboard::new();
//! let grow = DoubleAnimation::new()
//!     .to(100.0)
//!     .into_timeline()
//!     .with_duration(Duration::from_secs(1));
//! Storyboard::set_target_name(&grow, "A").unwrap();
//! Storyboard::set_target_property(&grow, "Width").unwrap();
//! sb.add_child(grow).unwrap();
//! canvas.resources().insert("grow", Arc::new(sb.clone()));
//!
//! let scheduler = AnimationScheduler::new();
//! sb.begin_on(&scheduler.handle()).unwrap();
//! scheduler.tick_by(Duration::from_secs(1));
//!
//! assert_eq!(sb.current_state(), ClockState::Filling);
//! assert_eq!(rect.get("Width").unwrap().as_double(), Some(100.0));
//! ```

pub mod animation;
mod clock;
pub mod config;
pub mod duration;
pub mod easing;
pub mod error;
pub mod property_path;
pub mod scheduler;
pub mod storyboard;
mod target;
pub mod timeline;
pub mod values;

pub use animation::{Animation, ColorAnimation, DoubleAnimation, PointAnimation};
pub use clock::ClockState;
pub use config::SchedulerConfig;
pub use duration::{RepeatBehavior, TimelineDuration};
pub use easing::Easing;
pub use error::{AnimationError, PathError, Result};
pub use property_path::{parse_path, Member, PathSegment, PropertyPath, PropertyTarget};
pub use scheduler::{
    get_scheduler, is_scheduler_initialized, set_global_scheduler, try_get_scheduler,
    AnimationScheduler, SchedulerHandle,
};
pub use storyboard::Storyboard;
pub use timeline::{CompletedHandlerId, Timeline, TimelineCollection, TimelineId};
pub use values::{Animatable, Interpolate};
