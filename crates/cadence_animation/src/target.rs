//! Activation planning
//!
//! Before a tree is handed to the clock arena, every animation leaf is bound to
//! exactly one property location. Planning only reads the object graph; any
//! failure aborts `begin` before a single property is written.

use cadence_core::{ObjectRef, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;

use crate::animation::AnimationCurve;
use crate::config::SchedulerConfig;
use crate::duration::{RepeatBehavior, TimelineDuration};
use crate::error::{AnimationError, Result};
use crate::property_path::{PropertyPath, PropertyTarget};
use crate::timeline::{Timeline, TimelineKind};

/// A leaf's resolved write location and the value it held before `begin`
pub(crate) struct AnimationBinding {
    pub target: PropertyTarget,
    pub curve: Arc<dyn AnimationCurve>,
    pub base: Value,
}

pub(crate) struct PlannedClock {
    pub timeline: Timeline,
    pub parent: Option<usize>,
    pub children: SmallVec<[usize; 4]>,
    /// Length of one iteration, `None` when unbounded
    pub natural: Option<Duration>,
    pub repeat: RepeatBehavior,
    pub animation: Option<AnimationBinding>,
}

/// Flattened clock tree; node 0 is the root and parents precede children
pub(crate) struct ActivationPlan {
    pub nodes: Vec<PlannedClock>,
}

impl ActivationPlan {
    pub fn timelines(&self) -> impl Iterator<Item = &Timeline> {
        self.nodes.iter().map(|node| &node.timeline)
    }
}

#[derive(Clone)]
enum TargetSpec {
    Object(ObjectRef),
    Name(String),
}

#[derive(Clone, Default)]
struct Inherited {
    target: Option<TargetSpec>,
    /// Nearest explicit `Target`, used when a nearer name does not resolve
    fallback: Option<ObjectRef>,
    property: Option<PropertyPath>,
}

struct Planner<'a> {
    scope: Option<ObjectRef>,
    config: &'a SchedulerConfig,
    nodes: Vec<PlannedClock>,
    claimed: FxHashMap<(cadence_core::ObjectId, cadence_core::PropertyId), Timeline>,
    leaves: usize,
}

/// Resolve targets and timing for the tree rooted at `root`
///
/// Returns `Ok(None)` when the tree contains no animations.
pub(crate) fn plan_activation(
    root: &Timeline,
    config: &SchedulerConfig,
) -> Result<Option<ActivationPlan>> {
    let scope = root.metadata().target.or_else(|| root.scope());
    let mut planner = Planner {
        scope,
        config,
        nodes: Vec::new(),
        claimed: FxHashMap::default(),
        leaves: 0,
    };
    planner.visit(root, None, &Inherited::default())?;

    if planner.leaves == 0 {
        return Ok(None);
    }
    Ok(Some(ActivationPlan {
        nodes: planner.nodes,
    }))
}

impl Planner<'_> {
    fn visit(&mut self, timeline: &Timeline, parent: Option<usize>, inherited: &Inherited) -> Result<usize> {
        let metadata = timeline.metadata();
        let inherited = Inherited {
            target: match (&metadata.target, metadata.target_name) {
                (Some(target), _) => Some(TargetSpec::Object(target.clone())),
                (None, Some(name)) => Some(TargetSpec::Name(name)),
                (None, None) => inherited.target.clone(),
            },
            fallback: metadata.target.or_else(|| inherited.fallback.clone()),
            property: metadata.target_property.or_else(|| inherited.property.clone()),
        };

        let index = self.nodes.len();
        self.nodes.push(PlannedClock {
            timeline: timeline.clone(),
            parent,
            children: SmallVec::new(),
            natural: None,
            repeat: timeline.repeat_behavior(),
            animation: None,
        });

        let natural = match timeline.kind() {
            TimelineKind::Animation(curve) => {
                let binding = self.bind(timeline, curve, &inherited)?;
                self.nodes[index].animation = Some(binding);
                self.leaves += 1;
                match timeline.duration() {
                    TimelineDuration::Automatic => Some(self.config.default_animation_duration()),
                    other => other.time(),
                }
            }
            TimelineKind::Group(children) => {
                let mut span = Some(Duration::ZERO);
                for child in children.iter() {
                    let child_index = self.visit(&child, Some(index), &inherited)?;
                    self.nodes[index].children.push(child_index);
                    let node = &self.nodes[child_index];
                    let child_span = node.repeat.active_span(node.natural);
                    span = match (span, child_span) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        _ => None,
                    };
                }
                match timeline.duration() {
                    TimelineDuration::Automatic => span,
                    other => other.time(),
                }
            }
        };
        self.nodes[index].natural = natural;
        Ok(index)
    }

    fn bind(
        &mut self,
        timeline: &Timeline,
        curve: &Arc<dyn AnimationCurve>,
        inherited: &Inherited,
    ) -> Result<AnimationBinding> {
        let object = match &inherited.target {
            Some(TargetSpec::Object(target)) => target.clone(),
            Some(TargetSpec::Name(name)) => match self.resolve_name(name) {
                Ok(object) => object,
                Err(err) => match &inherited.fallback {
                    Some(target) => {
                        tracing::trace!(name = %name, "name unresolved; using inherited target");
                        target.clone()
                    }
                    None => return Err(err),
                },
            },
            None => return Err(AnimationError::NoTarget(timeline.describe())),
        };
        let path = inherited
            .property
            .as_ref()
            .ok_or_else(|| AnimationError::NoTargetProperty(timeline.describe()))?;
        let target = path.resolve(&object)?;

        let kind = object
            .registry()
            .property(target.property)
            .map(|info| info.kind);
        if let Some(expected) = kind {
            if expected != curve.value_kind() {
                return Err(AnimationError::TypeMismatch {
                    property: target.describe(),
                    expected,
                    animation: curve.value_kind(),
                });
            }
        }

        if let Some(owner) = self.claimed.get(&target.key()) {
            let info = object.registry().property(target.property);
            tracing::debug!(
                first = %owner.describe(),
                second = %timeline.describe(),
                "conflicting animation targets"
            );
            return Err(AnimationError::ConflictingTarget {
                target: match object.name() {
                    Some(name) => format!("{} '{name}'", object.type_name()),
                    None => format!("a {}", object.type_name()),
                },
                property: info
                    .map(|info| info.qualified_name())
                    .unwrap_or_else(|| path.to_string()),
            });
        }
        self.claimed.insert(target.key(), timeline.clone());

        let base = target.get();
        Ok(AnimationBinding {
            target,
            curve: Arc::clone(curve),
            base,
        })
    }

    fn resolve_name(&self, name: &str) -> Result<ObjectRef> {
        self.scope
            .as_ref()
            .and_then(|scope| scope.find_name(name))
            .and_then(|found| found.into_object())
            .ok_or_else(|| AnimationError::UnresolvedTargetName(name.to_string()))
    }
}
