//! Timelines
//!
//! A [`Timeline`] is the inert description of something that plays over time:
//! either a leaf animation or a group (the timeline behind a
//! [`Storyboard`](crate::Storyboard)) whose children live in a
//! [`TimelineCollection`]. Timelines are cheap handles; clones refer to the same
//! description.
//!
//! Nothing here tracks time. `begin` hands the tree to a scheduler, which
//! builds a parallel clock tree and reports state back through
//! [`Timeline::current_state`] and [`Timeline::current_time`].

use cadence_core::{DependencyObject, ObjectRef};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::animation::AnimationCurve;
use crate::clock::ClockState;
use crate::duration::{RepeatBehavior, TimelineDuration};
use crate::error::{AnimationError, Result};
use crate::property_path::PropertyPath;
use crate::scheduler::{try_get_scheduler, SchedulerHandle};

static NEXT_TIMELINE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique timeline identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimelineId(u64);

/// Handle returned by [`Timeline::on_completed`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompletedHandlerId(u64);

type CompletedHandler = Arc<dyn Fn(&Timeline) + Send + Sync>;

pub(crate) enum TimelineKind {
    Group(TimelineCollection),
    Animation(Arc<dyn AnimationCurve>),
}

/// Target metadata as set on one timeline (not inherited)
#[derive(Clone, Debug, Default)]
pub(crate) struct TargetMetadata {
    pub target: Option<ObjectRef>,
    pub target_name: Option<String>,
    pub target_property: Option<PropertyPath>,
}

#[derive(Default)]
struct TimelineState {
    name: Option<String>,
    duration: TimelineDuration,
    repeat: RepeatBehavior,
    target: Option<Weak<DependencyObject>>,
    target_name: Option<String>,
    target_property: Option<PropertyPath>,
    collection: Weak<CollectionInner>,
    scope: Weak<DependencyObject>,
    scheduler: Option<SchedulerHandle>,
}

struct TimelineInner {
    id: TimelineId,
    kind: TimelineKind,
    state: Mutex<TimelineState>,
    completed: Mutex<Vec<(CompletedHandlerId, CompletedHandler)>>,
}

/// A node in a timeline tree
#[derive(Clone)]
pub struct Timeline {
    inner: Arc<TimelineInner>,
}

impl Timeline {
    fn with_kind(kind: impl FnOnce(&Weak<TimelineInner>) -> TimelineKind) -> Self {
        let inner = Arc::new_cyclic(|this| TimelineInner {
            id: TimelineId(NEXT_TIMELINE_ID.fetch_add(1, Ordering::Relaxed)),
            kind: kind(this),
            state: Mutex::new(TimelineState::default()),
            completed: Mutex::new(Vec::new()),
        });
        Self { inner }
    }

    pub(crate) fn animation(curve: Arc<dyn AnimationCurve>) -> Self {
        Self::with_kind(|_| TimelineKind::Animation(curve))
    }

    pub(crate) fn group() -> Self {
        Self::with_kind(|this| TimelineKind::Group(TimelineCollection::owned_by(this.clone())))
    }

    pub fn id(&self) -> TimelineId {
        self.inner.id
    }

    pub(crate) fn kind(&self) -> &TimelineKind {
        &self.inner.kind
    }

    /// Whether this timeline groups children
    pub fn is_group(&self) -> bool {
        matches!(self.inner.kind, TimelineKind::Group(_))
    }

    /// The child collection of a group timeline
    pub fn children(&self) -> Option<&TimelineCollection> {
        match &self.inner.kind {
            TimelineKind::Group(children) => Some(children),
            TimelineKind::Animation(_) => None,
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn name(&self) -> Option<String> {
        self.inner.state.lock().unwrap().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.inner.state.lock().unwrap().name = Some(name.into());
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn duration(&self) -> TimelineDuration {
        self.inner.state.lock().unwrap().duration
    }

    /// Takes effect at the next `begin`
    pub fn set_duration(&self, duration: impl Into<TimelineDuration>) {
        self.inner.state.lock().unwrap().duration = duration.into();
    }

    pub fn with_duration(self, duration: impl Into<TimelineDuration>) -> Self {
        self.set_duration(duration);
        self
    }

    pub fn repeat_behavior(&self) -> RepeatBehavior {
        self.inner.state.lock().unwrap().repeat
    }

    /// Takes effect at the next `begin`
    pub fn set_repeat_behavior(&self, repeat: RepeatBehavior) {
        self.inner.state.lock().unwrap().repeat = repeat;
    }

    pub fn with_repeat_behavior(self, repeat: RepeatBehavior) -> Self {
        self.set_repeat_behavior(repeat);
        self
    }

    /// The group timeline whose child collection holds this timeline
    pub fn parent(&self) -> Option<Timeline> {
        let collection = self.inner.state.lock().unwrap().collection.upgrade()?;
        collection.owner.upgrade().map(|inner| Timeline { inner })
    }

    /// Whether this timeline can be controlled on its own
    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    fn in_collection(&self) -> bool {
        self.inner.state.lock().unwrap().collection.upgrade().is_some()
    }

    pub(crate) fn describe(&self) -> String {
        match self.name() {
            Some(name) => format!("timeline '{name}'"),
            None => format!("timeline #{}", self.inner.id.0),
        }
    }

    // =========================================================================
    // Target metadata (accessed through Storyboard)
    // =========================================================================

    pub(crate) fn metadata(&self) -> TargetMetadata {
        let state = self.inner.state.lock().unwrap();
        TargetMetadata {
            target: state.target.as_ref().and_then(Weak::upgrade),
            target_name: state.target_name.clone(),
            target_property: state.target_property.clone(),
        }
    }

    pub(crate) fn set_target_object(&self, target: Option<&ObjectRef>) {
        self.inner.state.lock().unwrap().target = target.map(Arc::downgrade);
    }

    pub(crate) fn set_target_name_value(&self, name: Option<String>) {
        self.inner.state.lock().unwrap().target_name = name;
    }

    pub(crate) fn set_target_property_value(&self, path: Option<PropertyPath>) {
        self.inner.state.lock().unwrap().target_property = path;
    }

    /// The object whose names `TargetName` is resolved against when no
    /// explicit target is set on the root
    pub(crate) fn scope(&self) -> Option<ObjectRef> {
        self.inner.state.lock().unwrap().scope.upgrade()
    }

    pub(crate) fn set_scope(&self, scope: Option<&ObjectRef>) {
        self.inner.state.lock().unwrap().scope = scope.map(Arc::downgrade).unwrap_or_default();
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Register a handler run each time this timeline's clock completes
    ///
    /// Handlers run on the scheduler's thread after the tick that produced the
    /// completion, outside of any scheduler lock, so they may call `begin` or
    /// `stop` on any timeline.
    pub fn on_completed<F>(&self, handler: F) -> CompletedHandlerId
    where
        F: Fn(&Timeline) + Send + Sync + 'static,
    {
        let id = CompletedHandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed));
        self.inner
            .completed
            .lock()
            .unwrap()
            .push((id, Arc::new(handler)));
        id
    }

    /// Returns whether the handler was registered
    pub fn remove_completed_handler(&self, id: CompletedHandlerId) -> bool {
        let mut handlers = self.inner.completed.lock().unwrap();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub(crate) fn notify_completed(&self) {
        let handlers: Vec<CompletedHandler> = self
            .inner
            .completed
            .lock()
            .unwrap()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(self);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn ensure_root(&self, operation: &str) -> Result<()> {
        match self.parent() {
            Some(parent) => Err(AnimationError::InvalidOperation(format!(
                "cannot {operation} {}: it is a child of {}",
                self.describe(),
                parent.describe()
            ))),
            None => Ok(()),
        }
    }

    pub(crate) fn bound_scheduler(&self) -> Option<SchedulerHandle> {
        self.inner
            .state
            .lock()
            .unwrap()
            .scheduler
            .clone()
            .filter(SchedulerHandle::is_alive)
    }

    pub(crate) fn bind_scheduler(&self, handle: &SchedulerHandle) {
        self.inner.state.lock().unwrap().scheduler = Some(handle.clone());
    }

    /// Start (or restart) this timeline tree
    ///
    /// Uses the scheduler the timeline last ran on, else the global one.
    pub fn begin(&self) -> Result<()> {
        self.ensure_root("begin")?;
        let handle = self
            .bound_scheduler()
            .or_else(try_get_scheduler)
            .ok_or(AnimationError::SchedulerUnavailable)?;
        handle.activate(self)
    }

    /// Start (or restart) this timeline tree on a specific scheduler
    pub fn begin_on(&self, scheduler: &SchedulerHandle) -> Result<()> {
        self.ensure_root("begin")?;
        scheduler.activate(self)
    }

    /// Stop the tree, reverting animated properties
    pub fn stop(&self) -> Result<()> {
        self.ensure_root("stop")?;
        if let Some(handle) = self.bound_scheduler() {
            handle.stop(self);
        }
        Ok(())
    }

    /// Freeze the tree's time; the state stays `Active`
    pub fn pause(&self) -> Result<()> {
        self.ensure_root("pause")?;
        if let Some(handle) = self.bound_scheduler() {
            handle.set_paused(self, true);
        }
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        self.ensure_root("resume")?;
        if let Some(handle) = self.bound_scheduler() {
            handle.set_paused(self, false);
        }
        Ok(())
    }

    /// Jump to `offset` from the start of the tree
    ///
    /// Completions crossed by the jump are delivered on the next tick.
    pub fn seek(&self, offset: Duration) -> Result<()> {
        self.ensure_root("seek")?;
        if let Some(handle) = self.bound_scheduler() {
            handle.seek(self, offset);
        }
        Ok(())
    }

    pub fn current_state(&self) -> ClockState {
        self.bound_scheduler()
            .map(|handle| handle.state(self))
            .unwrap_or_default()
    }

    /// Time within the current iteration
    pub fn current_time(&self) -> Duration {
        self.bound_scheduler()
            .map(|handle| handle.current_time(self))
            .unwrap_or_default()
    }

    /// Whether the tree this timeline runs in is paused
    pub fn is_paused(&self) -> bool {
        self.bound_scheduler()
            .map(|handle| handle.is_paused(self))
            .unwrap_or(false)
    }
}

impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Timeline {}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock().unwrap();
        let mut debug = f.debug_struct("Timeline");
        debug
            .field("id", &self.inner.id)
            .field("name", &state.name)
            .field("duration", &state.duration)
            .field("repeat", &state.repeat);
        match &self.inner.kind {
            TimelineKind::Group(children) => debug.field("children", &children.len()),
            TimelineKind::Animation(curve) => debug.field("animation", curve),
        };
        debug.finish()
    }
}

// ============================================================================
// TimelineCollection
// ============================================================================

struct CollectionInner {
    owner: Weak<TimelineInner>,
    items: Mutex<Vec<Timeline>>,
}

/// Ordered children of a group timeline
///
/// A timeline can sit in at most one collection at a time. Edits to a
/// collection whose tree is running take effect at the next `begin`.
#[derive(Clone)]
pub struct TimelineCollection {
    inner: Arc<CollectionInner>,
}

impl TimelineCollection {
    /// A collection not owned by any timeline
    pub fn new() -> Self {
        Self::owned_by(Weak::new())
    }

    fn owned_by(owner: Weak<TimelineInner>) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                owner,
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The group timeline that owns this collection
    pub fn owner(&self) -> Option<Timeline> {
        self.inner.owner.upgrade().map(|inner| Timeline { inner })
    }

    fn check_insertable(&self, timeline: &Timeline) -> Result<()> {
        if timeline.in_collection() {
            return Err(AnimationError::AlreadyInCollection);
        }
        let mut ancestor = self.owner();
        while let Some(current) = ancestor {
            if current == *timeline {
                return Err(AnimationError::InvalidOperation(format!(
                    "adding {} to its own descendant would create a cycle",
                    timeline.describe()
                )));
            }
            ancestor = current.parent();
        }
        Ok(())
    }

    fn adopt(&self, timeline: &Timeline) {
        timeline.inner.state.lock().unwrap().collection = Arc::downgrade(&self.inner);
    }

    fn release(&self, timeline: &Timeline) {
        let mut state = timeline.inner.state.lock().unwrap();
        if std::ptr::eq(state.collection.as_ptr(), Arc::as_ptr(&self.inner)) {
            state.collection = Weak::new();
        }
    }

    pub fn add(&self, timeline: impl Into<Timeline>) -> Result<()> {
        let timeline = timeline.into();
        self.check_insertable(&timeline)?;
        self.adopt(&timeline);
        self.inner.items.lock().unwrap().push(timeline);
        Ok(())
    }

    pub fn insert(&self, index: usize, timeline: impl Into<Timeline>) -> Result<()> {
        let timeline = timeline.into();
        let len = self.len();
        if index > len {
            return Err(AnimationError::InvalidArgument(format!(
                "index {index} is out of range for a collection of {len}"
            )));
        }
        self.check_insertable(&timeline)?;
        self.adopt(&timeline);
        self.inner.items.lock().unwrap().insert(index, timeline);
        Ok(())
    }

    /// Returns whether the timeline was present
    pub fn remove(&self, timeline: &Timeline) -> bool {
        let removed = {
            let mut items = self.inner.items.lock().unwrap();
            items
                .iter()
                .position(|item| item == timeline)
                .map(|index| items.remove(index))
        };
        match removed {
            Some(timeline) => {
                self.release(&timeline);
                true
            }
            None => false,
        }
    }

    pub fn remove_at(&self, index: usize) -> Option<Timeline> {
        let removed = {
            let mut items = self.inner.items.lock().unwrap();
            (index < items.len()).then(|| items.remove(index))
        };
        if let Some(timeline) = &removed {
            self.release(timeline);
        }
        removed
    }

    pub fn get(&self, index: usize) -> Option<Timeline> {
        self.inner.items.lock().unwrap().get(index).cloned()
    }

    pub fn index_of(&self, timeline: &Timeline) -> Option<usize> {
        self.inner
            .items
            .lock()
            .unwrap()
            .iter()
            .position(|item| item == timeline)
    }

    pub fn contains(&self, timeline: &Timeline) -> bool {
        self.index_of(timeline).is_some()
    }

    pub fn clear(&self) {
        let drained: Vec<Timeline> = self.inner.items.lock().unwrap().drain(..).collect();
        for timeline in &drained {
            self.release(timeline);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the children in order
    pub fn to_vec(&self) -> Vec<Timeline> {
        self.inner.items.lock().unwrap().clone()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Timeline> {
        self.to_vec().into_iter()
    }
}

impl Default for TimelineCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimelineCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl<'a> IntoIterator for &'a TimelineCollection {
    type Item = Timeline;
    type IntoIter = std::vec::IntoIter<Timeline>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
