//! Animation scheduler
//!
//! Owns the clock trees of every running root timeline and advances them once
//! per frame. The host drives it by calling [`AnimationScheduler::tick`] from
//! its frame loop (or [`AnimationScheduler::tick_by`] with an explicit delta).
//! Timelines reach it through a [`SchedulerHandle`], either the one they were
//! started on or the global handle installed with [`set_global_scheduler`].
//!
//! `Completed` handlers run after the whole frame has been advanced, once the
//! scheduler lock is released, in child-before-parent order.

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

use crate::clock::{ClockArena, ClockId, ClockState};
use crate::config::SchedulerConfig;
use crate::error::{AnimationError, Result};
use crate::target::plan_activation;
use crate::timeline::{Timeline, TimelineId};

// ============================================================================
// Global Animation Scheduler State
// ============================================================================

/// Global scheduler handle for access from anywhere in the application
static GLOBAL_SCHEDULER: OnceLock<SchedulerHandle> = OnceLock::new();

/// Set the global animation scheduler handle
///
/// This should be called once at startup after creating the
/// [`AnimationScheduler`]. `Timeline::begin` falls back to it for timelines
/// that have never run.
///
/// # Panics
///
/// Panics if called more than once.
pub fn set_global_scheduler(handle: SchedulerHandle) {
    if GLOBAL_SCHEDULER.set(handle).is_err() {
        panic!("set_global_scheduler() called more than once");
    }
}

/// Get the global animation scheduler handle
///
/// # Panics
///
/// Panics if `set_global_scheduler()` has not been called.
pub fn get_scheduler() -> SchedulerHandle {
    GLOBAL_SCHEDULER
        .get()
        .expect("Animation scheduler not initialized. Call set_global_scheduler() at startup.")
        .clone()
}

/// Try to get the global scheduler (returns None if not initialized)
pub fn try_get_scheduler() -> Option<SchedulerHandle> {
    GLOBAL_SCHEDULER.get().cloned()
}

/// Check if the global scheduler has been initialized
pub fn is_scheduler_initialized() -> bool {
    GLOBAL_SCHEDULER.get().is_some()
}

/// Internal state of the animation scheduler
struct SchedulerInner {
    clocks: ClockArena,
    /// Root clocks in activation order
    roots: Vec<ClockId>,
    /// Clock currently running each timeline
    bindings: FxHashMap<TimelineId, ClockId>,
    /// Completions produced outside a tick (by `seek`), delivered on the next one
    pending: Vec<(ClockId, Timeline)>,
    last_frame: Instant,
    config: SchedulerConfig,
}

impl SchedulerInner {
    fn is_bound(&self, clock: ClockId, timeline: &Timeline) -> bool {
        self.clocks.contains(clock) && self.bindings.get(&timeline.id()) == Some(&clock)
    }

    /// Bound clock of `timeline` if it is the root of its tree
    fn bound_root(&self, timeline: &Timeline) -> Option<ClockId> {
        let id = *self.bindings.get(&timeline.id())?;
        self.clocks
            .get(id)
            .filter(|clock| clock.parent.is_none())
            .map(|_| id)
    }

    fn teardown(&mut self, root: ClockId, revert: bool) {
        let removed = if revert {
            self.clocks.stop_tree(root)
        } else {
            self.clocks.discard(root)
        };
        self.release(&removed);
        self.roots.retain(|id| *id != root);
        tracing::debug!(clocks = removed.len(), revert, "clock tree removed");
    }

    /// Drop a non-root clock and its descendants from a running tree
    fn prune(&mut self, clock: ClockId) {
        let removed = self.clocks.detach(clock);
        self.release(&removed);
        tracing::debug!(clocks = removed.len(), "subtree detached from running tree");
    }

    fn release(&mut self, removed: &[(TimelineId, ClockId)]) {
        for (timeline, clock) in removed {
            if self.bindings.get(timeline) == Some(clock) {
                self.bindings.remove(timeline);
            }
        }
        let clocks = &self.clocks;
        self.pending.retain(|(id, _)| clocks.contains(*id));
    }

    fn is_running(&self) -> bool {
        !self.pending.is_empty()
            || self.roots.iter().any(|&id| {
                self.clocks
                    .get(id)
                    .is_some_and(|clock| clock.state == ClockState::Active && !clock.paused)
            })
    }
}

/// The animation scheduler that ticks all running timeline trees
///
/// This is typically held by the host's frame loop and shared with timelines
/// via [`SchedulerHandle`].
///
/// ```
/// use cadence_animation::{AnimationScheduler, DoubleAnimation, Storyboard};
/// use cadence_core::DependencyObject;
/// use std::time::Duration;
///
/// let scheduler = AnimationScheduler::new();
/// let rect = DependencyObject::create("Rectangle").unwrap();
///
/// let sb = Storyboard::new();
/// let grow = DoubleAnimation::new()
///     .from(0.0)
///     .to(100.0)
///     .into_timeline()
///     .with_duration(Duration::from_millis(200));
/// Storyboard::set_target(&grow, &rect);
/// Storyboard::set_target_property(&grow, "Width").unwrap();
/// sb.add_child(grow).unwrap();
///
/// sb.begin_on(&scheduler.handle()).unwrap();
/// scheduler.tick_by(Duration::from_millis(100));
/// assert_eq!(rect.get("Width").unwrap().as_double(), Some(50.0));
/// ```
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                clocks: ClockArena::new(),
                roots: Vec::new(),
                bindings: FxHashMap::default(),
                pending: Vec::new(),
                last_frame: Instant::now(),
                config,
            })),
        }
    }

    /// Get a handle to this scheduler for passing to timelines
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.lock().unwrap().config.clone()
    }

    /// Frame pacing hint derived from the configured target FPS
    pub fn frame_interval(&self) -> Duration {
        self.inner.lock().unwrap().config.frame_interval()
    }

    /// Advance by the wall-clock time since the previous frame
    ///
    /// Gaps longer than the configured maximum frame delta are clamped.
    /// Returns true if any tree is still running (needs another tick).
    pub fn tick(&self) -> bool {
        let dt = {
            let mut inner = self.inner.lock().unwrap();
            let now = Instant::now();
            let dt = now
                .duration_since(inner.last_frame)
                .min(inner.config.max_frame_delta());
            inner.last_frame = now;
            dt
        };
        self.tick_by(dt)
    }

    /// Advance every running tree by `dt`, then deliver completions
    ///
    /// Returns true if any tree is still running.
    pub fn tick_by(&self, dt: Duration) -> bool {
        let notifications = {
            let mut guard = self.inner.lock().unwrap();
            let inner = &mut *guard;

            let mut completed = Vec::new();
            for &root in &inner.roots {
                inner.clocks.advance_root(root, dt, &mut completed);
            }

            let mut batch = std::mem::take(&mut inner.pending);
            batch.extend(completed.into_iter().filter_map(|id| {
                inner
                    .clocks
                    .get(id)
                    .map(|clock| (id, clock.timeline.clone()))
            }));
            batch
        };

        for (clock, timeline) in notifications {
            // An earlier handler may have stopped or restarted this tree
            let live = self.inner.lock().unwrap().is_bound(clock, &timeline);
            if live {
                tracing::trace!(timeline = %timeline.describe(), "completed");
                timeline.notify_completed();
            }
        }

        self.has_active_animations()
    }

    /// Check if any tree is still advancing or has undelivered completions
    pub fn has_active_animations(&self) -> bool {
        self.inner.lock().unwrap().is_running()
    }

    /// Number of root trees (running or filling)
    pub fn root_count(&self) -> usize {
        self.inner.lock().unwrap().roots.len()
    }

    /// Number of live clocks across all trees
    pub fn clock_count(&self) -> usize {
        self.inner.lock().unwrap().clocks.len()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for AnimationScheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A weak handle to the animation scheduler
///
/// Timelines hold one of these after they begin. It won't prevent the
/// scheduler from being dropped; operations on a dead handle are no-ops.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Build and start the clock tree for `root`
    ///
    /// A tree headed by one of the begun timelines is replaced. Timelines a
    /// different running tree still holds are cut out of it.
    pub(crate) fn activate(&self, root: &Timeline) -> Result<()> {
        let inner = self
            .inner
            .upgrade()
            .ok_or(AnimationError::SchedulerUnavailable)?;
        let config = inner.lock().unwrap().config.clone();

        // Resolution reads the object graph only; nothing is written on failure
        let plan = plan_activation(root, &config)?;

        root.bind_scheduler(self);
        let mut timelines = vec![root.clone()];
        if let Some(plan) = &plan {
            timelines.extend(plan.timelines().skip(1).cloned());
        }
        for timeline in &timelines {
            timeline.bind_scheduler(self);
        }

        let mut guard = inner.lock().unwrap();
        let stale: Vec<ClockId> = timelines
            .iter()
            .filter_map(|timeline| guard.bindings.get(&timeline.id()).copied())
            .collect();
        for &clock in &stale {
            if guard.clocks.get(clock).is_some_and(|clock| clock.parent.is_none()) {
                guard.teardown(clock, false);
            }
        }
        // Timelines since removed from another running tree leave it; the
        // rest of that tree keeps running
        for clock in stale {
            if guard.clocks.contains(clock) {
                guard.prune(clock);
            }
        }

        let Some(plan) = plan else {
            tracing::debug!(timeline = %root.describe(), "nothing to animate");
            return Ok(());
        };

        let inner = &mut *guard;
        let root_clock = inner.clocks.build(plan);
        for id in inner.clocks.subtree(root_clock) {
            if let Some(clock) = inner.clocks.get(id) {
                inner.bindings.insert(clock.timeline.id(), id);
            }
        }
        inner.roots.push(root_clock);
        // Reset last_frame to now to prevent a huge dt on the first tick
        inner.last_frame = Instant::now();
        inner.clocks.apply_initial(root_clock);
        tracing::debug!(
            timeline = %root.describe(),
            clocks = inner.clocks.subtree(root_clock).len(),
            "clock tree started"
        );
        Ok(())
    }

    /// Tear down the tree `root` heads, reverting animated values
    pub(crate) fn stop(&self, root: &Timeline) {
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = inner.lock().unwrap();
            if let Some(clock) = guard.bound_root(root) {
                guard.teardown(clock, true);
            }
        }
    }

    pub(crate) fn set_paused(&self, root: &Timeline, paused: bool) {
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = inner.lock().unwrap();
            if let Some(clock) = guard.bound_root(root) {
                if let Some(clock) = guard.clocks.get_mut(clock) {
                    clock.paused = paused;
                }
            }
        }
    }

    /// Reposition the tree; completions are queued for the next tick
    pub(crate) fn seek(&self, root: &Timeline, offset: Duration) {
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = inner.lock().unwrap();
            let Some(clock) = guard.bound_root(root) else {
                return;
            };
            let completed = guard.clocks.seek(clock, offset);
            let inner = &mut *guard;
            inner
                .pending
                .retain(|(id, _)| inner.clocks.root_of(*id) != clock);
            for id in completed {
                if let Some(clock) = inner.clocks.get(id) {
                    inner.pending.push((id, clock.timeline.clone()));
                }
            }
        }
    }

    fn with_clock<R>(&self, timeline: &Timeline, f: impl FnOnce(&ClockArena, ClockId) -> R) -> Option<R> {
        let inner = self.inner.upgrade()?;
        let guard = inner.lock().unwrap();
        let id = *guard.bindings.get(&timeline.id())?;
        guard.clocks.contains(id).then(|| f(&guard.clocks, id))
    }

    pub(crate) fn state(&self, timeline: &Timeline) -> ClockState {
        self.with_clock(timeline, |clocks, id| {
            clocks.get(id).map(|clock| clock.state).unwrap_or_default()
        })
        .unwrap_or_default()
    }

    pub(crate) fn current_time(&self, timeline: &Timeline) -> Duration {
        self.with_clock(timeline, |clocks, id| {
            clocks
                .get(id)
                .map(|clock| clock.current_time)
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    pub(crate) fn is_paused(&self, timeline: &Timeline) -> bool {
        self.with_clock(timeline, |clocks, id| {
            clocks
                .get(clocks.root_of(id))
                .is_some_and(|clock| clock.paused)
        })
        .unwrap_or(false)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ColorAnimation, DoubleAnimation};
    use crate::duration::RepeatBehavior;
    use crate::property_path::PropertyPath;
    use crate::storyboard::Storyboard;
    use cadence_core::{Color, DependencyObject, ObjectRef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn width(object: &ObjectRef) -> f64 {
        object.get("Width").unwrap().as_double().unwrap()
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    /// Canvas with rectangles "A" and "B" and a storyboard stored in its
    /// resources: two nested storyboards growing A over 1s and B over 2s,
    /// the whole thing repeated twice.
    fn create_storyboard() -> (ObjectRef, ObjectRef, ObjectRef, Storyboard) {
        let canvas = DependencyObject::create("Canvas").unwrap();
        let a = DependencyObject::create("Rectangle").unwrap().with_name("A");
        let b = DependencyObject::create("Rectangle").unwrap().with_name("B");
        canvas.add_item(a.clone()).unwrap();
        canvas.add_item(b.clone()).unwrap();

        let sb = Storyboard::new();
        sb.set_repeat_behavior(RepeatBehavior::count(2));

        let first = Storyboard::new();
        let grow_a = DoubleAnimation::new()
            .from(10.0)
            .to(100.0)
            .into_timeline()
            .with_duration(ms(1000));
        Storyboard::set_target_name(&grow_a, "A").unwrap();
        Storyboard::set_target_property(&grow_a, "Width").unwrap();
        first.add_child(grow_a).unwrap();

        let second = Storyboard::new();
        let grow_b = DoubleAnimation::new()
            .from(10.0)
            .to(100.0)
            .into_timeline()
            .with_duration(ms(2000));
        Storyboard::set_target_name(&grow_b, "B").unwrap();
        let width_id = b.property_id("Width").unwrap();
        Storyboard::set_target_property(&grow_b, PropertyPath::from_property(width_id)).unwrap();
        second.add_child(grow_b).unwrap();

        sb.add_child(first).unwrap();
        sb.add_child(second).unwrap();
        canvas.resources().insert("Storyboard", Arc::new(sb.clone()));
        (canvas, a, b, sb)
    }

    fn child(sb: &Storyboard, index: usize) -> Timeline {
        sb.children().get(index).unwrap()
    }

    #[test]
    fn test_scheduler_tick() {
        let scheduler = AnimationScheduler::new();
        let (_canvas, a, _, sb) = create_storyboard();

        sb.begin_on(&scheduler.handle()).unwrap();
        assert_eq!(width(&a), 10.0);

        // Tick
        assert!(scheduler.tick_by(ms(500)));

        // Value should have moved
        assert!(close(width(&a), 55.0));
    }

    #[test]
    fn test_current_state_follows_children() {
        let scheduler = AnimationScheduler::new();
        let (_canvas, a, b, sb) = create_storyboard();
        sb.begin_on(&scheduler.handle()).unwrap();

        scheduler.tick_by(ms(300));
        assert_eq!(sb.current_state(), ClockState::Active);
        assert_eq!(child(&sb, 0).current_state(), ClockState::Active);
        assert_eq!(child(&sb, 1).current_state(), ClockState::Active);
        assert_eq!(sb.current_time(), ms(300));

        scheduler.tick_by(ms(950));
        assert_eq!(sb.current_state(), ClockState::Active);
        assert_eq!(child(&sb, 0).current_state(), ClockState::Filling);
        assert_eq!(child(&sb, 0).current_time(), ms(1000));
        assert_eq!(child(&sb, 1).current_state(), ClockState::Active);
        assert_eq!(width(&a), 100.0);
        assert!(close(width(&b), 66.25));

        sb.stop().unwrap();
        assert_eq!(sb.current_state(), ClockState::Stopped);
        assert_eq!(child(&sb, 0).current_state(), ClockState::Stopped);
        assert_eq!(sb.current_time(), Duration::ZERO);
        assert_eq!(width(&a), 100.0);
        assert_eq!(width(&b), 0.0);
    }

    #[test]
    fn test_repeat_restarts_children() {
        let scheduler = AnimationScheduler::new();
        let (_canvas, a, b, sb) = create_storyboard();
        sb.begin_on(&scheduler.handle()).unwrap();

        for _ in 0..5 {
            scheduler.tick_by(ms(500));
        }
        assert_eq!(sb.current_state(), ClockState::Active);
        assert_eq!(child(&sb, 0).current_state(), ClockState::Active);
        assert!(close(width(&a), 55.0));
        assert!(close(width(&b), 32.5));

        for _ in 0..3 {
            scheduler.tick_by(ms(500));
        }
        assert_eq!(sb.current_state(), ClockState::Filling);
        assert_eq!(width(&b), 100.0);
        assert!(!scheduler.has_active_animations());

        sb.stop().unwrap();
        assert_eq!(width(&a), 0.0);
        assert_eq!(width(&b), 0.0);
    }

    #[test]
    fn test_completed_restart_accumulates() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();

        let sb = Storyboard::new();
        let step = DoubleAnimation::new()
            .by(10.0)
            .into_timeline()
            .with_duration(ms(100));
        Storyboard::set_target(&step, &rect);
        Storyboard::set_target_property(&step, "Width").unwrap();
        sb.add_child(step).unwrap();

        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);
        sb.on_completed(move |timeline| {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 < 5 {
                timeline.begin().unwrap();
            }
        });

        sb.begin_on(&scheduler.handle()).unwrap();
        for _ in 0..10 {
            scheduler.tick_by(ms(100));
        }
        assert_eq!(completions.load(Ordering::SeqCst), 5);
        assert_eq!(width(&rect), 50.0);
        assert_eq!(scheduler.root_count(), 1);
    }

    #[test]
    fn test_completed_restart_resets_from() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let anim = DoubleAnimation::new()
            .from(5.0)
            .to(100.0)
            .into_timeline()
            .with_duration(ms(100));
        Storyboard::set_target(&anim, &rect);
        Storyboard::set_target_property(&anim, "Width").unwrap();
        assert_eq!(width(&rect), 0.0);

        let restarted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&restarted);
        anim.on_completed(move |timeline| {
            counter.fetch_add(1, Ordering::SeqCst);
            timeline.begin().unwrap();
        });

        anim.begin_on(&scheduler.handle()).unwrap();
        let mut elapsed = Duration::ZERO;
        while restarted.load(Ordering::SeqCst) < 5 {
            assert!(elapsed < ms(2000), "only {restarted:?} restarts in 2s");
            scheduler.tick_by(ms(10));
            elapsed += ms(10);
        }
        assert_eq!(elapsed, ms(500));
        assert_eq!(width(&rect), 5.0);
        assert_eq!(anim.current_state(), ClockState::Active);

        scheduler.tick_by(ms(50));
        let sampled = width(&rect);
        assert!((40.0..=60.0).contains(&sampled), "sampled {sampled}");
        assert_eq!(restarted.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_children_complete_before_parent() {
        let scheduler = AnimationScheduler::new();
        let canvas = DependencyObject::create("Canvas").unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));

        let parent = Storyboard::new();
        parent.set_duration(ms(500));
        Storyboard::set_target(&parent, &canvas);
        for (index, property) in ["Width", "Height"].into_iter().enumerate() {
            let group = Storyboard::new();
            group.set_duration(ms(500));
            let anim = DoubleAnimation::new().to(50.0).into_timeline();
            Storyboard::set_target_property(&anim, property).unwrap();
            group.add_child(anim).unwrap();

            let log = Arc::clone(&events);
            group.on_completed(move |_| log.lock().unwrap().push(format!("child{index}")));
            parent.add_child(group).unwrap();
        }
        let log = Arc::clone(&events);
        parent.on_completed(move |timeline| {
            log.lock()
                .unwrap()
                .push(format!("parent:{:?}", timeline.current_state()));
        });

        parent.begin_on(&scheduler.handle()).unwrap();
        scheduler.tick_by(ms(500));

        assert_eq!(
            *events.lock().unwrap(),
            vec!["child0", "child1", "parent:Filling"]
        );
        assert!(close(
            canvas.get("Width").unwrap().as_double().unwrap(),
            25.0
        ));
    }

    #[test]
    fn test_empty_storyboard_stays_stopped() {
        let scheduler = AnimationScheduler::new();
        let sb = Storyboard::new();
        sb.begin_on(&scheduler.handle()).unwrap();
        assert_eq!(sb.current_state(), ClockState::Stopped);
        assert_eq!(scheduler.root_count(), 0);
        assert!(!scheduler.tick_by(ms(16)));
    }

    #[test]
    fn test_unresolved_name_activates_nothing() {
        let scheduler = AnimationScheduler::new();
        let (canvas, a, _, sb) = create_storyboard();
        let missing = DoubleAnimation::new().to(1.0).into_timeline();
        Storyboard::set_target_name(&missing, "Missing").unwrap();
        Storyboard::set_target_property(&missing, "Height").unwrap();
        sb.add_child(missing).unwrap();

        let err = sb.begin_on(&scheduler.handle()).unwrap_err();
        assert!(err.is_invalid_operation());
        assert_eq!(sb.current_state(), ClockState::Stopped);
        assert_eq!(width(&a), 0.0);
        assert_eq!(scheduler.clock_count(), 0);
        drop(canvas);
    }

    #[test]
    fn test_same_property_conflict_writes_nothing() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let sb = Storyboard::new();
        Storyboard::set_target(&sb, &rect);
        Storyboard::set_target_property(&sb, "Width").unwrap();
        sb.add_child(DoubleAnimation::new().from(10.0).to(20.0)).unwrap();
        sb.add_child(DoubleAnimation::new().from(30.0).to(40.0)).unwrap();

        assert!(matches!(
            sb.begin_on(&scheduler.handle()),
            Err(AnimationError::ConflictingTarget { .. })
        ));
        assert_eq!(width(&rect), 0.0);
        assert_eq!(sb.current_state(), ClockState::Stopped);
    }

    #[test]
    fn test_type_mismatch_fails_begin() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let anim = ColorAnimation::new().to(Color::RED).into_timeline();
        Storyboard::set_target(&anim, &rect);
        Storyboard::set_target_property(&anim, "Width").unwrap();

        assert!(matches!(
            anim.begin_on(&scheduler.handle()),
            Err(AnimationError::TypeMismatch { .. })
        ));
        assert_eq!(anim.current_state(), ClockState::Stopped);
    }

    #[test]
    fn test_child_storyboard_is_not_controllable() {
        let scheduler = AnimationScheduler::new();
        let (_canvas, a, _, sb) = create_storyboard();
        sb.begin_on(&scheduler.handle()).unwrap();
        scheduler.tick_by(ms(500));

        let first = child(&sb, 0);
        assert!(first.stop().unwrap_err().is_invalid_operation());
        assert!(first.pause().unwrap_err().is_invalid_operation());
        assert!(first.resume().unwrap_err().is_invalid_operation());
        assert!(first.seek(ms(10)).unwrap_err().is_invalid_operation());
        assert!(first.begin().unwrap_err().is_invalid_operation());
        assert_eq!(first.current_state(), ClockState::Active);

        sb.stop().unwrap();
        assert_eq!(width(&a), 0.0);
        assert_eq!(first.current_state(), ClockState::Stopped);
    }

    #[test]
    fn test_adding_running_storyboard_keeps_it_running() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let rect = DependencyObject::create("Rectangle").unwrap();

        let running = Storyboard::new();
        let anim = DoubleAnimation::new().to(10.0).into_timeline();
        Storyboard::set_target(&anim, &rect);
        Storyboard::set_target_property(&anim, "Width").unwrap();
        running.add_child(anim).unwrap();
        running.begin_on(&handle).unwrap();
        scheduler.tick_by(ms(100));

        let sb = Storyboard::new();
        sb.add_child(running.clone()).unwrap();
        assert_eq!(running.current_state(), ClockState::Active);
        assert_eq!(sb.current_state(), ClockState::Stopped);
        assert!(running.stop().is_err());

        sb.children().remove(&running);
        running.stop().unwrap();
        assert_eq!(running.current_state(), ClockState::Stopped);
        assert_eq!(width(&rect), 0.0);
    }

    #[test]
    fn test_pause_keeps_state_active() {
        let scheduler = AnimationScheduler::new();
        let (_canvas, a, _, sb) = create_storyboard();
        sb.begin_on(&scheduler.handle()).unwrap();
        scheduler.tick_by(ms(200));

        sb.pause().unwrap();
        assert_eq!(sb.current_state(), ClockState::Active);
        assert!(sb.is_paused());
        assert!(child(&sb, 0).is_paused());
        assert!(!scheduler.has_active_animations());

        scheduler.tick_by(ms(500));
        assert_eq!(sb.current_time(), ms(200));
        assert!(close(width(&a), 28.0));

        sb.resume().unwrap();
        scheduler.tick_by(ms(100));
        assert_eq!(sb.current_time(), ms(300));
    }

    #[test]
    fn test_seek_queues_completions() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let anim = DoubleAnimation::new()
            .from(10.0)
            .to(100.0)
            .into_timeline()
            .with_duration(ms(1000));
        Storyboard::set_target(&anim, &rect);
        Storyboard::set_target_property(&anim, "Width").unwrap();
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);
        anim.on_completed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        anim.begin_on(&scheduler.handle()).unwrap();
        anim.seek(ms(1500)).unwrap();
        assert_eq!(anim.current_state(), ClockState::Filling);
        assert_eq!(width(&rect), 100.0);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert!(scheduler.has_active_animations());

        scheduler.tick_by(Duration::ZERO);
        assert_eq!(completions.load(Ordering::SeqCst), 1);

        anim.seek(ms(250)).unwrap();
        assert_eq!(anim.current_state(), ClockState::Active);
        assert!(close(width(&rect), 32.5));
    }

    #[test]
    fn test_stop_from_handler_skips_later_completions() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let sb = Storyboard::new();
        let anim = DoubleAnimation::new().to(10.0).into_timeline().with_duration(ms(100));
        Storyboard::set_target(&anim, &rect);
        Storyboard::set_target_property(&anim, "Width").unwrap();
        sb.add_child(anim.clone()).unwrap();

        let stopper = sb.clone();
        anim.on_completed(move |_| stopper.stop().unwrap());
        let parent_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&parent_calls);
        sb.on_completed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sb.begin_on(&scheduler.handle()).unwrap();
        scheduler.tick_by(ms(100));
        assert_eq!(parent_calls.load(Ordering::SeqCst), 0);
        assert_eq!(sb.current_state(), ClockState::Stopped);
        assert_eq!(width(&rect), 0.0);
    }

    #[test]
    fn test_begin_replaces_without_revert() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let anim = DoubleAnimation::new().by(10.0).into_timeline().with_duration(ms(1000));
        Storyboard::set_target(&anim, &rect);
        Storyboard::set_target_property(&anim, "Width").unwrap();

        anim.begin_on(&scheduler.handle()).unwrap();
        scheduler.tick_by(ms(500));
        assert_eq!(width(&rect), 5.0);

        anim.begin().unwrap();
        assert_eq!(width(&rect), 5.0);
        assert_eq!(scheduler.root_count(), 1);
        assert_eq!(anim.current_time(), Duration::ZERO);

        scheduler.tick_by(ms(1000));
        assert_eq!(width(&rect), 15.0);
    }

    #[test]
    fn test_removed_child_begins_without_stopping_former_parent() {
        let scheduler = AnimationScheduler::new();
        let a = DependencyObject::create("Rectangle").unwrap();
        let b = DependencyObject::create("Rectangle").unwrap();

        let sb = Storyboard::new();
        let mut anims = Vec::new();
        for target in [&a, &b] {
            let anim = DoubleAnimation::new()
                .from(0.0)
                .to(100.0)
                .into_timeline()
                .with_duration(ms(1000));
            Storyboard::set_target(&anim, target);
            Storyboard::set_target_property(&anim, "Width").unwrap();
            sb.add_child(anim.clone()).unwrap();
            anims.push(anim);
        }
        let (first, second) = (anims[0].clone(), anims[1].clone());
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);
        sb.on_completed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sb.begin_on(&scheduler.handle()).unwrap();
        scheduler.tick_by(ms(200));
        assert!(sb.children().remove(&second));
        second.begin().unwrap();

        assert_eq!(scheduler.root_count(), 2);
        assert_eq!(scheduler.clock_count(), 3);
        assert_eq!(sb.current_state(), ClockState::Active);
        assert_eq!(first.current_state(), ClockState::Active);
        assert_eq!(second.current_time(), Duration::ZERO);
        assert_eq!(width(&b), 0.0);

        scheduler.tick_by(ms(200));
        assert!(close(width(&a), 40.0));
        assert!(close(width(&b), 20.0));

        scheduler.tick_by(ms(600));
        assert_eq!(sb.current_state(), ClockState::Filling);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(width(&a), 100.0);
        assert_eq!(second.current_state(), ClockState::Active);
    }

    #[test]
    fn test_seek_far_into_forever_group() {
        let scheduler = AnimationScheduler::new();
        let rect = DependencyObject::create("Rectangle").unwrap();
        let sb = Storyboard::new();
        sb.set_repeat_behavior(RepeatBehavior::Forever);
        let blink = DoubleAnimation::new().to(1.0).into_timeline().with_duration(ms(1));
        Storyboard::set_target(&blink, &rect);
        Storyboard::set_target_property(&blink, "Width").unwrap();
        sb.add_child(blink.clone()).unwrap();

        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);
        blink.on_completed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sb.begin_on(&scheduler.handle()).unwrap();
        sb.seek(Duration::from_secs(600)).unwrap();
        scheduler.tick_by(Duration::ZERO);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(sb.current_state(), ClockState::Active);
        assert_eq!(sb.current_time(), Duration::ZERO);
    }

    #[test]
    fn test_resource_lookup_uses_name_not_key() {
        let (canvas, _, _, sb) = create_storyboard();
        assert!(canvas.find_name("Storyboard").is_none());

        sb.set_name("intro");
        let found = canvas.find_name("intro").unwrap();
        let resource = found.as_resource().unwrap();
        let found = resource.as_any().downcast_ref::<Storyboard>().unwrap();
        assert_eq!(*found, sb);
    }

    #[test]
    fn test_begin_without_scheduler() {
        if is_scheduler_initialized() {
            return;
        }
        let anim = DoubleAnimation::new().to(1.0).into_timeline();
        assert_eq!(anim.begin(), Err(AnimationError::SchedulerUnavailable));
    }

    #[test]
    fn test_handle_weak_reference() {
        let handle = {
            let scheduler = AnimationScheduler::new();
            scheduler.handle()
        };

        // Scheduler is dropped, handle should not be alive
        assert!(!handle.is_alive());

        // Operations should fail or safely no-op
        let anim = DoubleAnimation::new().to(1.0).into_timeline();
        assert_eq!(
            anim.begin_on(&handle),
            Err(AnimationError::SchedulerUnavailable)
        );
        handle.stop(&anim);
        assert_eq!(handle.state(&anim), ClockState::Stopped);
    }

    #[test]
    fn test_scheduler_counts() {
        let scheduler = AnimationScheduler::new();
        assert_eq!(scheduler.root_count(), 0);
        assert_eq!(scheduler.clock_count(), 0);

        let (_canvas, _, _, sb) = create_storyboard();
        sb.begin_on(&scheduler.handle()).unwrap();
        assert_eq!(scheduler.root_count(), 1);
        assert_eq!(scheduler.clock_count(), 5);
        assert!(scheduler.has_active_animations());

        sb.stop().unwrap();
        assert_eq!(scheduler.root_count(), 0);
        assert_eq!(scheduler.clock_count(), 0);
    }

    #[test]
    fn test_wall_clock_tick_is_clamped() {
        let config = SchedulerConfig {
            max_frame_delta_ms: 20,
            ..SchedulerConfig::default()
        };
        let scheduler = AnimationScheduler::with_config(config);
        let (_canvas, _, _, sb) = create_storyboard();
        sb.begin_on(&scheduler.handle()).unwrap();

        std::thread::sleep(ms(40));
        scheduler.tick();
        assert!(sb.current_time() <= ms(20));
        assert!(sb.current_time() > Duration::ZERO);
    }
}
