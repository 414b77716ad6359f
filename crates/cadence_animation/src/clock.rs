//! Clocks
//!
//! A clock is the runtime twin of a timeline: it is created when its root
//! begins and holds the state, local time and iteration count that the inert
//! timeline does not. Clocks live in a slotmap arena owned by the scheduler;
//! parent links are plain ids used for time derivation only.
//!
//! Time flows top-down. A root's total time grows with each tick; every clock
//! maps the time it is given (its parent's local time) onto its own iteration
//! and local time, then hands that local time to its children.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::time::Duration;

use crate::duration::RepeatBehavior;
use crate::target::{ActivationPlan, AnimationBinding};
use crate::timeline::{Timeline, TimelineId};

new_key_type! {
    /// Handle to a clock in the scheduler's arena
    pub struct ClockId;
}

/// Observable state of a running timeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockState {
    /// Not running
    #[default]
    Stopped,
    /// Time is advancing (or paused)
    Active,
    /// Reached its natural end; time is frozen and the last value is held
    Filling,
}

pub(crate) struct Clock {
    pub timeline: Timeline,
    pub parent: Option<ClockId>,
    pub children: SmallVec<[ClockId; 4]>,
    pub state: ClockState,
    /// Time within the current iteration
    pub current_time: Duration,
    /// Time since the start of this clock's active span
    pub total: Duration,
    pub iteration: u32,
    pub paused: bool,
    natural: Option<Duration>,
    repeat: RepeatBehavior,
    animation: Option<AnimationBinding>,
}

impl Clock {
    fn progress(&self) -> f64 {
        match self.natural {
            Some(d) if d.is_zero() => 1.0,
            Some(d) => (self.current_time.as_secs_f64() / d.as_secs_f64()).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    fn restart(&mut self) {
        self.state = ClockState::Active;
        self.current_time = Duration::ZERO;
        self.total = Duration::ZERO;
        self.iteration = 0;
    }

    fn apply(&self) {
        let Some(binding) = &self.animation else {
            return;
        };
        write(binding, self.progress());
    }

    fn revert(&self) {
        if let Some(binding) = &self.animation {
            if let Err(err) = binding.target.set(binding.base.clone()) {
                tracing::warn!(location = %binding.target.describe(), %err, "failed to restore base value");
            }
        }
    }
}

fn write(binding: &AnimationBinding, progress: f64) {
    match binding.curve.sample(&binding.base, progress) {
        Some(value) => {
            if let Err(err) = binding.target.set(value) {
                tracing::warn!(location = %binding.target.describe(), %err, "animated write failed");
            }
        }
        None => {
            tracing::trace!(
                location = %binding.target.describe(),
                base = ?binding.base,
                "base value cannot be animated; skipping"
            );
        }
    }
}

/// Where a clock sits on its own time line for a given elapsed time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Timing {
    pub state: ClockState,
    pub local: Duration,
    pub iteration: u32,
}

pub(crate) fn timing_at(natural: Option<Duration>, repeat: RepeatBehavior, total: Duration) -> Timing {
    let Some(d) = natural else {
        return Timing {
            state: ClockState::Active,
            local: total,
            iteration: 0,
        };
    };
    if d.is_zero() {
        return Timing {
            state: ClockState::Filling,
            local: Duration::ZERO,
            iteration: 0,
        };
    }
    if let Some(n) = repeat.iterations() {
        if d.checked_mul(n).is_some_and(|end| total >= end) {
            return Timing {
                state: ClockState::Filling,
                local: d,
                iteration: n - 1,
            };
        }
    }
    let period = d.as_nanos();
    let elapsed = total.as_nanos();
    Timing {
        state: ClockState::Active,
        local: Duration::from_nanos((elapsed % period) as u64),
        iteration: u32::try_from(elapsed / period).unwrap_or(u32::MAX),
    }
}

/// Arena of every clock a scheduler runs
#[derive(Default)]
pub(crate) struct ClockArena {
    clocks: SlotMap<ClockId, Clock>,
}

impl ClockArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ClockId) -> Option<&Clock> {
        self.clocks.get(id)
    }

    pub fn get_mut(&mut self, id: ClockId) -> Option<&mut Clock> {
        self.clocks.get_mut(id)
    }

    pub fn contains(&self, id: ClockId) -> bool {
        self.clocks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Create the clock tree for a plan; returns the root
    pub fn build(&mut self, plan: ActivationPlan) -> ClockId {
        let mut ids: Vec<ClockId> = Vec::with_capacity(plan.nodes.len());
        for node in plan.nodes {
            let parent = node.parent.map(|index| ids[index]);
            let id = self.clocks.insert(Clock {
                timeline: node.timeline,
                parent,
                children: SmallVec::new(),
                state: ClockState::Active,
                current_time: Duration::ZERO,
                total: Duration::ZERO,
                iteration: 0,
                paused: false,
                natural: node.natural,
                repeat: node.repeat,
                animation: node.animation,
            });
            if let Some(parent) = parent.and_then(|parent| self.clocks.get_mut(parent)) {
                parent.children.push(id);
            }
            ids.push(id);
        }
        ids[0]
    }

    /// Pre-order ids of `root` and everything below it
    pub fn subtree(&self, root: ClockId) -> Vec<ClockId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(clock) = self.clocks.get(id) {
                out.push(id);
                stack.extend(clock.children.iter().rev().copied());
            }
        }
        out
    }

    /// The outermost clock of the tree `id` belongs to
    pub fn root_of(&self, mut id: ClockId) -> ClockId {
        while let Some(parent) = self.clocks.get(id).and_then(|clock| clock.parent) {
            id = parent;
        }
        id
    }

    /// Write every leaf's time-zero value
    pub fn apply_initial(&self, root: ClockId) {
        for id in self.subtree(root) {
            if let Some(clock) = self.clocks.get(id) {
                clock.apply();
            }
        }
    }

    fn restart_subtree(&mut self, root: ClockId) {
        for id in self.subtree(root) {
            if let Some(clock) = self.clocks.get_mut(id) {
                clock.restart();
            }
        }
    }

    /// Move a root forward by `delta`, collecting clocks that completed
    pub fn advance_root(&mut self, root: ClockId, delta: Duration, completed: &mut Vec<ClockId>) {
        let total = match self.clocks.get(root) {
            Some(clock) if clock.state == ClockState::Active && !clock.paused => {
                clock.total.saturating_add(delta)
            }
            _ => return,
        };
        self.drive(root, total, completed);
    }

    /// Reposition a root as if `offset` had elapsed since it began
    pub fn seek(&mut self, root: ClockId, offset: Duration) -> Vec<ClockId> {
        let mut completed = Vec::new();
        self.restart_subtree(root);
        self.drive(root, offset, &mut completed);
        completed
    }

    fn drive(&mut self, id: ClockId, total: Duration, completed: &mut Vec<ClockId>) {
        let Some(clock) = self.clocks.get(id) else {
            return;
        };
        if clock.state != ClockState::Active {
            return;
        }
        let timing = timing_at(clock.natural, clock.repeat, total);
        let (natural, iteration) = (clock.natural, clock.iteration);
        let children = clock.children.clone();

        // Children finish the iteration the parent wraps past, then start over.
        // Iterations skipped whole within one step are not replayed.
        if let Some(d) = natural.filter(|_| timing.iteration > iteration) {
            for &child in &children {
                self.drive(child, d, completed);
            }
            for &child in &children {
                self.restart_subtree(child);
            }
        }

        if let Some(clock) = self.clocks.get_mut(id) {
            clock.current_time = timing.local;
            clock.total = total;
            clock.iteration = timing.iteration;
        }
        for &child in &children {
            self.drive(child, timing.local, completed);
        }
        if let Some(clock) = self.clocks.get(id) {
            clock.apply();
        }

        if timing.state == ClockState::Filling {
            for &child in &children {
                self.fill_active(child, completed);
            }
            if let Some(clock) = self.clocks.get_mut(id) {
                clock.state = ClockState::Filling;
                completed.push(id);
            }
        }
    }

    /// Freeze descendants a shorter parent cut off, children first
    fn fill_active(&mut self, id: ClockId, completed: &mut Vec<ClockId>) {
        let children = match self.clocks.get(id) {
            Some(clock) if clock.state == ClockState::Active => clock.children.clone(),
            _ => return,
        };
        for child in children {
            self.fill_active(child, completed);
        }
        if let Some(clock) = self.clocks.get_mut(id) {
            clock.state = ClockState::Filling;
            completed.push(id);
        }
    }

    /// Tear a tree down, restoring base values
    ///
    /// Every leaf reverts when the root has completed; otherwise leaves that
    /// already completed keep their held value.
    pub fn stop_tree(&mut self, root: ClockId) -> Vec<(TimelineId, ClockId)> {
        let root_filled = self
            .clocks
            .get(root)
            .is_some_and(|clock| clock.state == ClockState::Filling);
        for id in self.subtree(root) {
            if let Some(clock) = self.clocks.get(id) {
                if root_filled || clock.state == ClockState::Active {
                    clock.revert();
                }
            }
        }
        self.discard(root)
    }

    /// Cut `id` and its descendants out of their tree without touching
    /// property values; the rest of the tree keeps running
    pub fn detach(&mut self, id: ClockId) -> Vec<(TimelineId, ClockId)> {
        if let Some(parent) = self.clocks.get(id).and_then(|clock| clock.parent) {
            if let Some(parent) = self.clocks.get_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
        self.discard(id)
    }

    /// Remove a tree without touching property values
    pub fn discard(&mut self, root: ClockId) -> Vec<(TimelineId, ClockId)> {
        self.subtree(root)
            .into_iter()
            .filter_map(|id| {
                self.clocks
                    .remove(id)
                    .map(|clock| (clock.timeline.id(), id))
            })
            .collect()
    }

    /// The value a leaf would write at its current time
    #[cfg(test)]
    pub fn sampled_value(&self, id: ClockId) -> Option<cadence_core::Value> {
        let clock = self.clocks.get(id)?;
        let binding = clock.animation.as_ref()?;
        binding.curve.sample(&binding.base, clock.progress())
    }
}
