//! Deferred actions keyed by simulation time
//!
//! A min-heap of (fire time, action) owned by the simulation. The tick loop
//! advances the clock and drains due actions one at a time, so an action
//! may schedule or cancel others while it runs. Actions due at the same
//! time fire in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Smallest accepted repeat interval (seconds)
const MIN_INTERVAL: f64 = 1e-4;

/// Handle to a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<A> {
    fire_at: f64,
    seq: u64,
    id: TimerId,
    every: Option<f64>,
    action: A,
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    // Reversed: BinaryHeap is a max-heap, the earliest entry must come out first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    now: f64,
    heap: BinaryHeap<Entry<A>>,
    /// Ids still able to fire; cancelled and spent ids are absent
    live: HashSet<TimerId>,
    next_id: u64,
    next_seq: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now: 0.0,
            heap: BinaryHeap::new(),
            live: HashSet::new(),
            next_id: 1,
            next_seq: 0,
        }
    }
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock (seconds)
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn advance(&mut self, dt: f32) {
        self.now += f64::from(dt.max(0.0));
    }

    /// Fire `action` once, `delay` seconds from now
    pub fn schedule_once(&mut self, action: A, delay: f32) -> TimerId {
        let id = self.allocate();
        self.push(id, self.now + f64::from(delay.max(0.0)), None, action);
        id
    }

    /// Fire `action` every `interval` seconds, first time one interval from now
    pub fn schedule_every(&mut self, action: A, interval: f32) -> TimerId {
        let interval = f64::from(interval).max(MIN_INTERVAL);
        let id = self.allocate();
        self.push(id, self.now + interval, Some(interval), action);
        id
    }

    /// Cancel a pending action.
    ///
    /// Unknown, already cancelled and already fired ids are ignored; returns
    /// whether anything was still pending.
    pub fn unschedule(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Pop the next action due at or before the current clock.
    ///
    /// Repeating actions are re-armed before they are returned, so the
    /// caller can cancel them from inside their own handler.
    pub fn pop_due(&mut self) -> Option<(TimerId, A)> {
        loop {
            let due = self.heap.peek().is_some_and(|e| e.fire_at <= self.now);
            if !due {
                return None;
            }
            let entry = self.heap.pop()?;
            if !self.live.contains(&entry.id) {
                continue; // cancelled
            }
            match entry.every {
                Some(interval) => {
                    let action = entry.action.clone();
                    self.push(entry.id, entry.fire_at + interval, Some(interval), entry.action);
                    return Some((entry.id, action));
                }
                None => {
                    self.live.remove(&entry.id);
                    return Some((entry.id, entry.action));
                }
            }
        }
    }

    fn allocate(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    fn push(&mut self, id: TimerId, fire_at: f64, every: Option<f64>, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            fire_at,
            seq,
            id,
            every,
            action,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drain(s: &mut Scheduler<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| s.pop_due().map(|(_, a)| a)).collect()
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule_once("late", 2.0);
        s.schedule_once("early", 1.0);
        s.advance(0.5);
        assert!(drain(&mut s).is_empty());
        s.advance(2.0);
        assert_eq!(drain(&mut s), vec!["early", "late"]);
    }

    #[test]
    fn test_same_time_keeps_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule_once("fade", 1.0);
        s.schedule_once("settle", 1.5);
        s.schedule_once("teleport", 1.0);
        s.advance(3.0);
        assert_eq!(drain(&mut s), vec!["fade", "teleport", "settle"]);
    }

    #[test]
    fn test_large_step_fires_every_elapsed_repeat_in_order() {
        let mut s = Scheduler::new();
        s.schedule_every("tick", 0.25);
        s.schedule_once("once", 0.6);
        s.advance(1.0);
        assert_eq!(drain(&mut s), vec!["tick", "tick", "once", "tick", "tick"]);
    }

    #[test]
    fn test_repeat_cancelled_from_handler() {
        let mut s = Scheduler::new();
        let id = s.schedule_every("spawn", 1.0);
        s.advance(1.0);
        let (fired, _) = s.pop_due().unwrap();
        assert_eq!(fired, id);
        assert!(s.unschedule(fired));
        s.advance(5.0);
        assert!(drain(&mut s).is_empty());
    }

    #[test]
    fn test_unschedule_fired_one_shot_is_noop() {
        let mut s = Scheduler::new();
        let id = s.schedule_once("x", 0.0);
        assert_eq!(drain(&mut s), vec!["x"]);
        assert!(!s.unschedule(id));
        assert!(!s.unschedule(id));
    }

    proptest! {
        #[test]
        fn prop_double_unschedule_matches_single(
            intervals in prop::collection::vec(0.05f32..2.0, 1..8),
            cancel in 0usize..8,
            steps in prop::collection::vec(0.01f32..0.5, 1..40),
        ) {
            let mut once = Scheduler::new();
            let mut twice = Scheduler::new();
            let mut ids = Vec::new();
            for (i, interval) in intervals.iter().enumerate() {
                ids.push(once.schedule_every(i, *interval));
                twice.schedule_every(i, *interval);
            }
            let target = ids[cancel % ids.len()];
            once.unschedule(target);
            twice.unschedule(target);
            twice.unschedule(target);

            for dt in steps {
                once.advance(dt);
                twice.advance(dt);
                let a: Vec<_> = std::iter::from_fn(|| once.pop_due()).collect();
                let b: Vec<_> = std::iter::from_fn(|| twice.pop_due()).collect();
                prop_assert_eq!(a, b);
            }
        }
    }
}
