//! Discrete-event timeline
//!
//! Sequences activities in two lanes per timestamp. The immediate lane is a
//! stack that fully drains — including activities that immediate activities
//! themselves schedule — before the clock may advance; pending immediates
//! accumulated between pops are pushed reversed, so activities scheduled
//! together run in their enqueue order while nested scheduling recurses
//! depth-first. The scheduled lane keys activities by target time; at one
//! timestamp, activities scheduled together form a FIFO batch and batches
//! interleave uniformly at random, so only intra-batch order is guaranteed.
//!
//! The injected generator is the lane's only entropy source: a fixed seed
//! and an identical sequence of scheduling calls replay identically.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;
use types::time::TimeStamp;

/// Activities pending at one timestamp: FIFO batches drawn in random order.
#[derive(Debug)]
struct EventCell<A> {
    batches: Vec<VecDeque<A>>,
}

/// Event queue driving one simulation run.
///
/// `A` is the activity payload; the timeline stores and orders activities
/// but never executes them, so executing code can hold the rest of the
/// simulation mutably while it pops.
#[derive(Debug)]
pub struct Timeline<A> {
    current: TimeStamp,
    immediate: Vec<A>,
    scheduled: BTreeMap<TimeStamp, EventCell<A>>,
    scheduled_len: usize,
    pending_immediate: Vec<A>,
    pending_scheduled: Vec<(TimeStamp, A)>,
    rng: ChaCha8Rng,
}

impl<A> Timeline<A> {
    /// Create a timeline at time zero with an explicit random generator.
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            current: TimeStamp::ZERO,
            immediate: Vec::new(),
            scheduled: BTreeMap::new(),
            scheduled_len: 0,
            pending_immediate: Vec::new(),
            pending_scheduled: Vec::new(),
            rng,
        }
    }

    /// Schedule an activity `delay` after the current time.
    ///
    /// `TimeStamp::IMMEDIATE` targets the immediate lane; any finite delay
    /// (including zero) targets the scheduled lane at `now + delay`, which
    /// drains only after every immediate activity.
    pub fn schedule_in(&mut self, delay: TimeStamp, activity: A) {
        if delay.is_immediate() {
            self.pending_immediate.push(activity);
        } else {
            self.pending_scheduled.push((self.current.plus(delay), activity));
        }
    }

    /// Remove and return the next activity with its execution time,
    /// advancing the clock to it. Immediates drain entirely first and run
    /// at the current time.
    pub fn pop(&mut self) -> Option<(TimeStamp, A)> {
        self.flush_pending();

        if let Some(activity) = self.immediate.pop() {
            return Some((self.current, activity));
        }

        let mut entry = self.scheduled.first_entry()?;
        let time = *entry.key();
        assert!(
            time >= self.current,
            "scheduled activity at {} precedes current time {}",
            time,
            self.current
        );
        let (activity, cell_empty) = {
            let cell = entry.get_mut();
            let index = self.rng.gen_range(0..cell.batches.len());
            let activity = cell.batches[index].pop_front().expect("empty batch in event cell");
            if cell.batches[index].is_empty() {
                cell.batches.swap_remove(index);
            }
            (activity, cell.batches.is_empty())
        };
        if cell_empty {
            entry.remove();
        }
        self.scheduled_len -= 1;
        self.current = time;
        trace!(time = %time, "advanced to scheduled activity");
        Some((time, activity))
    }

    /// Whether any immediate activity is pending, or any scheduled activity
    /// exists at or before `target`.
    pub fn has_work_through(&self, target: TimeStamp) -> bool {
        if !self.immediate.is_empty() || !self.pending_immediate.is_empty() {
            return true;
        }
        let next = match (
            self.scheduled.keys().next().copied(),
            self.pending_scheduled.iter().map(|(t, _)| *t).min(),
        ) {
            (None, None) => return false,
            (Some(t), None) | (None, Some(t)) => t,
            (Some(a), Some(b)) => a.min(b),
        };
        next <= target
    }

    /// Advance the clock to `target` if it is later than the current time.
    /// Called by the driver after draining work through `target`.
    pub fn advance_to(&mut self, target: TimeStamp) {
        assert!(!target.is_immediate(), "cannot advance to IMMEDIATE");
        if target > self.current {
            self.current = target;
        }
    }

    /// The simulation clock. Only ever advances.
    pub fn current_time(&self) -> TimeStamp {
        self.current
    }

    /// Number of activities awaiting execution.
    pub fn len(&self) -> usize {
        self.immediate.len()
            + self.pending_immediate.len()
            + self.scheduled_len
            + self.pending_scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move pending activities into the live lanes. One flush forms one
    /// batch per distinct target time; pending immediates are pushed in
    /// reverse so the first enqueued ends on top of the stack.
    fn flush_pending(&mut self) {
        if !self.pending_scheduled.is_empty() {
            let mut batches: BTreeMap<TimeStamp, VecDeque<A>> = BTreeMap::new();
            for (time, activity) in self.pending_scheduled.drain(..) {
                batches.entry(time).or_default().push_back(activity);
            }
            for (time, batch) in batches {
                self.scheduled_len += batch.len();
                self.scheduled
                    .entry(time)
                    .or_insert_with(|| EventCell { batches: Vec::new() })
                    .batches
                    .push(batch);
            }
        }
        while let Some(activity) = self.pending_immediate.pop() {
            self.immediate.push(activity);
        }
    }
}
