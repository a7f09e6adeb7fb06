//! Discrete-event, multi-priority tick scheduler
//!
//! The schedule owns the tick counter and one min-heap per priority level.
//! Each `step()` advances the counter by exactly one tick and fires every agent
//! due on that tick, draining level 0 before level 1 and so on.
//!
//! Agents are owned boxes handed to the scheduler; when fired, the box is moved
//! back into the agent, which may reschedule itself (or anything else) through
//! the `&mut Schedule` it receives. Everything scheduled during a step lands
//! strictly in the future, so it can never fire within the same step.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use crate::error::{Result, SimError};

/// The first tick of the game
pub const EPOCH: i64 = 0;

/// A unit of behavior invoked by the schedule at a specific tick
///
/// `C` is the mutable context handed to every agent (the simulation world).
pub trait Agent<C> {
    fn go(
        self: Box<Self>,
        ctx: &mut C,
        schedule: &mut Schedule<C>,
        tick: i64,
        priority: usize,
    ) -> Result<()>;
}

impl<C, F> Agent<C> for F
where
    F: FnOnce(&mut C, &mut Schedule<C>, i64, usize) -> Result<()>,
{
    fn go(
        self: Box<Self>,
        ctx: &mut C,
        schedule: &mut Schedule<C>,
        tick: i64,
        priority: usize,
    ) -> Result<()> {
        (*self)(ctx, schedule, tick, priority)
    }
}

/// Queue element: due tick plus insertion sequence for a stable tie-break
struct Entry<C> {
    due: i64,
    seq: u64,
    agent: Box<dyn Agent<C>>,
}

impl<C> PartialEq for Entry<C> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<C> Eq for Entry<C> {}

impl<C> PartialOrd for Entry<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Entry<C> {
    // BinaryHeap is a max-heap; reverse so the earliest (due, seq) sits on top
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Multi-priority event queue driving the simulation
pub struct Schedule<C> {
    /// Current tick; `EPOCH - 1` before the first step
    ticks: i64,
    /// One heap per priority level
    queues: Vec<BinaryHeap<Entry<C>>>,
    /// Monotonic insertion counter
    next_seq: u64,
}

impl<C> fmt::Debug for Schedule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("ticks", &self.ticks)
            .field("levels", &self.queues.len())
            .field("pending", &self.pending())
            .finish()
    }
}

impl<C> Schedule<C> {
    /// Create a schedule with the given number of priority levels
    pub fn new(priority_levels: usize) -> Self {
        Self {
            ticks: EPOCH - 1,
            queues: (0..priority_levels).map(|_| BinaryHeap::new()).collect(),
            next_seq: 0,
        }
    }

    /// Current tick
    pub fn now(&self) -> i64 {
        self.ticks
    }

    pub fn priority_levels(&self) -> usize {
        self.queues.len()
    }

    /// Number of agents waiting across all levels
    pub fn pending(&self) -> usize {
        self.queues.iter().map(BinaryHeap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(BinaryHeap::is_empty)
    }

    /// Schedule an agent for the very next tick
    pub fn schedule(&mut self, priority: usize, agent: Box<dyn Agent<C>>) -> Result<()> {
        self.schedule_at(self.ticks + 1, priority, agent)
    }

    /// Schedule an agent `delta` ticks from now
    pub fn schedule_in(
        &mut self,
        delta: i64,
        priority: usize,
        agent: Box<dyn Agent<C>>,
    ) -> Result<()> {
        if delta <= 0 {
            return Err(SimError::InvalidDelay { delta });
        }
        self.schedule_at(self.ticks + delta, priority, agent)
    }

    /// Schedule an agent at an absolute tick, which must lie in the future
    pub fn schedule_at(
        &mut self,
        tick: i64,
        priority: usize,
        agent: Box<dyn Agent<C>>,
    ) -> Result<()> {
        let levels = self.queues.len();
        let Some(queue) = self.queues.get_mut(priority) else {
            return Err(SimError::InvalidPriority { priority, levels });
        };
        if tick <= self.ticks {
            return Err(SimError::InvalidSchedule {
                tick,
                now: self.ticks,
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        queue.push(Entry {
            due: tick,
            seq,
            agent,
        });
        Ok(())
    }

    /// Advance one tick and fire every agent due now, lowest level first
    ///
    /// The first agent error aborts the step and is returned to the caller.
    pub fn step(&mut self, ctx: &mut C) -> Result<()> {
        self.ticks += 1;
        let now = self.ticks;

        for level in 0..self.queues.len() {
            while self.queues[level].peek().is_some_and(|e| e.due <= now) {
                let Some(entry) = self.queues[level].pop() else {
                    break;
                };
                entry.agent.go(ctx, self, now, level)?;
            }
            debug_assert!(
                self.queues[level].peek().is_none_or(|e| e.due > now),
                "stale entry left in level {level}"
            );
        }
        Ok(())
    }

    /// Remove every queued agent; the tick counter is left untouched
    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }
}
