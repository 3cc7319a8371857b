//! Scheduler: the single-threaded event loop.
//!
//! Owns the logical clock and every live timeline. `advance` moves the clock
//! and ticks each live timeline once; timelines started during the pass
//! (children, particles, spawn schedules) join the same pass, so a chain of
//! callbacks never lags a frame behind the clock. Nothing here blocks.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::stage::Stage;
use crate::timeline::{Timeline, TimelineId};

#[derive(Default)]
struct Inner {
    now: f64,
    next_id: u64,
    live: Vec<Timeline>,
    ticking: bool,
}

#[derive(Clone, Default)]
pub struct Scheduler(Rc<RefCell<Inner>>);

#[derive(Clone, Default)]
pub(crate) struct WeakScheduler(Weak<RefCell<Inner>>);

impl WeakScheduler {
    pub(crate) fn upgrade(&self) -> Option<Scheduler> {
        self.0.upgrade().map(Scheduler)
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time in seconds.
    pub fn now(&self) -> f64 {
        self.0.borrow().now
    }

    /// Number of timelines that are playing or waiting out a delay.
    pub fn live_count(&self) -> usize {
        self.0.borrow().live.iter().filter(|t| t.is_live()).count()
    }

    /// Move the clock forward by `dt` seconds and run everything that falls due.
    pub fn advance(&self, dt: f64) {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "ignoring invalid clock step");
            return;
        }
        let now = {
            let mut inner = self.0.borrow_mut();
            if inner.ticking {
                tracing::warn!("scheduler advanced from inside a tick; ignored");
                return;
            }
            inner.now += dt;
            inner.ticking = true;
            inner.now
        };
        self.run(now);
    }

    fn run(&self, now: f64) {
        let mut ticked: HashSet<TimelineId> = HashSet::new();
        loop {
            let batch: Vec<Timeline> = self
                .0
                .borrow()
                .live
                .iter()
                .filter(|t| !ticked.contains(&t.id()))
                .cloned()
                .collect();
            if batch.is_empty() {
                break;
            }
            for timeline in batch {
                ticked.insert(timeline.id());
                timeline.tick(now);
            }
        }

        let mut inner = self.0.borrow_mut();
        inner.live.retain(Timeline::is_live);
        inner.ticking = false;
    }

    pub(crate) fn next_id(&self) -> TimelineId {
        let mut inner = self.0.borrow_mut();
        inner.next_id += 1;
        TimelineId(inner.next_id)
    }

    pub(crate) fn register(&self, timeline: Timeline) {
        let mut inner = self.0.borrow_mut();
        if !inner.live.iter().any(|t| t.id() == timeline.id()) {
            inner.live.push(timeline);
        }
    }

    pub(crate) fn downgrade(&self) -> WeakScheduler {
        WeakScheduler(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("live", &inner.live.len())
            .finish()
    }
}

/// The clock and the render tree, handed explicitly to everything that
/// animates. Clones share both.
#[derive(Clone, Debug, Default)]
pub struct Runtime {
    pub scheduler: Scheduler,
    pub stage: Stage,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn advance(&self, dt: f64) {
        self.scheduler.advance(dt);
    }

    /// Advance in fixed `step`-sized ticks until `seconds` have elapsed.
    pub fn run_for(&self, seconds: f64, step: f64) {
        if step <= 0.0 {
            self.advance(seconds);
            return;
        }
        let mut remaining = seconds;
        while remaining > 1e-12 {
            let dt = step.min(remaining);
            self.advance(dt);
            remaining -= dt;
        }
    }
}
