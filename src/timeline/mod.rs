//! Timeline orchestrator.
//!
//! A timeline is an ordered list of steps resolved, at build time, into
//! absolute `(start, end)` windows on one logical clock. Each tick fires the
//! boundary callbacks that were crossed, in window order (ties broken by
//! declaration order), then interpolates every open window onto its target.
//!
//! Placement rule: a step starts at its anchor plus its offset. The default
//! anchor is the end of the previous step; `parallel` anchors to the previous
//! step's start; `at` anchors to the origin. A step that would start before
//! the origin is rejected, never clamped.

mod ease;
mod step;

pub use ease::Ease;
pub use step::{Anchor, Callback, Step, Target};

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::scheduler::{Runtime, WeakScheduler};
use crate::stage::{Prop, Stage, Value};

/// Boundary comparisons tolerate this much accumulated float error.
pub const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimelineId(pub(crate) u64);

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tl{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("step {index} resolves to a negative start time ({start:.3}s)")]
    NegativeStart { index: usize, start: f64 },
    #[error("step {index} has an invalid duration ({duration})")]
    InvalidDuration { index: usize, duration: f64 },
    #[error("step {index} has a non-finite offset")]
    InvalidOffset { index: usize },
    #[error("invalid timeline delay ({0})")]
    InvalidDelay(f64),
    #[error("timeline has no steps but expects a completion callback")]
    EmptyWithCompletion,
    #[error("repeating timeline has zero length")]
    ZeroLengthRepeat,
}

/// How many extra times a timeline replays after its first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Never,
    Times(u32),
    Forever,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    /// Built but not started.
    Idle,
    /// Started; may still be waiting out its delay.
    Playing,
    Completed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct TimelineBuilder {
    label: String,
    steps: Vec<Step>,
    delay: f64,
    autoplay: bool,
    repeat: Repeat,
    on_complete: Option<Callback>,
}

impl TimelineBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Seconds between `play` and the timeline origin.
    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// Build without starting; call [`Timeline::play`] or nest it in a parent.
    pub fn paused(mut self) -> Self {
        self.autoplay = false;
        self
    }

    pub fn repeat(mut self, times: u32) -> Self {
        self.repeat = if times == 0 {
            Repeat::Never
        } else {
            Repeat::Times(times)
        };
        self
    }

    pub fn repeat_forever(mut self) -> Self {
        self.repeat = Repeat::Forever;
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.on_complete = Some(Rc::new(f));
        self
    }

    pub fn build(self, rt: &Runtime) -> Result<Timeline, TimelineError> {
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(TimelineError::InvalidDelay(self.delay));
        }
        if self.steps.is_empty() && self.on_complete.is_some() {
            return Err(TimelineError::EmptyWithCompletion);
        }
        let windows = resolve(&self.steps)?;
        let duration = windows.iter().map(|w| w.1).fold(0.0, f64::max);
        if self.repeat != Repeat::Never && duration <= TIME_EPSILON {
            return Err(TimelineError::ZeroLengthRepeat);
        }

        let tracks = self
            .steps
            .into_iter()
            .zip(windows)
            .map(|(step, (start, end))| Track {
                step,
                start,
                end,
                started: false,
                completed: false,
                from: BTreeMap::new(),
            })
            .collect();

        let remaining = match self.repeat {
            Repeat::Never => Some(0),
            Repeat::Times(n) => Some(n),
            Repeat::Forever => None,
        };

        let timeline = Timeline(Rc::new(RefCell::new(Inner {
            id: rt.scheduler.next_id(),
            label: self.label,
            tracks,
            duration,
            delay: self.delay,
            repeat: self.repeat,
            remaining,
            origin: None,
            state: TimelineState::Idle,
            torn_down: false,
            on_complete: self.on_complete,
            scheduler: rt.scheduler.downgrade(),
            stage: rt.stage.clone(),
        })));

        if self.autoplay {
            timeline.play();
        }
        Ok(timeline)
    }
}

/// Resolve declared placements into absolute windows.
fn resolve(steps: &[Step]) -> Result<Vec<(f64, f64)>, TimelineError> {
    let mut windows = Vec::with_capacity(steps.len());
    let mut cursor = 0.0_f64;
    let mut prev_start = 0.0_f64;

    for (index, step) in steps.iter().enumerate() {
        if !step.duration.is_finite() || step.duration < 0.0 {
            return Err(TimelineError::InvalidDuration {
                index,
                duration: step.duration,
            });
        }
        if !step.offset.is_finite() {
            return Err(TimelineError::InvalidOffset { index });
        }

        let anchor = match step.anchor {
            Anchor::AfterPrevious => cursor,
            Anchor::WithPrevious => prev_start,
            Anchor::Absolute => 0.0,
        };
        let start = anchor + step.offset;
        if start < -TIME_EPSILON {
            return Err(TimelineError::NegativeStart { index, start });
        }
        let start = start.max(0.0);
        let end = start + step.duration;

        cursor = match step.anchor {
            Anchor::AfterPrevious => end,
            Anchor::WithPrevious | Anchor::Absolute => cursor.max(end),
        };
        prev_start = start;
        windows.push((start, end));
    }
    Ok(windows)
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

struct Track {
    step: Step,
    start: f64,
    end: f64,
    started: bool,
    completed: bool,
    /// Values captured when the window opened.
    from: BTreeMap<Prop, Value>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Start,
    End,
}

struct Fired {
    callback: Option<Callback>,
    child: Option<(Timeline, f64)>,
}

struct Inner {
    id: TimelineId,
    label: String,
    tracks: Vec<Track>,
    duration: f64,
    delay: f64,
    repeat: Repeat,
    /// Replays left; `None` repeats forever.
    remaining: Option<u32>,
    /// Absolute time of local zero for the current iteration.
    origin: Option<f64>,
    state: TimelineState,
    torn_down: bool,
    on_complete: Option<Callback>,
    scheduler: WeakScheduler,
    stage: Stage,
}

impl Inner {
    fn next_due(&self, local: f64) -> Option<(usize, Boundary)> {
        let mut best: Option<(f64, usize, Boundary)> = None;
        for (index, track) in self.tracks.iter().enumerate() {
            let (time, boundary) = if !track.started {
                (track.start, Boundary::Start)
            } else if !track.completed {
                (track.end, Boundary::End)
            } else {
                continue;
            };
            if time > local + TIME_EPSILON {
                continue;
            }
            let earlier = match best {
                None => true,
                Some((t, i, _)) => match time.total_cmp(&t) {
                    Ordering::Less => true,
                    Ordering::Equal => index < i,
                    Ordering::Greater => false,
                },
            };
            if earlier {
                best = Some((time, index, boundary));
            }
        }
        best.map(|(_, index, boundary)| (index, boundary))
    }

    fn open(&mut self, index: usize) -> Fired {
        let origin = self.origin.unwrap_or(0.0);
        let stage = self.stage.clone();
        let track = &mut self.tracks[index];
        track.started = true;

        let mut child = None;
        match &track.step.target {
            Target::Entity(id) => {
                for (prop, value) in &track.step.from {
                    stage.set(*id, *prop, value.clone());
                }
                track.from.clear();
                for (prop, to) in &track.step.to {
                    match stage.get(*id, *prop) {
                        Some(from) => {
                            track.from.insert(*prop, from);
                        }
                        None if to.is_interpolable() => {
                            tracing::trace!(
                                timeline = %self.label,
                                entity = %id,
                                ?prop,
                                "no starting value, tween will switch at the end"
                            );
                        }
                        None => {}
                    }
                }
            }
            Target::Timeline(timeline) => child = Some((timeline.clone(), origin + track.start)),
            Target::None => {}
        }

        Fired {
            callback: track.step.on_start.clone(),
            child,
        }
    }

    fn close(&mut self, index: usize) -> Fired {
        let stage = self.stage.clone();
        let track = &mut self.tracks[index];
        track.completed = true;

        if let Target::Entity(id) = &track.step.target {
            for (prop, value) in &track.step.to {
                stage.set(*id, *prop, value.clone());
            }
            if track.step.remove_target {
                stage.remove(*id);
            }
        }

        Fired {
            callback: track.step.on_complete.clone(),
            child: None,
        }
    }

    fn apply_open_windows(&self, local: f64) {
        for track in self.tracks.iter().filter(|t| t.started && !t.completed) {
            let Target::Entity(id) = &track.step.target else {
                continue;
            };
            let span = track.end - track.start;
            let progress = if span <= 0.0 {
                1.0
            } else {
                ((local - track.start) / span).clamp(0.0, 1.0)
            };
            let eased = track.step.ease.apply(progress);
            for (prop, to) in &track.step.to {
                if let Some(value) = track.from.get(prop).and_then(|from| from.interpolate(to, eased)) {
                    self.stage.set(*id, *prop, value);
                }
            }
        }
    }

    /// Start the next iteration, or mark the timeline complete.
    /// Returns `true` when another iteration begins.
    fn roll_over(&mut self) -> bool {
        let again = match self.remaining {
            Some(0) => false,
            Some(ref mut n) => {
                *n -= 1;
                true
            }
            None => true,
        };
        if !again {
            self.state = TimelineState::Completed;
            return false;
        }
        self.origin = self.origin.map(|o| o + self.duration);
        for track in &mut self.tracks {
            track.started = false;
            track.completed = false;
            track.from.clear();
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a built timeline. Clones refer to the same timeline.
#[derive(Clone)]
pub struct Timeline(Rc<RefCell<Inner>>);

impl Timeline {
    pub fn builder() -> TimelineBuilder {
        TimelineBuilder {
            label: "timeline".to_string(),
            steps: Vec::new(),
            delay: 0.0,
            autoplay: true,
            repeat: Repeat::Never,
            on_complete: None,
        }
    }

    pub fn id(&self) -> TimelineId {
        self.0.borrow().id
    }

    pub fn label(&self) -> String {
        self.0.borrow().label.clone()
    }

    pub fn state(&self) -> TimelineState {
        self.0.borrow().state
    }

    pub fn is_finished(&self) -> bool {
        self.state() == TimelineState::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == TimelineState::Cancelled
    }

    pub(crate) fn is_live(&self) -> bool {
        self.state() == TimelineState::Playing
    }

    /// Length of one iteration in seconds.
    pub fn duration(&self) -> f64 {
        self.0.borrow().duration
    }

    /// Length of the whole run including replays; `None` if it repeats forever.
    pub fn span(&self) -> Option<f64> {
        let inner = self.0.borrow();
        match inner.repeat {
            Repeat::Never => Some(inner.duration),
            Repeat::Times(n) => Some(inner.duration * f64::from(n + 1)),
            Repeat::Forever => None,
        }
    }

    /// Resolved `(start, end)` window of each step, in declaration order.
    pub fn windows(&self) -> Vec<(f64, f64)> {
        self.0.borrow().tracks.iter().map(|t| (t.start, t.end)).collect()
    }

    /// Start a paused timeline at the current clock time. No-op otherwise.
    pub fn play(&self) {
        let now = self.0.borrow().scheduler.upgrade().map(|s| s.now());
        match now {
            Some(now) => self.play_at(now),
            None => tracing::warn!(timeline = %self.id(), "cannot play: scheduler is gone"),
        }
    }

    fn play_at(&self, at: f64) {
        let scheduler = {
            let mut inner = self.0.borrow_mut();
            if inner.state != TimelineState::Idle {
                return;
            }
            inner.origin = Some(at + inner.delay);
            inner.state = TimelineState::Playing;
            tracing::trace!(timeline = %inner.id, label = %inner.label, at, "timeline started");
            inner.scheduler.upgrade()
        };
        if let Some(scheduler) = scheduler {
            scheduler.register(self.clone());
        }
    }

    /// Stop immediately and fire nothing further. Nested timelines are
    /// cancelled too. Calling it again, or after completion, is harmless.
    pub fn cancel(&self) {
        let children: Vec<Timeline> = {
            let mut inner = self.0.borrow_mut();
            if inner.torn_down {
                return;
            }
            inner.torn_down = true;
            if inner.state != TimelineState::Completed {
                inner.state = TimelineState::Cancelled;
                tracing::trace!(timeline = %inner.id, label = %inner.label, "timeline cancelled");
            }
            inner
                .tracks
                .iter()
                .filter_map(|t| match &t.step.target {
                    Target::Timeline(child) => Some(child.clone()),
                    _ => None,
                })
                .collect()
        };
        for child in children {
            child.cancel();
        }
    }

    pub(crate) fn tick(&self, now: f64) {
        loop {
            let local = {
                let inner = self.0.borrow();
                match (inner.state, inner.origin) {
                    (TimelineState::Playing, Some(origin)) => now - origin,
                    _ => return,
                }
            };
            if local < -TIME_EPSILON {
                return;
            }

            self.fire_due(local);
            if !self.is_live() {
                return;
            }
            self.0.borrow().apply_open_windows(local);

            let iteration_done = {
                let inner = self.0.borrow();
                local + TIME_EPSILON >= inner.duration && inner.tracks.iter().all(|t| t.completed)
            };
            if !iteration_done {
                return;
            }
            if self.0.borrow_mut().roll_over() {
                continue;
            }

            let (callback, id, label) = {
                let inner = self.0.borrow();
                (inner.on_complete.clone(), inner.id, inner.label.clone())
            };
            tracing::trace!(timeline = %id, label = %label, "timeline complete");
            if let Some(callback) = callback {
                callback();
            }
            return;
        }
    }

    fn fire_due(&self, local: f64) {
        loop {
            let fired = {
                let mut inner = self.0.borrow_mut();
                if inner.state != TimelineState::Playing {
                    return;
                }
                match inner.next_due(local) {
                    Some((index, Boundary::Start)) => inner.open(index),
                    Some((index, Boundary::End)) => inner.close(index),
                    None => return,
                }
            };
            if let Some((child, at)) = fired.child {
                child.play_at(at);
            }
            if let Some(callback) = fired.callback {
                callback();
            }
        }
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Timeline")
            .field("id", &inner.id)
            .field("label", &inner.label)
            .field("state", &inner.state)
            .field("duration", &inner.duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::stage::{Node, Visual};

    type Log = Rc<RefCell<Vec<String>>>;

    fn logger(log: &Log, msg: &'static str) -> impl Fn() + 'static {
        let log = log.clone();
        move || log.borrow_mut().push(msg.to_string())
    }

    #[test]
    fn sequential_steps_follow_the_previous_end() {
        let rt = Runtime::new();
        let tl = Timeline::builder()
            .step(Step::wait(1.0))
            .step(Step::wait(0.5))
            .step(Step::wait(0.5).offset(-0.2))
            .paused()
            .build(&rt)
            .unwrap();

        let w = tl.windows();
        assert_abs_diff_eq!(w[1].0, 1.0);
        assert_abs_diff_eq!(w[2].0, 1.3);
        assert_abs_diff_eq!(w[2].1, 1.8);
        assert_abs_diff_eq!(tl.duration(), 1.8);
    }

    #[test]
    fn parallel_and_absolute_steps() {
        let rt = Runtime::new();
        let tl = Timeline::builder()
            .step(Step::wait(2.0))
            .step(Step::wait(0.5).parallel().offset(0.25))
            .step(Step::call(|| {}).at(0.5))
            .step(Step::wait(1.0).offset(-1.0))
            .paused()
            .build(&rt)
            .unwrap();

        let w = tl.windows();
        assert_eq!(w[1], (0.25, 0.75));
        assert_eq!(w[2], (0.5, 0.5));
        // The cursor stays at the furthest end (2.0) after non-sequential steps.
        assert_eq!(w[3], (1.0, 2.0));
    }

    #[test]
    fn negative_resolved_start_is_rejected() {
        let rt = Runtime::new();
        let err = Timeline::builder()
            .step(Step::wait(0.5))
            .step(Step::wait(1.0).offset(-0.8))
            .build(&rt)
            .unwrap_err();
        assert!(matches!(err, TimelineError::NegativeStart { index: 1, .. }));
    }

    #[test]
    fn configuration_errors() {
        let rt = Runtime::new();
        assert_eq!(
            Timeline::builder().on_complete(|| {}).build(&rt).unwrap_err(),
            TimelineError::EmptyWithCompletion
        );
        assert_eq!(
            Timeline::builder()
                .step(Step::call(|| {}))
                .repeat_forever()
                .build(&rt)
                .unwrap_err(),
            TimelineError::ZeroLengthRepeat
        );
        assert!(matches!(
            Timeline::builder().step(Step::wait(-1.0)).build(&rt).unwrap_err(),
            TimelineError::InvalidDuration { index: 0, .. }
        ));
        assert_eq!(
            Timeline::builder().delay(f64::NAN).build(&rt).unwrap_err().to_string(),
            "invalid timeline delay (NaN)"
        );
    }

    #[test]
    fn callbacks_fire_once_in_window_order() {
        let rt = Runtime::new();
        let log: Log = Rc::default();
        let _tl = Timeline::builder()
            .step(Step::wait(1.0).on_start(logger(&log, "a+")).on_complete(logger(&log, "a-")))
            .step(
                Step::wait(1.0)
                    .offset(-0.5)
                    .on_start(logger(&log, "b+"))
                    .on_complete(logger(&log, "b-")),
            )
            .step(Step::call(logger(&log, "c")).parallel())
            .on_complete(logger(&log, "done"))
            .build(&rt)
            .unwrap();

        // One large tick crosses every boundary.
        rt.advance(5.0);
        rt.advance(1.0);
        assert_eq!(*log.borrow(), ["a+", "b+", "c", "a-", "b-", "done"]);
    }

    #[test]
    fn small_ticks_hit_boundaries_despite_float_drift() {
        let rt = Runtime::new();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let _tl = Timeline::builder()
            .step(Step::wait(1.0))
            .on_complete(move || flag.set(true))
            .build(&rt)
            .unwrap();

        for _ in 0..10 {
            rt.advance(0.1);
        }
        assert!(done.get());
    }

    #[test]
    fn cancel_stops_callbacks_and_is_idempotent() {
        let rt = Runtime::new();
        let log: Log = Rc::default();
        let tl = Timeline::builder()
            .step(Step::wait(1.0).on_start(logger(&log, "a+")).on_complete(logger(&log, "a-")))
            .step(Step::wait(1.0).on_start(logger(&log, "b+")))
            .on_complete(logger(&log, "done"))
            .build(&rt)
            .unwrap();

        rt.advance(0.5);
        tl.cancel();
        tl.cancel();
        rt.run_for(3.0, 0.1);

        assert_eq!(*log.borrow(), ["a+"]);
        assert!(tl.is_cancelled());
        assert_eq!(rt.scheduler.live_count(), 0);
    }

    #[test]
    fn cancel_from_inside_a_callback_stops_the_rest() {
        let rt = Runtime::new();
        let log: Log = Rc::default();
        let slot: Rc<RefCell<Option<Timeline>>> = Rc::default();
        let handle = slot.clone();
        let tl = Timeline::builder()
            .step(Step::call(move || {
                if let Some(tl) = handle.borrow().as_ref() {
                    tl.cancel();
                }
            }))
            .step(Step::call(logger(&log, "after")))
            .paused()
            .build(&rt)
            .unwrap();
        *slot.borrow_mut() = Some(tl.clone());

        tl.play();
        rt.advance(0.1);
        assert!(log.borrow().is_empty());
        slot.borrow_mut().take();
    }

    #[test]
    fn tween_interpolates_with_easing() {
        let rt = Runtime::new();
        let id = rt.stage.insert(None, Node::glyph('*')).unwrap();
        let _tl = Timeline::builder()
            .step(Step::to(id, 2.0).prop(Prop::X, 10.0))
            .step(Step::to(id, 1.0).prop(Prop::Opacity, 0.0).ease(Ease::PowerIn(2.0)))
            .build(&rt)
            .unwrap();

        rt.advance(1.0);
        assert_abs_diff_eq!(rt.stage.get(id, Prop::X).unwrap().as_number().unwrap(), 5.0);
        rt.advance(1.5);
        assert_abs_diff_eq!(rt.stage.get(id, Prop::X).unwrap().as_number().unwrap(), 10.0);
        assert_abs_diff_eq!(
            rt.stage.get(id, Prop::Opacity).unwrap().as_number().unwrap(),
            0.75,
            epsilon = 1e-9
        );
    }

    #[test]
    fn color_tweens_need_a_starting_color() {
        use crate::types::Color;

        let rt = Runtime::new();
        let bare = rt.stage.insert(None, Node::glyph('*')).unwrap();
        let tinted = rt.stage.insert(None, Node::glyph('*').fg(Color::rgb(0, 0, 0))).unwrap();
        let warm = Color::rgb(200, 100, 0);
        let _tl = Timeline::builder()
            .step(Step::to(bare, 2.0).prop(Prop::Fg, warm))
            .step(Step::to(tinted, 2.0).prop(Prop::Fg, warm).parallel())
            .build(&rt)
            .unwrap();

        rt.advance(1.0);
        assert_eq!(rt.stage.get(bare, Prop::Fg), None);
        assert_eq!(rt.stage.get(tinted, Prop::Fg), Some(Value::Color(Color::rgb(100, 50, 0))));

        rt.advance(1.0);
        assert_eq!(rt.stage.get(bare, Prop::Fg), Some(Value::Color(warm)));
        assert_eq!(rt.stage.get(tinted, Prop::Fg), Some(Value::Color(warm)));
    }

    #[test]
    fn explicit_from_values_apply_at_window_start() {
        let rt = Runtime::new();
        let id = rt.stage.insert(None, Node::glyph('*')).unwrap();
        let _tl = Timeline::builder()
            .step(Step::wait(1.0))
            .step(Step::to(id, 1.0).from_value(Prop::Scale, 0.0).prop(Prop::Scale, 2.0))
            .build(&rt)
            .unwrap();

        rt.advance(0.5);
        assert_eq!(rt.stage.get(id, Prop::Scale), Some(Value::Number(1.0)));
        rt.advance(0.75);
        assert_abs_diff_eq!(rt.stage.get(id, Prop::Scale).unwrap().as_number().unwrap(), 0.5);
    }

    #[test]
    fn discrete_values_and_removal_apply_at_step_end() {
        let rt = Runtime::new();
        let id = rt.stage.insert(None, Node::glyph('o')).unwrap();
        let tl = Timeline::builder()
            .step(Step::to(id, 1.0).prop(Prop::Glyph, '*'))
            .step(Step::remove(id))
            .paused()
            .build(&rt)
            .unwrap();
        tl.play();

        rt.advance(0.5);
        assert_eq!(rt.stage.get(id, Prop::Glyph), None);
        assert_eq!(rt.stage.visual(id), Some(Visual::Glyph('o')));
        rt.advance(0.4);
        assert!(rt.stage.contains(id));
        rt.advance(0.2);
        assert!(!rt.stage.contains(id));
    }

    #[test]
    fn paused_and_delayed_timelines_wait() {
        let rt = Runtime::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let tl = Timeline::builder()
            .step(Step::call(move || h.set(h.get() + 1)))
            .delay(0.5)
            .paused()
            .build(&rt)
            .unwrap();

        rt.advance(1.0);
        assert_eq!(hits.get(), 0);
        tl.play();
        rt.advance(0.4);
        assert_eq!(hits.get(), 0);
        rt.advance(0.2);
        assert_eq!(hits.get(), 1);
        assert!(tl.is_finished());
    }

    #[test]
    fn child_timeline_starts_at_its_step_and_cancels_with_parent() {
        let rt = Runtime::new();
        let log: Log = Rc::default();
        let child = Timeline::builder()
            .step(Step::call(logger(&log, "child+")))
            .step(Step::wait(1.0).on_complete(logger(&log, "child-")))
            .paused()
            .build(&rt)
            .unwrap();
        let parent = Timeline::builder()
            .step(Step::wait(1.0))
            .step(Step::child(&child))
            .step(Step::call(logger(&log, "parent-end")))
            .build(&rt)
            .unwrap();

        assert_abs_diff_eq!(parent.duration(), 2.0);
        rt.advance(0.9);
        assert!(log.borrow().is_empty());
        rt.advance(0.2);
        assert_eq!(*log.borrow(), ["child+"]);

        parent.cancel();
        rt.run_for(2.0, 0.1);
        assert_eq!(*log.borrow(), ["child+"]);
        assert!(child.is_cancelled());
    }

    #[test]
    fn repeat_fires_each_iteration_then_completes() {
        let rt = Runtime::new();
        let log: Log = Rc::default();
        let tl = Timeline::builder()
            .step(Step::wait(1.0).on_complete(logger(&log, "tick")))
            .repeat(2)
            .on_complete(logger(&log, "done"))
            .build(&rt)
            .unwrap();

        assert_eq!(tl.span(), Some(3.0));
        rt.run_for(2.5, 0.25);
        assert_eq!(*log.borrow(), ["tick", "tick"]);
        rt.advance(0.5);
        assert_eq!(*log.borrow(), ["tick", "tick", "tick", "done"]);
        assert!(tl.is_finished());
    }

    #[test]
    fn forever_repeat_catches_up_across_a_long_tick() {
        let rt = Runtime::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let tl = Timeline::builder()
            .step(Step::wait(0.1).on_complete(move || c.set(c.get() + 1)))
            .repeat_forever()
            .build(&rt)
            .unwrap();

        rt.advance(1.0);
        assert_eq!(count.get(), 10);
        assert_eq!(tl.span(), None);
        assert_eq!(tl.state(), TimelineState::Playing);
        tl.cancel();
    }
}
