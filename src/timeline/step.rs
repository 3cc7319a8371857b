use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::stage::{EntityId, Prop, Value};

use super::{Ease, Timeline};

/// Step and timeline callbacks. Shared so a repeating timeline can fire the
/// same callback once per iteration.
pub type Callback = Rc<dyn Fn()>;

/// What a step animates.
#[derive(Clone)]
pub enum Target {
    /// Nothing; the step only marks time and fires callbacks.
    None,
    Entity(EntityId),
    /// A nested timeline, started when the step's window opens.
    Timeline(Timeline),
}

/// Where a step is placed relative to the steps declared before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Previous step's end plus the offset.
    #[default]
    AfterPrevious,
    /// Previous step's start plus the offset; runs alongside it.
    WithPrevious,
    /// Timeline origin plus the offset.
    Absolute,
}

pub struct Step {
    pub(super) target: Target,
    pub(super) to: BTreeMap<Prop, Value>,
    pub(super) from: BTreeMap<Prop, Value>,
    pub(super) duration: f64,
    pub(super) ease: Ease,
    pub(super) anchor: Anchor,
    pub(super) offset: f64,
    pub(super) remove_target: bool,
    pub(super) on_start: Option<Callback>,
    pub(super) on_complete: Option<Callback>,
}

impl Step {
    fn new(target: Target, duration: f64) -> Self {
        Step {
            target,
            to: BTreeMap::new(),
            from: BTreeMap::new(),
            duration,
            ease: Ease::Linear,
            anchor: Anchor::AfterPrevious,
            offset: 0.0,
            remove_target: false,
            on_start: None,
            on_complete: None,
        }
    }

    /// Tween `target` over `duration` seconds. Add values with [`Step::prop`].
    pub fn to(target: EntityId, duration: f64) -> Self {
        Self::new(Target::Entity(target), duration)
    }

    /// A zero-length step that runs `f` when reached.
    pub fn call(f: impl Fn() + 'static) -> Self {
        Self::new(Target::None, 0.0).on_start(f)
    }

    /// An empty step that only occupies time.
    pub fn wait(duration: f64) -> Self {
        Self::new(Target::None, duration)
    }

    /// Remove `target` from the stage when reached.
    pub fn remove(target: EntityId) -> Self {
        Self::new(Target::Entity(target), 0.0).then_remove()
    }

    /// Start `child` when reached. The window spans one full run of the child
    /// (one iteration when it repeats forever).
    pub fn child(child: &Timeline) -> Self {
        let duration = child.span().unwrap_or_else(|| child.duration());
        Self::new(Target::Timeline(child.clone()), duration)
    }

    /// Drive `prop` to `value` over the step. The starting value is read off
    /// the target when the step opens; a prop with no value and no default
    /// (an unset `Fg`) switches to `value` at the end instead. Give it a
    /// start with [`Step::from_value`] to tween it.
    pub fn prop(mut self, prop: Prop, value: impl Into<Value>) -> Self {
        self.to.insert(prop, value.into());
        self
    }

    /// Set `prop` to `value` when the step starts instead of reading the
    /// current value off the target.
    pub fn from_value(mut self, prop: Prop, value: impl Into<Value>) -> Self {
        self.from.insert(prop, value.into());
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Shift the start relative to the anchor. Negative values overlap the
    /// previous step.
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Anchor to the previous step's start instead of its end.
    pub fn parallel(mut self) -> Self {
        self.anchor = Anchor::WithPrevious;
        self
    }

    /// Place at an absolute time from the timeline origin.
    pub fn at(mut self, time: f64) -> Self {
        self.anchor = Anchor::Absolute;
        self.offset = time;
        self
    }

    /// Remove the target from the stage when the step ends.
    pub fn then_remove(mut self) -> Self {
        self.remove_target = true;
        self
    }

    pub fn on_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_start = Some(Rc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.on_complete = Some(Rc::new(f));
        self
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Target::None => "none".to_string(),
            Target::Entity(id) => id.to_string(),
            Target::Timeline(tl) => format!("timeline {}", tl.id()),
        };
        f.debug_struct("Step")
            .field("target", &target)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("anchor", &self.anchor)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
