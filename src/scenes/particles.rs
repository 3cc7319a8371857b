use crate::emitter::{effects, EmissionPolicy};
use crate::scene::{Choreography, SceneContext, SceneError, Trigger};
use crate::stage::Node;
use crate::timeline::{Ease, Step, Timeline};
use crate::types::{Color, Point};

use super::{center_x, parked, rise_in, Placed, INK, PINK, VIOLET};

const LINES: [(&str, Color); 3] = [
    ("Every Moment", INK),
    ("With You", PINK),
    ("Is Pure Magic ✨", VIOLET),
];

/// A steady stream of rising particles while three lines of text settle in.
#[derive(Default)]
pub struct Particles {
    lines: Vec<Placed>,
}

impl Choreography for Particles {
    fn trigger(&self) -> Trigger {
        Trigger::Auto { delay: 0.0 }
    }

    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let area = cx.area();
        let top = (f64::from(area.height) / 2.0).floor() - 2.0;
        self.lines.clear();
        for (i, (text, color)) in LINES.iter().enumerate() {
            let rest = Point::new(center_x(area, text.chars().count()), top + 2.0 * i as f64);
            let id = cx.spawn(parked(Node::text(*text).fg(*color).layer(1), rest, 3.0, 0.8))?;
            self.lines.push(Placed { id, rest });
        }
        Ok(())
    }

    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        if self.lines.is_empty() {
            return Err(SceneError::Detached);
        }
        let area = cx.area();

        let stream = cx.emitter(0);
        stream.start(EmissionPolicy::Interval { period: 0.08 }, effects::rising(area))?;

        let mut builder = Timeline::builder().label("particles:lines").step(Step::wait(0.5));
        for (i, line) in self.lines.iter().enumerate() {
            let step = rise_in(*line, 1.2, Ease::BackOut(1.7));
            builder = builder.step(if i == 0 { step } else { step.offset(-0.6) });
        }
        cx.finale(builder, 3.0)?;
        Ok(())
    }
}
