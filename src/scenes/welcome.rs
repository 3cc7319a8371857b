use crate::emitter::{effects, EmissionPolicy};
use crate::scene::{Choreography, SceneContext, SceneError, Trigger};
use crate::stage::Node;
use crate::timeline::{Ease, Timeline};
use crate::types::{Color, Point};

use super::{art_width, center_x, parked, rise_in, Placed, INK, PINK, SPRING};

const KITTY: &[&str] = &[
    r"  /\_/\  ",
    r" ( o.o ) ",
    r"  > ^ <  ",
    r" /     \ ",
    r"(_)---(_)",
];

const RINGS: [Color; 3] = [
    Color::rgb(244, 114, 182),
    Color::rgb(192, 132, 252),
    Color::rgb(253, 186, 116),
];

const GREETING: &str = "H E L L O";
const NAME: &str = "C U T I E P I E E";

/// Opens the show by itself: the kitty bounces in, then the greeting.
#[derive(Default)]
pub struct Welcome {
    nodes: Option<Nodes>,
}

#[derive(Clone, Copy)]
struct Nodes {
    kitty: Placed,
    greeting: Placed,
    name: Placed,
}

impl Choreography for Welcome {
    fn trigger(&self) -> Trigger {
        Trigger::Auto { delay: 0.0 }
    }

    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let area = cx.area();
        let mid = (f64::from(area.height) / 2.0).floor();

        let art = cx.art("kitty", KITTY);
        let kitty_rest = Point::new(center_x(area, art_width(&art)), (mid - 1.0 - art.len() as f64).max(0.0));
        let kitty = cx.spawn(parked(Node::art(art).fg(PINK), kitty_rest, 3.0, 0.0))?;

        let greeting_rest = Point::new(center_x(area, GREETING.chars().count()), mid + 1.0);
        let greeting = cx.spawn(parked(Node::text(GREETING).fg(INK), greeting_rest, 2.0, 0.5))?;

        let name_rest = Point::new(center_x(area, NAME.chars().count()), mid + 3.0);
        let name = cx.spawn(parked(Node::text(NAME).fg(PINK), name_rest, 2.0, 0.5))?;

        self.nodes = Some(Nodes {
            kitty: Placed {
                id: kitty,
                rest: kitty_rest,
            },
            greeting: Placed {
                id: greeting,
                rest: greeting_rest,
            },
            name: Placed {
                id: name,
                rest: name_rest,
            },
        });
        Ok(())
    }

    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let n = self.nodes.ok_or(SceneError::Detached)?;
        let area = cx.area();

        let rings = cx.emitter(-1);
        rings.start(EmissionPolicy::Interval { period: 1.5 }, effects::splash(area, RINGS))?;

        let builder = Timeline::builder()
            .label("welcome:entrance")
            .step(rise_in(n.kitty, 1.5, SPRING))
            .step(rise_in(n.greeting, 1.2, Ease::BackOut(1.7)).offset(-0.8))
            .step(rise_in(n.name, 1.0, Ease::BackOut(1.7)).offset(-0.8));
        cx.finale(builder, 3.0)?;
        Ok(())
    }
}
