use crate::emitter::{effects, EmissionPolicy};
use crate::scene::{Choreography, SceneContext, SceneError};
use crate::stage::{Node, Prop};
use crate::timeline::{Ease, Step, Timeline};
use crate::types::{Color, Point};

use super::{art_width, center_x, parked, rise_in, Placed, GOLD, INK, PINK, SPRING};

const CAKE: &[&str] = &[
    "      i i i      ",
    "    __|_|_|__    ",
    "   |~~~~~~~~~|   ",
    "   |  HAPPY  |   ",
    "  _|_________|_  ",
    " |~~~~~~~~~~~~~| ",
    " |_____________| ",
];

const TITLE: &str = "I Cooked An Anniversary Cake For You!";
const SUBTITLE: &str = "Make a wish and cut the cake bb...";
const BUTTON: &str = "[ Cut the Cake! ]";
const BUTTON_BUSY: &str = "[ Cutting... ]";

const FROSTING: [Color; 3] = [
    Color::rgb(146, 64, 14),
    Color::rgb(217, 119, 6),
    Color::rgb(120, 53, 15),
];

/// Waits for the viewer to cut the cake, then splashes and sends up balloons.
#[derive(Default)]
pub struct Cake {
    nodes: Option<Nodes>,
}

#[derive(Clone, Copy)]
struct Nodes {
    button: Placed,
}

impl Choreography for Cake {
    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let area = cx.area();
        let h = f64::from(area.height);

        let title_rest = Point::new(center_x(area, TITLE.chars().count()), 2.0);
        let title = cx.spawn(parked(Node::text(TITLE).fg(PINK).layer(1), title_rest, 1.0, 1.0))?;
        let subtitle_rest = Point::new(center_x(area, SUBTITLE.chars().count()), 4.0);
        let subtitle = cx.spawn(parked(Node::text(SUBTITLE).fg(INK).layer(1), subtitle_rest, 1.0, 1.0))?;

        let art = cx.art("cake", CAKE);
        let cake_rest = Point::new(center_x(area, art_width(&art)), (h / 2.0 - art.len() as f64 / 2.0).floor());
        let cake = cx.spawn(parked(Node::art(art).fg(GOLD), cake_rest, 4.0, 0.6))?;

        let button_rest = Point::new(center_x(area, BUTTON.chars().count()), (h - 4.0).max(0.0));
        let button = cx.spawn(parked(Node::text(BUTTON).fg(PINK).layer(2), button_rest, 2.0, 0.8))?;

        let placed = |id, rest| Placed { id, rest };
        cx.timeline(
            Timeline::builder()
                .label("cake:entrance")
                .step(rise_in(placed(title, title_rest), 0.8, Ease::PowerOut(2.0)))
                .step(rise_in(placed(subtitle, subtitle_rest), 0.8, Ease::PowerOut(2.0)).offset(-0.5))
                .step(rise_in(placed(cake, cake_rest), 1.2, SPRING).offset(-0.4))
                .step(rise_in(placed(button, button_rest), 0.8, Ease::BackOut(1.7)).offset(-0.6)),
        )?;

        self.nodes = Some(Nodes {
            button: placed(button, button_rest),
        });
        Ok(())
    }

    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let n = self.nodes.ok_or(SceneError::Detached)?;
        let area = cx.area();

        let splash = cx.emitter(-1);
        splash.start(EmissionPolicy::Burst { count: 3, stagger: 0.2 }, effects::splash(area, FROSTING))?;

        let balloons = cx.emitter(3);
        let release = move || {
            if let Err(e) = balloons.start(EmissionPolicy::Burst { count: 15, stagger: 0.12 }, effects::balloons(area)) {
                tracing::warn!("balloon release failed: {e}");
            }
        };

        let builder = Timeline::builder()
            .label("cake:cut")
            .step(Step::to(n.button.id, 0.0).prop(Prop::Text, BUTTON_BUSY))
            .step(Step::call(release).at(0.5))
            .step(Step::wait(3.5));
        cx.finale(builder, 0.0)?;
        Ok(())
    }
}
