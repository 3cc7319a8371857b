//! The viewer switches on a light bulb.
//!
//! Pressing advance hides the button, drops a bulb on its wire, flickers it
//! into a glow, warms the room and finishes with a shower of sparkles.

use crate::emitter::{effects, EmissionPolicy};
use crate::scene::{Choreography, SceneContext, SceneError};
use crate::stage::{EntityId, Node, Prop};
use crate::timeline::{Ease, Step, Timeline};
use crate::types::{Color, Point};

use super::{center_x, parked, rise_in, Placed, GOLD, SPRING};

const BUTTON: &str = "[ * LIGHT UP THE ROOM * ]";
const HINT: &str = "press → to illuminate the room";

const BULB: &[&str] = &[
    "  |=|  ",
    " /   \\ ",
    "(  ~  )",
    " \\___/ ",
];
const WIRE_LENGTH: usize = 4;

const DARK: Color = Color::rgb(55, 55, 65);
const WARM: Color = Color::rgb(255, 236, 179);
const GLOW: Color = Color::rgb(253, 224, 71);

#[derive(Default)]
pub struct DarkRoom {
    nodes: Option<Nodes>,
    entrance: Option<Timeline>,
}

#[derive(Clone, Copy)]
struct Nodes {
    walls: EntityId,
    button: Placed,
    hint: Placed,
    /// Wire and bulb together, swaying from the ceiling.
    fixture: Placed,
    bulb: Placed,
    light: EntityId,
}

fn room_outline(width: usize, height: usize) -> Vec<String> {
    let width = width.max(2);
    let height = height.max(2);
    let inner = width - 2;
    let mut lines = Vec::with_capacity(height);
    lines.push(format!("┌{}┐", "─".repeat(inner)));
    for _ in 0..height - 2 {
        lines.push(format!("│{}│", " ".repeat(inner)));
    }
    lines.push(format!("└{}┘", "─".repeat(inner)));
    lines
}

impl Choreography for DarkRoom {
    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let area = cx.area();
        let (w, h) = (f64::from(area.width), f64::from(area.height));

        let outline = room_outline(usize::from(area.width), usize::from(area.height).saturating_sub(1));
        let walls = cx.spawn(Node::art(outline).fg(DARK).layer(-5))?;

        let button_rest = Point::new(center_x(area, BUTTON.chars().count()), (h * 0.6).floor());
        let button = cx.spawn(parked(Node::text(BUTTON).fg(GOLD).layer(2), button_rest, 4.0, 0.5))?;

        let hint_rest = Point::new(center_x(area, HINT.chars().count()), button_rest.y + 2.0);
        let hint = cx.spawn(parked(Node::text(HINT).fg(DARK).layer(2), hint_rest, 2.0, 0.8))?;

        let fixture_rest = Point::new((w / 2.0).floor(), 1.0);
        let fixture = cx.spawn(
            Node::group()
                .at(fixture_rest)
                .layer(1)
                .with(Prop::Opacity, 0.0),
        )?;
        let wire = vec!["|".to_string(); WIRE_LENGTH];
        cx.spawn_under(fixture, Node::art(wire).fg(DARK))?;

        let bulb_width = BULB.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let bulb_rest = Point::new(-((bulb_width / 2) as f64), WIRE_LENGTH as f64);
        let bulb_art = BULB.iter().map(|l| l.to_string()).collect();
        let bulb = cx.spawn_under(fixture, parked(Node::art(bulb_art).fg(GOLD), bulb_rest, -10.0, 0.7))?;

        let light = cx.spawn_under(
            bulb,
            Node::glyph('·')
                .at(Point::new((bulb_width / 2) as f64, 2.0))
                .layer(-1)
                .fg(GLOW)
                .with(Prop::Opacity, 0.0)
                .with(Prop::Scale, 0.0),
        )?;

        let nodes = Nodes {
            walls,
            button: Placed {
                id: button,
                rest: button_rest,
            },
            hint: Placed {
                id: hint,
                rest: hint_rest,
            },
            fixture: Placed {
                id: fixture,
                rest: fixture_rest,
            },
            bulb: Placed {
                id: bulb,
                rest: bulb_rest,
            },
            light,
        };
        self.nodes = Some(nodes);

        let entrance = cx.timeline(
            Timeline::builder()
                .label("dark_room:entrance")
                .delay(0.5)
                .step(rise_in(nodes.button, 1.5, SPRING))
                .step(rise_in(nodes.hint, 1.2, Ease::BackOut(1.7)).at(1.0)),
        )?;
        self.entrance = Some(entrance);
        Ok(())
    }

    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let n = self.nodes.ok_or(SceneError::Detached)?;
        // The press takes over the button and hint from wherever the entrance left them.
        if let Some(entrance) = self.entrance.take() {
            entrance.cancel();
        }

        let area = cx.area();
        let sparkles = cx.emitter(5);
        let shower = move || {
            if let Err(e) = sparkles.start(EmissionPolicy::Burst { count: 20, stagger: 0.08 }, effects::sparkles(area)) {
                tracing::warn!("sparkle shower failed: {e}");
            }
        };

        let out = Ease::PowerOut(2.0);
        let sway = |x: f64, duration: f64, ease: Ease| Step::to(n.fixture.id, duration).prop(Prop::X, x).ease(ease);
        let swing =
            |dx: f64, duration: f64, ease: Ease| Step::to(n.bulb.id, duration).prop(Prop::X, n.bulb.rest.x + dx).ease(ease);
        let flicker = |opacity: f64, scale: f64, duration: f64| {
            Step::to(n.light, duration)
                .prop(Prop::Opacity, opacity)
                .prop(Prop::Scale, scale)
                .ease(out)
        };
        let cx0 = n.fixture.rest.x;

        let builder = Timeline::builder()
            .label("dark_room:light-up")
            // button press
            .step(Step::to(n.button.id, 0.1).prop(Prop::Scale, 0.9))
            .step(Step::to(n.button.id, 0.2).prop(Prop::Scale, 1.1).ease(Ease::BackOut(2.0)))
            .step(
                Step::to(n.hint.id, 0.5)
                    .prop(Prop::Opacity, 0.0)
                    .prop(Prop::Y, n.hint.rest.y - 2.0)
                    .prop(Prop::Scale, 0.7)
                    .ease(Ease::BackIn(2.0))
                    .offset(-0.1),
            )
            .step(
                Step::to(n.button.id, 0.8)
                    .prop(Prop::Opacity, 0.0)
                    .prop(Prop::Y, n.button.rest.y - 2.0)
                    .prop(Prop::Scale, 0.0)
                    .ease(Ease::BackIn(2.0))
                    .offset(0.1),
            )
            // the fixture comes down and sways
            .step(Step::to(n.fixture.id, 0.5).prop(Prop::Opacity, 1.0).ease(out).offset(-0.3))
            .step(sway(cx0 + 1.0, 0.4, out))
            .step(sway(cx0 - 1.0, 0.5, Ease::PowerInOut(2.0)))
            .step(sway(cx0, 0.6, out))
            .step(
                rise_in(n.bulb, 2.5, Ease::ElasticOut {
                    amplitude: 1.2,
                    period: 0.5,
                })
                .offset(-1.2),
            )
            .step(swing(1.0, 0.8, out))
            .step(swing(-1.0, 0.6, Ease::PowerInOut(2.0)))
            .step(swing(0.0, 0.4, out))
            // flicker into a steady glow
            .step(flicker(0.2, 1.3, 0.1).offset(-1.5))
            .step(flicker(0.0, 1.3, 0.1))
            .step(flicker(0.4, 2.5, 0.2))
            .step(flicker(0.1, 2.5, 0.1))
            .step(flicker(0.9, 7.0, 1.2))
            .step(Step::to(n.walls, 2.0).prop(Prop::Fg, WARM).ease(out).offset(-2.0))
            .step(
                Step::to(n.fixture.id, 1.2)
                    .prop(Prop::Opacity, 0.0)
                    .prop(Prop::Scale, 0.8)
                    .prop(Prop::Y, n.fixture.rest.y - 5.0)
                    .ease(Ease::PowerIn(2.0))
                    .offset(-0.5),
            )
            .step(Step::call(shower).offset(-1.0));
        cx.finale(builder, 2.5)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_fills_the_area() {
        let room = room_outline(6, 3);
        assert_eq!(room, ["┌────┐", "│    │", "└────┘"]);
    }
}
