use crate::emitter::{effects, EmissionPolicy};
use crate::scene::{Choreography, SceneContext, SceneError, Trigger};
use crate::stage::{Node, Prop};
use crate::timeline::{Ease, Step, Timeline};
use crate::types::{Color, Point};

use super::{art_width, center_x, parked, rise_in, Placed, INK, PINK, VIOLET};

const PHOTO: &[&str] = &[
    "+-----------------------+",
    "|                       |",
    "|     ( ^_^ ) ( ^.^ )   |",
    "|       \\|/     \\|/     |",
    "|        |   ♥   |      |",
    "|       / \\     / \\     |",
    "|                       |",
    "+-----------------------+",
];

const TITLE: &str = "Here's Our First Year Together";
const LOVE: &str = "I LOVE YOUUU";

const RINGS: [Color; 3] = [
    Color::rgb(251, 113, 133),
    Color::rgb(216, 180, 254),
    Color::rgb(249, 168, 212),
];

/// The closing picture, framed with rings and floating hearts.
#[derive(Default)]
pub struct Photo {
    nodes: Option<Nodes>,
}

#[derive(Clone, Copy)]
struct Nodes {
    photo: Placed,
    title: Placed,
    love: Placed,
}

impl Choreography for Photo {
    fn trigger(&self) -> Trigger {
        Trigger::Auto { delay: 0.0 }
    }

    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let area = cx.area();
        let h = f64::from(area.height);

        let art = cx.art("photo", PHOTO);
        let (art_w, art_h) = (art_width(&art), art.len());
        let photo_rest = Point::new(center_x(area, art_w), ((h - art_h as f64) / 2.0 - 3.0).floor().max(0.0));
        let photo = cx.spawn(parked(Node::group().layer(1), photo_rest, 4.0, 0.0).with(Prop::Rotation, -15.0))?;
        cx.spawn_under(photo, Node::art(art).fg(INK))?;
        // corner accents
        let (right, bottom) = ((art_w.max(1) - 1) as f64, (art_h.max(1) - 1) as f64);
        for (x, y) in [(0.0, 0.0), (right, 0.0), (0.0, bottom), (right, bottom)] {
            cx.spawn_under(photo, Node::glyph('✦').at(Point::new(x, y)).fg(PINK).layer(1))?;
        }

        let below = photo_rest.y + art_h as f64 + 1.0;
        let title_rest = Point::new(center_x(area, TITLE.chars().count()), below);
        let title = cx.spawn(parked(Node::text(TITLE).fg(VIOLET).layer(1), title_rest, 2.0, 0.5))?;
        let love_rest = Point::new(center_x(area, LOVE.chars().count()), below + 2.0);
        let love = cx.spawn(parked(Node::text(LOVE).fg(PINK).layer(1), love_rest, 2.0, 0.5))?;

        self.nodes = Some(Nodes {
            photo: Placed {
                id: photo,
                rest: photo_rest,
            },
            title: Placed {
                id: title,
                rest: title_rest,
            },
            love: Placed {
                id: love,
                rest: love_rest,
            },
        });
        Ok(())
    }

    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        let n = self.nodes.ok_or(SceneError::Detached)?;
        let area = cx.area();

        let rings = cx.emitter(-1);
        let hearts = cx.emitter(3);
        let celebrate = move || {
            let started = rings
                .start(EmissionPolicy::Interval { period: 1.5 }, effects::splash(area, RINGS))
                .and_then(|_| hearts.start(EmissionPolicy::Burst { count: 10, stagger: 0.8 }, effects::hearts(area)));
            if let Err(e) = started {
                tracing::warn!("photo effects failed: {e}");
            }
        };

        let spring = Ease::ElasticOut {
            amplitude: 1.0,
            period: 0.5,
        };
        let builder = Timeline::builder()
            .label("photo:reveal")
            .step(rise_in(n.photo, 2.0, spring).prop(Prop::Rotation, 0.0))
            .step(Step::call(celebrate).at(0.5))
            .step(rise_in(n.title, 1.2, spring).offset(-1.0))
            .step(rise_in(n.love, 1.0, spring).offset(-0.8))
            .step(Step::wait(2.0));
        cx.finale(builder, 4.0)?;
        Ok(())
    }
}
