//! Stage: the render tree.
//!
//! A tree of nodes keyed by `EntityId`. Timelines write attributes, the
//! emitter inserts and removes particles, and the renderer reads a flattened
//! snapshot. The stage never knows about time or scenes.
//!
//! `Stage` is a cheap clonable handle; every clone sees the same tree.

mod value;

pub use value::{Prop, Value};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::types::{Color, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Draws nothing; used for scene roots and grouping.
    Group,
    Glyph(char),
    Text(String),
    /// Multi-line text art, drawn with its top-left corner at the node position.
    Art(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub visual: Visual,
    pub layer: i32,
    pub attrs: BTreeMap<Prop, Value>,
}

impl Node {
    pub fn new(visual: Visual) -> Self {
        Node {
            visual,
            layer: 0,
            attrs: BTreeMap::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(Visual::Group)
    }

    pub fn glyph(ch: char) -> Self {
        Self::new(Visual::Glyph(ch))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Visual::Text(text.into()))
    }

    pub fn art(lines: Vec<String>) -> Self {
        Self::new(Visual::Art(lines))
    }

    pub fn at(self, p: Point) -> Self {
        self.with(Prop::X, p.x).with(Prop::Y, p.y)
    }

    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn fg(self, color: Color) -> Self {
        self.with(Prop::Fg, color)
    }

    pub fn with(mut self, prop: Prop, value: impl Into<Value>) -> Self {
        self.attrs.insert(prop, value.into());
        self
    }
}

/// A node flattened against its ancestors, ready to rasterize.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: EntityId,
    pub visual: Visual,
    pub position: Point,
    pub layer: i32,
    pub opacity: f64,
    pub scale: f64,
    pub fg: Option<Color>,
}

struct Entry {
    node: Node,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

#[derive(Default)]
struct Tree {
    next_id: u64,
    entries: BTreeMap<EntityId, Entry>,
    roots: Vec<EntityId>,
}

#[derive(Clone, Default)]
pub struct Stage(Rc<RefCell<Tree>>);

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `parent`, or at the top level when `parent` is `None`.
    ///
    /// Returns `None` if the parent is no longer on stage.
    pub fn insert(&self, parent: Option<EntityId>, node: Node) -> Option<EntityId> {
        let mut tree = self.0.borrow_mut();
        if let Some(p) = parent {
            if !tree.entries.contains_key(&p) {
                return None;
            }
        }
        tree.next_id += 1;
        let id = EntityId(tree.next_id);
        tree.entries.insert(
            id,
            Entry {
                node,
                parent,
                children: Vec::new(),
            },
        );
        match parent {
            Some(p) => {
                if let Some(entry) = tree.entries.get_mut(&p) {
                    entry.children.push(id);
                }
            }
            None => tree.roots.push(id),
        }
        Some(id)
    }

    /// Remove a node and its whole subtree. Returns how many nodes were removed.
    pub fn remove(&self, id: EntityId) -> usize {
        let mut tree = self.0.borrow_mut();
        let Some(entry) = tree.entries.get(&id) else {
            return 0;
        };
        match entry.parent {
            Some(p) => {
                if let Some(parent) = tree.entries.get_mut(&p) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => tree.roots.retain(|r| *r != id),
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(entry) = tree.entries.remove(&next) {
                pending.extend(entry.children);
                removed += 1;
            }
        }
        removed
    }

    /// Set an attribute. Returns `false` if the node is gone.
    pub fn set(&self, id: EntityId, prop: Prop, value: Value) -> bool {
        let mut tree = self.0.borrow_mut();
        match tree.entries.get_mut(&id) {
            Some(entry) => {
                entry.node.attrs.insert(prop, value);
                true
            }
            None => false,
        }
    }

    /// Read an attribute, falling back to the prop's default when unset.
    pub fn get(&self, id: EntityId, prop: Prop) -> Option<Value> {
        let tree = self.0.borrow();
        let entry = tree.entries.get(&id)?;
        entry
            .node
            .attrs
            .get(&prop)
            .cloned()
            .or_else(|| prop.default_value())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.0.borrow().entries.contains_key(&id)
    }

    /// Total number of nodes on stage.
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn visual(&self, id: EntityId) -> Option<Visual> {
        self.0.borrow().entries.get(&id).map(|e| e.node.visual.clone())
    }

    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.0
            .borrow()
            .entries
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    /// All nodes below `id`, not including `id` itself.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let tree = self.0.borrow();
        let mut out = Vec::new();
        let mut pending: Vec<EntityId> = tree
            .entries
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        while let Some(next) = pending.pop() {
            if let Some(entry) = tree.entries.get(&next) {
                pending.extend(entry.children.iter().copied());
            }
            out.push(next);
        }
        out
    }

    /// Flatten the visible tree. Positions accumulate down the tree, opacity
    /// and scale multiply, and `fg` is inherited when a node has none.
    pub fn snapshot(&self) -> Vec<Sprite> {
        let tree = self.0.borrow();
        let mut sprites = Vec::new();
        let mut pending: Vec<(EntityId, Point, f64, f64, Option<Color>)> = tree
            .roots
            .iter()
            .rev()
            .map(|id| (*id, Point::default(), 1.0, 1.0, None))
            .collect();

        while let Some((id, origin, opacity, scale, fg)) = pending.pop() {
            let Some(entry) = tree.entries.get(&id) else {
                continue;
            };
            let attrs = &entry.node.attrs;
            let visible = attrs.get(&Prop::Visible).and_then(Value::as_flag).unwrap_or(true);
            if !visible {
                continue;
            }
            let num = |prop: Prop, default: f64| {
                attrs.get(&prop).and_then(Value::as_number).unwrap_or(default)
            };
            let position = Point::new(origin.x + num(Prop::X, 0.0), origin.y + num(Prop::Y, 0.0));
            let opacity = opacity * num(Prop::Opacity, 1.0).clamp(0.0, 1.0);
            let scale = scale * num(Prop::Scale, 1.0).max(0.0);
            let fg = attrs.get(&Prop::Fg).and_then(Value::as_color).or(fg);

            let visual = match (&entry.node.visual, attrs.get(&Prop::Glyph), attrs.get(&Prop::Text)) {
                (Visual::Glyph(_), Some(Value::Glyph(ch)), _) => Visual::Glyph(*ch),
                (Visual::Text(_), _, Some(Value::Text(t))) => Visual::Text(t.clone()),
                (v, _, _) => v.clone(),
            };
            if visual != Visual::Group {
                sprites.push(Sprite {
                    id,
                    visual,
                    position,
                    layer: entry.node.layer,
                    opacity,
                    scale,
                    fg,
                });
            }

            for child in entry.children.iter().rev() {
                pending.push((*child, position, opacity, scale, fg));
            }
        }
        sprites
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("nodes", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_takes_the_whole_subtree() {
        let stage = Stage::new();
        let root = stage.insert(None, Node::group()).unwrap();
        let a = stage.insert(Some(root), Node::glyph('a')).unwrap();
        stage.insert(Some(a), Node::glyph('b')).unwrap();
        let other = stage.insert(None, Node::glyph('c')).unwrap();

        assert_eq!(stage.len(), 4);
        assert_eq!(stage.remove(root), 3);
        assert_eq!(stage.len(), 1);
        assert!(stage.contains(other));
        assert_eq!(stage.remove(root), 0);
    }

    #[test]
    fn insert_under_missing_parent_is_refused() {
        let stage = Stage::new();
        let root = stage.insert(None, Node::group()).unwrap();
        stage.remove(root);
        assert!(stage.insert(Some(root), Node::glyph('x')).is_none());
        assert!(stage.is_empty());
    }

    #[test]
    fn get_falls_back_to_defaults() {
        let stage = Stage::new();
        let id = stage.insert(None, Node::glyph('*').with(Prop::X, 3.0)).unwrap();
        assert_eq!(stage.get(id, Prop::X), Some(Value::Number(3.0)));
        assert_eq!(stage.get(id, Prop::Opacity), Some(Value::Number(1.0)));
        assert_eq!(stage.get(id, Prop::Fg), None);
    }

    #[test]
    fn snapshot_composes_position_and_opacity() {
        let stage = Stage::new();
        let root = stage
            .insert(None, Node::group().at(Point::new(10.0, 5.0)).with(Prop::Opacity, 0.5))
            .unwrap();
        stage
            .insert(Some(root), Node::glyph('*').at(Point::new(2.0, 1.0)).with(Prop::Opacity, 0.5))
            .unwrap();

        let sprites = stage.snapshot();
        assert_eq!(sprites.len(), 1);
        assert_eq!(sprites[0].position, Point::new(12.0, 6.0));
        assert!((sprites[0].opacity - 0.25).abs() < 1e-9);
    }

    #[test]
    fn hidden_nodes_hide_their_children() {
        let stage = Stage::new();
        let root = stage.insert(None, Node::group().with(Prop::Visible, false)).unwrap();
        stage.insert(Some(root), Node::glyph('*')).unwrap();
        assert!(stage.snapshot().is_empty());
    }
}
