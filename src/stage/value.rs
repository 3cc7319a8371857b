//! Animatable attribute keys and values.

use serde::{Deserialize, Serialize};

use crate::types::Color;

/// An attribute a timeline step can drive on a stage node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    /// Horizontal offset from the parent, in cells.
    X,
    /// Vertical offset from the parent, in cells.
    Y,
    Opacity,
    Scale,
    /// Degrees. Carried for completeness; the terminal renderer ignores it.
    Rotation,
    Fg,
    Glyph,
    Text,
    Visible,
}

impl Prop {
    /// The value a node reports for this prop when it was never set.
    pub fn default_value(self) -> Option<Value> {
        match self {
            Prop::X | Prop::Y | Prop::Rotation => Some(Value::Number(0.0)),
            Prop::Opacity | Prop::Scale => Some(Value::Number(1.0)),
            Prop::Visible => Some(Value::Flag(true)),
            Prop::Fg | Prop::Glyph | Prop::Text => None,
        }
    }
}

/// Value stored against a `Prop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Number(f64),
    Color(Color),
    Glyph(char),
    Text(String),
    Flag(bool),
}

impl Value {
    /// Numbers and colors tween; everything else switches at the end of a step.
    pub fn is_interpolable(&self) -> bool {
        matches!(self, Value::Number(_) | Value::Color(_))
    }

    /// Interpolate towards `other` at eased progress `t`.
    ///
    /// Returns `None` for discrete values and mismatched kinds; callers apply
    /// the target value atomically when the step ends.
    pub fn interpolate(&self, other: &Value, t: f64) -> Option<Value> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(Value::Number(a + (b - a) * t)),
            (Value::Color(a), Value::Color(b)) => Some(Value::Color(a.lerp(*b, t))),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<char> for Value {
    fn from(ch: char) -> Self {
        Value::Glyph(ch)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_interpolate_linearly() {
        let v = Value::Number(10.0).interpolate(&Value::Number(20.0), 0.25);
        assert_eq!(v, Some(Value::Number(12.5)));
    }

    #[test]
    fn discrete_and_mismatched_values_do_not_interpolate() {
        assert!(Value::Glyph('a').interpolate(&Value::Glyph('b'), 0.5).is_none());
        assert!(Value::Number(1.0).interpolate(&Value::Flag(true), 0.5).is_none());
        assert!(!Value::Text("x".into()).is_interpolable());
    }

    #[test]
    fn colors_interpolate_component_wise() {
        let from = Value::Color(Color::rgb(0, 0, 0));
        let to = Value::Color(Color::rgb(200, 100, 50));
        assert_eq!(
            from.interpolate(&to, 0.5),
            Some(Value::Color(Color::rgb(100, 50, 25)))
        );
    }
}
