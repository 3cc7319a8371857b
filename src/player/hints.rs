use std::io::Write;

use crossterm::{queue, style};

use crate::config::KeyBindings;

/// One entry of the key hint bar: the keys, drawn bold, and what they do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub keys: String,
    pub action: &'static str,
}

/// Hints for the configured bindings, e.g. `[→ Space] next`.
pub fn hints(bindings: &KeyBindings) -> Vec<Hint> {
    let describe = |keys: &[String]| {
        let names: Vec<&str> = keys.iter().map(|k| key_label(k)).collect();
        format!("[{}]", names.join(" "))
    };
    vec![
        Hint {
            keys: describe(&bindings.advance),
            action: "next",
        },
        Hint {
            keys: describe(&bindings.quit),
            action: "quit",
        },
    ]
}

fn key_label(binding: &str) -> &str {
    match binding {
        "Right" => "→",
        "Left" => "←",
        "Up" => "↑",
        "Down" => "↓",
        other => other,
    }
}

pub fn print_hints(out: &mut impl Write, hints: &[Hint]) -> anyhow::Result<()> {
    queue!(out, style::Print(" "))?;
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            queue!(out, style::Print("  "))?;
        }
        queue!(
            out,
            style::SetAttribute(style::Attribute::Bold),
            style::Print(&hint.keys),
            style::SetAttribute(style::Attribute::Reset),
            style::SetAttribute(style::Attribute::Dim),
            style::Print(format!(" {}", hint.action)),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_read_naturally() {
        let hints = hints(&KeyBindings::default());
        assert_eq!(hints[0].keys, "[→ Space Enter]");
        assert_eq!(hints[1].keys, "[q Esc Ctrl-c]");
        assert_eq!(hints[1].action, "quit");
    }

    #[test]
    fn hints_print_keys_and_actions() {
        let mut out = Vec::new();
        print_hints(&mut out, &hints(&KeyBindings::default())).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[→ Space Enter]"));
        assert!(text.contains(" next"));
    }
}
