//! Keyboard shortcuts for toolbar actions.
//!
//! ## Learning: HashMap Lookups with Derived Keys
//!
//! `KeyPress` derives `Hash` and `Eq`, so a chord can be used directly as
//! a map key. Parsing normalises case (`Ctrl+B` and `ctrl+b` are the same
//! chord), which keeps lookups a single hash probe.

use std::collections::HashMap;

use crate::command::ToolbarAction;
use crate::config::Config;

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl+Shift.
    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Ctrl+Alt.
    pub const CTRL_ALT: Modifiers = Modifiers {
        ctrl: true,
        alt: true,
        shift: false,
        meta: false,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    /// Parses one modifier name into `self`. Returns false for unknown names.
    fn add(&mut self, name: &str) -> bool {
        match name {
            "ctrl" | "control" => self.ctrl = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            "meta" | "cmd" | "win" | "super" => self.meta = true,
            _ => return false,
        }
        true
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("ctrl");
        }
        if self.alt {
            parts.push("alt");
        }
        if self.shift {
            parts.push("shift");
        }
        if self.meta {
            parts.push("meta");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, stored lowercase
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Space,
}

impl Key {
    /// Parses a key name.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "enter" | "return" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "escape" | "esc" => Some(Key::Escape),
            "space" => Some(Key::Space),
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Enter => write!(f, "enter"),
            Key::Tab => write!(f, "tab"),
            Key::Backspace => write!(f, "backspace"),
            Key::Delete => write!(f, "delete"),
            Key::Escape => write!(f, "escape"),
            Key::Space => write!(f, "space"),
        }
    }
}

/// A key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Parses a chord like `ctrl+shift+z`.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let (mods, key) = match lower.rsplit_once('+') {
            // "ctrl++" binds the plus key itself
            Some((mods, "")) => (mods.strip_suffix('+')?, "+"),
            Some((mods, key)) => (mods, key),
            None => ("", lower.as_str()),
        };
        let key = Key::parse(key)?;

        let mut modifiers = Modifiers::NONE;
        for name in mods.split('+').filter(|m| !m.is_empty()) {
            if !modifiers.add(name) {
                return None;
            }
        }
        Some(Self { key, modifiers })
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// A key binding maps a chord to a toolbar action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyPress,
    pub action: ToolbarAction,
}

/// Keyboard mapping.
#[derive(Debug, Clone)]
pub struct Keymap {
    by_key: HashMap<KeyPress, ToolbarAction>,
}

impl Keymap {
    /// Creates a keymap with the default bindings.
    pub fn new() -> Self {
        let mut keymap = Self {
            by_key: HashMap::new(),
        };
        keymap.add_default_bindings();
        keymap
    }

    /// Creates a keymap from configuration.
    ///
    /// User bindings override defaults. Entries that do not parse are
    /// skipped with a warning.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::new();
        for (key_str, action_str) in &config.keyboard.bindings {
            let Some(key) = KeyPress::parse(key_str) else {
                tracing::warn!("Ignoring key binding {:?} = {:?}", key_str, action_str);
                continue;
            };
            if action_str.is_empty() || action_str == "none" {
                keymap.unbind(&key);
                continue;
            }
            match ToolbarAction::from_name(action_str) {
                Some(action) => keymap.bind(key, action),
                None => tracing::warn!("Ignoring key binding {:?} = {:?}", key_str, action_str),
            }
        }
        keymap
    }

    fn add_default_bindings(&mut self) {
        use ToolbarAction::*;

        let ch = Key::Char;
        let bindings = [
            (KeyPress::new(ch('b'), Modifiers::CTRL), Bold),
            (KeyPress::new(ch('i'), Modifiers::CTRL), Italic),
            (KeyPress::new(ch('u'), Modifiers::CTRL), Underline),
            (KeyPress::new(ch('z'), Modifiers::CTRL), Undo),
            (KeyPress::new(ch('z'), Modifiers::CTRL_SHIFT), Redo),
            (KeyPress::new(ch('y'), Modifiers::CTRL), Redo),
            (KeyPress::new(ch('a'), Modifiers::CTRL), SelectAll),
            (KeyPress::new(ch('0'), Modifiers::CTRL_ALT), Paragraph),
            (KeyPress::new(ch('1'), Modifiers::CTRL_ALT), Heading(1)),
            (KeyPress::new(ch('2'), Modifiers::CTRL_ALT), Heading(2)),
            (KeyPress::new(ch('3'), Modifiers::CTRL_ALT), Heading(3)),
            (KeyPress::new(ch('7'), Modifiers::CTRL_SHIFT), OrderedList),
            (KeyPress::new(ch('8'), Modifiers::CTRL_SHIFT), BulletList),
        ];
        for (key, action) in bindings {
            self.bind(key, action);
        }
    }

    /// Adds or replaces a binding.
    pub fn bind(&mut self, key: KeyPress, action: ToolbarAction) {
        self.by_key.insert(key, action);
    }

    /// Removes a binding.
    pub fn unbind(&mut self, key: &KeyPress) -> Option<ToolbarAction> {
        self.by_key.remove(key)
    }

    /// Looks up the action bound to a chord.
    pub fn lookup(&self, key: &KeyPress) -> Option<ToolbarAction> {
        self.by_key.get(key).copied()
    }

    /// Returns all bindings, sorted by chord text.
    pub fn bindings(&self) -> Vec<KeyBinding> {
        let mut bindings: Vec<KeyBinding> = self
            .by_key
            .iter()
            .map(|(key, action)| KeyBinding {
                key: *key,
                action: *action,
            })
            .collect();
        bindings.sort_by_key(|b| b.key.to_string());
        bindings
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
