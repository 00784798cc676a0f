use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_SHORTCUT: &str = "Ctrl+S";

const NAMED_KEYS: &[(&str, &str, u32)] = &[
    ("enter", "Enter", 13),
    ("escape", "Escape", 27),
    ("space", "Space", 32),
    ("tab", "Tab", 9),
    ("f1", "F1", 112),
    ("f2", "F2", 113),
    ("f3", "F3", 114),
    ("f4", "F4", 115),
    ("f5", "F5", 116),
    ("f6", "F6", 117),
    ("f7", "F7", 118),
    ("f8", "F8", 119),
    ("f9", "F9", 120),
    ("f10", "F10", 121),
    ("f11", "F11", 122),
    ("f12", "F12", 123),
    ("arrowup", "ArrowUp", 38),
    ("arrowdown", "ArrowDown", 40),
    ("arrowleft", "ArrowLeft", 37),
    ("arrowright", "ArrowRight", 39),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("shortcut cannot be empty")]
    Empty,
    #[error("shortcut `{0}` has neither a key nor a modifier")]
    NoKeyOrModifier(String),
}

/// A parsed keyboard combination, ready to be turned into synthetic key events.
///
/// Only [`parse_shortcut`] builds one, so a spec always carries a main key or
/// at least one modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutSpec {
    key: String,
    code: String,
    key_code: u32,
    #[serde(rename = "ctrlKey")]
    ctrl: bool,
    #[serde(rename = "altKey")]
    alt: bool,
    #[serde(rename = "shiftKey")]
    shift: bool,
    #[serde(rename = "metaKey")]
    meta: bool,
}

impl ShortcutSpec {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn key_code(&self) -> u32 {
        self.key_code
    }

    pub fn ctrl(&self) -> bool {
        self.ctrl
    }

    pub fn alt(&self) -> bool {
        self.alt
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    pub fn meta(&self) -> bool {
        self.meta
    }

    pub fn has_modifier(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

impl fmt::Display for ShortcutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::with_capacity(5);
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        if !self.key.is_empty() {
            parts.push(&self.key);
        }
        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for ShortcutSpec {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_shortcut(input)
    }
}

/// Parses a combination such as `Ctrl+Shift+S`.
///
/// Tokens are matched case-insensitively. When several non-modifier tokens
/// appear, the last one becomes the main key. An empty segment counts as a
/// blank main key, so `Ctrl+S+` keeps only the modifier.
pub fn parse_shortcut(input: &str) -> Result<ShortcutSpec, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut spec = ShortcutSpec {
        key: String::new(),
        code: String::new(),
        key_code: 0,
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };
    let mut main_key_found = false;

    for part in input.split('+').map(|part| part.trim().to_lowercase()) {
        match part.as_str() {
            "" => {
                spec.key.clear();
                spec.code.clear();
                spec.key_code = 0;
                main_key_found = false;
            }
            "ctrl" | "control" => spec.ctrl = true,
            "alt" => spec.alt = true,
            "shift" => spec.shift = true,
            "meta" | "command" | "windows" => spec.meta = true,
            token => {
                let (code, key_code) = resolve_main_key(token);
                spec.key = token.to_uppercase();
                spec.code = code;
                spec.key_code = key_code;
                main_key_found = true;
            }
        }
    }

    if !main_key_found && !spec.has_modifier() {
        return Err(ParseError::NoKeyOrModifier(input.to_string()));
    }

    Ok(spec)
}

pub fn parse_optional_shortcut(input: Option<&str>) -> Result<ShortcutSpec, ParseError> {
    input.map_or(Err(ParseError::Empty), parse_shortcut)
}

fn resolve_main_key(token: &str) -> (String, u32) {
    let mut chars = token.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        let upper: String = ch.to_uppercase().collect();
        let key_code = upper.chars().next().map_or(0, u32::from);
        return (format!("Key{upper}"), key_code);
    }

    if let Some((_, code, key_code)) = NAMED_KEYS.iter().find(|(name, _, _)| *name == token) {
        return ((*code).to_string(), *key_code);
    }

    (capitalize(token), 0)
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
