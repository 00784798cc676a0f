pub mod synthesizer;

use serde::Serialize;

pub use synthesizer::synthesize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
    KeyPress,
}

/// A synthetic key event in the shape of a DOM `KeyboardEventInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardEvent {
    #[serde(rename = "type")]
    pub kind: KeyEventKind,
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub char_code: u32,
    #[serde(rename = "ctrlKey")]
    pub ctrl: bool,
    #[serde(rename = "altKey")]
    pub alt: bool,
    #[serde(rename = "shiftKey")]
    pub shift: bool,
    #[serde(rename = "metaKey")]
    pub meta: bool,
    pub bubbles: bool,
    pub cancelable: bool,
}

/// The document context events are dispatched into.
pub trait EventTarget {
    fn dispatch_event(&mut self, event: KeyboardEvent);
}

impl EventTarget for Vec<KeyboardEvent> {
    fn dispatch_event(&mut self, event: KeyboardEvent) {
        self.push(event);
    }
}
