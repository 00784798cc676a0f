use tracing::{debug, warn};

use crate::input::{EventTarget, KeyEventKind, KeyboardEvent};
use crate::shortcut::ShortcutSpec;

/// Dispatches the events a physical press of `spec` would produce.
///
/// Sends keydown then keyup. A bare printable key (shift allowed) also gets a
/// legacy keypress. Returns how many events reached the target; a spec with
/// neither a key nor a key code dispatches nothing.
pub fn synthesize<T: EventTarget + ?Sized>(spec: &ShortcutSpec, target: &mut T) -> usize {
    if spec.key().is_empty() && spec.key_code() == 0 {
        warn!(shortcut = %spec, "shortcut has no key to press; skipping synthesis");
        return 0;
    }

    let code = if spec.code().is_empty() {
        format!("Key{}", spec.key())
    } else {
        spec.code().to_string()
    };

    let mut dispatched = 0;
    for kind in [KeyEventKind::KeyDown, KeyEventKind::KeyUp] {
        target.dispatch_event(KeyboardEvent {
            kind,
            key: spec.key().to_string(),
            code: code.clone(),
            key_code: spec.key_code(),
            char_code: 0,
            ctrl: spec.ctrl(),
            alt: spec.alt(),
            shift: spec.shift(),
            meta: spec.meta(),
            bubbles: true,
            cancelable: true,
        });
        dispatched += 1;
    }

    if let Some(ch) = single_char(spec.key()) {
        if !spec.ctrl() && !spec.alt() && !spec.meta() {
            let char_code = u32::from(ch);
            target.dispatch_event(KeyboardEvent {
                kind: KeyEventKind::KeyPress,
                key: spec.key().to_string(),
                code: String::new(),
                key_code: char_code,
                char_code,
                ctrl: false,
                alt: false,
                shift: false,
                meta: false,
                bubbles: true,
                cancelable: true,
            });
            dispatched += 1;
        }
    }

    debug!(shortcut = %spec, dispatched, "synthetic key events dispatched");
    dispatched
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}
