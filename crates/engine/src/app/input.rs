use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, ModifiersState, NamedKey};

use crate::world::{KeyPhase, RawKeyEvent};

const DOWN: &[KeyPhase] = &[KeyPhase::Down];
const DOWN_AND_PRESS: &[KeyPhase] = &[KeyPhase::Down, KeyPhase::Press];
const UP: &[KeyPhase] = &[KeyPhase::Up];

/// Turns winit keyboard events into engine key events with browser-style
/// key names (`"a"`, `"ArrowUp"`, `" "`).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator {
    shift_pressed: bool,
    ctrl_pressed: bool,
}

impl KeyTranslator {
    pub fn set_modifiers(&mut self, state: ModifiersState) {
        self.shift_pressed = state.shift_key();
        self.ctrl_pressed = state.control_key();
    }

    /// `None` for keys without a stable name (dead or unidentified keys).
    pub fn translate(&self, event: &KeyEvent) -> Option<(RawKeyEvent, &'static [KeyPhase])> {
        self.translate_parts(&event.logical_key, event.state, event.text.as_deref())
    }

    fn translate_parts(
        &self,
        key: &Key,
        state: ElementState,
        text: Option<&str>,
    ) -> Option<(RawKeyEvent, &'static [KeyPhase])> {
        let name = key_name(key)?;
        let phases = match state {
            ElementState::Pressed if text.is_some_and(|text| !text.is_empty()) => DOWN_AND_PRESS,
            ElementState::Pressed => DOWN,
            ElementState::Released => UP,
        };
        let raw = RawKeyEvent::new(name)
            .with_shift(self.shift_pressed)
            .with_ctrl(self.ctrl_pressed);
        Some((raw, phases))
    }
}

fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_string()),
        Key::Named(NamedKey::Space) => Some(" ".to_string()),
        Key::Named(named) => Some(format!("{named:?}")),
        Key::Unidentified(_) | Key::Dead(_) => None,
    }
}

pub(crate) fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape)
}

#[cfg(test)]
mod tests {
    use winit::keyboard::NativeKey;

    use super::*;

    #[test]
    fn character_press_yields_down_then_press() {
        let translator = KeyTranslator::default();
        let (raw, phases) = translator
            .translate_parts(&Key::Character("w".into()), ElementState::Pressed, Some("w"))
            .expect("named key");

        assert_eq!(raw, RawKeyEvent::new("w"));
        assert_eq!(phases, &[KeyPhase::Down, KeyPhase::Press]);
    }

    #[test]
    fn named_keys_use_browser_names() {
        let translator = KeyTranslator::default();
        let name = |key: Key| {
            translator
                .translate_parts(&key, ElementState::Pressed, None)
                .map(|(raw, _)| raw.key)
        };

        assert_eq!(name(Key::Named(NamedKey::ArrowUp)).as_deref(), Some("ArrowUp"));
        assert_eq!(name(Key::Named(NamedKey::Escape)).as_deref(), Some("Escape"));
        assert_eq!(name(Key::Named(NamedKey::Space)).as_deref(), Some(" "));
        assert_eq!(name(Key::Unidentified(NativeKey::Unidentified)), None);
        assert_eq!(name(Key::Dead(None)), None);
    }

    #[test]
    fn keys_without_text_only_go_down_and_release_goes_up() {
        let translator = KeyTranslator::default();
        let (_, pressed) = translator
            .translate_parts(&Key::Named(NamedKey::ArrowLeft), ElementState::Pressed, None)
            .expect("named key");
        let (_, released) = translator
            .translate_parts(&Key::Character("a".into()), ElementState::Released, None)
            .expect("named key");

        assert_eq!(pressed, &[KeyPhase::Down]);
        assert_eq!(released, &[KeyPhase::Up]);
    }

    #[test]
    fn modifiers_are_carried_into_raw_events() {
        let mut translator = KeyTranslator::default();
        translator.set_modifiers(ModifiersState::SHIFT | ModifiersState::CONTROL);
        let (raw, _) = translator
            .translate_parts(&Key::Character("S".into()), ElementState::Pressed, Some("S"))
            .expect("named key");
        assert!(raw.shift_pressed);
        assert!(raw.ctrl_pressed);

        translator.set_modifiers(ModifiersState::empty());
        let (raw, _) = translator
            .translate_parts(&Key::Character("s".into()), ElementState::Released, None)
            .expect("named key");
        assert!(!raw.shift_pressed);
        assert!(!raw.ctrl_pressed);
    }
}
