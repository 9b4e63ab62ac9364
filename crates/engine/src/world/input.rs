/// Which host keyboard event a key arrived with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPhase {
    Down,
    Up,
    Press,
}

/// Keyboard event as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: String,
    pub shift_pressed: bool,
    pub ctrl_pressed: bool,
}

impl RawKeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_shift(mut self, shift_pressed: bool) -> Self {
        self.shift_pressed = shift_pressed;
        self
    }

    pub fn with_ctrl(mut self, ctrl_pressed: bool) -> Self {
        self.ctrl_pressed = ctrl_pressed;
        self
    }
}

/// Key as republished on the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub name: String,
    pub shift: bool,
    pub ctrl: bool,
}

impl From<&RawKeyEvent> for KeyDescriptor {
    fn from(raw: &RawKeyEvent) -> Self {
        Self {
            name: raw.key.clone(),
            shift: raw.shift_pressed,
            ctrl: raw.ctrl_pressed,
        }
    }
}
