//! Keyboard snapshot consumed by the per-frame update.
//!
//! The windowing shell writes key transitions in whenever they arrive; the
//! simulation reads the snapshot once per frame. There is no event queue
//! and no debouncing: the last transition wins.

/// Logical keys the renderer reacts to, decoupled from physical key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Avatar translation along its facing direction.
    Forward,
    Backward,
    /// Avatar yaw.
    TurnLeft,
    TurnRight,
    /// Free-look camera drive along the view ray.
    CameraForward,
    CameraBackward,
    /// Free-look camera yaw around the up axis.
    CameraLeft,
    CameraRight,
}

impl Key {
    const COUNT: usize = 8;

    fn index(self) -> usize {
        self as usize
    }
}

/// Currently-held state for every [`Key`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    held: [bool; Key::COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Key, held: bool) {
        self.held[key.index()] = held;
    }

    pub fn held(&self, key: Key) -> bool {
        self.held[key.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_transition_wins() {
        let mut input = InputState::new();
        assert!(!input.held(Key::Forward));

        input.set(Key::Forward, true);
        input.set(Key::Forward, true);
        assert!(input.held(Key::Forward));

        input.set(Key::Forward, false);
        assert!(!input.held(Key::Forward));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut input = InputState::new();
        input.set(Key::Forward, true);
        input.set(Key::TurnLeft, true);
        assert!(input.held(Key::Forward));
        assert!(input.held(Key::TurnLeft));
        assert!(!input.held(Key::Backward));
    }
}
