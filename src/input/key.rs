use bevy::prelude::KeyCode;

use super::{ButtonFlags, InputBackends, InputError, InputSource};

/// A single keyboard key. Button-only: reading its value is an error.
#[derive(Debug, Clone)]
pub struct KeyInput {
    name: String,
    key: KeyCode,
    flags: ButtonFlags,
    disabled: bool,
}

impl KeyInput {
    pub fn new(key: KeyCode) -> Self {
        Self {
            name: format!("{key:?}"),
            key,
            flags: ButtonFlags::default(),
            disabled: false,
        }
    }

    /// Starts out disabled; nothing is sampled until [`InputSource::enable`].
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }
}

impl InputSource for KeyInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn down(&self) -> bool {
        self.flags.down
    }

    fn up(&self) -> bool {
        self.flags.up
    }

    fn pressed(&self) -> bool {
        self.flags.pressed
    }

    fn value(&self) -> Result<f32, InputError> {
        Err(InputError::NotAxis {
            name: self.name.clone(),
        })
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn disable(&mut self) {
        self.disabled = true;
        self.flags = ButtonFlags::default();
    }

    fn enable(&mut self) {
        self.disabled = false;
    }

    fn update(&mut self, backends: &InputBackends) {
        if self.disabled {
            return;
        }

        self.flags = ButtonFlags {
            down: backends.keys.just_pressed(self.key),
            up: backends.keys.just_released(self.key),
            pressed: backends.keys.pressed(self.key),
        };
    }
}
