use std::collections::HashMap;

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

use super::registry::{HORIZONTAL, JUMP, MOUSE_X, MOUSE_Y, VERTICAL};
use super::{ButtonFlags, InputBackends, InputError, InputSource};

/// Name of the aim action bound in the default [`ActionMap`].
pub const AIM: &str = "Aim";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonBinding {
    pub keys: Vec<KeyCode>,
    pub mouse: Vec<MouseButton>,
    pub gamepad: Vec<GamepadButton>,
}

/// A continuous action. The raw value is the strongest of its bound controls.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBinding {
    pub positive: Vec<KeyCode>,
    pub negative: Vec<KeyCode>,
    pub gamepad: Option<GamepadAxis>,
    pub mouse: Option<MouseAxis>,
    /// Multiplier applied to the mouse motion delta.
    pub mouse_scale: f32,
    /// Stick values below this magnitude read as zero.
    pub dead_zone: f32,
    /// Units per second the smoothed value moves toward a non-zero raw value.
    /// Zero or less disables smoothing.
    pub sensitivity: f32,
    /// Units per second the smoothed value falls back to zero.
    pub gravity: f32,
}

impl Default for AxisBinding {
    fn default() -> Self {
        Self {
            positive: Vec::new(),
            negative: Vec::new(),
            gamepad: None,
            mouse: None,
            mouse_scale: 0.1,
            dead_zone: 0.19,
            sensitivity: 3.0,
            gravity: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionBinding {
    Button(ButtonBinding),
    Axis(AxisBinding),
}

/// Logical action names and the physical controls behind them.
#[derive(Resource, Debug, Clone)]
pub struct ActionMap {
    bindings: HashMap<String, ActionBinding>,
}

impl ActionMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: ActionBinding) -> &mut Self {
        self.bindings.insert(name.into(), binding);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ActionBinding> {
        self.bindings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionBinding)> {
        self.bindings
            .iter()
            .map(|(name, binding)| (name.as_str(), binding))
    }

    /// Whether `key` drives the named button action.
    pub fn button_uses_key(&self, name: &str, key: KeyCode) -> bool {
        matches!(self.get(name), Some(ActionBinding::Button(button)) if button.keys.contains(&key))
    }
}

impl Default for ActionMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.insert(
            HORIZONTAL,
            ActionBinding::Axis(AxisBinding {
                positive: vec![KeyCode::KeyD, KeyCode::ArrowRight],
                negative: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
                gamepad: Some(GamepadAxis::LeftStickX),
                ..default()
            }),
        )
        .insert(
            VERTICAL,
            ActionBinding::Axis(AxisBinding {
                positive: vec![KeyCode::KeyW, KeyCode::ArrowUp],
                negative: vec![KeyCode::KeyS, KeyCode::ArrowDown],
                gamepad: Some(GamepadAxis::LeftStickY),
                ..default()
            }),
        )
        .insert(
            MOUSE_X,
            ActionBinding::Axis(AxisBinding {
                gamepad: Some(GamepadAxis::RightStickX),
                mouse: Some(MouseAxis::X),
                sensitivity: 0.0,
                ..default()
            }),
        )
        .insert(
            MOUSE_Y,
            ActionBinding::Axis(AxisBinding {
                gamepad: Some(GamepadAxis::RightStickY),
                mouse: Some(MouseAxis::Y),
                sensitivity: 0.0,
                ..default()
            }),
        )
        .insert(
            JUMP,
            ActionBinding::Button(ButtonBinding {
                keys: vec![KeyCode::Space],
                gamepad: vec![GamepadButton::South],
                ..default()
            }),
        )
        .insert(
            AIM,
            ActionBinding::Button(ButtonBinding {
                keys: vec![KeyCode::KeyC],
                mouse: vec![MouseButton::Right],
                gamepad: vec![GamepadButton::LeftTrigger2],
            }),
        );
        map
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AxisSample {
    raw: f32,
    smoothed: f32,
}

/// Per-frame state of every action in the [`ActionMap`].
///
/// Unknown names read as released buttons and zero axes.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActionState {
    buttons: HashMap<String, ButtonFlags>,
    axes: HashMap<String, AxisSample>,
}

impl ActionState {
    pub fn button(&self, name: &str) -> ButtonFlags {
        self.buttons.get(name).copied().unwrap_or_default()
    }

    pub fn axis(&self, name: &str) -> f32 {
        self.axes.get(name).map_or(0.0, |axis| axis.smoothed)
    }

    pub fn axis_raw(&self, name: &str) -> f32 {
        self.axes.get(name).map_or(0.0, |axis| axis.raw)
    }

    /// Records this frame's held state; edges come from comparing with the last sample.
    pub fn set_button(&mut self, name: &str, pressed: bool) {
        let previous = self.button(name).pressed;
        self.buttons.insert(
            name.to_string(),
            ButtonFlags {
                down: pressed && !previous,
                up: !pressed && previous,
                pressed,
            },
        );
    }

    pub fn set_axis(&mut self, name: &str, raw: f32, smoothed: f32) {
        self.axes
            .insert(name.to_string(), AxisSample { raw, smoothed });
    }
}

/// Moves a smoothed axis toward its raw value the way a keyboard "virtual stick" behaves:
/// toward raw at `sensitivity`, back to rest at `gravity`, snapping through zero on reversal.
pub fn smooth_axis(current: f32, raw: f32, sensitivity: f32, gravity: f32, delta_secs: f32) -> f32 {
    if sensitivity <= 0.0 {
        return raw;
    }

    if raw == 0.0 {
        return move_towards(current, 0.0, gravity * delta_secs);
    }

    let from = if current * raw < 0.0 { 0.0 } else { current };
    move_towards(from, raw, sensitivity * delta_secs)
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let gap = target - current;
    if gap.abs() <= max_delta {
        target
    } else {
        current + gap.signum() * max_delta
    }
}

fn strongest(values: impl IntoIterator<Item = f32>) -> f32 {
    values
        .into_iter()
        .fold(0.0, |best, value| if value.abs() > best.abs() { value } else { best })
}

/// Samples Bevy's input resources into [`ActionState`].
pub(super) fn sample_actions(
    time: Res<Time>,
    map: Res<ActionMap>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    gamepads: Query<&Gamepad>,
    mut state: ResMut<ActionState>,
) {
    let delta = time.delta_secs();

    for (name, binding) in map.iter() {
        match binding {
            ActionBinding::Button(button) => {
                let pressed = keys.any_pressed(button.keys.iter().copied())
                    || mouse_buttons.any_pressed(button.mouse.iter().copied())
                    || gamepads
                        .iter()
                        .any(|gamepad| button.gamepad.iter().any(|b| gamepad.pressed(*b)));
                state.set_button(name, pressed);
            }
            ActionBinding::Axis(axis) => {
                let key_value = keys.any_pressed(axis.positive.iter().copied()) as i8
                    - keys.any_pressed(axis.negative.iter().copied()) as i8;

                let stick_value = axis.gamepad.map_or(0.0, |stick| {
                    strongest(gamepads.iter().filter_map(|gamepad| gamepad.get(stick)))
                });
                let stick_value = if stick_value.abs() < axis.dead_zone {
                    0.0
                } else {
                    stick_value
                };

                // Screen space grows downward; "Mouse Y" reads positive when moving up.
                let mouse_value = match axis.mouse {
                    Some(MouseAxis::X) => mouse_motion.delta.x * axis.mouse_scale,
                    Some(MouseAxis::Y) => -mouse_motion.delta.y * axis.mouse_scale,
                    None => 0.0,
                };

                let raw = strongest([key_value as f32, stick_value, mouse_value]);
                let smoothed =
                    smooth_axis(state.axis(name), raw, axis.sensitivity, axis.gravity, delta);
                state.set_axis(name, raw, smoothed);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionMode {
    Button,
    Axis { raw: bool },
}

/// An [`InputSource`] backed by a named logical action.
///
/// In axis mode every flag is simply "the value is non-zero this frame"; there is
/// no real edge detection, unlike [`XrInput`](super::XrInput) in button mode.
#[derive(Debug, Clone)]
pub struct ActionInput {
    name: String,
    mode: ActionMode,
    flags: ButtonFlags,
    value: f32,
    disabled: bool,
}

impl ActionInput {
    pub fn button(name: impl Into<String>) -> Self {
        Self::with_mode(name.into(), ActionMode::Button)
    }

    /// An axis read from the smoothed value, or the unprocessed one with `raw`.
    pub fn axis(name: impl Into<String>, raw: bool) -> Self {
        Self::with_mode(name.into(), ActionMode::Axis { raw })
    }

    fn with_mode(name: String, mode: ActionMode) -> Self {
        Self {
            name,
            mode,
            flags: ButtonFlags::default(),
            value: 0.0,
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is_axis(&self) -> bool {
        matches!(self.mode, ActionMode::Axis { .. })
    }
}

impl InputSource for ActionInput {
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
        if self.is_axis() {
            Ok(self.value)
        } else {
            Err(InputError::NotAxis {
                name: self.name.clone(),
            })
        }
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn disable(&mut self) {
        self.disabled = true;
        self.flags = ButtonFlags::default();
        self.value = 0.0;
    }

    fn enable(&mut self) {
        self.disabled = false;
    }

    fn update(&mut self, backends: &InputBackends) {
        if self.disabled {
            return;
        }

        match self.mode {
            ActionMode::Button => self.flags = backends.actions.button(&self.name),
            ActionMode::Axis { raw } => {
                self.value = if raw {
                    backends.actions.axis_raw(&self.name)
                } else {
                    backends.actions.axis(&self.name)
                };
                self.flags = ButtonFlags::level(self.value.abs() > f32::EPSILON);
            }
        }
    }
}
