//! Uniform button/axis access over keyboard keys, named actions and XR controllers.
//!
//! Every backend is wrapped in an [`InputSource`], and the player owns an
//! [`InputRegistry`] that resolves sources by name. The registry is refreshed
//! once per frame in [`FrameSet::Input`], before anything reads from it.

mod action;
mod error;
mod key;
mod registry;
mod xr;

use bevy::input::InputSystem;
use bevy::prelude::*;

use crate::game_states::FrameSet;

pub use action::{
    AIM, ActionBinding, ActionInput, ActionMap, ActionState, AxisBinding, ButtonBinding, MouseAxis,
};
pub use error::InputError;
pub use key::KeyInput;
pub use registry::{DefaultInputs, HORIZONTAL, InputRegistry, JUMP, MOUSE_X, MOUSE_Y, VERTICAL};
pub use xr::{FeatureUsage, FeatureValue, Hand, XrDevice, XrDevices, XrInput};

/// Edge and level state of a button-like control for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonFlags {
    pub down: bool,
    pub up: bool,
    pub pressed: bool,
}

impl ButtonFlags {
    /// All three flags follow a single "active" level.
    pub fn level(active: bool) -> Self {
        Self {
            down: active,
            up: active,
            pressed: active,
        }
    }
}

/// The backends an [`InputSource`] may sample from during an update.
pub struct InputBackends<'a> {
    pub keys: &'a ButtonInput<KeyCode>,
    pub actions: &'a ActionState,
    pub xr: &'a XrDevices,
}

/// A single named control the gameplay code can query without knowing its backend.
pub trait InputSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the control went down this frame.
    fn down(&self) -> bool;

    /// Whether the control was released this frame.
    fn up(&self) -> bool;

    /// Whether the control is currently held.
    fn pressed(&self) -> bool;

    /// Axis value, only meaningful for axis-typed sources.
    fn value(&self) -> Result<f32, InputError>;

    fn is_disabled(&self) -> bool;

    /// Clears every flag and the value, and freezes the source until [`enable`](Self::enable).
    fn disable(&mut self);

    fn enable(&mut self);

    /// Re-samples the backend. Does nothing while disabled.
    fn update(&mut self, backends: &InputBackends);
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActionMap>()
            .init_resource::<ActionState>()
            .init_resource::<XrDevices>()
            .add_systems(PreUpdate, action::sample_actions.after(InputSystem))
            .add_systems(Update, refresh_registries.in_set(FrameSet::Input));
    }
}

fn refresh_registries(
    keys: Res<ButtonInput<KeyCode>>,
    actions: Res<ActionState>,
    xr: Res<XrDevices>,
    mut registries: Query<&mut InputRegistry>,
) {
    let backends = InputBackends {
        keys: &*keys,
        actions: &*actions,
        xr: &*xr,
    };

    for mut registry in &mut registries {
        registry.update(&backends);
    }
}
