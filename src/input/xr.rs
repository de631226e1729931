use std::collections::HashMap;
use std::fmt;

use bevy::log::{debug, warn};
use bevy::math::Vec2;
use bevy::prelude::Resource;

use super::{ButtonFlags, InputBackends, InputError, InputSource};

/// Number of hand controllers an XR rig is expected to report.
const EXPECTED_CONTROLLERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

/// Common controller features, named after the usages XR runtimes expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureUsage {
    PrimaryButton,
    SecondaryButton,
    TriggerButton,
    GripButton,
    MenuButton,
    Primary2DAxisClick,
    Trigger,
    Grip,
    Primary2DAxis,
    Secondary2DAxis,
}

impl fmt::Display for FeatureUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Bool(bool),
    Float(f32),
    Axis2d(Vec2),
}

/// One tracked XR device and the latest feature values reported for it.
#[derive(Debug, Clone, Default)]
pub struct XrDevice {
    pub name: String,
    pub hand: Option<Hand>,
    features: HashMap<FeatureUsage, FeatureValue>,
}

impl XrDevice {
    pub fn controller(name: impl Into<String>, hand: Hand) -> Self {
        Self {
            name: name.into(),
            hand: Some(hand),
            features: HashMap::new(),
        }
    }

    pub fn set_feature(&mut self, usage: FeatureUsage, value: FeatureValue) -> &mut Self {
        self.features.insert(usage, value);
        self
    }

    pub fn with_feature(mut self, usage: FeatureUsage, value: FeatureValue) -> Self {
        self.set_feature(usage, value);
        self
    }

    pub fn try_bool(&self, usage: FeatureUsage) -> Option<bool> {
        match self.features.get(&usage)? {
            FeatureValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn try_float(&self, usage: FeatureUsage) -> Option<f32> {
        match self.features.get(&usage)? {
            FeatureValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn try_axis2d(&self, usage: FeatureUsage) -> Option<Vec2> {
        match self.features.get(&usage)? {
            FeatureValue::Axis2d(value) => Some(*value),
            _ => None,
        }
    }
}

/// Devices reported by the XR runtime integration. Empty on desktop.
#[derive(Resource, Debug, Clone, Default)]
pub struct XrDevices {
    devices: Vec<XrDevice>,
}

impl XrDevices {
    pub fn new(devices: Vec<XrDevice>) -> Self {
        Self { devices }
    }

    pub fn set_devices(&mut self, devices: Vec<XrDevice>) {
        self.devices = devices;
    }

    pub fn devices_mut(&mut self) -> &mut [XrDevice] {
        &mut self.devices
    }

    /// Devices carrying a left or right hand characteristic.
    pub fn controllers(&self) -> impl Iterator<Item = &XrDevice> {
        self.devices.iter().filter(|device| device.hand.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XrMode {
    Button,
    Axis,
    /// One component of a 2D feature: 0 reads x, anything else reads y.
    AxisComponent(usize),
}

/// An [`InputSource`] polling a feature across both hand controllers.
///
/// Button mode ORs the feature over every controller and detects edges against the
/// previous frame. Axis mode takes the first non-zero reading.
#[derive(Debug, Clone)]
pub struct XrInput {
    name: String,
    usage: FeatureUsage,
    mode: XrMode,
    last_state: bool,
    flags: ButtonFlags,
    value: f32,
    disabled: bool,
    seen_controllers: Option<usize>,
}

impl XrInput {
    pub fn button(usage: FeatureUsage) -> Self {
        Self::with_mode(usage, XrMode::Button)
    }

    pub fn axis(usage: FeatureUsage) -> Self {
        Self::with_mode(usage, XrMode::Axis)
    }

    pub fn axis_component(usage: FeatureUsage, component: usize) -> Self {
        Self::with_mode(usage, XrMode::AxisComponent(component))
    }

    fn with_mode(usage: FeatureUsage, mode: XrMode) -> Self {
        Self {
            name: usage.to_string(),
            usage,
            mode,
            last_state: false,
            flags: ButtonFlags::default(),
            value: 0.0,
            disabled: false,
            seen_controllers: None,
        }
    }

    /// Replaces the usage-derived name, e.g. to stand in for a default input.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is_axis(&self) -> bool {
        !matches!(self.mode, XrMode::Button)
    }

    fn check_controller_count(&mut self, count: usize) {
        if self.seen_controllers == Some(count) {
            return;
        }
        self.seen_controllers = Some(count);

        if count == EXPECTED_CONTROLLERS {
            debug!("{}: tracking {count} XR controllers", self.name);
        } else {
            warn!(
                "{}: expected {EXPECTED_CONTROLLERS} XR controllers, found {count}",
                self.name
            );
        }
    }

    fn sample_button<'a>(&mut self, controllers: impl Iterator<Item = &'a XrDevice>) {
        let mut state = false;
        for device in controllers {
            state |= device.try_bool(self.usage).unwrap_or(false);
        }

        self.flags = ButtonFlags {
            down: state && !self.last_state,
            up: !state && self.last_state,
            pressed: state,
        };
        self.last_state = state;
    }

    fn sample_axis<'a>(&mut self, controllers: impl Iterator<Item = &'a XrDevice>) {
        let usage = self.usage;
        let mode = self.mode;
        let reading = |device: &XrDevice| match mode {
            XrMode::AxisComponent(0) => device.try_axis2d(usage).map(|axis| axis.x),
            XrMode::AxisComponent(_) => device.try_axis2d(usage).map(|axis| axis.y),
            _ => device.try_float(usage),
        };

        self.value = controllers
            .filter_map(reading)
            .find(|value| value.abs() > f32::EPSILON)
            .unwrap_or(0.0);
        self.flags = ButtonFlags::level(self.value.abs() > f32::EPSILON);
    }
}

impl InputSource for XrInput {
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
        self.last_state = false;
    }

    fn enable(&mut self) {
        self.disabled = false;
    }

    fn update(&mut self, backends: &InputBackends) {
        if self.disabled {
            return;
        }

        self.check_controller_count(backends.xr.controllers().count());

        if self.is_axis() {
            self.sample_axis(backends.xr.controllers());
        } else {
            self.sample_button(backends.xr.controllers());
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::input::ButtonInput;
    use bevy::prelude::KeyCode;

    use super::*;
    use crate::input::ActionState;

    fn update_with(input: &mut XrInput, xr: &XrDevices) {
        let keys = ButtonInput::<KeyCode>::default();
        let actions = ActionState::default();
        input.update(&InputBackends {
            keys: &keys,
            actions: &actions,
            xr,
        });
    }

    fn rig(left_trigger: bool, right_trigger: bool) -> XrDevices {
        XrDevices::new(vec![
            XrDevice::controller("left", Hand::Left)
                .with_feature(FeatureUsage::TriggerButton, FeatureValue::Bool(left_trigger)),
            XrDevice::controller("right", Hand::Right)
                .with_feature(FeatureUsage::TriggerButton, FeatureValue::Bool(right_trigger)),
        ])
    }

    #[test]
    fn button_edges_compare_with_last_frame() {
        let mut trigger = XrInput::button(FeatureUsage::TriggerButton);
        assert_eq!(trigger.name(), "TriggerButton");

        update_with(&mut trigger, &rig(false, true));
        assert!(trigger.down() && trigger.pressed() && !trigger.up());

        // Either hand keeps it held.
        update_with(&mut trigger, &rig(true, false));
        assert!(!trigger.down() && trigger.pressed() && !trigger.up());

        update_with(&mut trigger, &rig(false, false));
        assert!(!trigger.down() && !trigger.pressed() && trigger.up());

        update_with(&mut trigger, &rig(false, false));
        assert!(!trigger.down() && !trigger.pressed() && !trigger.up());
    }

    #[test]
    fn axis_component_reads_first_non_zero_controller() {
        let xr = XrDevices::new(vec![
            XrDevice::controller("left", Hand::Left).with_feature(
                FeatureUsage::Primary2DAxis,
                FeatureValue::Axis2d(Vec2::new(0.0, 0.0)),
            ),
            XrDevice::controller("right", Hand::Right).with_feature(
                FeatureUsage::Primary2DAxis,
                FeatureValue::Axis2d(Vec2::new(-0.5, 0.75)),
            ),
        ]);

        let mut x = XrInput::axis_component(FeatureUsage::Primary2DAxis, 0).named("Horizontal");
        let mut y = XrInput::axis_component(FeatureUsage::Primary2DAxis, 1);
        update_with(&mut x, &xr);
        update_with(&mut y, &xr);

        assert_eq!(x.name(), "Horizontal");
        assert_eq!(x.value(), Ok(-0.5));
        assert_eq!(y.value(), Ok(0.75));
        assert!(x.down() && x.pressed() && x.up());
    }

    #[test]
    fn scalar_axis_and_missing_devices() {
        let xr = XrDevices::new(vec![
            XrDevice::controller("left", Hand::Left)
                .with_feature(FeatureUsage::Trigger, FeatureValue::Float(0.4)),
        ]);
        let mut trigger = XrInput::axis(FeatureUsage::Trigger);

        // A single controller is an anomaly, not a failure.
        update_with(&mut trigger, &xr);
        assert_eq!(trigger.value(), Ok(0.4));

        update_with(&mut trigger, &XrDevices::default());
        assert_eq!(trigger.value(), Ok(0.0));
        assert!(!trigger.pressed());
    }

    #[test]
    fn button_value_is_rejected() {
        let grip = XrInput::button(FeatureUsage::GripButton);
        assert!(matches!(grip.value(), Err(InputError::NotAxis { .. })));
    }

    #[test]
    fn disabled_controller_input_ignores_devices() {
        let mut trigger = XrInput::button(FeatureUsage::TriggerButton);
        trigger.disable();
        update_with(&mut trigger, &rig(true, true));
        assert!(!trigger.down() && !trigger.pressed() && !trigger.up());

        trigger.enable();
        update_with(&mut trigger, &rig(true, true));
        assert!(trigger.down() && trigger.pressed());
    }

    #[test]
    fn non_hand_devices_are_not_polled() {
        let xr = XrDevices::new(vec![XrDevice {
            name: "headset".to_string(),
            hand: None,
            features: HashMap::from([(FeatureUsage::MenuButton, FeatureValue::Bool(true))]),
        }]);
        assert_eq!(xr.controllers().count(), 0);
    }
}
