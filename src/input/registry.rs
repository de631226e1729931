use std::collections::HashMap;

use bevy::log::{debug, warn};
use bevy::prelude::Component;

use super::{ActionInput, FeatureUsage, InputBackends, InputError, InputSource, XrInput};

pub const HORIZONTAL: &str = "Horizontal";
pub const VERTICAL: &str = "Vertical";
pub const MOUSE_X: &str = "Mouse X";
pub const MOUSE_Y: &str = "Mouse Y";
pub const JUMP: &str = "Jump";

/// The fixed identities of the default group, in registry order.
const DEFAULT_NAMES: [&str; 5] = [HORIZONTAL, VERTICAL, MOUSE_X, MOUSE_Y, JUMP];

/// Sources backing the default group. Each slot has a fixed name in the registry,
/// whatever the source itself is called.
pub struct DefaultInputs {
    pub horizontal: Box<dyn InputSource>,
    pub vertical: Box<dyn InputSource>,
    pub mouse_x: Box<dyn InputSource>,
    pub mouse_y: Box<dyn InputSource>,
    pub jump: Box<dyn InputSource>,
}

impl DefaultInputs {
    /// Keyboard, mouse and gamepad through the named actions.
    pub fn desktop() -> Self {
        Self {
            horizontal: Box::new(ActionInput::axis(HORIZONTAL, true)),
            vertical: Box::new(ActionInput::axis(VERTICAL, true)),
            mouse_x: Box::new(ActionInput::axis(MOUSE_X, true)),
            mouse_y: Box::new(ActionInput::axis(MOUSE_Y, true)),
            jump: Box::new(ActionInput::button(JUMP)),
        }
    }

    /// Hand controllers: primary stick moves, secondary stick looks.
    pub fn xr() -> Self {
        Self {
            horizontal: Box::new(
                XrInput::axis_component(FeatureUsage::Primary2DAxis, 0).named(HORIZONTAL),
            ),
            vertical: Box::new(
                XrInput::axis_component(FeatureUsage::Primary2DAxis, 1).named(VERTICAL),
            ),
            mouse_x: Box::new(
                XrInput::axis_component(FeatureUsage::Secondary2DAxis, 0).named(MOUSE_X),
            ),
            mouse_y: Box::new(
                XrInput::axis_component(FeatureUsage::Secondary2DAxis, 1).named(MOUSE_Y),
            ),
            jump: Box::new(XrInput::button(FeatureUsage::PrimaryButton).named(JUMP)),
        }
    }

    fn into_sources(self) -> Vec<Box<dyn InputSource>> {
        vec![
            self.horizontal,
            self.vertical,
            self.mouse_x,
            self.mouse_y,
            self.jump,
        ]
    }
}

/// Every input the player reads, grouped into the default set and an optional custom set.
///
/// Lookups consult the defaults first unless they are globally disabled, then the
/// custom set. Both sets are refreshed by [`update`](Self::update) once per frame.
#[derive(Component)]
pub struct InputRegistry {
    use_defaults: bool,
    defaults: Vec<Box<dyn InputSource>>,
    default_index: HashMap<String, usize>,
    custom: Vec<Box<dyn InputSource>>,
    custom_index: HashMap<String, usize>,
}

impl InputRegistry {
    /// A registry with the desktop defaults.
    pub fn new(
        custom: Vec<Box<dyn InputSource>>,
        index: Option<HashMap<String, usize>>,
    ) -> Self {
        Self::with_defaults(DefaultInputs::desktop(), custom, index)
    }

    /// A supplied `index` is kept only if it covers the custom list exactly; otherwise
    /// the map is rebuilt from the source names in list order.
    pub fn with_defaults(
        defaults: DefaultInputs,
        custom: Vec<Box<dyn InputSource>>,
        index: Option<HashMap<String, usize>>,
    ) -> Self {
        let default_index = DEFAULT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();

        let custom_index = match index {
            Some(index) if index_fits(&index, custom.len()) => index,
            supplied => {
                if let Some(discarded) = supplied {
                    warn!(
                        "discarding input index map with {} entries for {} custom inputs",
                        discarded.len(),
                        custom.len()
                    );
                }
                custom
                    .iter()
                    .enumerate()
                    .map(|(i, input)| (input.name().to_string(), i))
                    .collect()
            }
        };
        debug!("tracking custom inputs {:?}", custom_index);

        Self {
            use_defaults: true,
            defaults: defaults.into_sources(),
            default_index,
            custom,
            custom_index,
        }
    }

    pub fn update(&mut self, backends: &InputBackends) {
        if self.use_defaults {
            for input in &mut self.defaults {
                input.update(backends);
            }
        }

        for input in &mut self.custom {
            input.update(backends);
        }
    }

    /// Resolves a name, defaults first.
    pub fn get(&self, name: &str) -> Result<&dyn InputSource, InputError> {
        if self.use_defaults {
            if let Some(&i) = self.default_index.get(name) {
                return Ok(self.defaults[i].as_ref());
            }
        }

        match self.custom_index.get(name) {
            Some(&i) => Ok(self.custom[i].as_ref()),
            None => Err(self.unknown(name)),
        }
    }

    /// Position of a custom input in the custom list.
    pub fn custom_index(&self, name: &str) -> Option<usize> {
        self.custom_index.get(name).copied()
    }

    pub fn custom_len(&self) -> usize {
        self.custom_index.len()
    }

    pub fn disable(&mut self, name: &str) -> Result<(), InputError> {
        self.custom_mut(name)?.disable();
        Ok(())
    }

    pub fn enable(&mut self, name: &str) -> Result<(), InputError> {
        self.custom_mut(name)?.enable();
        Ok(())
    }

    pub fn disable_default(&mut self, name: &str) -> Result<(), InputError> {
        self.default_mut(name)?.disable();
        Ok(())
    }

    pub fn enable_default(&mut self, name: &str) -> Result<(), InputError> {
        self.default_mut(name)?.enable();
        Ok(())
    }

    pub fn disable_defaults(&mut self) {
        self.use_defaults = false;
        for input in &mut self.defaults {
            input.disable();
        }
    }

    pub fn enable_defaults(&mut self) {
        self.use_defaults = true;
        for input in &mut self.defaults {
            input.enable();
        }
    }

    pub fn defaults_enabled(&self) -> bool {
        self.use_defaults
    }

    pub fn horizontal(&self) -> Result<f32, InputError> {
        self.enabled_default(HORIZONTAL)?.value()
    }

    pub fn vertical(&self) -> Result<f32, InputError> {
        self.enabled_default(VERTICAL)?.value()
    }

    pub fn mouse_x(&self) -> Result<f32, InputError> {
        self.enabled_default(MOUSE_X)?.value()
    }

    pub fn mouse_y(&self) -> Result<f32, InputError> {
        self.enabled_default(MOUSE_Y)?.value()
    }

    /// Whether jump went down this frame.
    pub fn jump(&self) -> Result<bool, InputError> {
        Ok(self.enabled_default(JUMP)?.down())
    }

    /// Every tracked name: defaults first, then custom inputs in list order.
    pub fn tracked_names(&self) -> Vec<String> {
        self.defaults
            .iter()
            .chain(&self.custom)
            .map(|input| input.name().to_string())
            .collect()
    }

    fn enabled_default(&self, name: &str) -> Result<&dyn InputSource, InputError> {
        let input = self.defaults[self.default_index[name]].as_ref();
        if !self.use_defaults || input.is_disabled() {
            return Err(InputError::DefaultDisabled {
                name: name.to_string(),
            });
        }
        Ok(input)
    }

    fn default_mut(&mut self, name: &str) -> Result<&mut Box<dyn InputSource>, InputError> {
        match self.default_index.get(name) {
            Some(&i) => Ok(&mut self.defaults[i]),
            None => Err(self.unknown(name)),
        }
    }

    fn custom_mut(&mut self, name: &str) -> Result<&mut Box<dyn InputSource>, InputError> {
        match self.custom_index.get(name) {
            Some(&i) => Ok(&mut self.custom[i]),
            None => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> InputError {
        InputError::UnknownInput {
            name: name.to_string(),
            tracked: self.tracked_names(),
        }
    }
}

fn index_fits(index: &HashMap<String, usize>, len: usize) -> bool {
    index.len() == len && index.values().all(|&i| i < len)
}

#[cfg(test)]
mod tests {
    use bevy::input::ButtonInput;
    use bevy::prelude::KeyCode;

    use super::*;
    use crate::input::{AIM, ActionState, KeyInput, XrDevices};

    fn custom_inputs() -> Vec<Box<dyn InputSource>> {
        vec![
            Box::new(KeyInput::new(KeyCode::ShiftLeft)),
            Box::new(ActionInput::button(AIM)),
        ]
    }

    fn player_registry() -> InputRegistry {
        let index = HashMap::from([("sprint".to_string(), 0), ("aim".to_string(), 1)]);
        InputRegistry::new(custom_inputs(), Some(index))
    }

    fn update(registry: &mut InputRegistry, keys: &ButtonInput<KeyCode>, actions: &ActionState) {
        let xr = XrDevices::default();
        registry.update(&InputBackends {
            keys,
            actions,
            xr: &xr,
        });
    }

    #[test]
    fn supplied_index_is_kept_when_it_fits() {
        let registry = player_registry();
        assert_eq!(registry.custom_index("sprint"), Some(0));
        assert_eq!(registry.custom_index("aim"), Some(1));
        assert_eq!(registry.get("sprint").unwrap().name(), "ShiftLeft");
    }

    #[test]
    fn oversized_index_is_rebuilt_from_the_list() {
        let index = HashMap::from([
            ("sprint".to_string(), 0),
            ("aim".to_string(), 1),
            ("crouch".to_string(), 2),
        ]);
        let registry = InputRegistry::new(custom_inputs(), Some(index));

        assert_eq!(registry.custom_len(), 2);
        assert_eq!(registry.custom_index("ShiftLeft"), Some(0));
        assert_eq!(registry.custom_index(AIM), Some(1));
        assert_eq!(registry.custom_index("sprint"), None);
        assert_eq!(registry.custom_index("crouch"), None);
    }

    #[test]
    fn out_of_range_index_is_rebuilt() {
        let index = HashMap::from([("sprint".to_string(), 0), ("aim".to_string(), 7)]);
        let registry = InputRegistry::new(custom_inputs(), Some(index));
        assert_eq!(registry.custom_index("aim"), None);
        assert_eq!(registry.custom_index(AIM), Some(1));
    }

    #[test]
    fn defaults_and_custom_inputs_update_together() {
        let mut registry = player_registry();
        let mut keys = ButtonInput::<KeyCode>::default();
        let mut actions = ActionState::default();
        keys.press(KeyCode::ShiftLeft);
        actions.set_axis(HORIZONTAL, 1.0, 0.2);
        actions.set_axis(MOUSE_Y, -0.3, -0.3);
        actions.set_button(JUMP, true);

        update(&mut registry, &keys, &actions);

        assert_eq!(registry.horizontal(), Ok(1.0));
        assert_eq!(registry.vertical(), Ok(0.0));
        assert_eq!(registry.mouse_y(), Ok(-0.3));
        assert_eq!(registry.jump(), Ok(true));
        assert!(registry.get("sprint").unwrap().pressed());
        assert!(!registry.get("aim").unwrap().pressed());
    }

    #[test]
    fn disabled_horizontal_fails_until_reenabled() {
        let mut registry = player_registry();
        let keys = ButtonInput::<KeyCode>::default();
        let mut actions = ActionState::default();
        actions.set_axis(HORIZONTAL, -1.0, -1.0);

        registry.disable_default(HORIZONTAL).unwrap();
        update(&mut registry, &keys, &actions);
        assert_eq!(
            registry.horizontal(),
            Err(InputError::DefaultDisabled {
                name: HORIZONTAL.to_string()
            })
        );
        // The other defaults are unaffected.
        assert_eq!(registry.vertical(), Ok(0.0));

        registry.enable_default(HORIZONTAL).unwrap();
        update(&mut registry, &keys, &actions);
        assert_eq!(registry.horizontal(), Ok(-1.0));
    }

    #[test]
    fn globally_disabled_defaults_fall_through_to_custom_lookup() {
        let mut registry = InputRegistry::new(
            vec![Box::new(ActionInput::button(JUMP)), Box::new(KeyInput::new(KeyCode::KeyE))],
            None,
        );
        let keys = ButtonInput::<KeyCode>::default();
        let mut actions = ActionState::default();
        actions.set_button(JUMP, true);

        registry.disable_defaults();
        update(&mut registry, &keys, &actions);

        assert!(matches!(registry.jump(), Err(InputError::DefaultDisabled { .. })));
        assert!(matches!(registry.mouse_x(), Err(InputError::DefaultDisabled { .. })));
        // "Jump" now resolves to the custom source, which was updated.
        assert!(registry.get(JUMP).unwrap().down());
        assert!(registry.get(HORIZONTAL).is_err());

        registry.enable_defaults();
        actions.set_button(JUMP, true);
        update(&mut registry, &keys, &actions);
        assert_eq!(registry.jump(), Ok(false));
        assert_eq!(registry.horizontal(), Ok(0.0));
    }

    #[test]
    fn unknown_names_list_every_tracked_input() {
        let registry = player_registry();
        let error = registry.get("crouch").err().unwrap();
        assert_eq!(
            error,
            InputError::UnknownInput {
                name: "crouch".to_string(),
                tracked: vec![
                    HORIZONTAL.to_string(),
                    VERTICAL.to_string(),
                    MOUSE_X.to_string(),
                    MOUSE_Y.to_string(),
                    JUMP.to_string(),
                    "ShiftLeft".to_string(),
                    AIM.to_string(),
                ],
            }
        );
        assert_eq!(
            error.to_string(),
            "input `crouch` is not tracked; available inputs are: \
             (Horizontal, Vertical, Mouse X, Mouse Y, Jump, ShiftLeft, Aim)"
        );
    }

    #[test]
    fn toggling_custom_inputs() {
        let mut registry = player_registry();
        let mut keys = ButtonInput::<KeyCode>::default();
        let actions = ActionState::default();
        keys.press(KeyCode::ShiftLeft);

        registry.disable("sprint").unwrap();
        update(&mut registry, &keys, &actions);
        assert!(registry.get("sprint").unwrap().is_disabled());
        assert!(!registry.get("sprint").unwrap().pressed());

        registry.enable("sprint").unwrap();
        update(&mut registry, &keys, &actions);
        assert!(registry.get("sprint").unwrap().pressed());

        assert!(matches!(
            registry.disable("crouch"),
            Err(InputError::UnknownInput { .. })
        ));
        assert!(matches!(
            registry.enable_default("sprint"),
            Err(InputError::UnknownInput { .. })
        ));
    }

    #[test]
    fn non_axis_default_reports_invalid_access() {
        let mut defaults = DefaultInputs::desktop();
        defaults.mouse_x = Box::new(KeyInput::new(KeyCode::KeyQ));
        let registry = InputRegistry::with_defaults(defaults, Vec::new(), None);
        assert!(matches!(registry.mouse_x(), Err(InputError::NotAxis { .. })));
    }
}
