//! Module model
//!
//! One [`Module`] mirrors one physical device on the bus. The item set
//! is provisioned at construction from the module family and never
//! changes; only item values mutate. Family behavior (payload decoding,
//! available actions) is dispatched over the closed [`ModuleClass`] enum
//! so the supported module set is checkable at compile time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::action::{ActionMessageBuilder, ActionType};
use crate::address::{ItemKey, ModuleKey};
use crate::error::{Error, Result};
use crate::item::{Item, ItemValue, StateChangeListener};
use crate::message::{Description, StatusMessage};
use crate::types::{DataType, ItemType, ModuleType, RegulationMode, TemperatureMode};
use crate::SerialNumber;

/// Shutter position sentinels
pub const SHUTTER_UP: i64 = 0;
pub const SHUTTER_DOWN: i64 = 100;
pub const SHUTTER_MIDDLE: i64 = 50;

/// Named thermostat items
pub const ITEM_HEATING_CURRENT: &str = "heating_current";
pub const ITEM_HEATING_PRESET: &str = "heating_preset";
pub const ITEM_HEATING_MODE: &str = "heating_mode";
pub const ITEM_HEATING_PROFILE: &str = "heating_profile";
pub const ITEM_COOLING_CURRENT: &str = "cooling_current";
pub const ITEM_COOLING_PRESET: &str = "cooling_preset";
pub const ITEM_COOLING_MODE: &str = "cooling_mode";
pub const ITEM_COOLING_PROFILE: &str = "cooling_profile";

/// Relative dimmer step used by increase/decrease
const DIMMER_STEP: f64 = 10.0;

/// Outbound command seam. The session engine implements this with
/// fire-and-drop semantics: lines are only written while the session is
/// online, otherwise they are dropped with a warning.
pub trait CommandSink: Send + Sync {
    fn send_command(&self, line: &str);
    fn is_online(&self) -> bool;
}

/// Listener for module configuration changes (descriptions translated)
pub trait ConfigChangeListener: Send + Sync {
    fn items_translated(&self);
}

/// Behavior family of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleClass {
    /// Boolean outputs decoded from a hex bitmask
    Relay { outputs: u8 },
    /// Boolean inputs decoded from a hex bitmask
    Contact { inputs: u8 },
    /// Percentage outputs packed as 2-hex-digit values
    Dimmer { outputs: u8 },
    /// Position sentinels decoded from bit pairs
    Shutter { shutters: u8 },
    /// Named heating/cooling records
    Thermostat,
    /// Single boolean system variable
    Variable,
}

impl ModuleClass {
    /// Static type→class table. This is the closed replacement for a
    /// runtime type registry: adding a module family means adding a
    /// variant here and covering the new arm.
    pub fn for_type(module_type: ModuleType) -> Option<Self> {
        match module_type {
            ModuleType::Bir => Some(ModuleClass::Relay { outputs: 8 }),
            ModuleType::Dmr => Some(ModuleClass::Relay { outputs: 5 }),
            ModuleType::Trp => Some(ModuleClass::Relay { outputs: 2 }),
            ModuleType::Is4 => Some(ModuleClass::Contact { inputs: 4 }),
            ModuleType::Is8 => Some(ModuleClass::Contact { inputs: 8 }),
            ModuleType::Bu1 => Some(ModuleClass::Contact { inputs: 1 }),
            ModuleType::Bu2 => Some(ModuleClass::Contact { inputs: 2 }),
            ModuleType::Bu4 => Some(ModuleClass::Contact { inputs: 4 }),
            ModuleType::Dim => Some(ModuleClass::Dimmer { outputs: 8 }),
            ModuleType::D10 => Some(ModuleClass::Dimmer { outputs: 10 }),
            ModuleType::Dal => Some(ModuleClass::Dimmer { outputs: 16 }),
            ModuleType::Trv => Some(ModuleClass::Shutter { shutters: 4 }),
            ModuleType::Te1 | ModuleType::Te2 => Some(ModuleClass::Thermostat),
            ModuleType::Var => Some(ModuleClass::Variable),
        }
    }

    /// Whether newly seen modules of this class are announced to the
    /// discovery sink. Contact modules only make sense pre-bound, and
    /// variables are surfaced through the variable group instead.
    pub fn discoverable(&self) -> bool {
        !matches!(self, ModuleClass::Contact { .. } | ModuleClass::Variable)
    }
}

/// A live module instance
pub struct Module {
    module_key: ModuleKey,
    class: ModuleClass,
    description: RwLock<Description>,
    items: HashMap<ItemKey, Arc<Item>>,
    sink: Arc<dyn CommandSink>,
    config_listener: Mutex<Option<Arc<dyn ConfigChangeListener>>>,
}

impl Module {
    /// Create a module with its full item set provisioned. Fails for
    /// module types without a model class.
    pub fn new(
        module_type: ModuleType,
        serial_number: SerialNumber,
        sink: Arc<dyn CommandSink>,
    ) -> Result<Self> {
        let class = ModuleClass::for_type(module_type)
            .ok_or(Error::UnsupportedModuleType(module_type))?;
        let module_key = ModuleKey::new(module_type, serial_number);

        let mut items = HashMap::new();
        let mut add_io = |io: u8, item_type: ItemType, items: &mut HashMap<_, _>| {
            let key = ItemKey::io(module_key, io);
            items.insert(key.clone(), Arc::new(Item::new(key, item_type)));
        };
        match class {
            ModuleClass::Relay { outputs } => {
                for io in 1..=outputs {
                    add_io(io, ItemType::BooleanVar, &mut items);
                }
            }
            ModuleClass::Contact { inputs } => {
                for io in 1..=inputs {
                    add_io(io, ItemType::BooleanVar, &mut items);
                }
            }
            ModuleClass::Dimmer { outputs } => {
                for io in 1..=outputs {
                    add_io(io, ItemType::NumericVar, &mut items);
                }
            }
            ModuleClass::Shutter { shutters } => {
                for io in 1..=shutters {
                    add_io(io, ItemType::Shutter, &mut items);
                }
            }
            ModuleClass::Thermostat => {
                for name in [
                    ITEM_HEATING_CURRENT,
                    ITEM_HEATING_PRESET,
                    ITEM_HEATING_MODE,
                    ITEM_HEATING_PROFILE,
                    ITEM_COOLING_CURRENT,
                    ITEM_COOLING_PRESET,
                    ITEM_COOLING_MODE,
                    ITEM_COOLING_PROFILE,
                ] {
                    let key = ItemKey::named(module_key, name);
                    items.insert(key.clone(), Arc::new(Item::new(key, ItemType::NumericVar)));
                }
            }
            ModuleClass::Variable => {
                let key = ItemKey::module(module_key);
                items.insert(key.clone(), Arc::new(Item::new(key, ItemType::BooleanVar)));
            }
        }

        let description = Description::new(
            format!("{} {}", module_type, serial_number.to_label()),
            None,
            None,
        );

        Ok(Self {
            module_key,
            class,
            description: RwLock::new(description),
            items,
            sink,
            config_listener: Mutex::new(None),
        })
    }

    pub fn module_key(&self) -> ModuleKey {
        self.module_key
    }

    pub fn class(&self) -> ModuleClass {
        self.class
    }

    pub fn description(&self) -> Description {
        self.description.read().clone()
    }

    pub fn items(&self) -> &HashMap<ItemKey, Arc<Item>> {
        &self.items
    }

    pub fn item(&self, key: &ItemKey) -> Option<Arc<Item>> {
        self.items.get(key).cloned()
    }

    fn io_item(&self, io: u8) -> Option<Arc<Item>> {
        self.items.get(&ItemKey::io(self.module_key, io)).cloned()
    }

    fn named_item(&self, name: &str) -> Option<Arc<Item>> {
        self.items
            .get(&ItemKey::named(self.module_key, name))
            .cloned()
    }

    pub fn discoverable(&self) -> bool {
        self.class.discoverable()
    }

    /// Apply one state-change listener to every item of the module
    pub fn set_state_listener(&self, listener: Option<Arc<dyn StateChangeListener>>) {
        for item in self.items.values() {
            item.set_state_listener(listener.clone());
        }
    }

    pub fn set_config_listener(&self, listener: Option<Arc<dyn ConfigChangeListener>>) {
        *self.config_listener.lock() = listener;
    }

    /// Notify the config listener that gateway descriptions arrived
    pub fn notify_items_translated(&self) {
        let listener = self.config_listener.lock().clone();
        if let Some(listener) = listener {
            listener.items_translated();
        }
    }

    /// Route an inbound status message into this module. Descriptive
    /// payloads (bracketed, or any payload during the APPINFO cycle)
    /// update descriptions; everything else decodes into item values.
    /// Items left dirty by the decode are notified and cleaned.
    pub fn process_status(&self, message: &StatusMessage, appinfo_cycle: bool) {
        let data = message.data();
        if data.is_empty() {
            return;
        }

        if data.contains('[') || appinfo_cycle {
            debug!("updating description: {} -> {}", self.module_key, data);
            let description = Description::parse(data);
            *self.description.write() = description.clone();

            let item = match message.io_number() {
                Some(io) => self.io_item(io),
                None if matches!(self.class, ModuleClass::Variable) => {
                    self.item(&ItemKey::module(self.module_key))
                }
                None => None,
            };
            if let Some(item) = item {
                item.set_description(description);
            }
            self.notify_items_translated();
            return;
        }

        debug!("updating state: {} -> {}", self.module_key, data);
        self.update_items(message);
        for item in self.items.values() {
            if item.is_dirty() {
                item.notify_state_update();
                item.clear_dirty();
            }
        }
    }

    /// Family-specific payload decode. Numeric failures leave the
    /// module's items untouched for this cycle.
    fn update_items(&self, message: &StatusMessage) {
        match self.class {
            ModuleClass::Relay { .. } | ModuleClass::Contact { .. } => {
                self.update_boolean_items(message)
            }
            ModuleClass::Dimmer { .. } => self.update_dimmer_items(message),
            ModuleClass::Shutter { .. } => self.update_shutter_items(message),
            ModuleClass::Thermostat => self.update_thermostat_items(message),
            ModuleClass::Variable => self.update_variable_item(message),
        }
    }

    fn update_boolean_items(&self, message: &StatusMessage) {
        let Ok(state) = u64::from_str_radix(message.data(), 16) else {
            warn!("invalid bitmask payload: {}", message.data());
            return;
        };
        for i in 0..self.items.len() {
            let mask = 1u64 << i;
            if let Some(item) = self.io_item(i as u8 + 1) {
                item.set_value(ItemValue::Bool(state & mask == mask));
            }
        }
    }

    fn update_dimmer_items(&self, message: &StatusMessage) {
        if message.data_type() != Some(DataType::D) {
            return;
        }
        // short payloads are left-padded and embedded spaces read as 0
        let mut data = message.data().to_string();
        if data.len() < self.items.len() * 2 {
            data = format!("0{}", data.replace(' ', "0"));
        }
        for i in 0..self.items.len() {
            let Some(slice) = data.get(i * 2..i * 2 + 2) else {
                break;
            };
            let Ok(value) = i64::from_str_radix(slice, 16) else {
                warn!("invalid dimmer payload: {}", message.data());
                return;
            };
            if let Some(item) = self.io_item(i as u8 + 1) {
                item.set_value(ItemValue::Int(value));
            }
        }
    }

    fn update_shutter_items(&self, message: &StatusMessage) {
        let Ok(state) = u64::from_str_radix(message.data(), 16) else {
            warn!("invalid shutter payload: {}", message.data());
            return;
        };
        for i in 0..self.items.len() {
            let mask1 = 1u64 << (i * 2);
            let mask2 = 1u64 << (i * 2 + 1);
            if let Some(item) = self.io_item(i as u8 + 1) {
                let position = if state & mask1 == mask1 {
                    SHUTTER_UP
                } else if state & mask2 == mask2 {
                    SHUTTER_DOWN
                } else {
                    SHUTTER_MIDDLE
                };
                item.set_value(ItemValue::Int(position));
            }
        }
    }

    fn update_thermostat_items(&self, message: &StatusMessage) {
        // T 21.0 22.5 AUTO 0.0 (current, preset, mode, profile)
        let mut tokens = message.data().split_whitespace();
        let parsed = (|| {
            let current: f64 = tokens.next()?.parse().ok()?;
            let preset: f64 = tokens.next()?.parse().ok()?;
            let mode = tokens.next()?;
            let profile: f64 = tokens.next()?.parse().ok()?;
            Some((current, preset, mode, profile))
        })();
        let Some((current, preset, mode, profile)) = parsed else {
            warn!(
                "invalid thermostat status for {}: {}",
                self.module_key,
                message.data()
            );
            return;
        };

        match message.data_type() {
            Some(DataType::T) => {
                let Some(mode) = TemperatureMode::from_token(mode) else {
                    warn!("unknown heating mode token: {}", mode);
                    return;
                };
                self.set_named(ITEM_HEATING_CURRENT, ItemValue::Float(current));
                self.set_named(ITEM_HEATING_PRESET, ItemValue::Float(preset));
                self.set_named(ITEM_HEATING_MODE, ItemValue::HeatingMode(mode));
                self.set_named(ITEM_HEATING_PROFILE, ItemValue::Float(profile));
            }
            Some(DataType::U) => {
                let Some(mode) = RegulationMode::from_token(mode) else {
                    warn!("unknown cooling mode token: {}", mode);
                    return;
                };
                self.set_named(ITEM_COOLING_CURRENT, ItemValue::Float(current));
                self.set_named(ITEM_COOLING_PRESET, ItemValue::Float(preset));
                self.set_named(ITEM_COOLING_MODE, ItemValue::CoolingMode(mode));
                self.set_named(ITEM_COOLING_PROFILE, ItemValue::Float(profile));
            }
            _ => {}
        }
    }

    fn update_variable_item(&self, message: &StatusMessage) {
        let Ok(state) = u64::from_str_radix(message.data(), 16) else {
            warn!("invalid variable payload: {}", message.data());
            return;
        };
        if let Some(item) = self.item(&ItemKey::module(self.module_key)) {
            item.set_value(ItemValue::Bool(state == 1));
        }
    }

    fn set_named(&self, name: &str, value: ItemValue) {
        if let Some(item) = self.named_item(name) {
            item.set_value(value);
        }
    }

    fn send(&self, builder: ActionMessageBuilder) {
        match builder.build() {
            Ok(line) => self.sink.send_command(&line),
            Err(e) => error!("unable to build action for {}: {}", self.module_key, e),
        }
    }

    /// Request a status refresh for the whole module
    pub fn query_state(&self) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_action(ActionType::Status),
        );
    }

    // relay/variable outputs

    pub fn set_output(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::SetOutput),
        );
    }

    pub fn reset_output(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::ResetOutput),
        );
    }

    pub fn toggle_output(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::ToggleOutput),
        );
    }

    // contact push simulation

    pub fn short_push(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::ShortPush),
        );
    }

    pub fn long_push(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::LongPush),
        );
    }

    pub fn double_push(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::DoublePush),
        );
    }

    // dimmer

    pub fn percent(&self, io: u8, percent: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::SetDimmer)
                .with_value(percent as f64),
        );
    }

    pub fn on(&self, io: u8) {
        self.percent(io, 100);
    }

    pub fn off(&self, io: u8) {
        self.percent(io, 0);
    }

    pub fn increase(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::IncreaseBy)
                .with_value(DIMMER_STEP),
        );
    }

    pub fn decrease(&self, io: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(io)
                .with_action(ActionType::DecreaseBy)
                .with_value(DIMMER_STEP),
        );
    }

    // shutter: the wire addresses the pair's first bit, not the shutter
    // index

    fn shutter_io(idx: u8) -> u8 {
        (idx - 1) * 2 + 1
    }

    pub fn go_high(&self, idx: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(Self::shutter_io(idx))
                .with_action(ActionType::SetShutter),
        );
    }

    pub fn go_low(&self, idx: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(Self::shutter_io(idx))
                .with_action(ActionType::ResetShutter),
        );
    }

    pub fn stop(&self, idx: u8) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_io_number(Self::shutter_io(idx))
                .with_action(ActionType::StopShutter),
        );
    }

    // thermostat

    pub fn set_setpoint(&self, action: ActionType, value: f64) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_action(action)
                .with_value(value),
        );
    }

    pub fn set_mode(&self, action: ActionType, selection: i64) {
        self.send(
            ActionMessageBuilder::from_module_key(&self.module_key)
                .with_action(action)
                .with_selection(selection),
        );
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("module_key", &self.module_key)
            .field("class", &self.class)
            .field("items", &self.items.len())
            .finish()
    }
}
