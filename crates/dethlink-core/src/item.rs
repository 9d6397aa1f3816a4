//! Observable item cells
//!
//! An [`Item`] is one addressable value point: an output state, a dimmer
//! percentage, a thermostat reading. Items track a 4-slot history of
//! change timestamps so multi-press patterns can be classified from raw
//! contact updates.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::address::ItemKey;
use crate::message::Description;
use crate::types::{ItemType, RegulationMode, TemperatureMode};

/// Listener for item state changes. Single-subscriber: re-registration
/// replaces, unregistering is setting `None`.
pub trait StateChangeListener: Send + Sync {
    fn item_state_changed(&self, item: &Item);
}

/// Value held by an item
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    HeatingMode(TemperatureMode),
    CoolingMode(RegulationMode),
}

impl ItemValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ItemValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ItemValue::Int(i) => Some(*i),
            ItemValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ItemValue::Int(i) => Some(*i as f64),
            ItemValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<bool> for ItemValue {
    fn from(v: bool) -> Self {
        ItemValue::Bool(v)
    }
}

impl From<i64> for ItemValue {
    fn from(v: i64) -> Self {
        ItemValue::Int(v)
    }
}

impl From<f64> for ItemValue {
    fn from(v: f64) -> Self {
        ItemValue::Float(v)
    }
}

/// Mutable item state behind the narrow lock
#[derive(Debug, Default)]
struct ItemState {
    value: Option<ItemValue>,
    last_changes: [u64; 4],
    changed: bool,
    description: Option<Description>,
}

/// One observable value cell
pub struct Item {
    item_key: ItemKey,
    item_type: ItemType,
    state: RwLock<ItemState>,
    listener: Mutex<Option<Arc<dyn StateChangeListener>>>,
}

impl Item {
    pub fn new(item_key: ItemKey, item_type: ItemType) -> Self {
        Self {
            item_key,
            item_type,
            state: RwLock::new(ItemState::default()),
            listener: Mutex::new(None),
        }
    }

    pub fn item_key(&self) -> &ItemKey {
        &self.item_key
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Current value, `None` until the first update
    pub fn value(&self) -> Option<ItemValue> {
        self.state.read().value
    }

    /// Store a value. The timestamp history shifts and the dirty flag is
    /// raised only when the value actually differs (including the
    /// None→Some transition); identical values still overwrite storage.
    pub fn set_value(&self, value: ItemValue) {
        let mut state = self.state.write();
        if state.value != Some(value) {
            state.last_changes.rotate_left(1);
            state.last_changes[3] = now_millis();
            trace!(
                "value change timestamps for {}: {:?}",
                self.item_key,
                state.last_changes
            );
            state.changed = true;
        }
        state.value = Some(value);
    }

    /// Rolling change-timestamp history, oldest to newest (millis)
    pub fn change_history(&self) -> [u64; 4] {
        self.state.read().last_changes
    }

    pub fn is_dirty(&self) -> bool {
        self.state.read().changed
    }

    pub fn clear_dirty(&self) {
        self.state.write().changed = false;
    }

    pub fn set_description(&self, description: Description) {
        let mut state = self.state.write();
        state.description = Some(description);
        state.changed = true;
    }

    pub fn description(&self) -> Option<Description> {
        self.state.read().description.clone()
    }

    /// Human label: the gateway-provided name when known, the wire label
    /// otherwise
    pub fn label(&self) -> String {
        match &self.state.read().description {
            Some(d) => d.name().to_string(),
            None => self.item_key.label(),
        }
    }

    /// Replace the state-change listener. `None` unregisters; owners must
    /// unregister before teardown so a dead collaborator is never
    /// notified.
    pub fn set_state_listener(&self, listener: Option<Arc<dyn StateChangeListener>>) {
        *self.listener.lock() = listener;
    }

    /// Invoke the listener, if any. Callers decide when dirty semantics
    /// require a notification; this only delivers it.
    pub fn notify_state_update(&self) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.item_state_changed(self);
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("item_key", &self.item_key)
            .field("item_type", &self.item_type)
            .field("value", &self.value())
            .finish()
    }
}

/// Milliseconds since the Unix epoch
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ModuleKey;
    use crate::types::ModuleType;
    use crate::SerialNumber;

    fn item() -> Item {
        let key = ItemKey::io(
            ModuleKey::new(ModuleType::Is8, SerialNumber::new(0x10).unwrap()),
            1,
        );
        Item::new(key, ItemType::BooleanVar)
    }

    #[test]
    fn test_identical_value_is_noop_for_history() {
        let item = item();
        item.set_value(ItemValue::Bool(true));
        assert!(item.is_dirty());
        item.clear_dirty();
        let history = item.change_history();

        item.set_value(ItemValue::Bool(true));
        assert!(!item.is_dirty());
        assert_eq!(item.change_history(), history);
    }

    #[test]
    fn test_differing_value_shifts_history() {
        let item = item();
        item.set_value(ItemValue::Bool(true));
        let before = item.change_history();
        item.set_value(ItemValue::Bool(false));
        let after = item.change_history();
        assert!(item.is_dirty());
        assert_eq!(after[2], before[3]);
        assert!(after[3] >= before[3]);
    }

    #[test]
    fn test_nil_to_value_marks_dirty() {
        let item = item();
        assert_eq!(item.value(), None);
        item.set_value(ItemValue::Bool(false));
        assert!(item.is_dirty());
        assert_eq!(item.value(), Some(ItemValue::Bool(false)));
    }
}
