//! Item groups
//!
//! Some items are not module-local: system variables live on scattered
//! VAR modules but are handled as one logical collection. An
//! [`ItemGroup`] holds such items, growing as the protocol introduces
//! them, and fans actions out to the items' parent modules.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error};

use crate::action::{ActionMessageBuilder, ActionType};
use crate::address::{ItemKey, ModuleKey};
use crate::item::{Item, StateChangeListener};
use crate::module::CommandSink;
use crate::types::GroupType;

/// Listener notified when a new item joins the group
pub trait GroupItemListener: Send + Sync {
    fn group_item_added(&self, item: &Arc<Item>);
}

/// Virtual container of items keyed by group type
pub struct ItemGroup {
    group_type: GroupType,
    items: RwLock<HashMap<ItemKey, Arc<Item>>>,
    sink: Arc<dyn CommandSink>,
    state_listener: Mutex<Option<Arc<dyn StateChangeListener>>>,
    item_listener: Mutex<Option<Arc<dyn GroupItemListener>>>,
}

impl ItemGroup {
    pub fn new(group_type: GroupType, sink: Arc<dyn CommandSink>) -> Self {
        Self {
            group_type,
            items: RwLock::new(HashMap::new()),
            sink,
            state_listener: Mutex::new(None),
            item_listener: Mutex::new(None),
        }
    }

    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    /// Add an item to the group, wiring the group's shared listener onto
    /// it. Re-adding the same key is a no-op.
    pub fn add_item(&self, item: Arc<Item>) {
        let key = item.item_key().clone();
        {
            let mut items = self.items.write();
            if items.contains_key(&key) {
                return;
            }
            item.set_state_listener(self.state_listener.lock().clone());
            items.insert(key.clone(), item.clone());
        }
        debug!("item added to {} group: {}", self.group_type, key);
        let listener = self.item_listener.lock().clone();
        if let Some(listener) = listener {
            listener.group_item_added(&item);
        }
    }

    pub fn item(&self, key: &ItemKey) -> Option<Arc<Item>> {
        self.items.read().get(key).cloned()
    }

    pub fn items(&self) -> Vec<Arc<Item>> {
        self.items.read().values().cloned().collect()
    }

    /// Replace the shared state-change listener on the group and every
    /// current member
    pub fn set_state_listener(&self, listener: Option<Arc<dyn StateChangeListener>>) {
        *self.state_listener.lock() = listener.clone();
        for item in self.items.read().values() {
            item.set_state_listener(listener.clone());
        }
    }

    pub fn set_item_listener(&self, listener: Option<Arc<dyn GroupItemListener>>) {
        *self.item_listener.lock() = listener;
    }

    fn send(&self, builder: ActionMessageBuilder) {
        match builder.build() {
            Ok(line) => self.sink.send_command(&line),
            Err(e) => error!("unable to build action for {} group: {}", self.group_type, e),
        }
    }

    pub fn query_state(&self, key: &ItemKey) {
        self.send(ActionMessageBuilder::from_item_key(key).with_action(ActionType::Status));
    }

    pub fn set_output(&self, key: &ItemKey) {
        self.send(ActionMessageBuilder::from_item_key(key).with_action(ActionType::SetOutput));
    }

    pub fn reset_output(&self, key: &ItemKey) {
        self.send(ActionMessageBuilder::from_item_key(key).with_action(ActionType::ResetOutput));
    }

    /// Request a status refresh from every distinct module backing the
    /// group's items
    pub fn update_state(&self) {
        let modules: HashSet<ModuleKey> = self
            .items
            .read()
            .keys()
            .map(|key| key.module_key())
            .collect();
        for module_key in modules {
            self.send(
                ActionMessageBuilder::from_module_key(&module_key)
                    .with_action(ActionType::Status),
            );
        }
    }
}

impl std::fmt::Debug for ItemGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemGroup")
            .field("group_type", &self.group_type)
            .field("items", &self.items.read().len())
            .finish()
    }
}
