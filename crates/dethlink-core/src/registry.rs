//! Module and group registry
//!
//! The registry is the single source of live [`Module`] and
//! [`ItemGroup`] instances: lookups create on first access and return
//! the same `Arc` forever after, so state accumulated on an instance is
//! never split across duplicates. First access races are resolved by the
//! concurrent map's entry API.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::address::{ItemKey, ModuleKey};
use crate::error::Result;
use crate::group::ItemGroup;
use crate::module::{CommandSink, Module, ModuleClass};
use crate::types::{GroupType, ModuleType};
use crate::SerialNumber;

/// A newly created registry entity, handed to the discovery listener
#[derive(Clone)]
pub enum DiscoveredEntity {
    Module(Arc<Module>),
    Group(Arc<ItemGroup>),
}

impl DiscoveredEntity {
    pub fn label(&self) -> String {
        match self {
            DiscoveredEntity::Module(m) => m.module_key().to_label(),
            DiscoveredEntity::Group(g) => format!("{} group", g.group_type()),
        }
    }
}

/// Sink for newly created discoverable entities. Invoked at most once
/// per entity, and only while a listener is attached.
pub trait DiscoveryListener: Send + Sync {
    fn on_discoverable(&self, entity: &DiscoveredEntity);
}

/// Create-or-get cache of modules and item groups
pub struct Registry {
    modules: DashMap<ModuleKey, Arc<Module>>,
    groups: DashMap<GroupType, Arc<ItemGroup>>,
    sink: Arc<dyn CommandSink>,
    discovery: Mutex<Option<Arc<dyn DiscoveryListener>>>,
}

impl Registry {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            modules: DashMap::new(),
            groups: DashMap::new(),
            sink,
            discovery: Mutex::new(None),
        }
    }

    /// Replace the discovery listener. Entities created while no
    /// listener is attached are never announced retroactively.
    pub fn set_discovery_listener(&self, listener: Option<Arc<dyn DiscoveryListener>>) {
        *self.discovery.lock() = listener;
    }

    /// Look up the module for `(module_type, serial)`, creating it on
    /// first access. Types without a model class fail.
    pub fn get_module(
        &self,
        module_type: ModuleType,
        serial_number: SerialNumber,
    ) -> Result<Arc<Module>> {
        let key = ModuleKey::new(module_type, serial_number);
        if let Some(existing) = self.modules.get(&key) {
            return Ok(existing.clone());
        }

        let created;
        let module = match self.modules.entry(key) {
            Entry::Occupied(entry) => {
                created = false;
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let module = Arc::new(Module::new(module_type, serial_number, self.sink.clone())?);
                entry.insert(module.clone());
                created = true;
                module
            }
        };

        if created {
            debug!("module created: {}", module.module_key());
            // system variables are surfaced through the variable group
            if matches!(module.class(), ModuleClass::Variable) {
                if let Some(item) = module.item(&ItemKey::module(module.module_key())) {
                    self.get_item_group(GroupType::Variable).add_item(item);
                }
            }
            if module.discoverable() {
                self.announce(DiscoveredEntity::Module(module.clone()));
            }
        }
        Ok(module)
    }

    /// Look up the group for `group_type`, creating it on first access
    pub fn get_item_group(&self, group_type: GroupType) -> Arc<ItemGroup> {
        if let Some(existing) = self.groups.get(&group_type) {
            return existing.clone();
        }

        let created;
        let group = match self.groups.entry(group_type) {
            Entry::Occupied(entry) => {
                created = false;
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let group = Arc::new(ItemGroup::new(group_type, self.sink.clone()));
                entry.insert(group.clone());
                created = true;
                group
            }
        };

        if created {
            debug!("item group created: {}", group.group_type());
            self.announce(DiscoveredEntity::Group(group.clone()));
        }
        group
    }

    /// Module already present, without creating one
    pub fn module(&self, key: &ModuleKey) -> Option<Arc<Module>> {
        self.modules.get(key).map(|m| m.clone())
    }

    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn announce(&self, entity: DiscoveredEntity) {
        let listener = self.discovery.lock().clone();
        if let Some(listener) = listener {
            listener.on_discoverable(&entity);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}
