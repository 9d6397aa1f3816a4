//! DETHLINK Core
//!
//! Address model, wire codec and live data model for the DETH ASCII line
//! protocol spoken by Domintell-style home automation gateways.
//!
//! This crate provides:
//! - Address value types ([`SerialNumber`], [`ModuleKey`], [`ItemKey`])
//! - Status/system-time line parsing and action line building
//!   ([`StatusMessage`], [`ActionMessageBuilder`])
//! - The live module/item model ([`Module`], [`Item`], [`ItemGroup`])
//! - The create-or-get address cache ([`Registry`])

pub mod action;
pub mod address;
pub mod error;
pub mod group;
pub mod item;
pub mod message;
pub mod module;
pub mod push;
pub mod registry;
pub mod types;

pub use action::{ActionMessageBuilder, ActionType};
pub use address::{ItemKey, ModuleKey, SerialNumber};
pub use error::{Error, Result};
pub use group::{GroupItemListener, ItemGroup};
pub use item::{Item, ItemValue, StateChangeListener};
pub use message::{parse_system_time, Description, StatusMessage};
pub use module::{CommandSink, ConfigChangeListener, Module, ModuleClass};
pub use push::{classify_push, PushEvent, PushTiming};
pub use registry::{DiscoveredEntity, DiscoveryListener, Registry};
pub use types::{DataType, GroupType, ItemType, ModuleType, RegulationMode, TemperatureMode};

/// Default TCP port of a DETH gateway module
pub const DEFAULT_GATEWAY_PORT: u16 = 17481;

/// Command opening a gateway session
pub const CMD_LOGIN: &str = "LOGIN";

/// Command requesting the full module description dump
pub const CMD_APPINFO: &str = "APPINFO";

/// Session keepalive command
pub const CMD_PING: &str = "PING";

/// Prefix of session control lines sent by the gateway
pub const INFO_PREFIX: &str = "INFO:";
