//! Address value types
//!
//! Every addressable entity on the bus is identified by a module type
//! code plus a serial number, optionally narrowed to one IO point:
//!
//! ```text
//! BIR0012A5      whole module (type BIR, serial 0x12A5)
//! BIR0012A5-3    output 3 of that module
//! DAL000F10-0A   ballast 0x0A on a DALI interface (2-digit IO)
//! ```

use std::fmt;

use crate::error::{Error, Result};
use crate::types::ModuleType;

/// Maximum serial value representable in the 6-hex-digit wire field
const MAX_SERIAL: u32 = 0xFF_FFFF;

/// A module's numeric bus address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialNumber(u32);

impl SerialNumber {
    /// Create from a raw numeric address
    pub fn new(address: u32) -> Result<Self> {
        if address > MAX_SERIAL {
            return Err(Error::InvalidSerialNumber(format!("{address:#x}")));
        }
        Ok(SerialNumber(address))
    }

    /// Parse from hex text, with or without a `0x` prefix. Surrounding
    /// whitespace is tolerated; the wire pads short serials with spaces.
    pub fn parse_hex(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| Error::InvalidSerialNumber(text.to_string()))?;
        SerialNumber::new(value)
    }

    /// Raw numeric address
    pub fn address(&self) -> u32 {
        self.0
    }

    /// Lowercase hex rendering without padding
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.0)
    }

    /// Uppercase hex rendering padded to the fixed 6-character wire width
    pub fn to_fixed6(&self) -> String {
        format!("{:06X}", self.0)
    }

    /// Human label carrying both renderings
    pub fn to_label(&self) -> String {
        format!("{}/{:x}", self.0, self.0)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one physical module: `(ModuleType, SerialNumber)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleKey {
    module_type: ModuleType,
    serial_number: SerialNumber,
}

impl ModuleKey {
    pub fn new(module_type: ModuleType, serial_number: SerialNumber) -> Self {
        Self {
            module_type,
            serial_number,
        }
    }

    pub fn module_type(&self) -> ModuleType {
        self.module_type
    }

    pub fn serial_number(&self) -> SerialNumber {
        self.serial_number
    }

    /// Stable identifier safe for use as a lookup key
    pub fn id(&self) -> String {
        format!("{}-{}", self.module_type, self.serial_number.address())
    }

    /// Human label
    pub fn to_label(&self) -> String {
        format!("{} {}", self.module_type, self.serial_number.to_label())
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Identifies one addressable value within (or logically grouped under)
/// a module. Exactly one of IO number / name is set, or neither for
/// single-item modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    module_key: ModuleKey,
    io_number: Option<u8>,
    name: Option<String>,
}

impl ItemKey {
    /// Key for a single-item module
    pub fn module(module_key: ModuleKey) -> Self {
        Self {
            module_key,
            io_number: None,
            name: None,
        }
    }

    /// Key for an IO-indexed item
    pub fn io(module_key: ModuleKey, io_number: u8) -> Self {
        Self {
            module_key,
            io_number: Some(io_number),
            name: None,
        }
    }

    /// Key for a named item
    pub fn named(module_key: ModuleKey, name: impl Into<String>) -> Self {
        Self {
            module_key,
            io_number: None,
            name: Some(name.into()),
        }
    }

    pub fn module_key(&self) -> ModuleKey {
        self.module_key
    }

    pub fn io_number(&self) -> Option<u8> {
        self.io_number
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Wire label: `<TYPE><SERIAL6>[-<io>]`
    pub fn label(&self) -> String {
        to_label(
            self.module_key.module_type(),
            self.module_key.serial_number(),
            self.io_number,
        )
    }

    /// Stable identifier: `<TYPE>-<serialhex>[-<io|name>]`
    pub fn id(&self) -> String {
        let mut id = format!(
            "{}-{}",
            self.module_key.module_type(),
            self.module_key.serial_number().to_hex()
        );
        if let Some(io) = self.io_number {
            id.push('-');
            id.push_str(&io.to_string());
        } else if let Some(name) = &self.name {
            id.push('-');
            id.push_str(name);
        }
        id
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Build the wire label used to address a module or one of its IOs.
/// The IO index is hex, at the width the module family uses on the wire.
pub fn to_label(
    module_type: ModuleType,
    serial_number: SerialNumber,
    io_number: Option<u8>,
) -> String {
    match io_number {
        Some(io) => format!(
            "{}{}-{:0width$X}",
            module_type,
            serial_number.to_fixed6(),
            io,
            width = module_type.io_digits()
        ),
        None => format!("{}{}", module_type, serial_number.to_fixed6()),
    }
}
