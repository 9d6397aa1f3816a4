//! Protocol type enumerations
//!
//! Closed tables for everything the wire identifies by a short code:
//! module families, data type tags, thermostat selections. Replaces the
//! runtime type lookups of older gateway clients with compile-time
//! checkable enums.

use std::fmt;

/// Module type codes as they appear in the first 3 characters of a
/// status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleType {
    /// Bipolar relay module, 8 outputs
    Bir,
    /// Relay module, 5 outputs
    Dmr,
    /// Teleruptor relay module, 2 outputs
    Trp,
    /// Input/contact module, 4 inputs
    Is4,
    /// Input/contact module, 8 inputs
    Is8,
    /// Push button, 1 contact
    Bu1,
    /// Push button, 2 contacts
    Bu2,
    /// Push button, 4 contacts
    Bu4,
    /// Dimmer module, 8 outputs
    Dim,
    /// Dimmer module, 10 outputs
    D10,
    /// DALI dimmer bus interface (2-hex-digit IO addressing)
    Dal,
    /// Shutter/blind relay module, 4 shutters
    Trv,
    /// Thermostat sensor
    Te1,
    /// Thermostat sensor, second generation
    Te2,
    /// System variable
    Var,
}

impl ModuleType {
    /// Parse a 3-character module type code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BIR" => Some(ModuleType::Bir),
            "DMR" => Some(ModuleType::Dmr),
            "TRP" => Some(ModuleType::Trp),
            "IS4" => Some(ModuleType::Is4),
            "IS8" => Some(ModuleType::Is8),
            "BU1" => Some(ModuleType::Bu1),
            "BU2" => Some(ModuleType::Bu2),
            "BU4" => Some(ModuleType::Bu4),
            "DIM" => Some(ModuleType::Dim),
            "D10" => Some(ModuleType::D10),
            "DAL" => Some(ModuleType::Dal),
            "TRV" => Some(ModuleType::Trv),
            "TE1" => Some(ModuleType::Te1),
            "TE2" => Some(ModuleType::Te2),
            "VAR" => Some(ModuleType::Var),
            _ => None,
        }
    }

    /// Wire code of this module type
    pub fn code(&self) -> &'static str {
        match self {
            ModuleType::Bir => "BIR",
            ModuleType::Dmr => "DMR",
            ModuleType::Trp => "TRP",
            ModuleType::Is4 => "IS4",
            ModuleType::Is8 => "IS8",
            ModuleType::Bu1 => "BU1",
            ModuleType::Bu2 => "BU2",
            ModuleType::Bu4 => "BU4",
            ModuleType::Dim => "DIM",
            ModuleType::D10 => "D10",
            ModuleType::Dal => "DAL",
            ModuleType::Trv => "TRV",
            ModuleType::Te1 => "TE1",
            ModuleType::Te2 => "TE2",
            ModuleType::Var => "VAR",
        }
    }

    /// Width of the IO index field on the wire. The DALI family
    /// addresses up to 64 ballasts and uses two hex digits.
    pub fn io_digits(&self) -> usize {
        match self {
            ModuleType::Dal => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Data type tag of a status payload (the single character between the
/// address and the payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Input states (bitmask)
    I,
    /// Output states (bitmask)
    O,
    /// Dimmer percentages
    D,
    /// Thermostat heating record
    T,
    /// Thermostat cooling record
    U,
}

impl DataType {
    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'I' => Some(DataType::I),
            'O' => Some(DataType::O),
            'D' => Some(DataType::D),
            'T' => Some(DataType::T),
            'U' => Some(DataType::U),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            DataType::I => 'I',
            DataType::O => 'O',
            DataType::D => 'D',
            DataType::T => 'T',
            DataType::U => 'U',
        }
    }
}

/// Semantic kind of an item's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    BooleanVar,
    NumericVar,
    Shutter,
}

/// Item group discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    /// System-wide boolean variables
    Variable,
    /// System-wide numeric values
    Value,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupType::Variable => f.write_str("variable"),
            GroupType::Value => f.write_str("value"),
        }
    }
}

/// Thermostat heating mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemperatureMode {
    Absence,
    Auto,
    Comfort,
    Frost,
}

impl TemperatureMode {
    /// Numeric selection value sent with mode actions
    pub fn value(&self) -> i64 {
        match self {
            TemperatureMode::Absence => 1,
            TemperatureMode::Auto => 2,
            TemperatureMode::Comfort => 5,
            TemperatureMode::Frost => 6,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(TemperatureMode::Absence),
            2 => Some(TemperatureMode::Auto),
            5 => Some(TemperatureMode::Comfort),
            6 => Some(TemperatureMode::Frost),
            _ => None,
        }
    }

    /// Parse the mode token of a thermostat status record
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ABSENCE" => Some(TemperatureMode::Absence),
            "AUTO" => Some(TemperatureMode::Auto),
            "COMFORT" => Some(TemperatureMode::Comfort),
            "FROST" => Some(TemperatureMode::Frost),
            _ => None,
        }
    }
}

/// Thermostat regulation (cooling) mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegulationMode {
    Off,
    Heating,
    Cooling,
    Mixed,
    Dry,
    Fan,
}

impl RegulationMode {
    pub fn value(&self) -> i64 {
        match self {
            RegulationMode::Off => 0,
            RegulationMode::Heating => 1,
            RegulationMode::Cooling => 2,
            RegulationMode::Mixed => 3,
            RegulationMode::Dry => 4,
            RegulationMode::Fan => 5,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(RegulationMode::Off),
            1 => Some(RegulationMode::Heating),
            2 => Some(RegulationMode::Cooling),
            3 => Some(RegulationMode::Mixed),
            4 => Some(RegulationMode::Dry),
            5 => Some(RegulationMode::Fan),
            _ => None,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "OFF" => Some(RegulationMode::Off),
            "HEATING" => Some(RegulationMode::Heating),
            "COOLING" => Some(RegulationMode::Cooling),
            "MIXED" => Some(RegulationMode::Mixed),
            "DRY" => Some(RegulationMode::Dry),
            "FAN" => Some(RegulationMode::Fan),
            _ => None,
        }
    }
}
