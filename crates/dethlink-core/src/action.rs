//! Outgoing action line building
//!
//! Every command is `&<label><actioncode>[value]`. Actions expanding to
//! several code strings (simulated pushes) repeat the address prefix for
//! each code.

use std::fmt::Write;

use crate::address::{to_label, ItemKey, ModuleKey};
use crate::error::{Error, Result};
use crate::types::ModuleType;
use crate::SerialNumber;

/// Kind of numeric value an action carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    None,
    /// Plain truncated integer (selections and percentages)
    Decimal,
    /// `NN.N`, integer part wrapped mod 100 and zero padded
    Temperature,
    /// `NNN.NNNN`, integer part wrapped mod 1000 and zero padded
    Frequency,
}

/// Outgoing protocol actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Request a status refresh for the addressed module
    Status,
    /// Set a boolean output
    SetOutput,
    /// Reset a boolean output
    ResetOutput,
    /// Toggle a boolean output
    ToggleOutput,
    /// Simulate a short push on an input
    ShortPush,
    /// Simulate a long push on an input
    LongPush,
    /// Simulate a double push on an input
    DoublePush,
    /// Set a dimmer or volume percentage
    SetDimmer,
    /// Relative dimmer increase
    IncreaseBy,
    /// Relative dimmer decrease
    DecreaseBy,
    /// Drive a shutter to its high end
    SetShutter,
    /// Drive a shutter to its low end
    ResetShutter,
    /// Stop a moving shutter
    StopShutter,
    /// Heating setpoint
    HeatingSetpoint,
    /// Cooling setpoint
    CoolingSetpoint,
    /// Heating mode selection
    HeatingMode,
    /// Cooling regulation mode selection
    CoolingMode,
}

impl ActionType {
    /// Wire code strings for this action
    fn action_strings(&self) -> &'static [&'static str] {
        match self {
            ActionType::Status => &["%S"],
            ActionType::SetOutput => &["%I"],
            ActionType::ResetOutput => &["%O"],
            ActionType::ToggleOutput => &["%T"],
            ActionType::ShortPush => &["%P1", "%P2"],
            ActionType::LongPush => &["%P3", "%P4"],
            ActionType::DoublePush => &["%P1", "%P2", "%P1", "%P2"],
            ActionType::SetDimmer => &["%D"],
            ActionType::IncreaseBy => &["%I+"],
            ActionType::DecreaseBy => &["%I-"],
            ActionType::SetShutter => &["%H"],
            ActionType::ResetShutter => &["%L"],
            ActionType::StopShutter => &["%S"],
            ActionType::HeatingSetpoint => &["%T"],
            ActionType::CoolingSetpoint => &["%U"],
            ActionType::HeatingMode => &["%M"],
            ActionType::CoolingMode => &["%R"],
        }
    }

    fn value_kind(&self) -> ValueKind {
        match self {
            ActionType::SetDimmer
            | ActionType::IncreaseBy
            | ActionType::DecreaseBy
            | ActionType::HeatingMode
            | ActionType::CoolingMode => ValueKind::Decimal,
            ActionType::HeatingSetpoint | ActionType::CoolingSetpoint => {
                ValueKind::Temperature
            }
            _ => ValueKind::None,
        }
    }
}

/// Builder for outgoing action lines
#[derive(Debug, Clone)]
pub struct ActionMessageBuilder {
    module_type: ModuleType,
    serial_number: SerialNumber,
    io_number: Option<u8>,
    action: Option<ActionType>,
    num_value: Option<f64>,
    frequency: bool,
}

impl ActionMessageBuilder {
    pub fn from_item_key(key: &ItemKey) -> Self {
        Self {
            module_type: key.module_key().module_type(),
            serial_number: key.module_key().serial_number(),
            io_number: key.io_number(),
            action: None,
            num_value: None,
            frequency: false,
        }
    }

    pub fn from_module_key(key: &ModuleKey) -> Self {
        Self {
            module_type: key.module_type(),
            serial_number: key.serial_number(),
            io_number: None,
            action: None,
            num_value: None,
            frequency: false,
        }
    }

    pub fn with_io_number(mut self, io_number: u8) -> Self {
        self.io_number = Some(io_number);
        self
    }

    pub fn with_action(mut self, action: ActionType) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.num_value = Some(value);
        self
    }

    /// Selection values are plain integers on the wire
    pub fn with_selection(mut self, selection: i64) -> Self {
        self.num_value = Some(selection as f64);
        self
    }

    /// Format the value as a tuner frequency instead of the action's
    /// default numeric kind
    pub fn with_frequency(mut self, value: f64) -> Self {
        self.num_value = Some(value);
        self.frequency = true;
        self
    }

    /// Format the command line(s)
    pub fn build(&self) -> Result<String> {
        let action = self.action.ok_or(Error::ActionNotSet)?;
        let base = format!(
            "&{}",
            to_label(self.module_type, self.serial_number, self.io_number)
        );
        let codes = action.action_strings();

        if codes.len() == 1 {
            let mut line = base;
            line.push_str(codes[0]);
            let kind = if self.frequency {
                ValueKind::Frequency
            } else {
                action.value_kind()
            };
            if kind != ValueKind::None {
                let value = self.num_value.ok_or(Error::MissingValue(action))?;
                match kind {
                    ValueKind::Decimal => {
                        let _ = write!(line, "{}", value.trunc() as i64);
                    }
                    ValueKind::Temperature => line.push_str(&format_temperature(value)),
                    ValueKind::Frequency => line.push_str(&format_frequency(value)),
                    ValueKind::None => unreachable!(),
                }
            }
            Ok(line)
        } else {
            let mut line = String::new();
            for code in codes {
                line.push_str(&base);
                line.push_str(code);
            }
            Ok(line)
        }
    }
}

/// `NN.N`: two integer digits (wrapped mod 100), one fractional digit
pub fn format_temperature(value: f64) -> String {
    let rounded = (value.abs() * 10.0).round() / 10.0;
    let int_part = (rounded.trunc() as i64) % 100;
    let frac = ((rounded * 10.0).round() as i64) % 10;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{int_part:02}.{frac}")
}

/// `NNN.NNNN`: three integer digits (wrapped mod 1000), four fractional
/// digits
pub fn format_frequency(value: f64) -> String {
    let rounded = (value.abs() * 10_000.0).round() / 10_000.0;
    let int_part = (rounded.trunc() as i64) % 1000;
    let frac = ((rounded * 10_000.0).round() as i64) % 10_000;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{int_part:03}.{frac:04}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ModuleKey;

    fn key(mt: ModuleType, serial: u32) -> ModuleKey {
        ModuleKey::new(mt, SerialNumber::new(serial).unwrap())
    }

    #[test]
    fn test_numeric_formats() {
        assert_eq!(format_temperature(21.5), "21.5");
        assert_eq!(format_temperature(5.0), "05.0");
        assert_eq!(format_temperature(-5.5), "-05.5");
        assert_eq!(format_frequency(100.5), "100.5000");
        assert_eq!(format_frequency(88.3), "088.3000");
    }

    #[test]
    fn test_missing_value() {
        let err = ActionMessageBuilder::from_module_key(&key(ModuleType::Te1, 0x1234))
            .with_action(ActionType::HeatingSetpoint)
            .build();
        assert!(matches!(err, Err(Error::MissingValue(_))));
    }

    #[test]
    fn test_multi_code_expansion() {
        let line = ActionMessageBuilder::from_module_key(&key(ModuleType::Is8, 0xAB))
            .with_io_number(2)
            .with_action(ActionType::ShortPush)
            .build()
            .unwrap();
        assert_eq!(line, "&IS80000AB-2%P1&IS80000AB-2%P2");
    }
}
