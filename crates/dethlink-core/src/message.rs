//! Inbound line parsing
//!
//! Status lines are fixed-position ASCII:
//!
//! ```text
//! <MMM><SSSSSS>[-<II>]<D><payload>
//! BIR002F02-1I0F        input bitmask for BIR 0x2F02
//! TE1012345-1T 21.0 22.5 AUTO 0.0
//! VAR0000A1Living room[Ground floor]      (description form, no data type)
//! ```
//!
//! System time arrives once a minute as a bare `HH:mm dd/MM/yyyy` line.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{DataType, ModuleType};
use crate::SerialNumber;

/// Layout of the gateway clock line
const SYSTEM_TIME_FORMAT: &str = "%H:%M %d/%m/%Y";

/// A parsed status line
#[derive(Debug, Clone)]
pub struct StatusMessage {
    module_type: ModuleType,
    serial_number: SerialNumber,
    io_number: Option<u8>,
    data_type: Option<DataType>,
    data: String,
}

impl StatusMessage {
    /// Parse a status line. `is_description` skips the data type tag and
    /// keeps the remainder verbatim; the caller decides based on bracket
    /// content or the session's APPINFO cycle.
    pub fn parse(line: &str, is_description: bool) -> Result<Self> {
        let bytes = line.as_bytes();
        if bytes.len() < 10 || !line.is_ascii() {
            return Err(Error::MalformedStatus(line.to_string()));
        }

        let module_type = ModuleType::from_code(&line[0..3])
            .ok_or_else(|| Error::UnknownModuleType(line[0..3].to_string()))?;
        let serial_number = SerialNumber::parse_hex(&line[3..9])?;

        let mut cursor = 9;
        let mut io_number = None;
        if bytes[9] == b'-' {
            let digits = module_type.io_digits();
            let end = 10 + digits;
            if bytes.len() < end + 1 {
                return Err(Error::MalformedStatus(line.to_string()));
            }
            let io = u8::from_str_radix(&line[10..end], 16)
                .map_err(|_| Error::MalformedStatus(line.to_string()))?;
            io_number = Some(io);
            cursor = end;
        }

        let (data_type, data) = if is_description {
            (None, line[cursor..].to_string())
        } else {
            let tag = bytes[cursor] as char;
            let data_type =
                DataType::from_code(tag).ok_or(Error::UnknownDataType(tag))?;
            (Some(data_type), line[cursor + 1..].to_string())
        };

        Ok(Self {
            module_type,
            serial_number,
            io_number,
            data_type,
            data,
        })
    }

    pub fn module_type(&self) -> ModuleType {
        self.module_type
    }

    pub fn serial_number(&self) -> SerialNumber {
        self.serial_number
    }

    pub fn io_number(&self) -> Option<u8> {
        self.io_number
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Trimmed payload
    pub fn data(&self) -> &str {
        self.data.trim()
    }
}

/// Parse a gateway clock line. Unparseable input is logged and yields
/// `None`; a bad clock must never abort session processing.
pub fn parse_system_time(line: &str) -> Option<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(line.trim(), SYSTEM_TIME_FORMAT) {
        Ok(dt) => Some(dt),
        Err(_) => {
            debug!("unable to parse system date/time: {}", line);
            None
        }
    }
}

/// Quick check whether a line looks like the gateway clock
pub fn is_system_time(line: &str) -> bool {
    let t = line.trim();
    t.len() == 16 && t.as_bytes().get(2) == Some(&b':') && t.contains('/')
}

/// Descriptive metadata in `name[location][extra]` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    name: String,
    location: Option<String>,
    extra: Option<String>,
}

impl Description {
    pub fn new(
        name: impl Into<String>,
        location: Option<String>,
        extra: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            extra,
        }
    }

    /// Parse a description payload. Location and extra brackets are both
    /// optional; a payload without brackets is all name.
    pub fn parse(info: &str) -> Self {
        if let Some(name_end) = info.find('[') {
            let name = info[..name_end].to_string();
            let location_end = info[name_end..].find(']').map(|i| i + name_end);
            let location = location_end
                .map(|end| info[name_end + 1..end].to_string())
                .filter(|s| !s.is_empty());
            let extra = location_end
                .and_then(|end| info[end..].find('[').map(|i| i + end))
                .map(|start| info[start + 1..].trim_end_matches(']').to_string())
                .filter(|s| !s.is_empty());
            Description {
                name,
                location,
                extra,
            }
        } else {
            Description {
                name: info.to_string(),
                location: None,
                extra: None,
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }
}
