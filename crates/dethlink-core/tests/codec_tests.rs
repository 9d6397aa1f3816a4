//! Wire codec tests: status line parsing and action line building

use chrono::Timelike;

use dethlink_core::{
    parse_system_time, ActionMessageBuilder, ActionType, DataType, Error, ItemKey, ModuleKey,
    ModuleType, SerialNumber, StatusMessage, TemperatureMode,
};

fn module_key(mt: ModuleType, serial: u32) -> ModuleKey {
    ModuleKey::new(mt, SerialNumber::new(serial).unwrap())
}

#[test]
fn parses_status_without_io() {
    let msg = StatusMessage::parse("BIR002F02I0F", false).unwrap();
    assert_eq!(msg.module_type(), ModuleType::Bir);
    assert_eq!(msg.serial_number().address(), 0x2F02);
    assert_eq!(msg.io_number(), None);
    assert_eq!(msg.data_type(), Some(DataType::I));
    assert_eq!(msg.data(), "0F");
}

#[test]
fn parses_status_with_io() {
    let msg = StatusMessage::parse("IS80000AB-2I01", false).unwrap();
    assert_eq!(msg.module_type(), ModuleType::Is8);
    assert_eq!(msg.io_number(), Some(2));
    assert_eq!(msg.data(), "01");
}

#[test]
fn parses_two_digit_io_for_dali() {
    let msg = StatusMessage::parse("DAL000F10-0AD64", false).unwrap();
    assert_eq!(msg.module_type(), ModuleType::Dal);
    assert_eq!(msg.io_number(), Some(0x0A));
    assert_eq!(msg.data_type(), Some(DataType::D));
    assert_eq!(msg.data(), "64");
}

#[test]
fn parses_thermostat_record() {
    let msg = StatusMessage::parse("TE1012345-1T 21.0 22.5 AUTO 0.0", false).unwrap();
    assert_eq!(msg.module_type(), ModuleType::Te1);
    assert_eq!(msg.io_number(), Some(1));
    assert_eq!(msg.data_type(), Some(DataType::T));
    assert_eq!(msg.data(), "21.0 22.5 AUTO 0.0");
}

#[test]
fn parses_description_payload_verbatim() {
    let msg = StatusMessage::parse("VAR0000A1Night mode[Ground floor]", true).unwrap();
    assert_eq!(msg.module_type(), ModuleType::Var);
    assert_eq!(msg.data_type(), None);
    assert_eq!(msg.data(), "Night mode[Ground floor]");
}

#[test]
fn rejects_malformed_lines() {
    assert!(matches!(
        StatusMessage::parse("BIR", false),
        Err(Error::MalformedStatus(_))
    ));
    assert!(matches!(
        StatusMessage::parse("XYZ002F02I0F", false),
        Err(Error::UnknownModuleType(_))
    ));
    assert!(matches!(
        StatusMessage::parse("BIR002F02Z0F", false),
        Err(Error::UnknownDataType('Z'))
    ));
}

#[test]
fn parses_system_time_line() {
    let dt = parse_system_time("14:25 03/11/2021").unwrap();
    assert_eq!(dt.time().hour(), 14);
    assert_eq!(dt.time().minute(), 25);
    assert_eq!(parse_system_time("not a clock"), None);
}

#[test]
fn builds_status_request() {
    let line = ActionMessageBuilder::from_module_key(&module_key(ModuleType::Bir, 0x2F02))
        .with_action(ActionType::Status)
        .build()
        .unwrap();
    assert_eq!(line, "&BIR002F02%S");
}

#[test]
fn builds_output_toggle() {
    let line = ActionMessageBuilder::from_module_key(&module_key(ModuleType::Bir, 0x2F02))
        .with_io_number(1)
        .with_action(ActionType::ToggleOutput)
        .build()
        .unwrap();
    assert_eq!(line, "&BIR002F02-1%T");
}

#[test]
fn builds_dimmer_percentage() {
    let line = ActionMessageBuilder::from_module_key(&module_key(ModuleType::Dim, 0x12))
        .with_io_number(3)
        .with_action(ActionType::SetDimmer)
        .with_value(50.0)
        .build()
        .unwrap();
    assert_eq!(line, "&DIM000012-3%D50");
}

#[test]
fn builds_setpoint_with_temperature_format() {
    let line = ActionMessageBuilder::from_module_key(&module_key(ModuleType::Te1, 0x12345))
        .with_action(ActionType::HeatingSetpoint)
        .with_value(21.5)
        .build()
        .unwrap();
    assert_eq!(line, "&TE1012345%T21.5");
}

#[test]
fn builds_mode_selection() {
    let line = ActionMessageBuilder::from_module_key(&module_key(ModuleType::Te1, 0x12345))
        .with_action(ActionType::HeatingMode)
        .with_selection(TemperatureMode::Comfort.value())
        .build()
        .unwrap();
    assert_eq!(line, "&TE1012345%M5");
}

#[test]
fn builds_double_push_sequence() {
    let line = ActionMessageBuilder::from_module_key(&module_key(ModuleType::Bu2, 0xAB))
        .with_io_number(1)
        .with_action(ActionType::DoublePush)
        .build()
        .unwrap();
    assert_eq!(line, "&BU20000AB-1%P1&BU20000AB-1%P2&BU20000AB-1%P1&BU20000AB-1%P2");
}

#[test]
fn wire_label_round_trips_through_parser() {
    let key = ItemKey::io(module_key(ModuleType::Dal, 0xF10), 0x0A);
    let line = format!("{}D64", key.label());
    let msg = StatusMessage::parse(&line, false).unwrap();
    assert_eq!(msg.module_type(), ModuleType::Dal);
    assert_eq!(msg.serial_number().address(), 0xF10);
    assert_eq!(msg.io_number(), Some(0x0A));
}
