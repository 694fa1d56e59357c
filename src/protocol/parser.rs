//! Frame decoding for the iWoc protocol.
//!
//! Each message family has a standalone `parse_*` function returning a typed
//! reading. [`BikeDataParser`] wraps them, folds results into a
//! [`BikeState`] and keeps the little cross-message memory the protocol
//! needs (battery packet counter, VIN, protocol version).

use crate::error::DecodeError;
use crate::protocol::MessageKind;
use crate::protocol::reader::{read_u8, read_u16, read_u32, tenths};
use crate::types::ebm::EBM_DISTANCE_SCALE;
use crate::types::{
    AssistReading, BatteryPacket, BatteryReading, BikeState, EbmReading, MotorReading,
};

/// Minimum battery frame length.
pub const BATTERY_MESSAGE_LENGTH: usize = 17;

/// Battery frame length from which the combined number/cycles field is present.
pub const BATTERY_EXTENDED_LENGTH: usize = 19;

/// Minimum motor frame length.
pub const MOTOR_MESSAGE_LENGTH: usize = 18;

/// Minimum EBM frame length.
pub const EBM_MESSAGE_LENGTH: usize = 17;

/// Assist frame carrying min/max/current levels.
pub const ASSIST_LEVELS_LENGTH: usize = 10;

/// Assist frame carrying a sync result.
pub const ASSIST_SYNC_LENGTH: usize = 9;

/// Length of a VIN / serial number.
pub const VIN_LENGTH: usize = 17;

/// Primary-only battery frames after which the secondary slot is zeroed.
pub const SECONDARY_RESET_PACKETS: u32 = 4;

const VIN_PREFIX: &str = "$s$V#";
const VIN_ALT_PREFIX: &str = "R0";
const VIN_ALT_LENGTH: usize = 20;
const PROTOCOL_PREFIX: &str = "$s$P#";
const TEXT_SUFFIX: &str = "#@";
const PROTOCOL_ERROR: &str = "ER";

fn check_len(kind: MessageKind, data: &[u8], need: usize) -> Result<(), DecodeError> {
    if data.len() < need {
        return Err(DecodeError::TooShort {
            kind,
            need,
            got: data.len(),
        });
    }
    Ok(())
}

/// Unwraps a field read. `check_len` has already proven the offsets are in
/// range, so a missing value means the frame layout itself is inconsistent.
fn field<T>(kind: MessageKind, value: Option<T>) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::Malformed { kind })
}

/// Converts an ASCII digit byte to its numeric value.
fn digit(byte: u8) -> Result<u8, DecodeError> {
    if byte.is_ascii_digit() {
        Ok(byte - b'0')
    } else {
        Err(DecodeError::InvalidDigit { byte })
    }
}

/// Parses a battery frame.
///
/// Format (offsets into the raw frame):
/// ```text
/// [5:2 voltage/10] [7:1 soc] [8:1 temp] [9:2 current/10]
/// [11:2 nominal Wh/10] [13:2 remaining Wh/10] ([15:2 number*10000+cycles])
/// ```
pub fn parse_battery(data: &[u8]) -> Result<BatteryPacket, DecodeError> {
    const KIND: MessageKind = MessageKind::Battery;
    check_len(KIND, data, BATTERY_MESSAGE_LENGTH)?;

    let combined = if data.len() >= BATTERY_EXTENDED_LENGTH {
        read_u16(data, 15)
    } else {
        None
    };
    let (battery_number, cycles) = BatteryPacket::split_combined(combined);

    let reading = BatteryReading {
        voltage: tenths(field(KIND, read_u16(data, 5))?),
        soc: field(KIND, read_u8(data, 7))?,
        temperature: field(KIND, read_u8(data, 8))?,
        current: tenths(field(KIND, read_u16(data, 9))?),
        nominal_capacity: tenths(field(KIND, read_u16(data, 11))?),
        remaining_wh: tenths(field(KIND, read_u16(data, 13))?),
        cycles,
    };

    Ok(BatteryPacket {
        battery_number,
        reading,
    })
}

/// Parses a motor frame.
///
/// Format:
/// ```text
/// [5:1 assist] [6:1 temp C] [7:2 power A/10] [9:2 speed km/h/10]
/// [11:1 wheel rpm] [12:1 torque %] [13:2 max power A/10] [15:1 max torque %]
/// ```
pub fn parse_motor(data: &[u8]) -> Result<MotorReading, DecodeError> {
    const KIND: MessageKind = MessageKind::Motor;
    check_len(KIND, data, MOTOR_MESSAGE_LENGTH)?;

    Ok(MotorReading {
        assist_level: field(KIND, read_u8(data, 5))?,
        temperature_celsius: field(KIND, read_u8(data, 6))?,
        power_amp: tenths(field(KIND, read_u16(data, 7))?),
        speed_kmh: tenths(field(KIND, read_u16(data, 9))?),
        wheel_speed_rpm: field(KIND, read_u8(data, 11))?,
        torque_pct: field(KIND, read_u8(data, 12))?,
        power_max_amp: tenths(field(KIND, read_u16(data, 13))?),
        max_torque_pct: field(KIND, read_u8(data, 15))?,
    })
}

/// Parses an assist frame.
///
/// The shape is chosen by exact length: 10 bytes carry three ASCII digits
/// at offsets 5..8 (min, max, current); 9 bytes carry a two-character sync
/// result at 5..7.
pub fn parse_assist(data: &[u8]) -> Result<AssistReading, DecodeError> {
    match data.len() {
        ASSIST_LEVELS_LENGTH => Ok(AssistReading::Levels {
            min: digit(data[5])?,
            max: digit(data[6])?,
            current: digit(data[7])?,
        }),
        ASSIST_SYNC_LENGTH => {
            let sync_result = String::from_utf8_lossy(&data[5..7]).into_owned();
            let success = sync_result == "OK";
            Ok(AssistReading::Sync {
                sync_result,
                success,
            })
        }
        got => Err(DecodeError::UnexpectedLength {
            kind: MessageKind::Assist,
            got,
        }),
    }
}

/// Parses an EBM frame.
///
/// Format:
/// ```text
/// [5:4 odometry/10000 km] [9:4 autonomy/10000 km] [13:1 light] [14:1 status]
/// ```
pub fn parse_ebm(data: &[u8]) -> Result<EbmReading, DecodeError> {
    const KIND: MessageKind = MessageKind::Ebm;
    check_len(KIND, data, EBM_MESSAGE_LENGTH)?;

    let odometry = field(KIND, read_u32(data, 5))?;
    let autonomy = field(KIND, read_u32(data, 9))?;

    Ok(EbmReading {
        odometry_km: f64::from(odometry) / EBM_DISTANCE_SCALE,
        autonomy_km: f64::from(autonomy) / EBM_DISTANCE_SCALE,
        light_on: field(KIND, read_u8(data, 13))? == 1,
        status: field(KIND, read_u8(data, 14))?,
    })
}

/// Parses a VIN frame.
///
/// Accepted shapes: `$s$V#<17 chars>#@` and `R0<17 chars>@` (20 chars).
pub fn parse_vin(data: &[u8]) -> Result<String, DecodeError> {
    let text = String::from_utf8_lossy(data);

    let standard = text
        .strip_prefix(VIN_PREFIX)
        .and_then(|rest| rest.strip_suffix(TEXT_SUFFIX));
    if let Some(vin) = standard.filter(|vin| vin.chars().count() == VIN_LENGTH) {
        return Ok(vin.to_owned());
    }

    if text.chars().count() == VIN_ALT_LENGTH {
        let alternative = text
            .strip_prefix(VIN_ALT_PREFIX)
            .and_then(|rest| rest.strip_suffix('@'));
        if let Some(vin) = alternative.filter(|vin| vin.chars().count() == VIN_LENGTH) {
            return Ok(vin.to_owned());
        }
    }

    Err(DecodeError::Malformed {
        kind: MessageKind::Vin,
    })
}

/// Parses a protocol version frame: `$s$P#<version>#@`.
///
/// The version is taken verbatim. `ER` is the device's error answer.
pub fn parse_protocol_version(data: &[u8]) -> Result<String, DecodeError> {
    const KIND: MessageKind = MessageKind::Protocol;
    let text = String::from_utf8_lossy(data);

    match text
        .strip_prefix(PROTOCOL_PREFIX)
        .and_then(|rest| rest.strip_suffix(TEXT_SUFFIX))
    {
        Some(PROTOCOL_ERROR) => Err(DecodeError::DeviceError { kind: KIND }),
        Some(version) if !version.is_empty() => Ok(version.to_owned()),
        _ => Err(DecodeError::Malformed { kind: KIND }),
    }
}

/// Stateful decoder folding frames into a [`BikeState`].
#[derive(Debug, Clone, Default)]
pub struct BikeDataParser {
    state: BikeState,
    battery_packet_counter: u32,
    vin: Option<String>,
    protocol_version: Option<String>,
}

impl BikeDataParser {
    /// Creates a parser with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &BikeState {
        &self.state
    }

    /// Returns a mutable reference to the state, for externally attached
    /// fields such as RSSI.
    pub const fn state_mut(&mut self) -> &mut BikeState {
        &mut self.state
    }

    /// Returns the VIN / serial number, once received.
    #[must_use]
    pub fn vin(&self) -> Option<&str> {
        self.vin.as_deref()
    }

    /// Returns the protocol version, once received.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Returns how many primary battery frames arrived since the last
    /// secondary one.
    #[must_use]
    pub const fn battery_packet_counter(&self) -> u32 {
        self.battery_packet_counter
    }

    /// Classifies a frame and folds it into the state.
    ///
    /// Malformed frames are logged and leave the state untouched. Returns the
    /// classified kind.
    pub fn handle(&mut self, frame: &[u8]) -> MessageKind {
        let kind = MessageKind::classify(frame);

        let result = match kind {
            MessageKind::Battery => self.handle_battery(frame).map(drop),
            MessageKind::Motor => self.handle_motor(frame).map(drop),
            MessageKind::Assist => self.handle_assist(frame).map(drop),
            MessageKind::Ebm => self.handle_ebm(frame).map(drop),
            MessageKind::Vin => self.handle_vin(frame).map(drop),
            MessageKind::Protocol => self.handle_protocol_version(frame).map(drop),
            MessageKind::Unknown => {
                let prefix = &frame[..frame.len().min(5)];
                tracing::debug!(
                    "unknown message: prefix=[{}], length={}",
                    hex::encode(prefix),
                    frame.len()
                );
                Ok(())
            }
            _ => {
                tracing::debug!("received message of type: {kind}");
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::debug!("ignoring {kind} frame: {e}");
        }

        kind
    }

    /// Decodes a battery frame and routes it to the primary or secondary slot.
    pub fn handle_battery(&mut self, frame: &[u8]) -> Result<BatteryPacket, DecodeError> {
        let packet = parse_battery(frame)?;

        match packet.battery_number {
            2 => {
                self.battery_packet_counter = 0;
                self.state.battery_secondary = Some(packet.reading);
            }
            1 => {
                self.battery_packet_counter = self.battery_packet_counter.saturating_add(1);
                self.state.battery_primary = Some(packet.reading);

                if self.battery_packet_counter >= SECONDARY_RESET_PACKETS {
                    self.state.battery_secondary = Some(BatteryReading::zeroed());
                }
            }
            other => {
                tracing::debug!("battery frame for unexpected battery number {other}");
            }
        }

        Ok(packet)
    }

    /// Decodes a motor frame into the motor slot.
    pub fn handle_motor(&mut self, frame: &[u8]) -> Result<MotorReading, DecodeError> {
        let reading = parse_motor(frame)?;
        self.state.motor = Some(reading);
        Ok(reading)
    }

    /// Decodes an assist frame into the assist slot.
    pub fn handle_assist(&mut self, frame: &[u8]) -> Result<AssistReading, DecodeError> {
        let reading = parse_assist(frame)?;
        self.state.assist = Some(reading.clone());
        Ok(reading)
    }

    /// Decodes an EBM frame into the EBM slot.
    pub fn handle_ebm(&mut self, frame: &[u8]) -> Result<EbmReading, DecodeError> {
        let reading = parse_ebm(frame)?;
        self.state.ebm = Some(reading);
        Ok(reading)
    }

    /// Decodes a VIN frame; a valid VIN becomes sticky.
    pub fn handle_vin(&mut self, frame: &[u8]) -> Result<&str, DecodeError> {
        let vin = parse_vin(frame)?;
        if self.vin.as_deref() != Some(vin.as_str()) {
            tracing::info!("parsed VIN/serial number: {vin}");
        }
        Ok(self.vin.insert(vin).as_str())
    }

    /// Decodes a protocol version frame; a valid version becomes sticky.
    pub fn handle_protocol_version(&mut self, frame: &[u8]) -> Result<&str, DecodeError> {
        let version = match parse_protocol_version(frame) {
            Ok(version) => version,
            Err(e @ DecodeError::DeviceError { .. }) => {
                tracing::warn!("protocol version request returned error");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        if self.protocol_version.as_deref() != Some(version.as_str()) {
            tracing::info!("parsed protocol version: {version}");
        }
        Ok(self.protocol_version.insert(version).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EBM_MESSAGE: &str = "246a245a230056af68000bef6f00002340";
    const MOTOR_MESSAGE: &str = "246d245a230117000000000000004f642340";
    const BATTERY_MESSAGE: &str = "2462245a230193541700000877071a27342340";
    const ASSIST_MESSAGE: &str = "246d2441233033312340";

    fn frame(hex_frame: &str) -> Vec<u8> {
        hex::decode(hex_frame).unwrap()
    }

    #[test]
    fn test_missing_field_is_malformed() {
        assert_eq!(
            field::<u8>(MessageKind::Motor, None),
            Err(DecodeError::Malformed {
                kind: MessageKind::Motor
            })
        );
        assert_eq!(field(MessageKind::Motor, read_u8(&[7], 0)), Ok(7));
    }

    /// Battery frame with the given combined number/cycles field.
    fn battery_frame(combined: u16) -> Vec<u8> {
        let mut data = frame(BATTERY_MESSAGE);
        data[15..17].copy_from_slice(&combined.to_be_bytes());
        data
    }

    #[test]
    fn test_parse_ebm() {
        let ebm = parse_ebm(&frame(EBM_MESSAGE)).unwrap();
        // 0x0056af68 = 5681000
        assert!((ebm.odometry_km - 568.1).abs() < 0.01);
        // 0x000bef6f = 782191
        assert!((ebm.autonomy_km - 78.2).abs() < 0.1);
        assert!(!ebm.light_on);
        assert_eq!(ebm.status, 0);
    }

    #[test]
    fn test_parse_ebm_light_on() {
        let mut data = frame(EBM_MESSAGE);
        data[13] = 1;
        data[14] = 0x42;
        let ebm = parse_ebm(&data).unwrap();
        assert!(ebm.light_on);
        assert_eq!(ebm.status, 0x42);

        data[13] = 2;
        assert!(!parse_ebm(&data).unwrap().light_on);
    }

    #[test]
    fn test_parse_motor() {
        let motor = parse_motor(&frame(MOTOR_MESSAGE)).unwrap();
        assert_eq!(motor.assist_level, 1);
        assert_eq!(motor.temperature_celsius, 23);
        assert!(motor.power_amp.abs() < f32::EPSILON);
        assert!(motor.speed_kmh.abs() < f32::EPSILON);
        assert_eq!(motor.wheel_speed_rpm, 0);
        assert_eq!(motor.max_torque_pct, 0);
    }

    #[test]
    fn test_parse_motor_fields() {
        let mut data = frame(MOTOR_MESSAGE);
        data[7..9].copy_from_slice(&125u16.to_be_bytes());
        data[9..11].copy_from_slice(&253u16.to_be_bytes());
        data[11] = 88;
        data[12] = 45;
        data[13..15].copy_from_slice(&200u16.to_be_bytes());
        data[15] = 90;

        let motor = parse_motor(&data).unwrap();
        assert!((motor.power_amp - 12.5).abs() < 0.001);
        assert!((motor.speed_kmh - 25.3).abs() < 0.001);
        assert_eq!(motor.wheel_speed_rpm, 88);
        assert_eq!(motor.torque_pct, 45);
        assert!((motor.power_max_amp - 20.0).abs() < 0.001);
        assert_eq!(motor.max_torque_pct, 90);
    }

    #[test]
    fn test_parse_battery() {
        let packet = parse_battery(&frame(BATTERY_MESSAGE)).unwrap();
        let battery = packet.reading;
        assert_eq!(packet.battery_number, 1);
        assert!((battery.voltage - 40.3).abs() < 0.01);
        assert_eq!(battery.soc, 84);
        assert_eq!(battery.temperature, 23);
        assert!(battery.current.abs() < f32::EPSILON);
        assert!((battery.nominal_capacity - 216.7).abs() < 0.01);
        assert!((battery.remaining_wh - 181.8).abs() < 0.01);
        // 0x2734 = 10036
        assert_eq!(battery.cycles, Some(36));
    }

    #[test]
    fn test_parse_battery_without_extended_field() {
        let data = frame(BATTERY_MESSAGE);
        let packet = parse_battery(&data[..17]).unwrap();
        assert_eq!(packet.battery_number, 1);
        assert_eq!(packet.reading.cycles, None);

        let packet = parse_battery(&data[..18]).unwrap();
        assert_eq!(packet.reading.cycles, None);
    }

    #[test]
    fn test_parse_too_short() {
        let data = frame(BATTERY_MESSAGE);
        assert_eq!(
            parse_battery(&data[..16]),
            Err(DecodeError::TooShort {
                kind: MessageKind::Battery,
                need: 17,
                got: 16
            })
        );
        assert!(parse_motor(&frame(MOTOR_MESSAGE)[..17]).is_err());
        assert!(parse_ebm(&frame(EBM_MESSAGE)[..16]).is_err());
    }

    #[test]
    fn test_parse_assist_levels() {
        let assist = parse_assist(&frame(ASSIST_MESSAGE)).unwrap();
        assert_eq!(
            assist,
            AssistReading::Levels {
                min: 0,
                max: 3,
                current: 1
            }
        );
    }

    #[test]
    fn test_parse_assist_uses_digit_value() {
        // '5' is 0x35; the level must be 5, not 53
        let assist = parse_assist(b"$m$A#055#@").unwrap();
        assert_eq!(assist.current_level(), Some(5));
        assert_eq!(
            parse_assist(b"$m$A#0x1#@"),
            Err(DecodeError::InvalidDigit { byte: b'x' })
        );
    }

    #[test]
    fn test_parse_assist_sync() {
        assert_eq!(
            parse_assist(b"$m$A#OK#@").unwrap(),
            AssistReading::Sync {
                sync_result: "OK".into(),
                success: true
            }
        );
        assert_eq!(
            parse_assist(b"$m$A#KO#@").unwrap(),
            AssistReading::Sync {
                sync_result: "KO".into(),
                success: false
            }
        );
    }

    #[test]
    fn test_parse_assist_other_length() {
        assert_eq!(
            parse_assist(b"$m$A#0312#@"),
            Err(DecodeError::UnexpectedLength {
                kind: MessageKind::Assist,
                got: 11
            })
        );
    }

    #[test]
    fn test_parse_vin() {
        assert_eq!(
            parse_vin(b"$s$V#SB000000002207203#@").unwrap(),
            "SB000000002207203"
        );
        assert_eq!(
            parse_vin(b"R0AB123456789012345@").unwrap(),
            "AB123456789012345"
        );
        assert!(parse_vin(b"$s$V#SHORT#@").is_err());
        assert!(parse_vin(b"$s$V#@").is_err());
        assert!(parse_vin(b"R0AB12345678901234@").is_err());
        assert!(parse_vin(b"R1AB123456789012345@").is_err());
    }

    #[test]
    fn test_parse_protocol_version() {
        assert_eq!(parse_protocol_version(b"$s$P#1.02#@").unwrap(), "1.02");
        assert_eq!(parse_protocol_version(b"$s$P#3.00#@").unwrap(), "3.00");
        assert_eq!(
            parse_protocol_version(b"$s$P#ER#@"),
            Err(DecodeError::DeviceError {
                kind: MessageKind::Protocol
            })
        );
        assert!(parse_protocol_version(b"$s$P##@").is_err());
        assert!(parse_protocol_version(b"$s$P#1.02").is_err());
    }

    #[test]
    fn test_handle_routes_to_own_slot_only() {
        let cases = [
            (EBM_MESSAGE, MessageKind::Ebm),
            (MOTOR_MESSAGE, MessageKind::Motor),
            (BATTERY_MESSAGE, MessageKind::Battery),
            (ASSIST_MESSAGE, MessageKind::Assist),
        ];
        for (hex_frame, expected) in cases {
            let mut parser = BikeDataParser::new();
            assert_eq!(parser.handle(&frame(hex_frame)), expected);
            let state = parser.state();
            for kind in [
                MessageKind::Ebm,
                MessageKind::Motor,
                MessageKind::Battery,
                MessageKind::Assist,
            ] {
                assert_eq!(state.has_slot(kind), kind == expected, "{expected} -> {kind}");
            }
        }
    }

    #[test]
    fn test_handle_battery_primary() {
        let mut parser = BikeDataParser::new();
        assert_eq!(parser.handle(&frame(BATTERY_MESSAGE)), MessageKind::Battery);

        let primary = parser.state().battery_primary.unwrap();
        assert_eq!(primary.cycles, Some(36));
        assert_eq!(parser.state().battery_secondary, None);
        assert_eq!(parser.battery_packet_counter(), 1);
    }

    #[test]
    fn test_secondary_zeroed_after_four_primary_frames() {
        let mut parser = BikeDataParser::new();
        let secondary = battery_frame(20_012);
        let primary = battery_frame(10_036);

        parser.handle(&secondary);
        assert_eq!(
            parser.state().battery_secondary.unwrap().cycles,
            Some(12)
        );

        for _ in 0..3 {
            parser.handle(&primary);
        }
        assert_eq!(
            parser.state().battery_secondary.unwrap().cycles,
            Some(12)
        );

        parser.handle(&primary);
        assert_eq!(
            parser.state().battery_secondary,
            Some(BatteryReading::zeroed())
        );

        parser.handle(&primary);
        assert_eq!(parser.battery_packet_counter(), 5);
        assert_eq!(
            parser.state().battery_secondary,
            Some(BatteryReading::zeroed())
        );
    }

    #[test]
    fn test_secondary_frame_resets_counter() {
        let mut parser = BikeDataParser::new();
        let primary = battery_frame(10_036);

        for _ in 0..3 {
            parser.handle(&primary);
        }
        parser.handle(&battery_frame(20_001));
        assert_eq!(parser.battery_packet_counter(), 0);

        for _ in 0..3 {
            parser.handle(&primary);
        }
        assert_eq!(
            parser.state().battery_secondary.unwrap().cycles,
            Some(1)
        );
    }

    #[test]
    fn test_unexpected_battery_number_updates_no_slot() {
        let mut parser = BikeDataParser::new();
        let packet = parser.handle_battery(&battery_frame(30_005)).unwrap();
        assert_eq!(packet.battery_number, 3);
        assert!(parser.state().is_empty());
        assert_eq!(parser.battery_packet_counter(), 0);
    }

    #[test]
    fn test_vin_is_sticky() {
        let mut parser = BikeDataParser::new();
        assert_eq!(
            parser.handle(b"$s$V#SB000000002207203#@"),
            MessageKind::Vin
        );
        assert_eq!(parser.vin(), Some("SB000000002207203"));

        assert_eq!(parser.handle(b"$s$V#BROKEN#@"), MessageKind::Vin);
        assert_eq!(parser.handle(b"R0short@"), MessageKind::Vin);
        assert_eq!(parser.vin(), Some("SB000000002207203"));
        assert!(parser.state().is_empty());
    }

    #[test]
    fn test_protocol_version_is_sticky() {
        let mut parser = BikeDataParser::new();
        assert_eq!(parser.handle(b"$s$P#ER#@"), MessageKind::Protocol);
        assert_eq!(parser.protocol_version(), None);

        parser.handle(b"$s$P#1.02#@");
        assert_eq!(parser.protocol_version(), Some("1.02"));

        parser.handle(b"$s$P#ER#@");
        parser.handle(b"$s$P##@");
        assert_eq!(parser.protocol_version(), Some("1.02"));
    }

    #[test]
    fn test_malformed_frames_leave_state_unchanged() {
        let mut parser = BikeDataParser::new();
        parser.handle(&frame(MOTOR_MESSAGE));
        let before = parser.state().clone();

        assert_eq!(parser.handle(b"$m$Z#01#@"), MessageKind::Motor);
        assert_eq!(parser.handle(b"$b$Z#@"), MessageKind::Battery);
        assert_eq!(parser.handle(b"$j$Z#@"), MessageKind::Ebm);
        assert_eq!(parser.handle(b"$m$A#@"), MessageKind::Assist);
        assert_eq!(parser.handle(&[0xde, 0xad, 0xbe, 0xef]), MessageKind::Unknown);
        assert_eq!(parser.handle(b"$d$I#@"), MessageKind::DiagnosisInit);
        assert_eq!(parser.state(), &before);
    }
}
