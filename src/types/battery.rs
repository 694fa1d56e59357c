//! Battery telemetry.

/// Divisor splitting the combined battery field into number and cycles.
///
/// The firmware packs `battery_number * 10000 + cycles` into one 16-bit
/// value, e.g. `10036` is battery 1 with 36 cycles.
pub const BATTERY_NUMBER_DIVISOR: u16 = 10_000;

/// A single battery reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryReading {
    /// Pack voltage in volts.
    pub voltage: f32,
    /// State of charge in percent.
    pub soc: u8,
    /// Temperature status byte, as reported.
    pub temperature: u8,
    /// Current in amps.
    pub current: f32,
    /// Nominal capacity in watt-hours.
    pub nominal_capacity: f32,
    /// Remaining energy in watt-hours.
    pub remaining_wh: f32,
    /// Charge cycles, if the frame carried the extended field.
    pub cycles: Option<u16>,
}

impl BatteryReading {
    /// The explicit "no secondary battery" reading: every field zero and no
    /// cycle count.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            voltage: 0.0,
            soc: 0,
            temperature: 0,
            current: 0.0,
            nominal_capacity: 0.0,
            remaining_wh: 0.0,
            cycles: None,
        }
    }
}

/// A decoded battery frame: the reading plus which battery it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryPacket {
    /// 1 for the primary battery, 2 for the secondary (range extender).
    pub battery_number: u16,
    /// The reading itself.
    pub reading: BatteryReading,
}

impl BatteryPacket {
    /// Splits the combined field into `(battery_number, cycles)`.
    ///
    /// An absent or zero field means battery 1 with unknown cycles.
    #[must_use]
    pub const fn split_combined(combined: Option<u16>) -> (u16, Option<u16>) {
        match combined {
            Some(raw) if raw != 0 => (
                raw / BATTERY_NUMBER_DIVISOR,
                Some(raw % BATTERY_NUMBER_DIVISOR),
            ),
            _ => (1, None),
        }
    }
}
