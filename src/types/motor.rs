//! Motor telemetry.

/// A single motor reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotorReading {
    /// Current assist level, as reported.
    pub assist_level: u8,
    /// Motor temperature in degrees Celsius.
    pub temperature_celsius: u8,
    /// Power draw in amps.
    pub power_amp: f32,
    /// Speed in km/h.
    pub speed_kmh: f32,
    /// Wheel speed in rpm.
    pub wheel_speed_rpm: u8,
    /// Motor torque in percent.
    pub torque_pct: u8,
    /// Maximum power in amps.
    pub power_max_amp: f32,
    /// Maximum motor torque in percent.
    pub max_torque_pct: u8,
}
