//! E-bike management telemetry: odometry, range, light and status.

/// Divisor converting raw EBM distances to kilometres.
pub const EBM_DISTANCE_SCALE: f64 = 10_000.0;

/// A single EBM reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EbmReading {
    /// Total distance in kilometres.
    pub odometry_km: f64,
    /// Estimated remaining range in kilometres.
    pub autonomy_km: f64,
    /// Whether the light is on.
    pub light_on: bool,
    /// Status byte, as reported.
    pub status: u8,
}
