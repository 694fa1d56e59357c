//! The aggregated bike state.

use crate::protocol::MessageKind;
use crate::types::{AssistReading, BatteryReading, EbmReading, MotorReading};

/// Latest known readings, one slot per message family.
///
/// Slots are independent: decoding a motor frame never touches the battery
/// or EBM slots. There is no history, only the most recent value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BikeState {
    /// Primary battery.
    pub battery_primary: Option<BatteryReading>,
    /// Secondary battery (range extender). Zeroed once the bike keeps
    /// reporting only the primary battery.
    pub battery_secondary: Option<BatteryReading>,
    /// Motor.
    pub motor: Option<MotorReading>,
    /// Assist levels or last sync result.
    pub assist: Option<AssistReading>,
    /// Odometry, range, light and status.
    pub ebm: Option<EbmReading>,
    /// Signal strength in dBm, attached by the client from the transport.
    pub rssi: Option<i16>,
}

impl BikeState {
    /// Returns true if no telemetry slot has been filled yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.battery_primary.is_none()
            && self.battery_secondary.is_none()
            && self.motor.is_none()
            && self.assist.is_none()
            && self.ebm.is_none()
    }

    /// Returns true if the slot owned by `kind` holds a value.
    ///
    /// Battery frames own both battery slots. Kinds without a slot always
    /// return false.
    #[must_use]
    pub const fn has_slot(&self, kind: MessageKind) -> bool {
        match kind {
            MessageKind::Battery => {
                self.battery_primary.is_some() || self.battery_secondary.is_some()
            }
            MessageKind::Motor => self.motor.is_some(),
            MessageKind::Assist => self.assist.is_some(),
            MessageKind::Ebm => self.ebm.is_some(),
            _ => false,
        }
    }
}
