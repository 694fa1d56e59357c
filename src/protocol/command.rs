//! Request frames and GATT characteristics of the iWoc BLE interface.
//!
//! Requests are fixed six-byte frames written verbatim to the write
//! characteristic. Responses arrive as notifications on the notify
//! characteristic.

use bytes::Bytes;

/// Characteristic requests are written to.
pub const WRITE_CHARACTERISTIC: &str = "0000ffe2-0000-1000-8000-00805f9b34fb";

/// Characteristic the bike pushes frames on.
pub const NOTIFY_CHARACTERISTIC: &str = "0000ffd1-0000-1000-8000-00805f9b34fb";

/// Requests sent to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    /// `$S$V#@`: ask for the VIN / serial number.
    Vin,
    /// `$S$P#@`: ask for the protocol version.
    ProtocolVersion,
    /// `$D$I#@`: end the session before disconnecting.
    Close,
}

impl Request {
    /// Returns the wire bytes for this request.
    #[must_use]
    pub const fn as_bytes(&self) -> &'static [u8; 6] {
        match self {
            Self::Vin => &[0x24, 0x53, 0x24, 0x56, 0x23, 0x40],
            Self::ProtocolVersion => &[0x24, 0x53, 0x24, 0x50, 0x23, 0x40],
            Self::Close => &[0x24, 0x44, 0x24, 0x49, 0x23, 0x40],
        }
    }

    /// Returns the request as a `Bytes` buffer ready for a session write.
    #[must_use]
    pub fn to_bytes(self) -> Bytes {
        Bytes::from_static(self.as_bytes())
    }
}
