//! Message kinds and frame classification.
//!
//! The iWoc controller uses two framing families:
//!
//! ```text
//! delimited:   '$' main '$' sub '#' payload... '#' '@'
//! terminal-@:  tag payload... '@'
//! ```
//!
//! For the delimited family the main type sits at byte 1 and the sub type at
//! byte 3. For the terminal family only the first byte is significant.

use std::fmt;

/// Frame start marker of the delimited family.
pub const FRAME_START: u8 = b'$';

/// Frame end marker of the delimited family.
pub const FRAME_END: &[u8] = b"#@";

/// Frame end marker of the terminal family.
pub const TERMINAL_END: u8 = b'@';

/// The classified category of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Battery telemetry.
    Battery,
    /// Motor telemetry.
    Motor,
    /// Assist levels or assist sync result.
    Assist,
    /// E-bike management: odometry, range, light, status.
    Ebm,
    /// VIN / serial number.
    Vin,
    /// Protocol version.
    Protocol,
    /// Diagnosis session start.
    DiagnosisInit,
    /// Diagnosis read.
    DiagnosisRead,
    /// Diagnosis session end.
    DiagnosisEnd,
    /// Security session.
    SecuritySession,
    /// Device coding.
    CodingDevice,
    /// VIN write acknowledgement.
    WriteVin,
    /// Device status.
    Status,
    /// Engine maps.
    EngineMaps,
    /// Trip reset.
    ResetTrip,
    /// Calibration.
    Calibrate,
    /// Security challenge.
    SecurityChallenge,
    /// Anything not recognised.
    Unknown,
}

impl MessageKind {
    /// Classifies a raw frame.
    ///
    /// Payload bytes of binary frames may look like text, so this only looks
    /// at delimiters and marker positions and never rejects non-ASCII input.
    #[must_use]
    pub fn classify(frame: &[u8]) -> Self {
        match frame {
            [FRAME_START, ..] if frame.ends_with(FRAME_END) => {
                Self::from_markers(frame[1], frame.get(3).copied())
            }
            [FRAME_START, ..] => Self::Unknown,
            [tag, .., TERMINAL_END] => Self::from_terminal_tag(*tag),
            _ => Self::Unknown,
        }
    }

    /// Maps delimited-family (main, sub) markers to a kind.
    #[must_use]
    pub const fn from_markers(main: u8, sub: Option<u8>) -> Self {
        match (main, sub) {
            (b'b', _) => Self::Battery,
            (b'd', Some(b'I')) => Self::DiagnosisInit,
            (b'd', Some(b'R')) => Self::DiagnosisRead,
            (b'd', Some(b'E')) => Self::DiagnosisEnd,
            (b'd', Some(b'Z')) => Self::SecuritySession,
            (b'd', Some(b'C')) => Self::CodingDevice,
            (b'd', Some(b'V')) => Self::WriteVin,
            (b'd', Some(b'T')) => Self::Status,
            (b'j', Some(b'Z')) => Self::Ebm,
            (b'm', Some(b'A')) => Self::Assist,
            (b'm', Some(b'Z')) => Self::Motor,
            (b'm' | b'M', Some(b'M')) => Self::EngineMaps,
            (b'm', Some(b'R')) => Self::ResetTrip,
            (b's', Some(b'V')) => Self::Vin,
            (b's', Some(b'P')) => Self::Protocol,
            (b'i', Some(b'C')) => Self::Calibrate,
            _ => Self::Unknown,
        }
    }

    /// Maps a terminal-family leading byte to a kind.
    #[must_use]
    pub const fn from_terminal_tag(tag: u8) -> Self {
        match tag {
            b'T' => Self::Status,
            b'C' => Self::CodingDevice,
            b'R' => Self::Vin,
            b'Z' => Self::SecurityChallenge,
            _ => Self::Unknown,
        }
    }

    /// Returns the snake-case name used in logs and the message log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Motor => "motor",
            Self::Assist => "assist",
            Self::Ebm => "ebm",
            Self::Vin => "vin",
            Self::Protocol => "protocol",
            Self::DiagnosisInit => "diagnosis_init",
            Self::DiagnosisRead => "diagnosis_read",
            Self::DiagnosisEnd => "diagnosis_end",
            Self::SecuritySession => "security_session",
            Self::CodingDevice => "coding_device",
            Self::WriteVin => "write_vin",
            Self::Status => "status",
            Self::EngineMaps => "engine_maps",
            Self::ResetTrip => "reset_trip",
            Self::Calibrate => "calibrate",
            Self::SecurityChallenge => "security_challenge",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for kinds that are recognised but carry no decoded fields.
    #[must_use]
    pub const fn is_administrative(&self) -> bool {
        !matches!(
            self,
            Self::Battery
                | Self::Motor
                | Self::Assist
                | Self::Ebm
                | Self::Vin
                | Self::Protocol
                | Self::Unknown
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(hex_frame: &str) -> MessageKind {
        MessageKind::classify(&hex::decode(hex_frame).unwrap())
    }

    #[test]
    fn test_classify_telemetry() {
        assert_eq!(kind("246a245a230056af68000bef6f00002340"), MessageKind::Ebm);
        assert_eq!(kind("246d245a230117000000000000004f642340"), MessageKind::Motor);
        assert_eq!(
            kind("2462245a230193541700000877071a27342340"),
            MessageKind::Battery
        );
        assert_eq!(kind("246d2441233033312340"), MessageKind::Assist);
    }

    #[test]
    fn test_classify_identification() {
        assert_eq!(
            MessageKind::classify(b"$s$V#SB000000002207203#@"),
            MessageKind::Vin
        );
        assert_eq!(MessageKind::classify(b"$s$P#1.02#@"), MessageKind::Protocol);
        assert_eq!(
            MessageKind::classify(b"R0AB123456789012345@"),
            MessageKind::Vin
        );
    }

    #[test]
    fn test_classify_administrative() {
        let cases: [(&[u8], MessageKind); 13] = [
            (b"$d$I#@", MessageKind::DiagnosisInit),
            (b"$d$R#01#@", MessageKind::DiagnosisRead),
            (b"$d$E#@", MessageKind::DiagnosisEnd),
            (b"$d$Z#@", MessageKind::SecuritySession),
            (b"$d$C#@", MessageKind::CodingDevice),
            (b"$d$V#@", MessageKind::WriteVin),
            (b"$d$T#@", MessageKind::Status),
            (b"$m$M#@", MessageKind::EngineMaps),
            (b"$M$M#@", MessageKind::EngineMaps),
            (b"$m$R#@", MessageKind::ResetTrip),
            (b"$i$C#@", MessageKind::Calibrate),
            (b"T01@", MessageKind::Status),
            (b"Z1234@", MessageKind::SecurityChallenge),
        ];
        for (frame, expected) in cases {
            assert_eq!(MessageKind::classify(frame), expected, "{frame:?}");
            assert!(expected.is_administrative());
        }
        assert_eq!(MessageKind::classify(b"C9@"), MessageKind::CodingDevice);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(MessageKind::classify(b""), MessageKind::Unknown);
        assert_eq!(MessageKind::classify(b"$x$Q#@"), MessageKind::Unknown);
        assert_eq!(MessageKind::classify(b"$j$A#@"), MessageKind::Unknown);
        // delimited start but wrong terminator
        assert_eq!(MessageKind::classify(b"$b$Z#00"), MessageKind::Unknown);
        assert_eq!(MessageKind::classify(b"$s$V#@@"), MessageKind::Unknown);
        assert_eq!(MessageKind::classify(b"X123@"), MessageKind::Unknown);
        assert_eq!(MessageKind::classify(b"hello"), MessageKind::Unknown);
    }

    #[test]
    fn test_classify_tolerates_non_ascii() {
        assert_eq!(
            MessageKind::classify(&[b'$', b'b', 0xff, 0xfe, b'#', b'@']),
            MessageKind::Battery
        );
        assert_eq!(
            MessageKind::classify(&[b'$', b'm', b'$', b'Z', 0x80, 0x90, b'#', b'@']),
            MessageKind::Motor
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(MessageKind::SecurityChallenge.to_string(), "security_challenge");
        assert_eq!(MessageKind::Ebm.to_string(), "ebm");
        assert_eq!(format!("{:8}|", MessageKind::Ebm), "ebm     |");
    }
}
