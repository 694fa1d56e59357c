//! Big-endian field readers for iWoc frames.
//!
//! All multi-byte fields on the wire are big-endian. Readers return `None`
//! when the requested span runs past the end of the frame instead of
//! panicking, so decoders can treat a short frame as malformed.

/// Reads an unsigned byte at `offset`.
#[must_use]
pub fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

/// Reads a big-endian 16-bit value at `offset`.
#[must_use]
pub fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Reads a big-endian 24-bit value at `offset`.
#[must_use]
pub fn read_u24(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(3)?)?;
    Some(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
}

/// Reads a big-endian 32-bit value at `offset`.
#[must_use]
pub fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Scales a raw tenths value (e.g. decivolts) to a float.
#[must_use]
pub fn tenths(raw: u16) -> f32 {
    f32::from(raw) / 10.0
}
