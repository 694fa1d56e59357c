//! Protocol definitions for iWoc communication.
//!
//! This module contains the low-level protocol pieces:
//! - Big-endian field readers
//! - Message classification
//! - Request frames and GATT characteristics
//! - Frame decoding into typed readings

pub mod command;
pub mod kind;
pub mod parser;
pub mod reader;

pub use command::{NOTIFY_CHARACTERISTIC, Request, WRITE_CHARACTERISTIC};
pub use kind::MessageKind;
pub use parser::{
    BikeDataParser, parse_assist, parse_battery, parse_ebm, parse_motor, parse_protocol_version,
    parse_vin,
};
pub use reader::{read_u8, read_u16, read_u24, read_u32};
