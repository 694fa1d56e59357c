//! Data types for decoded bike telemetry.
//!
//! This module contains the readings produced by the decoder:
//! - Battery
//! - Motor and assist
//! - E-bike management (odometry, range, light)
//! - The aggregated [`BikeState`]
//! - The client's [`ConnectionState`]

pub mod assist;
pub mod battery;
pub mod connection;
pub mod ebm;
pub mod motor;
pub mod state;

pub use assist::AssistReading;
pub use battery::{BatteryPacket, BatteryReading};
pub use connection::ConnectionState;
pub use ebm::EbmReading;
pub use motor::MotorReading;
pub use state::BikeState;
