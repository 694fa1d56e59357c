//! # mysmartbike-ble
//!
//! A Rust client library for e-bikes with a Mahle iWoc controller, talking
//! to the bike over Bluetooth Low Energy.
//!
//! The bike pushes telemetry as notifications: battery, motor, assist level
//! and odometry frames. This library classifies and decodes them into a
//! [`BikeState`] snapshot and manages the connection lifecycle around a
//! user's intent to stay connected or disconnected.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Pluggable BLE backend through the [`Transport`] trait
//! - Event-driven state updates
//! - Optional raw message log for protocol debugging
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "bluest")]
//! # async fn run() -> Result<(), mysmartbike_ble::Error> {
//! use std::sync::Arc;
//!
//! use mysmartbike_ble::transport::bluest::BluestTransport;
//! use mysmartbike_ble::{BikeConfig, MySmartBike};
//!
//! let transport = BluestTransport::new().await?;
//! let bike = Arc::new(MySmartBike::new(transport, BikeConfig::new("F0:12:34:56:78:9A")));
//! let poller = bike.spawn_poller();
//!
//! let mut events = bike.subscribe();
//! while let Some(event) = events.recv().await {
//!     if let mysmartbike_ble::Event::StateUpdated(state) = event {
//!         println!("motor: {:?}", state.motor);
//!     }
//! }
//!
//! poller.abort();
//! bike.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Frame classification, decoding and request frames
//! - [`types`] - Telemetry readings and the aggregated bike state
//! - [`transport`] - BLE transport abstraction
//! - [`event`] - Async event system for state updates
//! - [`diagnostics`] - Raw BLE message log
//! - [`client`] - High-level [`MySmartBike`] client

mod bridge;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::MySmartBike;
pub use config::BikeConfig;
pub use error::{DecodeError, Error, Result, TransportError};
pub use event::{Event, EventDispatcher, EventFilter, EventType, Subscription};
pub use protocol::{BikeDataParser, MessageKind, Request};
pub use transport::{Session, Transport};
pub use types::{
    AssistReading, BatteryPacket, BatteryReading, BikeState, ConnectionState, EbmReading,
    MotorReading,
};
