//! Transport layer for iWoc communication.
//!
//! The BLE radio stack is a supplied capability: a [`Transport`] opens a
//! [`Session`] to a device address, and the session exposes the GATT
//! primitives the client needs. Enable the `bluest` feature for an
//! implementation backed by the platform Bluetooth stack.

#[cfg(feature = "bluest")]
pub mod bluest;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Trait for transport implementations.
pub trait Transport: Send + Sync {
    /// The session type produced by [`Transport::open`].
    type Session: Session + 'static;

    /// Opens a session to the device at `address`.
    fn open<'a>(&'a self, address: &'a str) -> TransportFuture<'a, Self::Session>;

    /// Returns the last known signal strength for `address`, if any.
    fn rssi(&self, _address: &str) -> Option<i16> {
        None
    }
}

/// An open connection to one device.
pub trait Session: Send + Sync {
    /// Writes `data` to a characteristic.
    fn write<'a>(&'a mut self, characteristic: &'a str, data: Bytes) -> TransportFuture<'a, ()>;

    /// Starts notifications on a characteristic; every notification payload
    /// is sent to `frames`.
    fn subscribe<'a>(
        &'a mut self,
        characteristic: &'a str,
        frames: mpsc::Sender<Bytes>,
    ) -> TransportFuture<'a, ()>;

    /// Stops notifications on a characteristic.
    fn unsubscribe<'a>(&'a mut self, characteristic: &'a str) -> TransportFuture<'a, ()>;

    /// Closes the session.
    fn close(&mut self) -> TransportFuture<'_, ()>;

    /// Returns true while the underlying link is up.
    fn is_live(&self) -> bool;
}
