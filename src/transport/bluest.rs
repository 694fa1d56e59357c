//! BLE transport backed by the platform Bluetooth stack via `bluest`.
//!
//! The device is found by scanning: an advertisement matches when its local
//! name equals the configured address, or when the platform device id
//! contains it (MAC address on Linux and Windows, UUID on macOS).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ::bluest::error::ErrorKind;
use ::bluest::{Adapter, AdvertisingDevice, Characteristic, Device, Uuid};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{Session, Transport, TransportFuture};
use crate::error::TransportError;

/// Default time to scan for the device before giving up.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

fn map_error(error: &::bluest::Error) -> TransportError {
    match error.kind() {
        ErrorKind::NotFound | ErrorKind::NotConnected | ErrorKind::Timeout => {
            TransportError::Unreachable(error.to_string())
        }
        _ => TransportError::Failed(error.to_string()),
    }
}

fn parse_uuid(characteristic: &str) -> Result<Uuid, TransportError> {
    Uuid::parse_str(characteristic).map_err(|e| {
        TransportError::Failed(format!("invalid characteristic {characteristic}: {e}"))
    })
}

/// Opens sessions through the default Bluetooth adapter.
pub struct BluestTransport {
    adapter: Adapter,
    scan_timeout: Duration,
    rssi: Mutex<HashMap<String, i16>>,
}

impl BluestTransport {
    /// Acquires the default adapter and waits until it is powered on.
    ///
    /// # Errors
    ///
    /// Returns an error if no adapter is present or it never becomes available.
    pub async fn new() -> Result<Self, TransportError> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| TransportError::Failed("default adapter not found".into()))?;
        adapter.wait_available().await.map_err(|e| map_error(&e))?;
        Ok(Self {
            adapter,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            rssi: Mutex::new(HashMap::new()),
        })
    }

    /// Sets how long a connect attempt scans for the device.
    #[must_use]
    pub const fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    fn record_rssi(&self, address: &str, rssi: Option<i16>) {
        if let (Some(rssi), Ok(mut map)) = (rssi, self.rssi.lock()) {
            map.insert(address.to_owned(), rssi);
        }
    }

    async fn discover(&self, address: &str) -> Result<AdvertisingDevice, TransportError> {
        let mut advertisements = self.adapter.scan(&[]).await.map_err(|e| map_error(&e))?;
        while let Some(advertisement) = advertisements.next().await {
            let name_matches = advertisement.adv_data.local_name.as_deref() == Some(address);
            let id_matches = format!("{:?}", advertisement.device.id()).contains(address);
            if name_matches || id_matches {
                self.record_rssi(address, advertisement.rssi);
                return Ok(advertisement);
            }
        }
        Err(TransportError::Unreachable(format!("{address} not found")))
    }
}

impl Transport for BluestTransport {
    type Session = BluestSession;

    fn open<'a>(&'a self, address: &'a str) -> TransportFuture<'a, Self::Session> {
        Box::pin(async move {
            let found = tokio::time::timeout(self.scan_timeout, self.discover(address))
                .await
                .map_err(|_| TransportError::Unreachable(format!("{address} not found")))??;
            let device = found.device;

            tracing::debug!("connecting to {address}");
            self.adapter
                .connect_device(&device)
                .await
                .map_err(|e| map_error(&e))?;

            let mut characteristics = Vec::new();
            for service in device.discover_services().await.map_err(|e| map_error(&e))? {
                let found = service
                    .discover_characteristics()
                    .await
                    .map_err(|e| map_error(&e))?;
                characteristics.extend(found);
            }
            tracing::debug!(
                "{address}: discovered {} characteristics",
                characteristics.len()
            );

            Ok(BluestSession {
                adapter: self.adapter.clone(),
                device,
                characteristics,
                live: Arc::new(AtomicBool::new(true)),
                forwarders: HashMap::new(),
            })
        })
    }

    fn rssi(&self, address: &str) -> Option<i16> {
        self.rssi.lock().ok()?.get(address).copied()
    }
}

/// An open GATT connection.
pub struct BluestSession {
    adapter: Adapter,
    device: Device,
    characteristics: Vec<Characteristic>,
    live: Arc<AtomicBool>,
    forwarders: HashMap<Uuid, JoinHandle<()>>,
}

impl BluestSession {
    fn characteristic(&self, characteristic: &str) -> Result<&Characteristic, TransportError> {
        let uuid = parse_uuid(characteristic)?;
        self.characteristics
            .iter()
            .find(|c| c.uuid() == uuid)
            .ok_or_else(|| TransportError::Failed(format!("characteristic {uuid} not found")))
    }
}

impl Session for BluestSession {
    fn write<'a>(&'a mut self, characteristic: &'a str, data: Bytes) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let target = self.characteristic(characteristic)?;
            target.write(&data).await.map_err(|e| map_error(&e))
        })
    }

    fn subscribe<'a>(
        &'a mut self,
        characteristic: &'a str,
        frames: mpsc::Sender<Bytes>,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let target = self.characteristic(characteristic)?.clone();
            let uuid = target.uuid();
            let live = Arc::clone(&self.live);
            let (ready_tx, ready_rx) = oneshot::channel();

            let task = tokio::spawn(async move {
                let mut notifications = match target.notify().await {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(map_error(&e)));
                        return;
                    }
                };
                while let Some(item) = notifications.next().await {
                    match item {
                        Ok(payload) => {
                            if frames.send(Bytes::from(payload)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::debug!("notification error on {uuid}: {e}");
                            break;
                        }
                    }
                }
                live.store(false, Ordering::Release);
            });

            match ready_rx.await {
                Ok(Ok(())) => {
                    if let Some(old) = self.forwarders.insert(uuid, task) {
                        old.abort();
                    }
                    Ok(())
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(TransportError::Failed(
                    "notification task ended before subscribing".into(),
                )),
            }
        })
    }

    fn unsubscribe<'a>(&'a mut self, characteristic: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let uuid = parse_uuid(characteristic)?;
            if let Some(task) = self.forwarders.remove(&uuid) {
                task.abort();
            }
            Ok(())
        })
    }

    fn close(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            for (_, task) in self.forwarders.drain() {
                task.abort();
            }
            self.live.store(false, Ordering::Release);
            self.adapter
                .disconnect_device(&self.device)
                .await
                .map_err(|e| map_error(&e))
        })
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for BluestSession {
    fn drop(&mut self) {
        for (_, task) in self.forwarders.drain() {
            task.abort();
        }
    }
}
