//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default interval between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Pause between the VIN request and the protocol version request.
pub const DEFAULT_STARTUP_FRAME_GAP: Duration = Duration::from_millis(200);

/// Time given to the close frame to leave the radio before unsubscribing.
pub const DEFAULT_CLOSE_FRAME_WAIT: Duration = Duration::from_millis(500);

/// Time the adapter needs to release a connection slot after a disconnect.
pub const DEFAULT_SLOT_COOLDOWN: Duration = Duration::from_secs(3);

/// Default capacity of the inbound frame channel.
pub const DEFAULT_FRAME_BUFFER: usize = 256;

/// Configuration for a bike client.
#[derive(Debug, Clone)]
pub struct BikeConfig {
    /// Device address passed to [`Transport::open`](crate::transport::Transport::open).
    pub address: String,
    /// Human-readable device name, used for the message log file name.
    pub device_name: String,
    /// Interval between poll ticks when using [`MySmartBike::spawn_poller`](crate::MySmartBike::spawn_poller).
    pub poll_interval: Duration,
    /// Pause between the two startup request frames.
    pub startup_frame_gap: Duration,
    /// Wait after writing the close frame.
    pub close_frame_wait: Duration,
    /// Wait after a teardown before the next connect attempt.
    pub slot_cooldown: Duration,
    /// Inbound frame channel capacity.
    pub frame_buffer: usize,
    /// Directory for the raw BLE message log; `None` disables it.
    pub message_log_dir: Option<PathBuf>,
}

impl BikeConfig {
    /// Creates a new configuration with default timings.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            device_name: String::from("unknown_device"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            startup_frame_gap: DEFAULT_STARTUP_FRAME_GAP,
            close_frame_wait: DEFAULT_CLOSE_FRAME_WAIT,
            slot_cooldown: DEFAULT_SLOT_COOLDOWN,
            frame_buffer: DEFAULT_FRAME_BUFFER,
            message_log_dir: None,
        }
    }

    /// Sets the device name.
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the pause between startup frames.
    #[must_use]
    pub const fn startup_frame_gap(mut self, gap: Duration) -> Self {
        self.startup_frame_gap = gap;
        self
    }

    /// Sets the wait after the close frame.
    #[must_use]
    pub const fn close_frame_wait(mut self, wait: Duration) -> Self {
        self.close_frame_wait = wait;
        self
    }

    /// Sets the connection slot cooldown.
    #[must_use]
    pub const fn slot_cooldown(mut self, cooldown: Duration) -> Self {
        self.slot_cooldown = cooldown;
        self
    }

    /// Sets the inbound frame channel capacity.
    #[must_use]
    pub const fn frame_buffer(mut self, capacity: usize) -> Self {
        self.frame_buffer = capacity;
        self
    }

    /// Enables the raw BLE message log in `dir`.
    #[must_use]
    pub fn message_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.message_log_dir = Some(dir.into());
        self
    }
}
