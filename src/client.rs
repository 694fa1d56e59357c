//! Main [`MySmartBike`] client implementation.
//!
//! The client owns the connection lifecycle of one bike: it opens a session
//! through a [`Transport`], subscribes to notifications, sends the startup
//! requests and tears the session down again. A periodic [`poll`] keeps the
//! connection alive unless the user explicitly disconnected.
//!
//! [`poll`]: MySmartBike::poll

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bridge::NotificationBridge;
use crate::config::BikeConfig;
use crate::diagnostics::MessageLog;
use crate::error::{Error, Result, TransportError};
use crate::event::{Event, EventDispatcher, Subscription};
use crate::protocol::{BikeDataParser, NOTIFY_CHARACTERISTIC, Request, WRITE_CHARACTERISTIC};
use crate::transport::{Session, Transport};
use crate::types::{BikeState, ConnectionState};

/// Capacity of the event broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// What a teardown does besides closing the session.
#[derive(Debug, Clone, Copy)]
struct Teardown {
    send_close: bool,
    wait_for_slot: bool,
}

impl Teardown {
    /// Manual disconnect: tell the bike, then give the adapter time.
    const MANUAL: Self = Self {
        send_close: true,
        wait_for_slot: true,
    };
    /// Replacing a stale session before reconnecting.
    const STALE: Self = Self {
        send_close: false,
        wait_for_slot: true,
    };
    /// Host shutdown: tell the bike, do not linger.
    const SHUTDOWN: Self = Self {
        send_close: true,
        wait_for_slot: false,
    };
    /// A half-opened session whose startup failed.
    const ABANDON: Self = Self {
        send_close: false,
        wait_for_slot: false,
    };
}

/// Who asked for a connect attempt. Decides how loudly failures are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Poll,
    Manual,
}

struct Connection<S> {
    state: ConnectionState,
    session: Option<S>,
    bridge_task: Option<JoinHandle<()>>,
    warned_unreachable: bool,
    /// Id of the newest connect attempt. Older attempts own nothing.
    attempt: u64,
}

impl<S> Connection<S> {
    /// Takes the session and stops its bridge task.
    ///
    /// `Connected` becomes `Disconnected`; other states are left alone so an
    /// in-flight attempt keeps its `Connecting` claim.
    fn take_session(&mut self) -> Option<S> {
        if let Some(task) = self.bridge_task.take() {
            task.abort();
        }
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Disconnected;
        }
        self.session.take()
    }

    /// Claims the connection for a new attempt and returns its id.
    fn begin_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.state = ConnectionState::Connecting;
        self.attempt
    }

    /// Invalidates the in-flight attempt, if any.
    fn supersede_attempt(&mut self) {
        self.attempt += 1;
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Returns true while `attempt` is the in-flight attempt.
    fn owns(&self, attempt: u64) -> bool {
        self.attempt == attempt && self.state == ConnectionState::Connecting
    }
}

/// Settles a connect attempt when it ends, including by cancellation.
struct AttemptGuard<'a, S> {
    connection: &'a Mutex<Connection<S>>,
    settled: &'a Notify,
    attempt: u64,
}

impl<S> Drop for AttemptGuard<'_, S> {
    fn drop(&mut self) {
        // only reached with the claim still held if the attempt was cancelled
        if let Ok(mut connection) = self.connection.try_lock() {
            if connection.owns(self.attempt) {
                connection.state = ConnectionState::Disconnected;
            }
        }
        self.settled.notify_waiters();
    }
}

/// Client for one iWoc-equipped bike.
pub struct MySmartBike<T: Transport> {
    config: BikeConfig,
    transport: T,
    connection: Mutex<Connection<T::Session>>,
    attempt_settled: Notify,
    parser: Arc<Mutex<BikeDataParser>>,
    dispatcher: EventDispatcher,
    message_log: Option<MessageLog>,
}

impl<T: Transport> MySmartBike<T> {
    /// Creates a new client. Nothing is opened until the first
    /// [`poll`](Self::poll) or [`connect`](Self::connect).
    ///
    /// When `config.message_log_dir` is set the message log writer task is
    /// started, so this must then be called inside a tokio runtime.
    #[must_use]
    pub fn new(transport: T, config: BikeConfig) -> Self {
        let message_log = config
            .message_log_dir
            .as_ref()
            .map(|dir| MessageLog::spawn(dir, &config.device_name));

        Self {
            config,
            transport,
            connection: Mutex::new(Connection {
                state: ConnectionState::Disconnected,
                session: None,
                bridge_task: None,
                warned_unreachable: false,
                attempt: 0,
            }),
            attempt_settled: Notify::new(),
            parser: Arc::new(Mutex::new(BikeDataParser::new())),
            dispatcher: EventDispatcher::new(EVENT_CAPACITY),
            message_log,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &BikeConfig {
        &self.config
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscribes to client events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.dispatcher.subscribe()
    }

    /// Returns the event dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Returns the current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.connection.lock().await.state
    }

    /// Returns true if a session is established.
    pub async fn is_connected(&self) -> bool {
        self.state().await.is_connected()
    }

    /// Returns false after a manual disconnect until the next manual connect.
    pub async fn connection_desired(&self) -> bool {
        self.state().await.connection_desired()
    }

    /// Returns a snapshot of the latest readings.
    pub async fn snapshot(&self) -> BikeState {
        self.parser.lock().await.state().clone()
    }

    /// Returns the VIN once the bike has reported it.
    pub async fn vin(&self) -> Option<String> {
        self.parser.lock().await.vin().map(str::to_owned)
    }

    /// Returns the protocol version once the bike has reported it.
    pub async fn protocol_version(&self) -> Option<String> {
        self.parser.lock().await.protocol_version().map(str::to_owned)
    }

    /// Manually (re)connects.
    ///
    /// Waits for any in-flight connect attempt to settle, then tears down any
    /// existing session, clears the manual-disconnect flag and attempts a
    /// connection. The flag stays cleared even if the attempt fails, so the
    /// poll tick resumes retrying.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unreachable`] if the bike is off or out of range, or
    /// [`Error::ConnectFailed`] for any other connect failure.
    pub async fn connect(&self) -> Result<()> {
        tracing::info!("user-initiated reconnect to {}", self.config.address);

        let (attempt, stale) = loop {
            let settled = self.attempt_settled.notified();
            tokio::pin!(settled);
            settled.as_mut().enable();
            {
                let mut connection = self.connection.lock().await;
                if connection.state != ConnectionState::Connecting {
                    // the claim also clears the manual-disconnect flag
                    let stale = connection.take_session();
                    break (connection.begin_attempt(), stale);
                }
            }
            tracing::debug!("waiting for the in-flight connect to {}", self.config.address);
            settled.await;
        };

        self.run_attempt(attempt, stale, Trigger::Manual).await
    }

    /// Manually disconnects and keeps the bike disconnected.
    ///
    /// The flag is set before teardown starts, so a concurrent poll tick
    /// cannot reconnect. An in-flight connect attempt is cancelled and closes
    /// its session as soon as it opens. Teardown failures are logged and
    /// swallowed.
    pub async fn disconnect(&self) {
        tracing::info!("user-initiated disconnect from {}", self.config.address);

        let session = {
            let mut connection = self.connection.lock().await;
            connection.state = ConnectionState::ManuallyDisconnected;
            connection.supersede_attempt();
            connection.take_session()
        };

        match session {
            Some(session) => self.teardown(session, Teardown::MANUAL).await,
            None => tokio::time::sleep(self.config.slot_cooldown).await,
        }

        self.dispatcher.dispatch(Event::Disconnected);
    }

    /// Runs one poll tick and returns the current state snapshot.
    ///
    /// A session whose link went down is dropped. If a connection is wanted
    /// and none is held, one connect attempt is made; its failure is not
    /// returned. Never connects after a manual disconnect.
    pub async fn poll(&self) -> BikeState {
        let (lost, should_connect) = {
            let mut connection = self.connection.lock().await;
            let lost = connection.state == ConnectionState::Connected
                && !connection.session.as_ref().is_some_and(Session::is_live);
            if lost {
                tracing::info!("connection to {} lost", self.config.address);
                connection.state = ConnectionState::Disconnected;
            }
            (lost, connection.state.allows_auto_connect())
        };

        if lost {
            self.dispatcher.dispatch(Event::Disconnected);
        }

        if should_connect {
            if let Err(e) = self.try_connect(Trigger::Poll).await {
                tracing::debug!("poll connect attempt failed: {e}");
            }
        }

        let rssi = self.transport.rssi(&self.config.address);
        let mut parser = self.parser.lock().await;
        parser.state_mut().rssi = rssi;
        parser.state().clone()
    }

    /// Tears down the session for host shutdown.
    ///
    /// Sends the close frame but skips the slot cooldown. Does not touch the
    /// manual-disconnect flag.
    pub async fn shutdown(&self) {
        tracing::debug!("shutting down client for {}", self.config.address);
        let session = {
            let mut connection = self.connection.lock().await;
            connection.supersede_attempt();
            connection.take_session()
        };
        if let Some(session) = session {
            self.teardown(session, Teardown::SHUTDOWN).await;
            self.dispatcher.dispatch(Event::Disconnected);
        }
    }

    /// Spawns a task calling [`poll`](Self::poll) every
    /// `config.poll_interval`. The first tick fires immediately.
    pub fn spawn_poller(self: &Arc<Self>) -> JoinHandle<()>
    where
        T: 'static,
    {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                client.poll().await;
            }
        })
    }

    async fn try_connect(&self, trigger: Trigger) -> Result<()> {
        let (attempt, stale) = {
            let mut connection = self.connection.lock().await;
            match connection.state {
                ConnectionState::Connecting => {
                    tracing::debug!("connect to {} already in progress", self.config.address);
                    return Ok(());
                }
                ConnectionState::ManuallyDisconnected => {
                    tracing::debug!(
                        "not connecting, {} was disconnected by the user",
                        self.config.address
                    );
                    return Ok(());
                }
                ConnectionState::Connected
                    if connection.session.as_ref().is_some_and(Session::is_live) =>
                {
                    return Ok(());
                }
                ConnectionState::Connected | ConnectionState::Disconnected => {}
            }
            let stale = connection.take_session();
            (connection.begin_attempt(), stale)
        };

        self.run_attempt(attempt, stale, trigger).await
    }

    /// Runs a claimed attempt. Only touches the connection state while the
    /// attempt still owns it.
    async fn run_attempt(
        &self,
        attempt: u64,
        stale: Option<T::Session>,
        trigger: Trigger,
    ) -> Result<()> {
        let _guard = AttemptGuard {
            connection: &self.connection,
            settled: &self.attempt_settled,
            attempt,
        };

        if let Some(session) = stale {
            tracing::debug!("discarding stale session to {}", self.config.address);
            self.teardown(session, Teardown::STALE).await;
        }

        tracing::debug!("connecting to {}", self.config.address);
        match self.open_session().await {
            Ok((session, bridge_task)) => {
                let mut connection = self.connection.lock().await;
                if !connection.owns(attempt) {
                    // disconnect() or shutdown() ran while we were connecting
                    drop(connection);
                    bridge_task.abort();
                    tracing::info!(
                        "connect to {} was cancelled while in progress",
                        self.config.address
                    );
                    self.teardown(session, Teardown::SHUTDOWN).await;
                    return Ok(());
                }
                connection.state = ConnectionState::Connected;
                connection.session = Some(session);
                connection.bridge_task = Some(bridge_task);
                connection.warned_unreachable = false;
                drop(connection);

                tracing::info!("connected to {}", self.config.address);
                self.dispatcher.dispatch(Event::Connected);
                Ok(())
            }
            Err(source) => Err(self.connect_failed(attempt, trigger, source).await),
        }
    }

    /// Records a failed attempt and maps it to the caller-facing error.
    async fn connect_failed(
        &self,
        attempt: u64,
        trigger: Trigger,
        source: TransportError,
    ) -> Error {
        let address = self.config.address.clone();
        let mut connection = self.connection.lock().await;
        if connection.owns(attempt) {
            connection.state = ConnectionState::Disconnected;
        }

        if !source.is_unreachable() {
            drop(connection);
            tracing::error!("failed to connect to {address}: {source}");
            return Error::ConnectFailed { address, source };
        }

        if trigger == Trigger::Manual || !connection.warned_unreachable {
            tracing::warn!("device {address} is not reachable - turn on the bike ({source})");
        } else {
            tracing::info!("device {address} still not reachable, will retry");
        }
        if trigger == Trigger::Poll {
            connection.warned_unreachable = true;
        }
        drop(connection);

        self.dispatcher.dispatch(Event::ConnectionPending {
            reason: source.to_string(),
        });
        Error::Unreachable { address, source }
    }

    /// Opens a session, subscribes and sends the startup requests.
    ///
    /// On failure after the session opened it is torn down before returning.
    async fn open_session(
        &self,
    ) -> std::result::Result<(T::Session, JoinHandle<()>), TransportError> {
        let mut session = self.transport.open(&self.config.address).await?;

        let (frame_tx, frame_rx) = mpsc::channel::<Bytes>(self.config.frame_buffer);
        let bridge_task = NotificationBridge::new(
            Arc::clone(&self.parser),
            self.dispatcher.clone(),
            self.message_log.clone(),
        )
        .spawn(frame_rx);

        if let Err(e) = self.start_session(&mut session, frame_tx).await {
            bridge_task.abort();
            self.teardown(session, Teardown::ABANDON).await;
            return Err(e);
        }

        Ok((session, bridge_task))
    }

    async fn start_session(
        &self,
        session: &mut T::Session,
        frames: mpsc::Sender<Bytes>,
    ) -> std::result::Result<(), TransportError> {
        session.subscribe(NOTIFY_CHARACTERISTIC, frames).await?;
        session
            .write(WRITE_CHARACTERISTIC, Request::Vin.to_bytes())
            .await?;
        tokio::time::sleep(self.config.startup_frame_gap).await;
        session
            .write(WRITE_CHARACTERISTIC, Request::ProtocolVersion.to_bytes())
            .await?;
        Ok(())
    }

    /// Releases a session. Every step is best effort; nothing here fails.
    async fn teardown(&self, mut session: T::Session, mode: Teardown) {
        if session.is_live() {
            if mode.send_close {
                match session
                    .write(WRITE_CHARACTERISTIC, Request::Close.to_bytes())
                    .await
                {
                    Ok(()) => tokio::time::sleep(self.config.close_frame_wait).await,
                    Err(e) => tracing::debug!("failed to send close frame: {e}"),
                }
            }
            if let Err(e) = session.unsubscribe(NOTIFY_CHARACTERISTIC).await {
                tracing::debug!("failed to stop notifications: {e}");
            }
            if let Err(e) = session.close().await {
                tracing::debug!("error closing session: {e}");
            }
        }
        drop(session);

        if mode.wait_for_slot {
            tokio::time::sleep(self.config.slot_cooldown).await;
        }
    }
}

impl<T: Transport> Drop for MySmartBike<T> {
    fn drop(&mut self) {
        if let Some(task) = self.connection.get_mut().bridge_task.take() {
            task.abort();
        }
    }
}
