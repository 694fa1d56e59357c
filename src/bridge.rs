//! Notification bridge between a transport session and the parser.
//!
//! The session pushes raw frames into a bounded channel. A single task
//! drains it, so frames reach the parser one at a time and in arrival order.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::diagnostics::MessageLog;
use crate::event::{Event, EventDispatcher};
use crate::protocol::{BikeDataParser, MessageKind};

/// Feeds inbound frames to the shared parser and publishes the results.
#[derive(Clone)]
pub(crate) struct NotificationBridge {
    parser: Arc<Mutex<BikeDataParser>>,
    dispatcher: EventDispatcher,
    message_log: Option<MessageLog>,
}

impl NotificationBridge {
    pub(crate) const fn new(
        parser: Arc<Mutex<BikeDataParser>>,
        dispatcher: EventDispatcher,
        message_log: Option<MessageLog>,
    ) -> Self {
        Self {
            parser,
            dispatcher,
            message_log,
        }
    }

    /// Spawns the task draining `frames`. It ends when every sender is gone.
    pub(crate) fn spawn(self, mut frames: mpsc::Receiver<Bytes>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                self.process(frame).await;
            }
            tracing::debug!("notification stream closed");
        })
    }

    /// Decodes one frame and dispatches the resulting events.
    pub(crate) async fn process(&self, frame: Bytes) -> MessageKind {
        let (kind, state, identified) = {
            let mut parser = self.parser.lock().await;
            let vin_before = parser.vin().map(str::to_owned);
            let version_before = parser.protocol_version().map(str::to_owned);

            let kind = parser.handle(&frame);

            let vin = parser.vin().map(str::to_owned);
            let protocol_version = parser.protocol_version().map(str::to_owned);
            let identified = (vin != vin_before || protocol_version != version_before)
                .then_some(Event::Identified {
                    vin,
                    protocol_version,
                });
            (kind, parser.state().clone(), identified)
        };

        tracing::trace!("BLE notification [{kind}]: {}", hex::encode(&frame));

        if let Some(log) = &self.message_log {
            log.record(kind, frame.clone());
        }

        self.dispatcher
            .dispatch(Event::FrameReceived { kind, data: frame });
        if let Some(event) = identified {
            self.dispatcher.dispatch(event);
        }
        self.dispatcher.dispatch(Event::StateUpdated(Box::new(state)));

        kind
    }
}
