// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Events emitted by a relay and the sinks that receive them.

use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// User-facing reason attached to [`InboundEvent::SendFailed`].
pub const SEND_FAILED_REASON: &str = "Couldn't send data to the other device";

/// Why a relay reached the closed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseCause {
    /// `close()` was called.
    Requested,
    /// The read loop hit an I/O error.
    ReadError(String),
    /// The remote end closed the stream.
    PeerClosed,
}

impl fmt::Display for CloseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseCause::Requested => write!(f, "closed on request"),
            CloseCause::ReadError(e) => write!(f, "read error: {}", e),
            CloseCause::PeerClosed => write!(f, "closed by remote"),
        }
    }
}

/// Events emitted by a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Bytes read from the stream. `bytes` is a private copy of the read buffer.
    DataReceived { bytes: Vec<u8>, length: usize },
    /// Bytes written to the stream by `send()`.
    DataSent { bytes: Vec<u8> },
    /// A `send()` failed. The connection is still open.
    SendFailed { reason: String },
    /// The relay closed. Always the last event.
    Closed { cause: CloseCause },
}

impl InboundEvent {
    /// Build a `DataReceived` event from the valid part of a read buffer.
    pub(crate) fn received(chunk: &[u8]) -> Self {
        InboundEvent::DataReceived {
            bytes: chunk.to_vec(),
            length: chunk.len(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::DataReceived { .. } => "data_received",
            InboundEvent::DataSent { .. } => "data_sent",
            InboundEvent::SendFailed { .. } => "send_failed",
            InboundEvent::Closed { .. } => "closed",
        }
    }
}

/// Sink for relay events.
///
/// Called from the read loop and from `send()`/`close()` while the relay's
/// state lock is held. Implementations must return quickly and must not call
/// back into the relay.
pub trait EventListener: Send + Sync + 'static {
    fn on_event(&self, event: InboundEvent);
}

impl EventListener for mpsc::UnboundedSender<InboundEvent> {
    fn on_event(&self, event: InboundEvent) {
        if let Err(e) = self.send(event) {
            warn!("Event receiver dropped, discarding {}", e.0.kind());
        }
    }
}

/// Meant for `async_channel::unbounded()` senders. A bounded channel that is
/// full drops the event, which may be the final `Closed`.
impl EventListener for async_channel::Sender<InboundEvent> {
    fn on_event(&self, event: InboundEvent) {
        if let Err(e) = self.try_send(event) {
            let event = e.into_inner();
            if let InboundEvent::Closed { cause } = &event {
                error!("Event channel unavailable, Closed ({}) was not delivered", cause);
            } else {
                warn!("Event channel unavailable, discarding {}", event.kind());
            }
        }
    }
}

/// Listener backed by a closure. Built with [`listener_fn`].
pub struct FnListener<F>(F);

impl<F> EventListener for FnListener<F>
where
    F: Fn(InboundEvent) + Send + Sync + 'static,
{
    fn on_event(&self, event: InboundEvent) {
        (self.0)(event)
    }
}

/// Wrap a closure as an [`EventListener`].
pub fn listener_fn<F>(f: F) -> FnListener<F>
where
    F: Fn(InboundEvent) + Send + Sync + 'static,
{
    FnListener(f)
}
