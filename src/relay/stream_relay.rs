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

//! Relay that owns one duplex stream.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::error::RelayError;
use super::event::{CloseCause, EventListener, InboundEvent, SEND_FAILED_REASON};
use crate::config::RelayConfig;

/// Lifecycle of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Constructed, read loop not running.
    Created,
    /// Read loop running.
    Running,
    /// Terminal.
    Closed,
}

struct Lifecycle {
    state: RelayState,
    cause: Option<CloseCause>,
}

struct Inner<S> {
    peer: String,
    buffer_size: usize,
    lifecycle: Mutex<Lifecycle>,
    reader: Mutex<Option<ReadHalf<S>>>,
    writer: AsyncMutex<Option<WriteHalf<S>>>,
    /// Flips to `true` on the transition to `Closed`. Pending reads and
    /// writes race it so a stalled peer cannot pin them.
    closed: watch::Sender<bool>,
    listener: Box<dyn EventListener>,
}

impl<S: Connection> Inner<S> {
    /// Emit an event unless the relay is closed. Returns false if it was dropped.
    fn emit_if_open(&self, event: InboundEvent) -> bool {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.state == RelayState::Closed {
            return false;
        }
        self.listener.on_event(event);
        true
    }

    /// Move to `Closed` and emit the single `Closed` event.
    ///
    /// Returns false if the relay was already closed.
    fn transition_closed(&self, cause: CloseCause) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state == RelayState::Closed {
            return false;
        }
        lifecycle.state = RelayState::Closed;
        lifecycle.cause = Some(cause.clone());
        self.closed.send_replace(true);
        self.listener.on_event(InboundEvent::Closed { cause });
        true
    }

    fn is_closed(&self) -> bool {
        self.lifecycle.lock().state == RelayState::Closed
    }

    /// Drop the write half, shutting it down first. Errors are ignored.
    ///
    /// A send in progress holds the lock; it is interrupted by the closed
    /// signal and drops the half itself.
    async fn release_writer(&self) {
        let Ok(mut guard) = self.writer.try_lock() else {
            debug!("Writer busy, it will be released by the pending send");
            return;
        };
        if let Some(mut writer) = guard.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Ignoring error while closing connection to {}: {}", self.peer, e);
            }
        }
    }
}

/// Bidirectional relay over a single [`Connection`].
///
/// Inbound bytes are read on a dedicated task and delivered to the listener
/// as [`InboundEvent::DataReceived`]. Outbound bytes are written by
/// [`send`](Self::send) on the caller's task. Clones share the same stream.
pub struct StreamRelay<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for StreamRelay<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Connection> StreamRelay<S> {
    /// Create a relay with the default configuration.
    pub fn new<L: EventListener>(connection: S, listener: L) -> Result<Self, RelayError> {
        Self::with_config(connection, listener, &RelayConfig::default())
    }

    /// Create a relay.
    ///
    /// Fails with [`RelayError::InvalidConnection`] if `connection` is not open.
    pub fn with_config<L: EventListener>(
        connection: S,
        listener: L,
        config: &RelayConfig,
    ) -> Result<Self, RelayError> {
        config.validate().map_err(|e| RelayError::InvalidConfig(e.to_string()))?;
        if !connection.is_open() {
            warn!("Refusing to relay a closed connection");
            return Err(RelayError::InvalidConnection);
        }

        let peer = connection.peer_label();
        let (reader, writer) = tokio::io::split(connection);
        debug!("Relay created for {}", peer);

        Ok(Self {
            inner: Arc::new(Inner {
                peer,
                buffer_size: config.buffer_size,
                lifecycle: Mutex::new(Lifecycle {
                    state: RelayState::Created,
                    cause: None,
                }),
                reader: Mutex::new(Some(reader)),
                writer: AsyncMutex::new(Some(writer)),
                closed: watch::channel(false).0,
                listener: Box::new(listener),
            }),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RelayState {
        self.inner.lifecycle.lock().state
    }

    /// Why the relay closed, once it has.
    pub fn close_cause(&self) -> Option<CloseCause> {
        self.inner.lifecycle.lock().cause.clone()
    }

    /// Description of the remote end.
    pub fn peer(&self) -> &str {
        &self.inner.peer
    }

    /// Spawn the read loop. Must be called inside a tokio runtime.
    ///
    /// The returned handle completes when the loop exits.
    pub fn start(&self) -> Result<JoinHandle<()>, RelayError> {
        let reader = {
            let mut lifecycle = self.inner.lifecycle.lock();
            match lifecycle.state {
                RelayState::Running => return Err(RelayError::AlreadyStarted),
                RelayState::Closed => return Err(RelayError::Closed),
                RelayState::Created => {}
            }
            let reader = self
                .inner
                .reader
                .lock()
                .take()
                .ok_or(RelayError::AlreadyStarted)?;
            lifecycle.state = RelayState::Running;
            reader
        };

        info!("Relay started for {}", self.inner.peer);
        Ok(tokio::spawn(read_loop(self.inner.clone(), reader)))
    }

    /// Write `bytes` to the stream.
    ///
    /// Emits `DataSent` on success. On failure emits `SendFailed`, leaves the
    /// connection open and returns [`RelayError::Write`]. A write still
    /// pending when the relay closes is abandoned with [`RelayError::Closed`].
    /// Must not be awaited from inside the listener.
    pub async fn send(&self, bytes: &[u8]) -> Result<(), RelayError> {
        // Subscribe before checking the state so a close in between is seen.
        let mut closed = self.inner.closed.subscribe();
        let mut guard = self.inner.writer.lock().await;
        if self.inner.is_closed() {
            guard.take();
            return Err(RelayError::Closed);
        }
        let writer = guard.as_mut().ok_or(RelayError::Closed)?;

        let result = tokio::select! {
            biased;
            _ = closed_signal(&mut closed) => None,
            result = async {
                writer.write_all(bytes).await?;
                writer.flush().await
            } => Some(result),
        };
        let Some(result) = result else {
            debug!("Send to {} abandoned, relay closed", self.inner.peer);
            guard.take();
            return Err(RelayError::Closed);
        };

        match result {
            Ok(()) => {
                debug!("Sent {} bytes to {}", bytes.len(), self.inner.peer);
                if !self.inner.emit_if_open(InboundEvent::DataSent {
                    bytes: bytes.to_vec(),
                }) {
                    // Closed while writing; finish the release close() skipped.
                    guard.take();
                }
                Ok(())
            }
            Err(e) => {
                warn!("Write to {} failed: {}", self.inner.peer, e);
                let closed = !self.inner.emit_if_open(InboundEvent::SendFailed {
                    reason: SEND_FAILED_REASON.to_string(),
                });
                if closed {
                    guard.take();
                }
                Err(RelayError::Write(e))
            }
        }
    }

    /// Close the connection and stop the read loop.
    ///
    /// Emits `Closed { cause: Requested }` unless the relay already closed.
    /// Calling it again is a no-op.
    pub async fn close(&self) {
        if !self.inner.transition_closed(CloseCause::Requested) {
            debug!("Relay for {} already closed", self.inner.peer);
            return;
        }
        info!("Closing relay for {}", self.inner.peer);

        // Never started: the read half is still parked here.
        let parked = self.inner.reader.lock().take();
        drop(parked);
        self.inner.release_writer().await;
    }
}

/// Resolves once the relay is closed.
async fn closed_signal(closed: &mut watch::Receiver<bool>) {
    // An error means the sender is gone with the relay, which is closed too.
    let _ = closed.wait_for(|closed| *closed).await;
}

async fn read_loop<S: Connection>(inner: Arc<Inner<S>>, mut reader: ReadHalf<S>) {
    let mut buffer = vec![0u8; inner.buffer_size];
    let mut closed = inner.closed.subscribe();

    loop {
        let result = tokio::select! {
            biased;
            _ = closed_signal(&mut closed) => {
                debug!("Read loop for {} stopped", inner.peer);
                break;
            }
            result = reader.read(&mut buffer) => result,
        };

        match result {
            Ok(0) => {
                info!("Connection closed by remote: {}", inner.peer);
                inner.transition_closed(CloseCause::PeerClosed);
                break;
            }
            Ok(n) => {
                debug!("Received {} bytes from {}", n, inner.peer);
                if !inner.emit_if_open(InboundEvent::received(&buffer[..n])) {
                    break;
                }
            }
            Err(e) => {
                warn!("Read from {} failed: {}", inner.peer, e);
                inner.transition_closed(CloseCause::ReadError(e.to_string()));
                break;
            }
        }
    }

    drop(reader);
    inner.release_writer().await;
    debug!("Read loop for {} exited", inner.peer);
}
