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

//! Event processing for relay output.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::relay::{CloseCause, InboundEvent};
use crate::state::SessionState;

/// Consumes relay events on the front-end side.
///
/// Inbound bytes go to `output` untouched. Send failures go to `notices`,
/// the user-facing channel.
pub struct EventProcessor<W, N> {
    state: Arc<SessionState>,
    output: W,
    notices: N,
}

impl<W: Write, N: Write> EventProcessor<W, N> {
    pub fn new(state: Arc<SessionState>, output: W, notices: N) -> Self {
        Self {
            state,
            output,
            notices,
        }
    }

    /// Process a single event.
    ///
    /// Returns `false` once the session has closed.
    pub fn process_event(&mut self, event: InboundEvent) -> Result<bool> {
        match event {
            InboundEvent::DataReceived { bytes, length } => {
                debug!("Inbound chunk: {} bytes", length);
                self.state.record_received(length);
                self.output.write_all(&bytes)?;
                self.output.flush()?;
            }
            InboundEvent::DataSent { bytes } => {
                debug!("Outbound chunk delivered: {} bytes", bytes.len());
                self.state.record_sent(bytes.len());
            }
            InboundEvent::SendFailed { reason } => {
                warn!("Send failed: {}", reason);
                writeln!(self.notices, "{}", reason)?;
                self.state.record_send_failure(reason);
            }
            InboundEvent::Closed { cause } => {
                match &cause {
                    CloseCause::ReadError(e) => warn!("Connection lost: {}", e),
                    other => info!("Connection {}", other),
                }
                writeln!(self.notices, "Disconnected ({})", cause)?;
                self.state.set_closed(cause);
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn notices(&self) -> &N {
        &self.notices
    }
}
