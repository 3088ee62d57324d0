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

//! Session state shared between the relay consumer and the front end.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::relay::CloseCause;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Error",
        }
    }
}

/// Byte totals for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficCounters {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
}

/// Shared session state.
#[derive(Debug)]
pub struct SessionState {
    /// Current connection status.
    pub connection_status: RwLock<ConnectionStatus>,

    /// Remote end of the current session.
    pub peer: RwLock<Option<String>>,

    /// When the session was established.
    pub connected_at: RwLock<Option<DateTime<Local>>>,

    pub counters: RwLock<TrafficCounters>,

    /// Most recent user-facing send failure.
    pub last_failure: RwLock<Option<String>>,

    pub close_cause: RwLock<Option<CloseCause>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            connection_status: RwLock::new(ConnectionStatus::Disconnected),
            peer: RwLock::new(None),
            connected_at: RwLock::new(None),
            counters: RwLock::new(TrafficCounters::default()),
            last_failure: RwLock::new(None),
            close_cause: RwLock::new(None),
        }
    }
}

impl SessionState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_connected(&self, peer: String) {
        *self.connection_status.write() = ConnectionStatus::Connected;
        *self.peer.write() = Some(peer);
        *self.connected_at.write() = Some(Local::now());
        *self.counters.write() = TrafficCounters::default();
        *self.last_failure.write() = None;
        *self.close_cause.write() = None;
    }

    /// Record the end of the session. A read error leaves the status at `Error`.
    pub fn set_closed(&self, cause: CloseCause) {
        let status = match cause {
            CloseCause::ReadError(_) => ConnectionStatus::Error,
            CloseCause::Requested | CloseCause::PeerClosed => ConnectionStatus::Disconnected,
        };
        *self.connection_status.write() = status;
        *self.close_cause.write() = Some(cause);
    }

    pub fn record_received(&self, bytes: usize) {
        self.counters.write().bytes_received += bytes as u64;
    }

    pub fn record_sent(&self, bytes: usize) {
        self.counters.write().bytes_sent += bytes as u64;
    }

    pub fn record_send_failure(&self, reason: String) {
        self.counters.write().send_failures += 1;
        *self.last_failure.write() = Some(reason);
    }

    pub fn get_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    pub fn is_connected(&self) -> bool {
        self.get_status() == ConnectionStatus::Connected
    }

    pub fn get_peer(&self) -> Option<String> {
        self.peer.read().clone()
    }

    pub fn get_counters(&self) -> TrafficCounters {
        *self.counters.read()
    }

    pub fn get_last_failure(&self) -> Option<String> {
        self.last_failure.read().clone()
    }

    pub fn get_close_cause(&self) -> Option<CloseCause> {
        self.close_cause.read().clone()
    }

    /// Time since the session was established.
    pub fn uptime(&self) -> Option<chrono::Duration> {
        self.connected_at.read().map(|at| Local::now() - at)
    }
}
