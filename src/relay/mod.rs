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

//! Byte-stream relay.
//!
//! Owns one duplex stream, reads it on a dedicated task and reports
//! everything that happens on it to a single listener.

mod connection;
mod error;
mod event;
#[cfg(test)]
mod mock;
mod stream_relay;

#[cfg(feature = "rfcomm")]
pub use connection::connect_rfcomm;
pub use connection::Connection;
pub use error::RelayError;
pub use event::{listener_fn, CloseCause, EventListener, FnListener, InboundEvent, SEND_FAILED_REASON};
pub use stream_relay::{RelayState, StreamRelay};
