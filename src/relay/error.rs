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

//! Relay error types.

use thiserror::Error;

/// Errors returned by [`StreamRelay`](super::StreamRelay) operations.
///
/// Read failures never appear here; they end the session and are reported
/// as a `Closed` event instead.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The connection handed to the relay was not open.
    #[error("connection is not open")]
    InvalidConnection,

    /// Relay settings were rejected.
    #[error("invalid relay configuration: {0}")]
    InvalidConfig(String),

    /// `start()` was called on a relay whose read loop already runs.
    #[error("relay already started")]
    AlreadyStarted,

    /// The relay has been closed.
    #[error("relay is closed")]
    Closed,

    /// Writing to the stream failed. The connection stays open.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}
