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

//! BluZone relay library.
//!
//! A [`relay::StreamRelay`] owns one connected duplex stream (TCP, Unix
//! socket, Bluetooth RFCOMM) and reports reads, writes and closure to a
//! single listener.

pub mod config;
pub mod console;
pub mod events;
pub mod relay;
pub mod state;
