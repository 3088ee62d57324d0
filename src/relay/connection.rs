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

//! Duplex streams a relay can own.

use tokio::io::{AsyncRead, AsyncWrite};

/// An open, bidirectional byte stream.
///
/// Streams are established elsewhere and handed to the relay, which then
/// owns them until the session ends.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Whether the stream is usable. Checked once at relay construction.
    fn is_open(&self) -> bool {
        true
    }

    /// Human-readable description of the remote end, for logs.
    fn peer_label(&self) -> String {
        "unknown".to_string()
    }
}

impl Connection for tokio::net::TcpStream {
    fn is_open(&self) -> bool {
        self.peer_addr().is_ok()
    }

    fn peer_label(&self) -> String {
        match self.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "tcp:unconnected".to_string(),
        }
    }
}

#[cfg(unix)]
impl Connection for tokio::net::UnixStream {
    fn peer_label(&self) -> String {
        match self.peer_addr() {
            Ok(addr) => match addr.as_pathname() {
                Some(path) => path.display().to_string(),
                None => "unix:unnamed".to_string(),
            },
            Err(_) => "unix:unconnected".to_string(),
        }
    }
}

impl Connection for tokio::io::DuplexStream {
    fn peer_label(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(feature = "rfcomm")]
impl Connection for bluer::rfcomm::Stream {
    fn is_open(&self) -> bool {
        self.peer_addr().is_ok()
    }

    fn peer_label(&self) -> String {
        match self.peer_addr() {
            Ok(sa) => format!("{}/{}", sa.addr, sa.channel),
            Err(_) => "rfcomm:unconnected".to_string(),
        }
    }
}

/// Connect an RFCOMM stream to an already paired device.
#[cfg(feature = "rfcomm")]
pub async fn connect_rfcomm(address: &str, channel: u8) -> anyhow::Result<bluer::rfcomm::Stream> {
    use anyhow::Context;
    use bluer::rfcomm::{SocketAddr, Stream};

    let address: bluer::Address = address
        .parse()
        .with_context(|| format!("Invalid Bluetooth address: {}", address))?;
    tracing::info!("Connecting RFCOMM to {} channel {}", address, channel);
    let stream = Stream::connect(SocketAddr::new(address, channel)).await?;
    Ok(stream)
}
