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

//! Scripted in-memory stream for relay tests.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::connection::Connection;

enum ReadStep {
    Data(Vec<u8>),
    Error(io::ErrorKind),
    Eof,
}

/// Stream that replays a fixed list of read outcomes.
///
/// Once the script is exhausted reads stay pending forever, like an idle
/// peer. Writes are captured unless `fail_writes` is set.
pub struct ScriptedStream {
    reads: VecDeque<ReadStep>,
    fail_writes: bool,
    fail_shutdown: bool,
    open: bool,
    written: Arc<Mutex<Vec<u8>>>,
    shutdowns: Arc<Mutex<usize>>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            fail_writes: false,
            fail_shutdown: false,
            open: true,
            written: Arc::new(Mutex::new(Vec::new())),
            shutdowns: Arc::new(Mutex::new(0)),
        }
    }

    pub fn read(mut self, data: &[u8]) -> Self {
        self.reads.push_back(ReadStep::Data(data.to_vec()));
        self
    }

    pub fn read_error(mut self, kind: io::ErrorKind) -> Self {
        self.reads.push_back(ReadStep::Error(kind));
        self
    }

    pub fn eof(mut self) -> Self {
        self.reads.push_back(ReadStep::Eof);
        self
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn fail_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }

    pub fn shutdowns(&self) -> Arc<Mutex<usize>> {
        self.shutdowns.clone()
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.reads.pop_front() {
            Some(ReadStep::Data(data)) => {
                buf.put_slice(&data);
                Poll::Ready(Ok(()))
            }
            Some(ReadStep::Error(kind)) => Poll::Ready(Err(io::Error::new(kind, "scripted read error"))),
            Some(ReadStep::Eof) => Poll::Ready(Ok(())),
            None => Poll::Pending,
        }
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted write error",
            )));
        }
        self.written.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        *self.shutdowns.lock() += 1;
        if self.fail_shutdown {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "scripted close error")));
        }
        Poll::Ready(Ok(()))
    }
}

impl Connection for ScriptedStream {
    fn is_open(&self) -> bool {
        self.open
    }

    fn peer_label(&self) -> String {
        "scripted".to_string()
    }
}
